//! Main entry point for the glyphdust CLI

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use glyphdust::{
    CanvasSize, FontRasterizer, OpacityMask, PixelCanvas, RasterError, RunError, Simulation, Vec2,
};

use crate::cli::{Cli, Commands, SourceArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG wins over the flags when set
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default());
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(log_level(cli.verbose, cli.quiet));
    }
    logger.init();

    match cli.command {
        Commands::Run { source } => {
            let simulation = build_simulation(&source).context("Failed to build scene")?;
            glyphdust::window::run(simulation)?;
            Ok(())
        }
        Commands::Snapshot {
            source,
            out,
            frames,
            pointer,
        } => {
            let simulation = build_simulation(&source).context("Failed to build scene")?;
            snapshot(simulation, &out, frames, pointer)
                .with_context(|| format!("Failed to write snapshot to {}", out.display()))
        }
        Commands::Config { source, out } => {
            let config = source.resolve()?;
            config
                .save(&out)
                .with_context(|| format!("Failed to write config to {}", out.display()))?;
            log::info!("Wrote {}", out.display());
            Ok(())
        }
    }
}

/// Map `-v`/`-q` to a log level. Verbosity beats quiet.
fn log_level(verbose: u8, quiet: bool) -> log::LevelFilter {
    match verbose {
        0 if quiet => log::LevelFilter::Error,
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Resolve the configuration and build a scene from an image mask or text.
fn build_simulation(source: &SourceArgs) -> Result<Simulation, RunError> {
    let config = source.resolve()?;

    if let Some(path) = &source.mask {
        let mask = OpacityMask::from_image_file(path)?;
        let canvas = CanvasSize::new(mask.width(), mask.height());
        return Ok(Simulation::from_mask(&mask, canvas, config));
    }

    match config.font.clone() {
        Some(path) => {
            let font = FontRasterizer::from_file(&path)?;
            Ok(Simulation::from_text(&font, config)?)
        }
        None if config.text.is_empty() => Ok(Simulation::blank(config)),
        None => Err(RasterError::NoFont.into()),
    }
}

/// Run `frames` frames headlessly and save the last one as a PNG.
fn snapshot(
    mut simulation: Simulation,
    out: &Path,
    frames: u32,
    pointer: Option<Vec2>,
) -> Result<(), RunError> {
    let mut canvas = PixelCanvas::new(simulation.canvas_size());
    if let Some(position) = pointer {
        simulation.pointer_mut().move_to(position);
    }
    for _ in 0..frames.max(1) {
        simulation.frame(&mut canvas);
    }
    canvas.save_png(out).map_err(RunError::Snapshot)?;
    log::info!(
        "Wrote {} ({} particles, {} frames)",
        out.display(),
        simulation.field().len(),
        simulation.frame_count()
    );
    Ok(())
}
