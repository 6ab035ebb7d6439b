//! Command-line interface for glyphdust

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use glyphdust::{Color, ConfigError, ParticleTextConfig, Vec2};

#[derive(Parser)]
#[command(name = "glyphdust")]
#[command(about = "Interactive particle text", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a window and play with the particles
    Run {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render frames headlessly and save the last one as an image
    Snapshot {
        #[command(flatten)]
        source: SourceArgs,

        /// Output image path
        #[arg(short, long)]
        out: PathBuf,

        /// Number of frames to run before saving
        #[arg(long, default_value_t = 1)]
        frames: u32,

        /// Move the pointer here before the first frame, as `X,Y` in canvas pixels
        #[arg(long, value_parser = parse_point)]
        pointer: Option<Vec2>,
    },

    /// Write a configuration file with the given options applied to the defaults
    Config {
        #[command(flatten)]
        source: SourceArgs,

        /// Output JSON path
        #[arg(short, long)]
        out: PathBuf,
    },
}

/// Where the particles come from and how they look.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Text to render
    #[arg(short, long)]
    pub text: Option<String>,

    /// TrueType/OpenType font file
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Use the alpha channel of an image instead of rendered text
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Particle radius in pixels
    #[arg(long)]
    pub particle_size: Option<f32>,

    /// Target particle count (0 derives it from the canvas area)
    #[arg(long)]
    pub num_particles: Option<u32>,

    /// Font size in pixels
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Pointer interaction radius in pixels (default: font size / 3)
    #[arg(long)]
    pub mouse_radius: Option<f32>,

    /// Particle color, e.g. `#000`, `#ff8800`, `rgba(0, 0, 0, 0.5)`
    #[arg(long)]
    pub color: Option<Color>,

    /// Background color; `transparent` clears each frame
    #[arg(long)]
    pub background: Option<Color>,
}

impl SourceArgs {
    /// Load the config file (or the defaults) and apply flag overrides.
    pub fn resolve(&self) -> Result<ParticleTextConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ParticleTextConfig::load(path)?,
            None => ParticleTextConfig::default(),
        };

        if let Some(text) = &self.text {
            config.text = text.clone();
        }
        if let Some(font) = &self.font {
            config.font = Some(font.clone());
        }
        if let Some(size) = self.particle_size {
            config.particle_size = size;
        }
        if let Some(count) = self.num_particles {
            config.num_particles = Some(count);
        }
        if let Some(size) = self.font_size {
            config.font_size = size;
        }
        if let Some(radius) = self.mouse_radius {
            config.mouse_radius = Some(radius);
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(color) = self.background {
            config.background_color = color;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {:?}", s))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x: {}", e))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y: {}", e))?;
    Ok(Vec2::new(x, y))
}
