//! Integration tests for the frame loop.
//!
//! These drive whole simulations through many frames and check what a
//! viewer would notice: particle counts, where particles end up, and that
//! the grid never loses track of anyone.

use glyphdust::field::{FieldParams, ParticleField};
use glyphdust::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

const RESTORE_RATIO: f32 = 14.0 / 15.0;

fn opaque_mask(width: u32, height: u32) -> OpacityMask {
    OpacityMask::new(width, height, vec![255; (width * height) as usize]).unwrap()
}

fn params(width: u32, height: u32, target: Option<u32>) -> FieldParams {
    FieldParams {
        canvas: CanvasSize::new(width, height),
        padding: Vec2::ZERO,
        particle_radius: 2.0,
        color: Color::BLACK,
        target_count: target,
        interaction_radius: 10.0,
    }
}

fn seeded_simulation(width: u32, height: u32, target: Option<u32>, seed: u64) -> Simulation {
    let mut rng = SmallRng::seed_from_u64(seed);
    let field = ParticleField::build_with_rng(&opaque_mask(width, height), &params(width, height, target), &mut rng);
    let config = ParticleTextConfig {
        mouse_radius: Some(10.0),
        ..Default::default()
    };
    Simulation::new(field, config)
}

fn positions(sim: &Simulation) -> Vec<Vec2> {
    sim.field().particles().iter().map(|p| p.position).collect()
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn test_scenario_a_mean_count() {
    let trials = 40;
    let mut total = 0;
    for seed in 0..trials {
        let mut rng = SmallRng::seed_from_u64(seed);
        let field = ParticleField::build_with_rng(&opaque_mask(100, 100), &params(100, 100, None), &mut rng);
        assert_eq!(field.target_count(), 167);
        total += field.len();
    }
    let mean = total as f32 / trials as f32;
    assert!((mean - 167.0).abs() < 167.0 * 0.05, "mean {}", mean);
}

#[test]
fn test_sampling_within_ten_percent_for_large_masks() {
    for seed in 0..10 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let field = ParticleField::build_with_rng(&opaque_mask(100, 100), &params(100, 100, Some(2_000)), &mut rng);
        let count = field.len() as f32;
        assert!((count - 2_000.0).abs() <= 200.0, "seed {} gave {}", seed, count);
    }
}

#[test]
fn test_target_at_or_above_qualifying_is_exact() {
    for target in [400, 401, 5_000] {
        let sim = seeded_simulation(20, 20, Some(target), 3);
        assert_eq!(sim.field().len(), 400);
    }
}

// ============================================================================
// Frame scenarios
// ============================================================================

#[test]
fn test_scenario_b_distant_pointer_changes_nothing() {
    let mut sim = seeded_simulation(50, 50, Some(10_000), 1);
    let before = positions(&sim);

    sim.pointer_mut().move_to(Vec2::new(500.0, 500.0));
    let stats = sim.step();
    assert_eq!(stats.pushed, 0);
    assert_eq!(stats.restored, 0);
    assert_eq!(positions(&sim), before);

    // Just outside sqrt(10² + 2²) of the nearest particle (corner at 0,0)
    sim.pointer_mut().move_to(Vec2::new(-7.3, -7.3));
    sim.step();
    assert_eq!(positions(&sim), before);
}

#[test]
fn test_scenario_c_displacement_decays_by_fourteen_fifteenths() {
    let mut sim = seeded_simulation(40, 40, Some(10_000), 2);
    sim.pointer_mut().move_to(Vec2::new(20.5, 20.5));
    sim.step();

    let displaced: Vec<(usize, f32)> = sim
        .field()
        .particles()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.displacement().length() > 1.0)
        .map(|(i, p)| (i, p.displacement().length()))
        .collect();
    assert!(!displaced.is_empty());

    for n in 1..=3 {
        let stats = sim.step();
        assert_eq!(stats.pushed, 0);
        for &(i, start) in &displaced {
            let now = sim.field().particles()[i].displacement().length();
            let want = start * RESTORE_RATIO.powi(n);
            assert!((now - want).abs() < 1e-3 * start.max(1.0), "particle {}: {} vs {}", i, now, want);
        }
    }
}

#[test]
fn test_stale_pointer_does_not_push() {
    let mut sim = seeded_simulation(30, 30, Some(10_000), 4);
    sim.pointer_mut().move_to(Vec2::new(15.0, 15.0));
    sim.pointer_mut().consume();
    let before = positions(&sim);

    let stats = sim.step();
    assert_eq!(stats.pushed, 0);
    assert_eq!(positions(&sim), before);
}

#[test]
fn test_hovering_pointer_lets_particles_return() {
    let mut sim = seeded_simulation(30, 30, Some(10_000), 5);
    sim.pointer_mut().move_to(Vec2::new(15.0, 15.0));
    assert!(sim.step().pushed > 0);

    for _ in 0..400 {
        assert_eq!(sim.step().pushed, 0);
    }
    for particle in sim.field().particles() {
        assert!(particle.displacement().length() < 1e-3);
    }
}

#[test]
fn test_idle_frames_stop_restoring_once_settled() {
    let mut sim = seeded_simulation(30, 30, Some(10_000), 9);
    sim.pointer_mut().move_to(Vec2::new(12.0, 18.0));
    sim.step();

    let mut settled_at = None;
    for frame in 0..5_000 {
        if sim.step().restored == 0 {
            settled_at = Some(frame);
            break;
        }
    }
    assert!(settled_at.is_some(), "particles never settled");
    assert!(sim.field().particles().iter().all(|p| p.position == p.base()));

    let stats = sim.step();
    assert_eq!((stats.pushed, stats.restored, stats.relocated), (0, 0, 0));
}

// ============================================================================
// Grid bookkeeping
// ============================================================================

#[test]
fn test_grid_consistent_under_sweeping_pointer() {
    let mut sim = seeded_simulation(60, 40, Some(10_000), 6);
    for frame in 0..300 {
        let t = frame as f32 * 0.07;
        let pointer = Vec2::new(30.0 + 35.0 * t.cos(), 20.0 + 25.0 * (t * 1.3).sin());
        if frame % 3 != 0 {
            sim.pointer_mut().move_to(pointer);
        }
        sim.step();
        assert!(sim.field().is_grid_consistent(), "frame {}", frame);
    }
}

#[test]
fn test_particles_leave_and_rejoin_the_grid() {
    let mut sim = seeded_simulation(20, 20, Some(10_000), 7);
    sim.pointer_mut().move_to(Vec2::new(15.0, 10.0));
    sim.step();

    let off_grid = sim.field().particles().iter().filter(|p| p.cell().is_none()).count();
    assert!(off_grid > 0);
    assert!(sim.field().is_grid_consistent());

    for _ in 0..300 {
        sim.step();
    }
    assert!(sim.field().particles().iter().all(|p| p.cell().is_some()));
    assert_eq!(sim.field().grid().member_count(), 400);
    assert!(sim.field().is_grid_consistent());
}

// ============================================================================
// Drawing
// ============================================================================

#[test]
fn test_first_frame_draws_shape_at_rest() {
    let mut alpha = vec![0u8; 64];
    alpha[3 * 8 + 3] = 255;
    let mask = OpacityMask::new(8, 8, alpha).unwrap();

    let config = ParticleTextConfig {
        background_color: Color::WHITE,
        color: Color::rgb(0, 0, 255),
        font_size: 2.0,
        mouse_radius: Some(4.0),
        ..Default::default()
    };
    let mut sim = Simulation::from_mask(&mask, CanvasSize::new(8, 8), config);
    assert_eq!(sim.field().len(), 1);
    // padding = font_size / 2
    assert_eq!(sim.field().particles()[0].base(), Vec2::new(4.0, 4.0));

    let mut canvas = PixelCanvas::new(CanvasSize::default());
    sim.frame(&mut canvas);
    assert_eq!(canvas.size(), CanvasSize::new(8, 8));
    assert_eq!(canvas.pixel(4, 4), Some(Color::rgb(0, 0, 255)));
    assert_eq!(canvas.pixel(0, 7), Some(Color::WHITE));
}

#[test]
fn test_rebuild_replaces_every_particle() {
    let mut sim = seeded_simulation(20, 20, Some(10_000), 8);
    sim.pointer_mut().move_to(Vec2::new(10.0, 10.0));
    sim.step();

    sim.rebuild(&opaque_mask(5, 5), CanvasSize::new(5, 5));
    assert_eq!(sim.canvas_size(), CanvasSize::new(5, 5));
    assert!(sim.field().particles().iter().all(|p| !p.is_displaced()));
    assert!(sim.field().is_grid_consistent());
}
