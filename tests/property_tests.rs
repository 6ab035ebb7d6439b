//! Property-based tests for the spatial grid and particle rules using proptest
//!
//! These verify invariants across random canvases, radii and positions:
//! - Neighbor completeness: nothing within the radius is missed
//! - Relocation is idempotent and keeps membership unique
//! - Restore decays displacement by 14/15 without overshooting
//! - Frames never break grid consistency

use glyphdust::field::{FieldParams, ParticleField};
use glyphdust::prelude::*;
use glyphdust::{Particle, SpatialGrid};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// A canvas size and a cell size no larger than the canvas.
fn grid_setup() -> impl Strategy<Value = (f32, f32, f32)> {
    (10.0f32..300.0, 10.0f32..300.0, 1.0f32..60.0)
}

fn point_in(width: f32, height: f32) -> impl Strategy<Value = Vec2> {
    (-20.0f32..width + 20.0, -20.0f32..height + 20.0).prop_map(|(x, y)| Vec2::new(x, y))
}

fn populate(grid: &mut SpatialGrid, points: &[Vec2]) -> Vec<Particle> {
    let mut particles: Vec<Particle> = points.iter().map(|&p| Particle::new(p, 1.0, 1.0)).collect();
    for (id, particle) in particles.iter_mut().enumerate() {
        grid.relocate(id, particle);
    }
    particles
}

proptest! {
    #[test]
    fn prop_neighbors_are_complete(
        (width, height, cell) in grid_setup(),
        seeds in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0), 1..200),
        (qx, qy) in (0.0f32..1.0, 0.0f32..1.0),
    ) {
        let mut grid = SpatialGrid::new(width, height, cell);
        let points: Vec<Vec2> = seeds.iter().map(|&(x, y)| Vec2::new(x * width, y * height)).collect();
        let particles = populate(&mut grid, &points);

        let query = Vec2::new(qx * width, qy * height);
        let found = grid.neighbors_of(query);

        for (id, particle) in particles.iter().enumerate() {
            // Stay clear of the exact boundary, where float rounding decides the cell
            if particle.position.distance(query) < cell * 0.999 && particle.cell().is_some() {
                prop_assert!(found.contains(&id), "particle {} at {:?} missed for query {:?}", id, particle.position, query);
            }
        }
    }

    #[test]
    fn prop_neighbors_have_no_duplicates(
        (width, height, cell) in grid_setup(),
        seeds in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0), 1..200),
        query in point_in(300.0, 300.0),
    ) {
        let mut grid = SpatialGrid::new(width, height, cell);
        let points: Vec<Vec2> = seeds.iter().map(|&(x, y)| Vec2::new(x * width, y * height)).collect();
        populate(&mut grid, &points);

        let mut found = grid.neighbors_of(query);
        let len = found.len();
        found.sort_unstable();
        found.dedup();
        prop_assert_eq!(found.len(), len);
    }

    #[test]
    fn prop_relocate_is_idempotent(
        (width, height, cell) in grid_setup(),
        start in point_in(300.0, 300.0),
        moves in prop::collection::vec(point_in(300.0, 300.0), 1..20),
    ) {
        let mut grid = SpatialGrid::new(width, height, cell);
        let mut particles = populate(&mut grid, &[start]);
        let particle = &mut particles[0];

        for target in moves {
            particle.position = target;
            grid.relocate(0, particle);
            let members = grid.member_count();

            prop_assert!(!grid.relocate(0, particle));
            prop_assert_eq!(grid.member_count(), members);
            prop_assert_eq!(particle.cell(), grid.cell_of(target));
            prop_assert_eq!(members, usize::from(particle.cell().is_some()));
            if let Some(c) = particle.cell() {
                prop_assert!(grid.contains(0, c));
            }
        }
    }

    #[test]
    fn prop_restore_decays_without_overshoot(
        base in point_in(200.0, 200.0),
        offset in (-50.0f32..50.0, -50.0f32..50.0),
    ) {
        let mut particle = Particle::new(base, 2.0, 1.0);
        particle.position = base + Vec2::new(offset.0, offset.1);
        let start = particle.displacement();
        prop_assume!(start.length() > 1e-2);

        let ratio = 14.0f32 / 15.0;
        let mut expected = start.length();
        for _ in 0..10 {
            particle.restore();
            expected *= ratio;
            let d = particle.displacement();
            prop_assert!((d.length() - expected).abs() <= 1e-3 * start.length().max(1.0));
            // Same side of home on each axis
            prop_assert!(d.x * start.x >= 0.0);
            prop_assert!(d.y * start.y >= 0.0);
        }
    }

    #[test]
    fn prop_frames_keep_grid_consistent(
        seed in any::<u64>(),
        size in 10u32..60,
        radius in 2.0f32..25.0,
        path in prop::collection::vec((point_in(80.0, 80.0), any::<bool>()), 1..40),
    ) {
        let mask = OpacityMask::new(size, size, vec![255; (size * size) as usize]).unwrap();
        let params = FieldParams {
            canvas: CanvasSize::new(size, size),
            padding: Vec2::splat(3.0),
            particle_radius: 1.5,
            color: Color::BLACK,
            target_count: Some(size * size / 2),
            interaction_radius: radius,
        };
        let mut rng = SmallRng::seed_from_u64(seed);
        let field = ParticleField::build_with_rng(&mask, &params, &mut rng);
        let config = ParticleTextConfig { mouse_radius: Some(radius), ..Default::default() };
        let mut sim = Simulation::new(field, config);

        for (position, moved) in path {
            if moved {
                sim.pointer_mut().move_to(position);
            }
            sim.step();
            prop_assert!(sim.field().is_grid_consistent());
        }
    }
}
