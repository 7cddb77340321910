// Host-side tests for entity lifecycles and population convergence.

use flow_core::blob::{wrap_margin, LiquidBlob};
use flow_core::burst::{burst_cadence, burst_due, GlowBurst};
use flow_core::constants::*;
use flow_core::field::FlowField;
use flow_core::particle::{wrap_coord, Particle};
use flow_core::population::{blob_target, converge, particle_target, Convergence};
use flow_core::smoke::{smoke_cadence, smoke_due, spawn_cluster, update_and_draw, SmokePuff};
use flow_core::{ControlParams, FlatNoise, Param};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

mod common;
use common::RecordingSurface;

const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

#[test]
fn targets_follow_density_and_growth() {
    assert_eq!(particle_target(0.0), 300);
    assert_eq!(particle_target(0.5), 900);
    assert_eq!(particle_target(1.0), 1500);
    assert_eq!(blob_target(0.0), 3);
    assert_eq!(blob_target(0.3), 4);
    assert_eq!(blob_target(0.5), 5);
    assert_eq!(blob_target(1.0), 7);
}

#[test]
fn converge_moves_one_step_and_never_overshoots() {
    let mut items = vec![0u32; 3];
    assert_eq!(converge(&mut items, 5, || 9), Convergence::Grew);
    assert_eq!(items, vec![0, 0, 0, 9]);
    assert_eq!(converge(&mut items, 5, || 9), Convergence::Grew);
    assert_eq!(converge(&mut items, 5, || 9), Convergence::Settled);
    assert_eq!(items.len(), 5);

    // Shrinking removes the newest element first.
    assert_eq!(converge(&mut items, 4, || 1), Convergence::Shrank);
    assert_eq!(items, vec![0, 0, 0, 9]);
}

#[test]
fn converge_reaches_target_in_distance_ticks() {
    let mut items: Vec<u8> = Vec::new();
    let mut ticks = 0;
    while converge(&mut items, 12, || 0) != Convergence::Settled {
        ticks += 1;
    }
    assert_eq!(ticks, 12);
}

#[test]
fn particle_spawn_ranges() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let p = Particle::spawn(&mut rng, BOUNDS);
        assert!(p.pos.x >= 0.0 && p.pos.x < BOUNDS.x);
        assert!(p.pos.y >= 0.0 && p.pos.y < BOUNDS.y);
        assert_eq!(p.pos, p.prev_pos);
        assert!(p.max_speed >= 1.5 && p.max_speed < 2.0);
        assert!(p.alpha >= 30.0 && p.alpha < 150.0);
        assert!(p.size >= 0.5 && p.size < 2.5);
        assert!((PARTICLE_LIFESPAN_MIN..PARTICLE_LIFESPAN_MAX).contains(&p.lifespan));
        assert_eq!(p.age, 0);
    }
}

#[test]
fn particle_speed_is_capped_by_flow() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut p = Particle::spawn(&mut rng, BOUNDS);
    p.apply_force(Vec2::new(100.0, 0.0));
    p.update(&ControlParams::ZERO, &mut rng, BOUNDS);
    assert!((p.vel.length() - p.max_speed * 0.5).abs() < 1e-4);
    assert_eq!(p.acc, Vec2::ZERO);

    let fast = ControlParams::ZERO.with(Param::Flow, 1.0);
    p.apply_force(Vec2::new(100.0, 0.0));
    p.update(&fast, &mut rng, BOUNDS);
    assert!((p.vel.length() - p.max_speed * 1.5).abs() < 1e-4);
}

#[test]
fn particle_wraps_into_bounds() {
    assert_eq!(wrap_coord(-1.0, 800.0), 799.0);
    assert_eq!(wrap_coord(800.0, 800.0), 0.0);
    assert_eq!(wrap_coord(801.5, 800.0), 1.5);
    assert_eq!(wrap_coord(5.0, 0.0), 0.0);

    let mut rng = StdRng::seed_from_u64(3);
    let mut p = Particle::spawn(&mut rng, BOUNDS);
    p.pos = Vec2::new(799.5, 0.2);
    p.vel = Vec2::new(1.0, -1.0);
    p.update(&ControlParams::ZERO.with(Param::Flow, 1.0), &mut rng, BOUNDS);
    assert!(p.pos.x >= 0.0 && p.pos.x < 1.0);
    assert!(p.pos.y > 599.0 && p.pos.y < 600.0);
}

#[test]
fn expired_particle_respawns_without_a_trail() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut p = Particle::spawn(&mut rng, BOUNDS);
    p.age = p.lifespan;
    p.update(&ControlParams::ZERO, &mut rng, BOUNDS);
    assert_eq!(p.age, 0);
    assert_eq!(p.pos, p.prev_pos);

    let mut surface = RecordingSurface::new(BOUNDS.x, BOUNDS.y);
    p.prev_pos = p.pos + Vec2::new(50.0, 0.0);
    p.show(&mut surface, &ControlParams::ZERO, &FlatNoise(0.5), 0.0, 1);
    assert_eq!(surface.lines, 0, "jumps longer than the trail limit are not drawn");
    assert_eq!(p.prev_pos, p.pos);
}

#[test]
fn particle_fade_envelope() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut p = Particle::spawn(&mut rng, BOUNDS);
    p.lifespan = 400;
    p.age = 0;
    assert_eq!(p.fade(), 0.0);
    p.age = 25;
    assert!((p.fade() - 0.5).abs() < 1e-6);
    p.age = 200;
    assert_eq!(p.fade(), 1.0);
    p.age = 350;
    assert!((p.fade() - 0.5).abs() < 1e-6);
    p.age = 400;
    assert_eq!(p.fade(), 0.0);
}

#[test]
fn particle_follows_field_cell() {
    let mut field = FlowField::new(100.0, 100.0);
    field.recompute(&ControlParams::ZERO, &FlatNoise(0.0));
    let mut rng = StdRng::seed_from_u64(2);
    let mut p = Particle::spawn(&mut rng, Vec2::new(100.0, 100.0));
    p.pos = Vec2::new(30.0, 30.0);
    p.follow(&field);
    assert!((p.acc.x - FIELD_MAG_BASE).abs() < 1e-5);

    // Outside the grid nothing is applied.
    p.acc = Vec2::ZERO;
    p.pos = Vec2::new(150.0, 30.0);
    p.follow(&field);
    assert_eq!(p.acc, Vec2::ZERO);
}

#[test]
fn blob_wraps_past_margin() {
    assert_eq!(wrap_margin(901.0, 800.0), -BLOB_MARGIN);
    assert_eq!(wrap_margin(-101.0, 800.0), 800.0 + BLOB_MARGIN);
    assert_eq!(wrap_margin(-50.0, 800.0), -50.0);
}

#[test]
fn blob_outline_and_layers() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut blob = LiquidBlob::spawn(&mut rng, BOUNDS);
    blob.pos = Vec2::new(400.0, 300.0);
    blob.size = 150.0;
    let outline = blob.outline(&FlatNoise(1.0), 0.0);
    assert_eq!(outline.len(), 63);
    for point in &outline {
        assert!((point.distance(blob.pos) - 200.0).abs() < 1e-2);
    }

    let mut surface = RecordingSurface::new(BOUNDS.x, BOUNDS.y);
    blob.show(&mut surface, &ControlParams::default(), &FlatNoise(0.5), 0.0);
    assert_eq!(surface.polygons, BLOB_LAYERS);
}

#[test]
fn blob_drift_is_damped() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut blob = LiquidBlob::spawn(&mut rng, BOUNDS);
    let phase = blob.phase;
    for _ in 0..1000 {
        blob.update(&mut rng, BOUNDS);
    }
    // Jitter of 0.05 damped by 0.98 keeps speeds small.
    assert!(blob.vel.length() < 3.0);
    assert!((blob.phase - phase - 1000.0 * BLOB_PHASE_STEP).abs() < 1e-6);
}

#[test]
fn smoke_lives_exactly_its_lifespan() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut puff = SmokePuff::spawn(&mut rng, Vec2::new(100.0, 100.0));
    let size = puff.size;
    assert!(puff.vel.y < 0.0, "smoke drifts upward");
    let mut ticks = 0;
    while !puff.is_dead() {
        puff.update();
        ticks += 1;
    }
    assert_eq!(ticks, SMOKE_LIFESPAN);
    assert_eq!(puff.fade(), 0.0);
    assert!((puff.size - size - SMOKE_LIFESPAN as f32 * SMOKE_GROWTH_PER_TICK).abs() < 1e-3);
}

#[test]
fn smoke_draws_newest_first_and_drops_expired() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut puffs = vec![
        SmokePuff::spawn(&mut rng, Vec2::new(10.0, 500.0)),
        SmokePuff::spawn(&mut rng, Vec2::new(200.0, 500.0)),
        SmokePuff::spawn(&mut rng, Vec2::new(400.0, 500.0)),
    ];
    puffs[1].age = SMOKE_LIFESPAN - 1;
    let mut surface = RecordingSurface::new(800.0, 600.0);

    let dropped = update_and_draw(&mut puffs, &mut surface, 0.0);
    assert_eq!(dropped, 1);
    assert_eq!(puffs.len(), 2);
    assert!(puffs[0].pos.x < 100.0 && puffs[1].pos.x > 300.0);

    let xs: Vec<f32> = surface.circles.iter().map(|(c, _, _)| c.x).collect();
    assert_eq!(xs.len(), 3);
    assert!(xs[0] > 300.0, "newest puff first");
    assert!(xs[1] > 100.0 && xs[1] < 300.0);
    assert!(xs[2] < 100.0, "oldest puff last, on top");
}

#[test]
fn smoke_cluster_jitter() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut puffs = Vec::new();
    let center = Vec2::new(200.0, 200.0);
    spawn_cluster(&mut puffs, &mut rng, center, SMOKE_PRESS_COUNT, SMOKE_PRESS_JITTER);
    assert_eq!(puffs.len(), 8);
    for puff in &puffs {
        assert!((puff.pos.x - center.x).abs() <= SMOKE_PRESS_JITTER);
        assert!((puff.pos.y - center.y).abs() <= SMOKE_PRESS_JITTER);
    }
    spawn_cluster(&mut puffs, &mut rng, center, 2, 0.0);
    assert_eq!(puffs[9].pos, center);
}

#[test]
fn cadences() {
    assert_eq!(smoke_cadence(0.3), 25);
    assert_eq!(smoke_cadence(1.0), 13);
    assert!(!smoke_due(40, 0.2), "growth at the gate spawns nothing");
    assert!(smoke_due(26, 1.0));
    assert!(!smoke_due(27, 1.0));

    assert_eq!(burst_cadence(0.0), 120);
    assert_eq!(burst_cadence(1.0), 30);
    assert!(burst_due(120, 0.0));
    assert!(!burst_due(60, 0.0));
}

#[test]
fn burst_draws_eight_rings() {
    let mut rng = StdRng::seed_from_u64(10);
    let params = ControlParams::ZERO.with(Param::Growth, 1.0);
    let burst = GlowBurst::roll(&mut rng, &params, BOUNDS, 90.0);
    assert_eq!(burst.size, BURST_SIZE_BASE + BURST_SIZE_SPAN);
    assert!(burst.hue >= 90.0 && burst.hue < 150.0);

    let mut surface = RecordingSurface::new(BOUNDS.x, BOUNDS.y);
    burst.draw(&mut surface, &params);
    assert_eq!(surface.circles.len(), BURST_RINGS);
    let (_, first, color) = surface.circles[0];
    let (_, last, last_color) = surface.circles[BURST_RINGS - 1];
    assert_eq!(first, burst.size);
    assert_eq!(last, burst.size + 7.0 * BURST_RING_STEP);
    assert_eq!(color.alpha, 12.0);
    assert!((last_color.alpha - 1.5).abs() < 1e-6);
}
