use crate::constants::*;
use crate::particle::random_point;
use crate::surface::{Hsba, Surface};
use glam::Vec2;
use rand::Rng;

/// Short-lived expanding puff. Unlike particles, puffs are removed when they expire.
#[derive(Clone, Debug)]
pub struct SmokePuff {
    pub pos: Vec2,
    pub vel: Vec2,
    pub alpha: f32,
    pub size: f32,
    pub age: u32,
    pub lifespan: u32,
}

impl SmokePuff {
    pub fn spawn<R: Rng>(rng: &mut R, at: Vec2) -> Self {
        Self {
            pos: at,
            vel: Vec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-1.0..-0.5)),
            alpha: SMOKE_BASE_ALPHA,
            size: rng.gen_range(20.0..60.0),
            age: 0,
            lifespan: SMOKE_LIFESPAN,
        }
    }

    pub fn update(&mut self) {
        self.pos += self.vel;
        self.vel *= SMOKE_DRAG;
        self.age += 1;
        self.size += SMOKE_GROWTH_PER_TICK;
    }

    #[inline]
    pub fn fade(&self) -> f32 {
        (1.0 - self.age as f32 / self.lifespan.max(1) as f32).clamp(0.0, 1.0)
    }

    pub fn show(&self, surface: &mut dyn Surface, color_phase: f32) {
        let hue = color_phase + self.pos.x * 0.1;
        let alpha = self.alpha * self.fade() * 0.3;
        surface.circle(self.pos, self.size.max(0.0), Hsba::new(hue, 30.0, 80.0, alpha));
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.age >= self.lifespan
    }
}

/// Update and draw every puff from newest to oldest, so older puffs paint
/// over newer ones, dropping those that expired. Returns how many were dropped.
pub fn update_and_draw(puffs: &mut Vec<SmokePuff>, surface: &mut dyn Surface, color_phase: f32) -> usize {
    let before = puffs.len();
    for i in (0..puffs.len()).rev() {
        let puff = &mut puffs[i];
        puff.update();
        puff.show(surface, color_phase);
        if puff.is_dead() {
            puffs.remove(i);
        }
    }
    before - puffs.len()
}

/// Ambient smoke cadence in ticks for a growth value (never 0).
#[inline]
pub fn smoke_cadence(growth: f32) -> u64 {
    ((SMOKE_CADENCE_BASE / (1.0 + growth * 2.0)).floor() as u64).max(1)
}

/// Whether an ambient smoke cluster spawns on `frame`.
#[inline]
pub fn smoke_due(frame: u64, growth: f32) -> bool {
    growth > SMOKE_GROWTH_GATE && frame % smoke_cadence(growth) == 0
}

/// Push `count` puffs jittered within `±jitter` of `center`.
pub fn spawn_cluster<R: Rng>(
    puffs: &mut Vec<SmokePuff>,
    rng: &mut R,
    center: Vec2,
    count: usize,
    jitter: f32,
) {
    let jitter = jitter.abs();
    for _ in 0..count {
        let offset = if jitter > 0.0 {
            Vec2::new(rng.gen_range(-jitter..jitter), rng.gen_range(-jitter..jitter))
        } else {
            Vec2::ZERO
        };
        puffs.push(SmokePuff::spawn(rng, center + offset));
    }
}

/// Spawn the ambient three-puff cluster at a random point on the surface.
pub fn spawn_ambient<R: Rng>(puffs: &mut Vec<SmokePuff>, rng: &mut R, bounds: Vec2) {
    let center = random_point(rng, bounds);
    spawn_cluster(puffs, rng, center, SMOKE_BURST_COUNT, SMOKE_BURST_JITTER);
}
