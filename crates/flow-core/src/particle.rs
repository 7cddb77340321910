use crate::constants::*;
use crate::field::FlowField;
use crate::params::ControlParams;
use crate::surface::{Hsba, NoiseSource, Surface};
use glam::Vec2;
use rand::Rng;

/// Flow-following trail particle. Recycled in place when its lifespan runs out.
///
/// Fields:
/// - `pos` / `prev_pos`: current and previous-frame positions (the trail segment)
/// - `vel`, `acc`: velocity and the per-tick force accumulator
/// - `max_speed`: base speed cap, scaled by `flow` at update time
/// - `alpha`, `size`, `hue_offset`: fixed per-particle look
/// - `lifespan`, `age`: ticks lived before teleporting
#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub acc: Vec2,
    pub max_speed: f32,
    pub alpha: f32,
    pub size: f32,
    pub hue_offset: f32,
    pub lifespan: u32,
    pub age: u32,
}

impl Particle {
    pub fn spawn<R: Rng>(rng: &mut R, bounds: Vec2) -> Self {
        let pos = random_point(rng, bounds);
        Self {
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            max_speed: 1.5 + rng.gen_range(0.0..0.5),
            alpha: rng.gen_range(30.0..150.0),
            size: rng.gen_range(0.5..2.5),
            hue_offset: rng.gen_range(0.0..360.0),
            lifespan: rng.gen_range(PARTICLE_LIFESPAN_MIN..PARTICLE_LIFESPAN_MAX),
            age: 0,
        }
    }

    /// Add the field force under the particle; cells outside the grid contribute nothing.
    #[inline]
    pub fn follow(&mut self, field: &FlowField) {
        if let Some(force) = field.lookup(self.pos) {
            self.apply_force(force);
        }
    }

    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.acc += force;
    }

    /// Integrate one tick, recycle on expiry and wrap toroidally into `[0, w) x [0, h)`.
    pub fn update<R: Rng>(&mut self, params: &ControlParams, rng: &mut R, bounds: Vec2) {
        self.vel += self.acc;
        self.vel = self.vel.clamp_length_max(self.max_speed * (0.5 + params.flow));
        self.pos += self.vel;
        self.acc = Vec2::ZERO;
        self.age += 1;

        if self.age > self.lifespan {
            self.pos = random_point(rng, bounds);
            self.prev_pos = self.pos;
            self.age = 0;
        }

        self.pos.x = wrap_coord(self.pos.x, bounds.x);
        self.pos.y = wrap_coord(self.pos.y, bounds.y);
    }

    /// Fade-in over the first ticks of life, fade-out over the last ones.
    #[inline]
    pub fn fade(&self) -> f32 {
        let age = self.age as f32;
        let fade_in = (age / PARTICLE_FADE_IN_TICKS).min(1.0);
        let fade_out = 1.0
            - ((age - self.lifespan as f32 + PARTICLE_FADE_OUT_TICKS) / PARTICLE_FADE_OUT_TICKS)
                .max(0.0);
        (fade_in * fade_out).clamp(0.0, 1.0)
    }

    pub fn color(
        &self,
        params: &ControlParams,
        noise: &dyn NoiseSource,
        color_phase: f32,
        frame: u64,
    ) -> Hsba {
        let hue = color_phase + self.hue_offset + self.pos.x * 0.08 + self.pos.y * 0.04;
        let saturation = 40.0 + params.color_shift * 60.0;
        let brightness = 70.0
            + noise.sample(
                self.pos.x as f64 * 0.01,
                self.pos.y as f64 * 0.01,
                frame as f64 * 0.01,
            ) * 30.0;
        Hsba::new(hue, saturation, brightness, self.alpha * self.fade())
    }

    /// Draw the trail segment (skipped after a jump) and remember the position.
    pub fn show(
        &mut self,
        surface: &mut dyn Surface,
        params: &ControlParams,
        noise: &dyn NoiseSource,
        color_phase: f32,
        frame: u64,
    ) {
        if self.pos.distance(self.prev_pos) < PARTICLE_MAX_TRAIL {
            let color = self.color(params, noise, color_phase, frame);
            surface.line(self.prev_pos, self.pos, self.size, color);
        }
        self.prev_pos = self.pos;
    }
}

/// Wrap a coordinate into `[0, extent)`; a degenerate extent pins it to 0.
#[inline]
pub fn wrap_coord(v: f32, extent: f32) -> f32 {
    if !extent.is_finite() || extent <= 0.0 || !v.is_finite() {
        return 0.0;
    }
    let w = v.rem_euclid(extent);
    if w >= extent {
        0.0
    } else {
        w
    }
}

#[inline]
pub(crate) fn random_point<R: Rng>(rng: &mut R, bounds: Vec2) -> Vec2 {
    Vec2::new(random_upto(rng, bounds.x), random_upto(rng, bounds.y))
}

/// Uniform in `[0, max)`, or 0 for an empty range.
#[inline]
pub(crate) fn random_upto<R: Rng>(rng: &mut R, max: f32) -> f32 {
    if max.is_finite() && max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}
