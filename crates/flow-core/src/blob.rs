use crate::constants::*;
use crate::params::ControlParams;
use crate::particle::random_point;
use crate::surface::{Hsba, NoiseSource, Surface};
use glam::Vec2;
use rand::Rng;
use smallvec::SmallVec;
use std::f32::consts::TAU;

/// Outline buffer; a full turn at `BLOB_ANGLE_STEP` is 63 vertices.
pub type Outline = SmallVec<[Vec2; 64]>;

/// Slow-drifting organic shape whose outline is perturbed by noise.
#[derive(Clone, Debug)]
pub struct LiquidBlob {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub phase: f64,
    pub hue: f32,
}

impl LiquidBlob {
    pub fn spawn<R: Rng>(rng: &mut R, bounds: Vec2) -> Self {
        Self {
            pos: random_point(rng, bounds),
            vel: Vec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5)),
            size: rng.gen_range(100.0..300.0),
            phase: rng.gen_range(0.0..1000.0),
            hue: rng.gen_range(0.0..360.0),
        }
    }

    /// Drift with a damped random walk, wrapping past a margin outside the surface.
    pub fn update<R: Rng>(&mut self, rng: &mut R, bounds: Vec2) {
        self.pos += self.vel;
        self.vel += Vec2::new(
            rng.gen_range(-BLOB_JITTER..BLOB_JITTER),
            rng.gen_range(-BLOB_JITTER..BLOB_JITTER),
        );
        self.vel *= BLOB_DAMPING;
        self.phase += BLOB_PHASE_STEP;

        self.pos.x = wrap_margin(self.pos.x, bounds.x);
        self.pos.y = wrap_margin(self.pos.y, bounds.y);
    }

    /// Closed outline around the centre, shifted diagonally by `offset`.
    pub fn outline(&self, noise: &dyn NoiseSource, offset: f32) -> Outline {
        let mut points = Outline::new();
        let mut a = 0.0_f32;
        while a < TAU {
            let (sin, cos) = a.sin_cos();
            let r = self.size
                + noise.sample(
                    cos as f64 * BLOB_NOISE_RADIUS + self.phase,
                    sin as f64 * BLOB_NOISE_RADIUS + self.phase,
                    self.phase,
                ) * BLOB_NOISE_AMPLITUDE;
            points.push(self.pos + Vec2::new(cos, sin) * r + Vec2::splat(offset));
            a += BLOB_ANGLE_STEP;
        }
        points
    }

    /// Three stacked translucent copies fake a soft glowing edge.
    pub fn show(
        &self,
        surface: &mut dyn Surface,
        params: &ControlParams,
        noise: &dyn NoiseSource,
        color_phase: f32,
    ) {
        let hue = self.hue + color_phase * 0.5;
        let saturation = 50.0 + params.color_shift * 30.0;
        for i in 0..BLOB_LAYERS {
            let offset = i as f32 * BLOB_LAYER_OFFSET;
            let alpha = BLOB_LAYER_ALPHA - i as f32 * BLOB_LAYER_ALPHA_FALLOFF;
            let outline = self.outline(noise, offset);
            surface.polygon(&outline, Hsba::new(hue, saturation, 60.0, alpha));
        }
    }
}

/// Jump to the opposite side once a coordinate leaves `[-margin, extent + margin]`.
#[inline]
pub fn wrap_margin(v: f32, extent: f32) -> f32 {
    if v > extent + BLOB_MARGIN {
        -BLOB_MARGIN
    } else if v < -BLOB_MARGIN {
        extent + BLOB_MARGIN
    } else {
        v
    }
}
