use crate::constants::*;
use crate::params::ControlParams;
use crate::particle::random_point;
use crate::surface::{Hsba, Surface};
use glam::Vec2;
use rand::Rng;

/// Burst cadence in ticks for a growth value (never 0).
#[inline]
pub fn burst_cadence(growth: f32) -> u64 {
    ((BURST_CADENCE_BASE / (1.0 + growth * 3.0)).floor() as u64).max(1)
}

#[inline]
pub fn burst_due(frame: u64, growth: f32) -> bool {
    frame % burst_cadence(growth) == 0
}

/// A one-shot set of concentric rings. Drawn immediately, never stored.
#[derive(Clone, Copy, Debug)]
pub struct GlowBurst {
    pub center: Vec2,
    pub size: f32,
    pub hue: f32,
}

impl GlowBurst {
    pub fn roll<R: Rng>(rng: &mut R, params: &ControlParams, bounds: Vec2, color_phase: f32) -> Self {
        Self {
            center: random_point(rng, bounds),
            size: BURST_SIZE_BASE + params.growth * BURST_SIZE_SPAN,
            hue: color_phase + rng.gen_range(0.0..BURST_HUE_SPREAD),
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface, params: &ControlParams) {
        let saturation = 60.0 + params.color_shift * 30.0;
        for i in 0..BURST_RINGS {
            let alpha = BURST_ALPHA_BASE - i as f32 * BURST_ALPHA_FALLOFF;
            let diameter = self.size + i as f32 * BURST_RING_STEP;
            surface.circle(self.center, diameter, Hsba::new(self.hue, saturation, 80.0, alpha));
        }
    }
}
