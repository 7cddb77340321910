//! Per-frame orchestration of every visual population.
//!
//! A [`Sketch`] owns the flow field and the three entity collections. Each
//! [`Sketch::tick`] takes a fresh parameter snapshot and runs, in order:
//! background fade, blob update/draw/converge, field recompute, particle
//! converge/update/draw, smoke update/draw/cull, ambient smoke spawn and glow
//! burst emission.

use crate::blob::LiquidBlob;
use crate::burst::{burst_due, GlowBurst};
use crate::constants::*;
use crate::field::FlowField;
use crate::params::ControlParams;
use crate::particle::Particle;
use crate::population::{blob_target, converge, particle_target};
use crate::smoke::{smoke_due, spawn_ambient, spawn_cluster, update_and_draw, SmokePuff};
use crate::surface::{NoiseSource, Surface};
use glam::Vec2;
use rand::Rng;

/// What happened during one tick; used for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub particles: usize,
    pub blobs: usize,
    pub smoke: usize,
    pub smoke_spawned: usize,
    pub smoke_culled: usize,
    pub burst: Option<Vec2>,
}

pub struct Sketch {
    bounds: Vec2,
    field: FlowField,
    particles: Vec<Particle>,
    blobs: Vec<LiquidBlob>,
    smoke: Vec<SmokePuff>,
    color_phase: f32,
    frame: u64,
}

impl Sketch {
    /// Seed populations at their initial targets for the given surface size.
    pub fn new<R: Rng>(width: f32, height: f32, params: &ControlParams, rng: &mut R) -> Self {
        let params = params.clamped();
        let bounds = Vec2::new(width.max(0.0), height.max(0.0));
        let particles = (0..particle_target(params.density))
            .map(|_| Particle::spawn(rng, bounds))
            .collect::<Vec<_>>();
        let blobs = (0..blob_target(params.growth))
            .map(|_| LiquidBlob::spawn(rng, bounds))
            .collect::<Vec<_>>();
        log::info!(
            "[sketch] {}x{} particles={} blobs={}",
            bounds.x,
            bounds.y,
            particles.len(),
            blobs.len()
        );
        Self {
            bounds,
            field: FlowField::new(bounds.x, bounds.y),
            particles,
            blobs,
            smoke: Vec::new(),
            color_phase: 0.0,
            frame: 0,
        }
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn field(&self) -> &FlowField {
        &self.field
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn blobs(&self) -> &[LiquidBlob] {
        &self.blobs
    }

    pub fn smoke(&self) -> &[SmokePuff] {
        &self.smoke
    }

    pub fn color_phase(&self) -> f32 {
        self.color_phase
    }

    /// Number of ticks run so far; the first tick is frame 1.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Track a new surface size and rebuild the field grid.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = Vec2::new(width.max(0.0), height.max(0.0));
        self.field.resize(self.bounds.x, self.bounds.y);
        log::info!(
            "[sketch] resize {}x{} -> grid {}x{}",
            self.bounds.x,
            self.bounds.y,
            self.field.cols(),
            self.field.rows()
        );
    }

    /// Spawn a puff cluster around a point (pointer presses).
    pub fn spawn_smoke_at<R: Rng>(&mut self, rng: &mut R, at: Vec2, count: usize, jitter: f32) {
        spawn_cluster(&mut self.smoke, rng, at, count, jitter);
    }

    pub fn tick<R: Rng>(
        &mut self,
        params: &ControlParams,
        surface: &mut dyn Surface,
        noise: &dyn NoiseSource,
        rng: &mut R,
    ) -> FrameReport {
        let params = params.clamped();
        let bounds = self.bounds;
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };

        surface.fade_background(FADE_ALPHA_BASE + params.flow * FADE_ALPHA_SPAN);

        for blob in &mut self.blobs {
            blob.update(rng, bounds);
            blob.show(surface, &params, noise, self.color_phase);
        }
        converge(&mut self.blobs, blob_target(params.growth), || {
            LiquidBlob::spawn(rng, bounds)
        });

        self.field.recompute(&params, noise);
        self.color_phase = (self.color_phase
            + COLOR_PHASE_BASE
            + params.color_shift * COLOR_PHASE_SPAN)
            .rem_euclid(COLOR_PHASE_PERIOD);

        converge(&mut self.particles, particle_target(params.density), || {
            Particle::spawn(rng, bounds)
        });
        for particle in &mut self.particles {
            particle.follow(&self.field);
            particle.update(&params, rng, bounds);
            particle.show(surface, &params, noise, self.color_phase, self.frame);
        }

        report.smoke_culled = update_and_draw(&mut self.smoke, surface, self.color_phase);

        if smoke_due(self.frame, params.growth) {
            let before = self.smoke.len();
            spawn_ambient(&mut self.smoke, rng, bounds);
            report.smoke_spawned = self.smoke.len() - before;
        }

        if burst_due(self.frame, params.growth) {
            let burst = GlowBurst::roll(rng, &params, bounds, self.color_phase);
            burst.draw(surface, &params);
            report.burst = Some(burst.center);
        }

        report.particles = self.particles.len();
        report.blobs = self.blobs.len();
        report.smoke = self.smoke.len();
        if self.frame % 600 == 0 {
            log::debug!(
                "[sketch] frame={} particles={} blobs={} smoke={}",
                report.frame,
                report.particles,
                report.blobs,
                report.smoke
            );
        }
        report
    }
}
