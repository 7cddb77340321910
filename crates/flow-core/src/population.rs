use crate::constants::*;
use std::cmp::Ordering;

/// Outcome of one convergence step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convergence {
    Grew,
    Shrank,
    Settled,
}

/// Move a collection one element toward `target`: push one spawned element or
/// pop the newest one. Never overshoots.
pub fn converge<T>(items: &mut Vec<T>, target: usize, spawn: impl FnOnce() -> T) -> Convergence {
    match items.len().cmp(&target) {
        Ordering::Less => {
            items.push(spawn());
            Convergence::Grew
        }
        Ordering::Greater => {
            items.pop();
            Convergence::Shrank
        }
        Ordering::Equal => Convergence::Settled,
    }
}

/// Target particle count for a density value.
#[inline]
pub fn particle_target(density: f32) -> usize {
    (PARTICLE_BASE_COUNT + density * PARTICLE_DENSITY_SPAN).floor() as usize
}

/// Target blob count for a growth value.
#[inline]
pub fn blob_target(growth: f32) -> usize {
    BLOB_BASE_COUNT + (growth * BLOB_GROWTH_SPAN).floor() as usize
}
