//! The ambient note loop.
//!
//! The loop is a self-rescheduling task: each iteration decides whether to
//! emit a note and how long to wait before the next iteration. Hosts drive it
//! (a `setTimeout` future on the web, a sleeping thread on native) and stop it
//! through a [`CancelToken`] checked before every reschedule.

use crate::constants::*;
use crate::music::{next_delay_ms, note_duration_sec, voice_index_for, NoteEvent, RegisterBand};
use crate::params::ControlParams;
use rand::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared stop flag for the ambient loop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one loop iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerStep {
    pub note: Option<NoteEvent>,
    pub band: Option<RegisterBand>,
    pub delay: Duration,
}

/// Stochastic note picker. Holds only counters; all musical state comes from
/// the parameter snapshot passed to [`NoteScheduler::step`].
#[derive(Clone, Debug, Default)]
pub struct NoteScheduler {
    iterations: u64,
    notes_emitted: u64,
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before the first iteration after the loop starts.
    pub fn first_delay() -> Duration {
        Duration::from_millis(FIRST_NOTE_DELAY_MS)
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn notes_emitted(&self) -> u64 {
        self.notes_emitted
    }

    /// Run one iteration. With audio disabled, or no voices, nothing is emitted
    /// and the loop polls again after a fixed second.
    pub fn step<R: Rng>(
        &mut self,
        params: &ControlParams,
        rng: &mut R,
        voice_count: usize,
    ) -> SchedulerStep {
        self.iterations += 1;
        if !params.audio_enabled || voice_count == 0 {
            return SchedulerStep {
                note: None,
                band: None,
                delay: Duration::from_millis(DISABLED_POLL_MS),
            };
        }

        let band = RegisterBand::pick(rng);
        let midi = *band.notes().choose(rng).unwrap_or(&60);
        let voice_index = voice_index_for(rng.gen::<f32>(), params.growth, voice_count);
        let duration = note_duration_sec(rng.gen::<f32>(), params.flow);
        let delay_ms = next_delay_ms(rng.gen::<f32>(), params.complexity);
        self.notes_emitted += 1;

        SchedulerStep {
            note: Some(NoteEvent::new(voice_index, midi, duration)),
            band: Some(band),
            delay: Duration::from_secs_f32(delay_ms / 1000.0),
        }
    }
}
