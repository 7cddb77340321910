//! Bridges host input (pointer presses, the audio toggle, key edits) to the
//! sketch and the audio engine. Hosts map raw events to canvas pixels first.

use crate::audio::{AudioBackend, AudioEngine};
use crate::constants::{SMOKE_PRESS_COUNT, SMOKE_PRESS_JITTER};
use crate::music::NoteEvent;
use crate::params::{ControlParams, Param, SharedParams};
use crate::sketch::Sketch;
use glam::Vec2;
use rand::Rng;

/// Step applied by one Up/Down key press.
pub const PARAM_NUDGE: f32 = 0.05;

/// Rising-edge detector for `audio_enabled`; init is retried only when the
/// flag turns on, not on every frame it stays on.
#[derive(Clone, Copy, Debug, Default)]
pub struct AudioGate {
    last: bool,
}

impl AudioGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current flag; true exactly when it went from off to on.
    pub fn observe(&mut self, enabled: bool) -> bool {
        let rose = enabled && !self.last;
        self.last = enabled;
        rose
    }
}

/// What a pointer press did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PressOutcome {
    pub ready: bool,
    pub note: Option<NoteEvent>,
    pub puffs: usize,
}

/// Handle a pointer press at canvas pixel `at`.
///
/// Starts audio first if it is not running (the press is the user gesture
/// browsers require). The note and the smoke cluster only happen when audio is
/// enabled and the engine ended up ready.
pub fn pointer_press<B: AudioBackend, R: Rng>(
    sketch: &mut Sketch,
    engine: &mut AudioEngine<B>,
    params: &ControlParams,
    at: Vec2,
    rng: &mut R,
) -> PressOutcome {
    if !engine.is_ready() {
        if let Err(e) = engine.ensure_initialized() {
            log::warn!("[input] audio start on press failed: {e}");
        }
    }
    let mut outcome = PressOutcome {
        ready: engine.is_ready(),
        ..PressOutcome::default()
    };
    if !params.audio_enabled || !outcome.ready {
        return outcome;
    }
    outcome.note = engine.pointer_note(params, at.y, sketch.bounds().y);
    let before = sketch.smoke().len();
    sketch.spawn_smoke_at(rng, at, SMOKE_PRESS_COUNT, SMOKE_PRESS_JITTER);
    outcome.puffs = sketch.smoke().len() - before;
    log::debug!(
        "[input] press ({:.0},{:.0}) note={:?} puffs={}",
        at.x,
        at.y,
        outcome.note.as_ref().map(|n| n.name()),
        outcome.puffs
    );
    outcome
}

/// Keyboard surrogate for the slider UI: one selected parameter, nudged up or down.
#[derive(Clone, Copy, Debug)]
pub struct ParamCursor {
    selected: Param,
}

impl Default for ParamCursor {
    fn default() -> Self {
        Self {
            selected: Param::Complexity,
        }
    }
}

impl ParamCursor {
    pub fn selected(&self) -> Param {
        self.selected
    }

    /// Select by 1-based slot (keys `1`..`5`). Out-of-range slots are ignored.
    pub fn select_slot(&mut self, slot: usize) -> Option<Param> {
        let param = *Param::ALL.get(slot.checked_sub(1)?)?;
        self.selected = param;
        log::info!("[keys] editing {}", param.label());
        Some(param)
    }

    /// Nudge the selected parameter by `steps * PARAM_NUDGE`; returns the stored value.
    pub fn nudge(&self, params: &SharedParams, steps: f32) -> f32 {
        let value = params.adjust(self.selected, steps * PARAM_NUDGE);
        log::info!("[keys] {} = {:.2}", self.selected.label(), value);
        value
    }
}
