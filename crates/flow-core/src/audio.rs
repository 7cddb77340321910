//! Audio engine lifecycle, independent of any output backend.
//!
//! The engine owns a fixed voice set routed through one reverb to the output.
//! It moves `Uninitialized -> Initializing -> Ready` and back to
//! `Uninitialized` on failure or disposal. Backends (WebAudio, cpal, test
//! mocks) implement [`AudioBackend`]; everything else lives here so both
//! frontends behave the same.

use crate::music::{pointer_note, NoteEvent};
use crate::params::ControlParams;
use crate::scheduler::{CancelToken, NoteScheduler, SchedulerStep};
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("audio backend error: {0}")]
    Backend(String),
    #[error("resource already disposed")]
    AlreadyDisposed,
    #[error("audio engine not initialized")]
    NotInitialized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

/// Oscillator topology for a voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VoiceKind {
    /// Plain polyphonic oscillator.
    Poly(Waveform),
    /// Two-operator FM: a sine modulator at `harmonicity * f` with depth
    /// `modulation_index * harmonicity * f` driving a sine carrier.
    Fm {
        harmonicity: f32,
        modulation_index: f32,
    },
}

/// Amplitude envelope in seconds (sustain is a level in [0, 1]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    /// Envelope level `t` seconds after the attack for a note held `hold` seconds.
    pub fn level_at(&self, t: f32, hold: f32) -> f32 {
        if t < 0.0 {
            return 0.0;
        }
        let held = |t: f32| -> f32 {
            if t < self.attack {
                if self.attack > 0.0 {
                    t / self.attack
                } else {
                    1.0
                }
            } else if t < self.attack + self.decay {
                let k = (t - self.attack) / self.decay.max(f32::EPSILON);
                1.0 + (self.sustain - 1.0) * k
            } else {
                self.sustain
            }
        };
        if t < hold {
            held(t)
        } else {
            let start = held(hold);
            let k = (t - hold) / self.release.max(f32::EPSILON);
            (start * (1.0 - k)).max(0.0)
        }
    }

    /// Piecewise-linear `(seconds, level)` points tracing [`level_at`](Self::level_at)
    /// for a note held `hold` seconds. Hosts schedule these as gain ramps.
    pub fn breakpoints(&self, hold: f32) -> [(f32, f32); 5] {
        let hold = hold.max(0.0);
        let attack_end = self.attack.min(hold);
        let decay_end = (self.attack + self.decay).min(hold);
        let held = |t: f32| self.level_at(t, f32::INFINITY);
        [
            (0.0, 0.0),
            (attack_end, held(attack_end)),
            (decay_end, held(decay_end)),
            (hold, held(hold)),
            (self.tail(hold), 0.0),
        ]
    }

    /// Seconds until a note held `hold` seconds is fully silent.
    #[inline]
    pub fn tail(&self, hold: f32) -> f32 {
        hold.max(0.0) + self.release
    }
}

/// Configuration for one synth voice.
///
/// Fields:
/// - `name`: short label for logs
/// - `kind`: oscillator topology
/// - `envelope`: amplitude ADSR
/// - `volume_db`: output level in decibels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSpec {
    pub name: &'static str,
    pub kind: VoiceKind,
    pub envelope: Adsr,
    pub volume_db: f32,
}

/// Shared reverb: `decay_sec` tail length, `wet` mix in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbSpec {
    pub decay_sec: f32,
    pub wet: f32,
}

pub const DEFAULT_VOICES: [VoiceSpec; 3] = [
    VoiceSpec {
        name: "pad",
        kind: VoiceKind::Poly(Waveform::Sine),
        envelope: Adsr {
            attack: 3.0,
            decay: 2.0,
            sustain: 0.5,
            release: 5.0,
        },
        volume_db: -25.0,
    },
    VoiceSpec {
        name: "drift",
        kind: VoiceKind::Poly(Waveform::Triangle),
        envelope: Adsr {
            attack: 4.0,
            decay: 3.0,
            sustain: 0.4,
            release: 6.0,
        },
        volume_db: -28.0,
    },
    VoiceSpec {
        name: "bell",
        kind: VoiceKind::Fm {
            harmonicity: 3.0,
            modulation_index: 10.0,
        },
        envelope: Adsr {
            attack: 2.0,
            decay: 1.5,
            sustain: 0.3,
            release: 4.0,
        },
        volume_db: -30.0,
    },
];

pub const DEFAULT_REVERB: ReverbSpec = ReverbSpec {
    decay_sec: 8.0,
    wet: 0.4,
};

/// Output-side operations the engine needs. Handles are opaque to the engine.
pub trait AudioBackend {
    type Voice;
    type Reverb;

    /// Acquire or resume the output device. Called at the start of every init attempt.
    fn start(&mut self) -> Result<(), AudioError>;
    fn create_voice(&mut self, spec: &VoiceSpec) -> Result<Self::Voice, AudioError>;
    fn create_reverb(&mut self, spec: &ReverbSpec) -> Result<Self::Reverb, AudioError>;
    fn connect(&mut self, voice: &Self::Voice, reverb: &Self::Reverb) -> Result<(), AudioError>;
    fn to_output(&mut self, reverb: &Self::Reverb) -> Result<(), AudioError>;
    /// Attack now, release after `duration_sec`.
    fn trigger(
        &mut self,
        voice: &Self::Voice,
        frequency_hz: f32,
        duration_sec: f32,
    ) -> Result<(), AudioError>;
    fn dispose_voice(&mut self, voice: Self::Voice) -> Result<(), AudioError>;
    fn dispose_reverb(&mut self, reverb: Self::Reverb) -> Result<(), AudioError>;
    fn transport_running(&self) -> bool;
    fn start_transport(&mut self) -> Result<(), AudioError>;
    fn stop_transport(&mut self) -> Result<(), AudioError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
}

struct Graph<B: AudioBackend> {
    voices: Vec<B::Voice>,
    reverb: B::Reverb,
}

pub struct AudioEngine<B: AudioBackend> {
    backend: B,
    voice_specs: Vec<VoiceSpec>,
    reverb_spec: ReverbSpec,
    state: EngineState,
    graph: Option<Graph<B>>,
    scheduler: NoteScheduler,
    loop_token: Option<CancelToken>,
    closed: bool,
}

impl<B: AudioBackend> AudioEngine<B> {
    pub fn new(backend: B) -> Self {
        Self::with_specs(backend, DEFAULT_VOICES.to_vec(), DEFAULT_REVERB)
    }

    pub fn with_specs(backend: B, voice_specs: Vec<VoiceSpec>, reverb_spec: ReverbSpec) -> Self {
        Self {
            backend,
            voice_specs,
            reverb_spec,
            state: EngineState::Uninitialized,
            graph: None,
            scheduler: NoteScheduler::new(),
            loop_token: None,
            closed: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn voice_count(&self) -> usize {
        self.graph.as_ref().map_or(0, |g| g.voices.len())
    }

    pub fn scheduler(&self) -> &NoteScheduler {
        &self.scheduler
    }

    /// Claim the init slot. Returns false if another init is in flight or the
    /// engine is already ready or closed; callers that get false must not build anything.
    pub fn begin_init(&mut self) -> bool {
        if self.closed || self.state != EngineState::Uninitialized {
            return false;
        }
        self.state = EngineState::Initializing;
        true
    }

    /// Build the voice graph after a successful [`begin_init`](Self::begin_init).
    ///
    /// On any failure the partial graph is released, the state returns to
    /// `Uninitialized` so a later gesture can retry, and the error is returned.
    pub fn finish_init(&mut self) -> Result<(), AudioError> {
        if self.state != EngineState::Initializing {
            return Ok(());
        }
        match self.build_graph() {
            Ok(graph) => {
                self.graph = Some(graph);
                if !self.backend.transport_running() {
                    if let Err(e) = self.backend.start_transport() {
                        log::warn!("[audio] transport start failed: {e}");
                    }
                }
                self.state = EngineState::Ready;
                log::info!("[audio] initialized: {} voices + reverb", self.voice_count());
                Ok(())
            }
            Err(e) => {
                self.state = EngineState::Uninitialized;
                log::warn!("[audio] init failed: {e}");
                Err(e)
            }
        }
    }

    /// Initialize if nobody else is. Returns whether the engine is ready afterwards.
    pub fn ensure_initialized(&mut self) -> Result<bool, AudioError> {
        if self.is_ready() {
            return Ok(true);
        }
        if !self.begin_init() {
            return Ok(false);
        }
        self.finish_init()?;
        Ok(self.is_ready())
    }

    fn build_graph(&mut self) -> Result<Graph<B>, AudioError> {
        self.backend.start()?;
        let reverb = self.backend.create_reverb(&self.reverb_spec)?;
        let mut voices = Vec::with_capacity(self.voice_specs.len());
        let mut failure = None;
        for spec in &self.voice_specs {
            let voice = match self.backend.create_voice(spec) {
                Ok(v) => v,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            let wired = self.backend.connect(&voice, &reverb);
            voices.push(voice);
            if let Err(e) = wired {
                failure = Some(e);
                break;
            }
        }
        if failure.is_none() {
            if let Err(e) = self.backend.to_output(&reverb) {
                failure = Some(e);
            }
        }
        match failure {
            None => Ok(Graph { voices, reverb }),
            Some(e) => {
                self.release(Graph { voices, reverb });
                Err(e)
            }
        }
    }

    /// Hand out the loop's cancel token once per ready period. Later calls
    /// return None so exactly one loop runs.
    pub fn start_loop(&mut self) -> Option<CancelToken> {
        if !self.is_ready() || self.loop_token.is_some() {
            return None;
        }
        let token = CancelToken::new();
        self.loop_token = Some(token.clone());
        log::info!("[audio] ambient loop started");
        Some(token)
    }

    pub fn loop_running(&self) -> bool {
        self.loop_token.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// One ambient loop iteration: pick a note, play it, return the gap.
    pub fn scheduler_step<R: Rng>(&mut self, params: &ControlParams, rng: &mut R) -> SchedulerStep {
        let voices = if self.is_ready() { self.voice_count() } else { 0 };
        let step = self.scheduler.step(params, rng, voices);
        if let Some(note) = &step.note {
            self.play(note);
        }
        step
    }

    /// Play one note. Returns false if the engine is not ready or the voice is unknown.
    pub fn play(&mut self, note: &NoteEvent) -> bool {
        let Some(graph) = self.graph.as_ref() else {
            return false;
        };
        let Some(voice) = graph.voices.get(note.voice_index) else {
            return false;
        };
        match self
            .backend
            .trigger(voice, note.frequency_hz, note.duration_sec)
        {
            Ok(()) => {
                log::trace!(
                    "[audio] note voice={} {} {:.1}s",
                    note.voice_index,
                    note.name(),
                    note.duration_sec
                );
                true
            }
            Err(e) => {
                log::warn!("[audio] trigger failed: {e}");
                false
            }
        }
    }

    /// Pointer-triggered note on the first voice, if audio is on and ready.
    pub fn pointer_note(&mut self, params: &ControlParams, y: f32, height: f32) -> Option<NoteEvent> {
        if !params.audio_enabled || !self.is_ready() {
            return None;
        }
        let note = pointer_note(y, height);
        self.play(&note).then_some(note)
    }

    /// Stop the loop and release every audio resource. Safe to call in any
    /// state and more than once; per-resource failures are logged and skipped.
    pub fn dispose(&mut self) {
        if let Some(token) = self.loop_token.take() {
            token.cancel();
        }
        if let Some(graph) = self.graph.take() {
            self.release(graph);
        }
        // A failed init can leave the backend started with the transport idle.
        if let Err(e) = self.backend.stop_transport() {
            log::debug!("[audio] transport stop skipped: {e}");
        }
        if self.state != EngineState::Uninitialized {
            log::info!("[audio] disposed");
        }
        self.state = EngineState::Uninitialized;
    }

    /// Dispose for good: later init attempts are refused, so no input path
    /// can bring audio or the ambient loop back.
    pub fn close(&mut self) {
        self.dispose();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn release(&mut self, graph: Graph<B>) {
        for voice in graph.voices {
            if let Err(e) = self.backend.dispose_voice(voice) {
                log::debug!("[audio] voice dispose skipped: {e}");
            }
        }
        if let Err(e) = self.backend.dispose_reverb(graph.reverb) {
            log::debug!("[audio] reverb dispose skipped: {e}");
        }
    }
}

