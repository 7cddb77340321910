pub mod audio;
pub mod blob;
pub mod burst;
pub mod constants;
pub mod field;
pub mod input;
pub mod music;
pub mod params;
pub mod particle;
pub mod population;
pub mod scheduler;
pub mod sketch;
pub mod smoke;
pub mod surface;

pub use audio::{
    Adsr, AudioBackend, AudioEngine, AudioError, EngineState, ReverbSpec, VoiceKind, VoiceSpec,
    Waveform, DEFAULT_REVERB, DEFAULT_VOICES,
};
pub use field::FlowField;
pub use input::{pointer_press, AudioGate, ParamCursor, PressOutcome};
pub use music::*;
pub use params::{ControlParams, Param, SharedParams};
pub use scheduler::{CancelToken, NoteScheduler, SchedulerStep};
pub use sketch::{FrameReport, Sketch};
pub use surface::{FlatNoise, Hsba, NoiseSource, PerlinNoise, Surface};
