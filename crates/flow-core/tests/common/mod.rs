// Shared fixtures for the flow-core integration tests: a surface that counts
// draw calls and an audio backend that records what the engine asked for.

#![allow(dead_code)]

use flow_core::{AudioBackend, AudioError, Hsba, ReverbSpec, Surface, VoiceSpec};
use glam::Vec2;

#[derive(Default)]
pub struct RecordingSurface {
    pub size: Vec2,
    pub fades: Vec<f32>,
    pub lines: usize,
    pub circles: Vec<(Vec2, f32, Hsba)>,
    pub polygons: usize,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        self.fades.clear();
        self.lines = 0;
        self.circles.clear();
        self.polygons = 0;
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fade_background(&mut self, alpha: f32) {
        self.fades.push(alpha);
    }

    fn line(&mut self, _from: Vec2, _to: Vec2, _stroke_width: f32, _color: Hsba) {
        self.lines += 1;
    }

    fn circle(&mut self, center: Vec2, diameter: f32, color: Hsba) {
        self.circles.push((center, diameter, color));
    }

    fn polygon(&mut self, _points: &[Vec2], _color: Hsba) {
        self.polygons += 1;
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub starts: usize,
    pub started: bool,
    pub voices_created: Vec<&'static str>,
    pub reverbs_created: usize,
    pub connections: usize,
    pub outputs: usize,
    pub triggers: Vec<(usize, f32, f32)>,
    pub disposed_voices: Vec<usize>,
    pub disposed_reverbs: usize,
    pub transport: bool,
    pub transport_starts: usize,
    pub transport_stops: usize,
    pub fail_start: bool,
    pub fail_voice_at: Option<usize>,
    pub fail_dispose: bool,
}

impl MockBackend {
    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }
}

impl AudioBackend for MockBackend {
    type Voice = usize;
    type Reverb = usize;

    fn start(&mut self) -> Result<(), AudioError> {
        self.starts += 1;
        if self.fail_start {
            return Err(AudioError::Unavailable("no output device".into()));
        }
        self.started = true;
        Ok(())
    }

    fn create_voice(&mut self, spec: &VoiceSpec) -> Result<usize, AudioError> {
        let id = self.voices_created.len();
        if self.fail_voice_at == Some(id) {
            return Err(AudioError::Backend(format!("voice {} refused", spec.name)));
        }
        self.voices_created.push(spec.name);
        Ok(id)
    }

    fn create_reverb(&mut self, _spec: &ReverbSpec) -> Result<usize, AudioError> {
        self.reverbs_created += 1;
        Ok(self.reverbs_created)
    }

    fn connect(&mut self, _voice: &usize, _reverb: &usize) -> Result<(), AudioError> {
        self.connections += 1;
        Ok(())
    }

    fn to_output(&mut self, _reverb: &usize) -> Result<(), AudioError> {
        self.outputs += 1;
        Ok(())
    }

    fn trigger(&mut self, voice: &usize, frequency_hz: f32, duration_sec: f32) -> Result<(), AudioError> {
        self.triggers.push((*voice, frequency_hz, duration_sec));
        Ok(())
    }

    fn dispose_voice(&mut self, voice: usize) -> Result<(), AudioError> {
        if self.fail_dispose {
            return Err(AudioError::AlreadyDisposed);
        }
        self.disposed_voices.push(voice);
        Ok(())
    }

    fn dispose_reverb(&mut self, _reverb: usize) -> Result<(), AudioError> {
        if self.fail_dispose {
            return Err(AudioError::AlreadyDisposed);
        }
        self.disposed_reverbs += 1;
        Ok(())
    }

    fn transport_running(&self) -> bool {
        self.transport
    }

    fn start_transport(&mut self) -> Result<(), AudioError> {
        self.transport = true;
        self.transport_starts += 1;
        Ok(())
    }

    fn stop_transport(&mut self) -> Result<(), AudioError> {
        if self.fail_dispose {
            return Err(AudioError::NotInitialized);
        }
        // Like a closed context: nothing left to stop.
        if !self.started {
            return Err(AudioError::AlreadyDisposed);
        }
        self.started = false;
        self.transport = false;
        self.transport_stops += 1;
        Ok(())
    }
}
