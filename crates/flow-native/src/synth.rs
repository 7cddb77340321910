// ---------------- Native audio (cpal) ----------------
//
// Software mixer behind the engine's `AudioBackend`: per-note oscillators
// with ADSR envelopes summed per voice, a Schroeder reverb on the shared bus,
// and a cpal output stream owned by its own thread (streams are not `Send`
// on every host).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use flow_core::{db_to_gain, Adsr, AudioBackend, AudioError, ReverbSpec, VoiceKind, VoiceSpec, Waveform};
use std::f32::consts::{PI, TAU};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

const COMB_TUNINGS: [usize; 4] = [1116, 1188, 1277, 1356]; // samples at 44.1 kHz
const ALLPASS_TUNINGS: [usize; 2] = [556, 441];
const ALLPASS_FEEDBACK: f32 = 0.5;
const COMB_DAMP: f32 = 0.2;
const MASTER_GAIN: f32 = 1.5;

#[derive(Clone, Copy)]
enum WaveKind {
    Sine,
    Triangle,
}

fn render_wave_sample(phase: f32, wave: WaveKind) -> f32 {
    match wave {
        WaveKind::Sine => phase.sin(),
        WaveKind::Triangle => (2.0 / PI) * phase.sin().asin(),
    }
}

#[derive(Clone)]
enum Operator {
    Single { wave: WaveKind, phase: f32 },
    Fm {
        carrier_phase: f32,
        mod_phase: f32,
        harmonicity: f32,
        depth_hz: f32,
    },
}

#[derive(Clone)]
struct ActiveNote {
    voice: usize,
    operator: Operator,
    frequency_hz: f32,
    envelope: Adsr,
    hold_sec: f32,
    samples_emitted: u32,
    total_samples: u32,
}

impl ActiveNote {
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let t = self.samples_emitted as f32 / sample_rate;
        let level = self.envelope.level_at(t, self.hold_sec);
        let raw = match &mut self.operator {
            Operator::Single { wave, phase } => {
                let s = render_wave_sample(*phase, *wave);
                *phase = (*phase + TAU * self.frequency_hz / sample_rate) % TAU;
                s
            }
            Operator::Fm {
                carrier_phase,
                mod_phase,
                harmonicity,
                depth_hz,
            } => {
                let s = carrier_phase.sin();
                let deviation = mod_phase.sin() * *depth_hz;
                *mod_phase = (*mod_phase + TAU * self.frequency_hz * *harmonicity / sample_rate) % TAU;
                *carrier_phase =
                    (*carrier_phase + TAU * (self.frequency_hz + deviation) / sample_rate).rem_euclid(TAU);
                s
            }
        };
        self.samples_emitted += 1;
        raw * level
    }

    fn finished(&self) -> bool {
        self.samples_emitted >= self.total_samples
    }
}

struct Comb {
    buf: Vec<f32>,
    idx: usize,
    feedback: f32,
    store: f32,
}

impl Comb {
    fn process(&mut self, input: f32) -> f32 {
        let out = self.buf[self.idx];
        self.store = out * (1.0 - COMB_DAMP) + self.store * COMB_DAMP;
        self.buf[self.idx] = input + self.store * self.feedback;
        self.idx = (self.idx + 1) % self.buf.len();
        out
    }
}

struct Allpass {
    buf: Vec<f32>,
    idx: usize,
}

impl Allpass {
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buf[self.idx];
        let out = delayed - input;
        self.buf[self.idx] = input + delayed * ALLPASS_FEEDBACK;
        self.idx = (self.idx + 1) % self.buf.len();
        out
    }
}

struct Reverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    wet: f32,
    routed: bool,
}

impl Reverb {
    /// Comb feedback chosen so each line decays 60 dB over `decay_sec`.
    fn new(spec: &ReverbSpec, sample_rate: f32) -> Self {
        let scale = sample_rate / 44_100.0;
        let decay = spec.decay_sec.max(0.1);
        let combs = COMB_TUNINGS
            .iter()
            .map(|&n| {
                let len = ((n as f32 * scale) as usize).max(1);
                Comb {
                    buf: vec![0.0; len],
                    idx: 0,
                    feedback: 10f32.powf(-3.0 * len as f32 / (decay * sample_rate)),
                    store: 0.0,
                }
            })
            .collect();
        let allpasses = ALLPASS_TUNINGS
            .iter()
            .map(|&n| Allpass {
                buf: vec![0.0; ((n as f32 * scale) as usize).max(1)],
                idx: 0,
            })
            .collect();
        Self {
            combs,
            allpasses,
            wet: spec.wet.clamp(0.0, 1.0),
            routed: false,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let n = self.combs.len().max(1) as f32;
        let mut acc = 0.0;
        for comb in &mut self.combs {
            acc += comb.process(input);
        }
        let mut out = acc / n;
        for ap in &mut self.allpasses {
            out = ap.process(out);
        }
        input * (1.0 - self.wet) + out * self.wet
    }
}

struct VoiceSlot {
    spec: VoiceSpec,
    gain: f32,
    connected: bool,
}

/// Everything the audio callback reads; shared behind a mutex.
pub struct Mixer {
    sample_rate: f32,
    running: bool,
    voices: Vec<Option<VoiceSlot>>,
    notes: Vec<ActiveNote>,
    reverb: Option<Reverb>,
}

impl Mixer {
    fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            running: false,
            voices: Vec::new(),
            notes: Vec::new(),
            reverb: None,
        }
    }

    fn mix_sample(&mut self) -> f32 {
        let sr = self.sample_rate;
        let mut bus = 0.0f32;
        let mut i = 0usize;
        while i < self.notes.len() {
            let note = &mut self.notes[i];
            let gain = match self.voices.get(note.voice).and_then(Option::as_ref) {
                Some(slot) if slot.connected => slot.gain,
                _ => 0.0,
            };
            bus += note.next_sample(sr) * gain;
            if note.finished() {
                self.notes.swap_remove(i);
                continue;
            }
            i += 1;
        }
        let out = match &mut self.reverb {
            Some(reverb) if reverb.routed => reverb.process(bus),
            _ => 0.0,
        };
        if self.running {
            (out * MASTER_GAIN).tanh()
        } else {
            0.0
        }
    }

    fn fill<T>(&mut self, data: &mut [T], channels: usize, convert: impl Fn(f32) -> T)
    where
        T: Copy,
    {
        for frame in data.chunks_mut(channels.max(1)) {
            let v = convert(self.mix_sample());
            for s in frame.iter_mut() {
                *s = v;
            }
        }
    }
}

fn fill_locked<T: Copy>(mixer: &Mutex<Mixer>, data: &mut [T], channels: usize, silence: T, convert: impl Fn(f32) -> T) {
    match mixer.lock() {
        Ok(mut guard) => guard.fill(data, channels, convert),
        Err(_) => data.iter_mut().for_each(|s| *s = silence),
    }
}

fn build_stream(
    device: &cpal::Device,
    supported: cpal::SupportedStreamConfig,
    mixer: Arc<Mutex<Mixer>>,
) -> Result<cpal::Stream, AudioError> {
    let channels = supported.channels() as usize;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let err_fn = |err| log::error!("[audio] stream error: {err}");
    let stream = match format {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _| fill_locked(&mixer, data, channels, 0.0, |v| v),
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_output_stream(
            &config,
            move |data: &mut [i16], _| {
                fill_locked(&mixer, data, channels, 0, |v| (v * i16::MAX as f32) as i16)
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_output_stream(
            &config,
            move |data: &mut [u16], _| {
                fill_locked(&mixer, data, channels, u16::MAX / 2, |v| {
                    ((v * 0.5 + 0.5).clamp(0.0, 1.0) * u16::MAX as f32) as u16
                })
            },
            err_fn,
            None,
        ),
        other => {
            return Err(AudioError::Unavailable(format!(
                "unsupported sample format {other:?}"
            )))
        }
    };
    stream.map_err(|e| AudioError::Unavailable(e.to_string()))
}

/// Output thread: owns the cpal stream until told to stop.
struct OutputThread {
    stop: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

fn spawn_output(mixer: Arc<Mutex<Mixer>>) -> Result<OutputThread, AudioError> {
    let (ready_tx, ready_rx) = mpsc::channel::<Result<f32, AudioError>>();
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let handle = thread::Builder::new()
        .name("audio-output".into())
        .spawn(move || {
            let opened = (|| -> Result<(cpal::Stream, f32), AudioError> {
                let host = cpal::default_host();
                let device = host
                    .default_output_device()
                    .ok_or_else(|| AudioError::Unavailable("no output device".into()))?;
                let supported = device
                    .default_output_config()
                    .map_err(|e| AudioError::Unavailable(e.to_string()))?;
                let sample_rate = supported.sample_rate().0 as f32;
                if let Ok(mut guard) = mixer.lock() {
                    guard.sample_rate = sample_rate;
                }
                let stream = build_stream(&device, supported, Arc::clone(&mixer))?;
                stream
                    .play()
                    .map_err(|e| AudioError::Unavailable(e.to_string()))?;
                Ok((stream, sample_rate))
            })();
            match opened {
                Ok((stream, sample_rate)) => {
                    _ = ready_tx.send(Ok(sample_rate));
                    // Park until stop; a dropped sender also ends the wait.
                    _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    _ = ready_tx.send(Err(e));
                }
            }
        })
        .map_err(|e| AudioError::Unavailable(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(sample_rate)) => {
            log::info!("[audio] output stream sr={sample_rate}");
            Ok(OutputThread {
                stop: stop_tx,
                handle,
            })
        }
        Ok(Err(e)) => {
            _ = handle.join();
            Err(e)
        }
        Err(_) => Err(AudioError::Unavailable("output thread exited".into())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeVoice(usize);

#[derive(Debug)]
pub struct NativeReverb;

/// cpal implementation of the engine's output side.
pub struct NativeAudio {
    mixer: Arc<Mutex<Mixer>>,
    output: Option<OutputThread>,
}

impl Default for NativeAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeAudio {
    pub fn new() -> Self {
        Self {
            mixer: Arc::new(Mutex::new(Mixer::new(48_000.0))),
            output: None,
        }
    }

    fn with_mixer<T>(&self, f: impl FnOnce(&mut Mixer) -> Result<T, AudioError>) -> Result<T, AudioError> {
        let mut guard = self
            .mixer
            .lock()
            .map_err(|_| AudioError::Backend("mixer lock poisoned".into()))?;
        f(&mut guard)
    }
}

impl AudioBackend for NativeAudio {
    type Voice = NativeVoice;
    type Reverb = NativeReverb;

    fn start(&mut self) -> Result<(), AudioError> {
        if self.output.is_none() {
            self.output = Some(spawn_output(Arc::clone(&self.mixer))?);
        }
        Ok(())
    }

    fn create_voice(&mut self, spec: &VoiceSpec) -> Result<NativeVoice, AudioError> {
        self.with_mixer(|m| {
            m.voices.push(Some(VoiceSlot {
                spec: *spec,
                gain: db_to_gain(spec.volume_db),
                connected: false,
            }));
            Ok(NativeVoice(m.voices.len() - 1))
        })
    }

    fn create_reverb(&mut self, spec: &ReverbSpec) -> Result<NativeReverb, AudioError> {
        self.with_mixer(|m| {
            m.reverb = Some(Reverb::new(spec, m.sample_rate));
            Ok(NativeReverb)
        })
    }

    fn connect(&mut self, voice: &NativeVoice, _reverb: &NativeReverb) -> Result<(), AudioError> {
        self.with_mixer(|m| match m.voices.get_mut(voice.0).and_then(Option::as_mut) {
            Some(slot) => {
                slot.connected = true;
                Ok(())
            }
            None => Err(AudioError::AlreadyDisposed),
        })
    }

    fn to_output(&mut self, _reverb: &NativeReverb) -> Result<(), AudioError> {
        self.with_mixer(|m| match m.reverb.as_mut() {
            Some(r) => {
                r.routed = true;
                Ok(())
            }
            None => Err(AudioError::AlreadyDisposed),
        })
    }

    fn trigger(
        &mut self,
        voice: &NativeVoice,
        frequency_hz: f32,
        duration_sec: f32,
    ) -> Result<(), AudioError> {
        self.with_mixer(|m| {
            let spec = m
                .voices
                .get(voice.0)
                .and_then(Option::as_ref)
                .map(|slot| slot.spec)
                .ok_or(AudioError::AlreadyDisposed)?;
            let operator = match spec.kind {
                VoiceKind::Poly(Waveform::Sine) => Operator::Single {
                    wave: WaveKind::Sine,
                    phase: 0.0,
                },
                VoiceKind::Poly(Waveform::Triangle) => Operator::Single {
                    wave: WaveKind::Triangle,
                    phase: 0.0,
                },
                VoiceKind::Fm {
                    harmonicity,
                    modulation_index,
                } => Operator::Fm {
                    carrier_phase: 0.0,
                    mod_phase: 0.0,
                    harmonicity,
                    depth_hz: modulation_index * harmonicity * frequency_hz,
                },
            };
            let total = (spec.envelope.tail(duration_sec) * m.sample_rate) as u32;
            m.notes.push(ActiveNote {
                voice: voice.0,
                operator,
                frequency_hz,
                envelope: spec.envelope,
                hold_sec: duration_sec.max(0.0),
                samples_emitted: 0,
                total_samples: total.max(1),
            });
            Ok(())
        })
    }

    fn dispose_voice(&mut self, voice: NativeVoice) -> Result<(), AudioError> {
        self.with_mixer(|m| {
            let slot = m.voices.get_mut(voice.0).ok_or(AudioError::AlreadyDisposed)?;
            slot.take().map(|_| ()).ok_or(AudioError::AlreadyDisposed)?;
            m.notes.retain(|n| n.voice != voice.0);
            if m.voices.iter().all(Option::is_none) {
                m.voices.clear();
            }
            Ok(())
        })
    }

    fn dispose_reverb(&mut self, _reverb: NativeReverb) -> Result<(), AudioError> {
        self.with_mixer(|m| m.reverb.take().map(|_| ()).ok_or(AudioError::AlreadyDisposed))
    }

    fn transport_running(&self) -> bool {
        self.mixer.lock().map(|m| m.running).unwrap_or(false)
    }

    fn start_transport(&mut self) -> Result<(), AudioError> {
        self.with_mixer(|m| {
            m.running = true;
            Ok(())
        })
    }

    /// Silences the mixer and closes the output stream.
    fn stop_transport(&mut self) -> Result<(), AudioError> {
        self.with_mixer(|m| {
            m.running = false;
            m.notes.clear();
            Ok(())
        })?;
        let output = self.output.take().ok_or(AudioError::AlreadyDisposed)?;
        _ = output.stop.send(());
        output
            .handle
            .join()
            .map_err(|_| AudioError::Backend("output thread panicked".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{DEFAULT_REVERB, DEFAULT_VOICES};

    fn routed_mixer() -> Mixer {
        let mut m = Mixer::new(8_000.0);
        m.running = true;
        let mut reverb = Reverb::new(&DEFAULT_REVERB, m.sample_rate);
        reverb.routed = true;
        m.reverb = Some(reverb);
        m.voices.push(Some(VoiceSlot {
            spec: DEFAULT_VOICES[0],
            gain: 1.0,
            connected: true,
        }));
        m
    }

    fn note(hold_sec: f32, sample_rate: f32) -> ActiveNote {
        let envelope = Adsr {
            attack: 0.01,
            decay: 0.01,
            sustain: 0.5,
            release: 0.05,
        };
        ActiveNote {
            voice: 0,
            operator: Operator::Single {
                wave: WaveKind::Sine,
                phase: 0.0,
            },
            frequency_hz: 440.0,
            envelope,
            hold_sec,
            samples_emitted: 0,
            total_samples: (envelope.tail(hold_sec) * sample_rate) as u32,
        }
    }

    #[test]
    fn notes_expire_after_release() {
        let mut m = routed_mixer();
        m.notes.push(note(0.1, m.sample_rate));
        let total = m.notes[0].total_samples;
        let mut peak = 0.0f32;
        for _ in 0..total {
            peak = peak.max(m.mix_sample().abs());
        }
        assert!(m.notes.is_empty());
        assert!(peak > 0.0 && peak < 1.0);
    }

    #[test]
    fn stopped_mixer_is_silent() {
        let mut m = routed_mixer();
        m.running = false;
        m.notes.push(note(0.1, m.sample_rate));
        for _ in 0..200 {
            assert_eq!(m.mix_sample(), 0.0);
        }
    }

    #[test]
    fn unrouted_reverb_is_silent() {
        let mut m = routed_mixer();
        if let Some(r) = m.reverb.as_mut() {
            r.routed = false;
        }
        m.notes.push(note(0.1, m.sample_rate));
        for _ in 0..200 {
            assert_eq!(m.mix_sample(), 0.0);
        }
    }

    #[test]
    fn triangle_spans_unit_range() {
        let top = render_wave_sample(PI / 2.0, WaveKind::Triangle);
        let mid = render_wave_sample(PI, WaveKind::Triangle);
        assert!((top - 1.0).abs() < 1e-4);
        assert!(mid.abs() < 1e-4);
    }

    #[test]
    fn comb_feedback_tracks_decay() {
        let reverb = Reverb::new(&DEFAULT_REVERB, 44_100.0);
        for comb in &reverb.combs {
            assert!(comb.feedback > 0.9 && comb.feedback < 1.0);
        }
        assert_eq!(reverb.wet, 0.4);
    }
}
