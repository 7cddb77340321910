use flow_core::{db_to_gain, AudioBackend, AudioError, ReverbSpec, VoiceKind, VoiceSpec, Waveform};
use wasm_bindgen::JsValue;
use web_sys as web;

const START_LEAD_SEC: f64 = 0.005; // schedule slightly ahead of currentTime
const STOP_PAD_SEC: f64 = 0.05;

fn js_err(e: JsValue) -> AudioError {
    AudioError::Backend(format!("{:?}", e))
}

fn create_gain(ctx: &web::AudioContext, value: f32) -> Result<web::GainNode, AudioError> {
    let g = web::GainNode::new(ctx).map_err(js_err)?;
    g.gain().set_value(value);
    Ok(g)
}

/// A voice is its output gain; each note builds fresh oscillators into it,
/// so polyphony is unbounded and released notes clean themselves up.
pub struct WebVoice {
    spec: VoiceSpec,
    out: web::GainNode,
}

/// input -> dry -> destination, input -> convolver -> wet -> destination
pub struct WebReverb {
    input: web::GainNode,
    convolver: web::ConvolverNode,
    dry: web::GainNode,
    wet: web::GainNode,
}

/// WebAudio implementation of the engine's output side.
#[derive(Default)]
pub struct WebAudio {
    ctx: Option<web::AudioContext>,
    transport: bool,
}

impl WebAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a suspended context; call from user gestures.
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == web::AudioContextState::Suspended {
                _ = ctx.resume();
            }
        }
    }

    fn ctx(&self) -> Result<&web::AudioContext, AudioError> {
        self.ctx.as_ref().ok_or(AudioError::NotInitialized)
    }

    fn oscillator(
        ctx: &web::AudioContext,
        kind: web::OscillatorType,
        frequency_hz: f32,
    ) -> Result<web::OscillatorNode, AudioError> {
        let osc = web::OscillatorNode::new(ctx).map_err(js_err)?;
        osc.set_type(kind);
        osc.frequency().set_value(frequency_hz);
        Ok(osc)
    }
}

/// Long stereo noise tail decaying by 60 dB over `decay_sec`.
fn build_impulse_response(
    ctx: &web::AudioContext,
    decay_sec: f32,
) -> Result<web::AudioBuffer, AudioError> {
    let sr = ctx.sample_rate();
    let seconds = decay_sec.max(0.1);
    let len = (sr * seconds) as u32;
    let ir = ctx.create_buffer(2, len, sr).map_err(js_err)?;
    let k = 1000.0_f32.ln() / seconds;
    // simple xorshift32 for deterministic noise
    let mut seeds: [u32; 2] = [0x1234ABCD, 0x7890FEDC];
    for (ch, seed) in seeds.iter_mut().enumerate() {
        let mut buf: Vec<f32> = Vec::with_capacity(len as usize);
        for i in 0..len {
            let mut x = *seed;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            *seed = x;
            let n = (x as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let t = i as f32 / sr;
            buf.push(n * (-k * t).exp());
        }
        ir.copy_to_channel(&mut buf, ch as i32).map_err(js_err)?;
    }
    Ok(ir)
}

impl AudioBackend for WebAudio {
    type Voice = WebVoice;
    type Reverb = WebReverb;

    fn start(&mut self) -> Result<(), AudioError> {
        if self.ctx.is_none() {
            let ctx = web::AudioContext::new()
                .map_err(|e| AudioError::Unavailable(format!("{:?}", e)))?;
            log::info!("[audio] context created sr={}", ctx.sample_rate());
            self.ctx = Some(ctx);
        }
        self.resume();
        Ok(())
    }

    fn create_voice(&mut self, spec: &VoiceSpec) -> Result<WebVoice, AudioError> {
        let out = create_gain(self.ctx()?, db_to_gain(spec.volume_db))?;
        Ok(WebVoice { spec: *spec, out })
    }

    fn create_reverb(&mut self, spec: &ReverbSpec) -> Result<WebReverb, AudioError> {
        let ctx = self.ctx()?;
        let convolver = web::ConvolverNode::new(ctx).map_err(js_err)?;
        convolver.set_normalize(true);
        convolver.set_buffer(Some(&build_impulse_response(ctx, spec.decay_sec)?));
        let wet_mix = spec.wet.clamp(0.0, 1.0);
        let input = create_gain(ctx, 1.0)?;
        let dry = create_gain(ctx, 1.0 - wet_mix)?;
        let wet = create_gain(ctx, wet_mix)?;
        input.connect_with_audio_node(&dry).map_err(js_err)?;
        input.connect_with_audio_node(&convolver).map_err(js_err)?;
        convolver.connect_with_audio_node(&wet).map_err(js_err)?;
        Ok(WebReverb {
            input,
            convolver,
            dry,
            wet,
        })
    }

    fn connect(&mut self, voice: &WebVoice, reverb: &WebReverb) -> Result<(), AudioError> {
        voice
            .out
            .connect_with_audio_node(&reverb.input)
            .map(|_| ())
            .map_err(js_err)
    }

    fn to_output(&mut self, reverb: &WebReverb) -> Result<(), AudioError> {
        let dst = self.ctx()?.destination();
        reverb.dry.connect_with_audio_node(&dst).map_err(js_err)?;
        reverb.wet.connect_with_audio_node(&dst).map_err(js_err)?;
        Ok(())
    }

    fn trigger(
        &mut self,
        voice: &WebVoice,
        frequency_hz: f32,
        duration_sec: f32,
    ) -> Result<(), AudioError> {
        let ctx = self.ctx()?;
        let t0 = ctx.current_time() + START_LEAD_SEC;
        let env = create_gain(ctx, 0.0)?;
        let gain = env.gain();
        for (t, level) in voice.spec.envelope.breakpoints(duration_sec) {
            if t <= 0.0 {
                _ = gain.set_value_at_time(level, t0);
            } else {
                _ = gain.linear_ramp_to_value_at_time(level, t0 + t as f64);
            }
        }
        let stop_at = t0 + voice.spec.envelope.tail(duration_sec) as f64 + STOP_PAD_SEC;

        let carrier = match voice.spec.kind {
            VoiceKind::Poly(waveform) => {
                let kind = match waveform {
                    Waveform::Sine => web::OscillatorType::Sine,
                    Waveform::Triangle => web::OscillatorType::Triangle,
                };
                Self::oscillator(ctx, kind, frequency_hz)?
            }
            VoiceKind::Fm {
                harmonicity,
                modulation_index,
            } => {
                let carrier = Self::oscillator(ctx, web::OscillatorType::Sine, frequency_hz)?;
                let modulator =
                    Self::oscillator(ctx, web::OscillatorType::Sine, frequency_hz * harmonicity)?;
                let depth = create_gain(ctx, modulation_index * harmonicity * frequency_hz)?;
                modulator.connect_with_audio_node(&depth).map_err(js_err)?;
                depth
                    .connect_with_audio_param(&carrier.frequency())
                    .map_err(js_err)?;
                modulator.start_with_when(t0).map_err(js_err)?;
                modulator.stop_with_when(stop_at).map_err(js_err)?;
                carrier
            }
        };
        carrier.connect_with_audio_node(&env).map_err(js_err)?;
        env.connect_with_audio_node(&voice.out).map_err(js_err)?;
        carrier.start_with_when(t0).map_err(js_err)?;
        carrier.stop_with_when(stop_at).map_err(js_err)?;
        Ok(())
    }

    fn dispose_voice(&mut self, voice: WebVoice) -> Result<(), AudioError> {
        voice.out.disconnect().map_err(js_err)
    }

    fn dispose_reverb(&mut self, reverb: WebReverb) -> Result<(), AudioError> {
        reverb.input.disconnect().map_err(js_err)?;
        reverb.convolver.disconnect().map_err(js_err)?;
        reverb.dry.disconnect().map_err(js_err)?;
        reverb.wet.disconnect().map_err(js_err)
    }

    fn transport_running(&self) -> bool {
        self.transport
    }

    fn start_transport(&mut self) -> Result<(), AudioError> {
        self.ctx()?;
        self.transport = true;
        Ok(())
    }

    /// Closes the context; the next init creates a fresh one.
    fn stop_transport(&mut self) -> Result<(), AudioError> {
        self.transport = false;
        let ctx = self.ctx.take().ok_or(AudioError::AlreadyDisposed)?;
        ctx.close().map(|_| ()).map_err(js_err)
    }
}
