mod canvas;
mod gpu;
mod synth;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use canvas::ShapeBatch;
use flow_core::{
    pointer_press, AudioEngine, AudioGate, CancelToken, ControlParams, NoteScheduler,
    ParamCursor, PerlinNoise, SharedParams, Sketch,
};
use glam::Vec2;
use gpu::GpuState;
use rand::prelude::*;
use synth::NativeAudio;

const SLEEP_SLICE: Duration = Duration::from_millis(50); // cancel latency of the ambient thread

type SharedEngine = Arc<Mutex<AudioEngine<NativeAudio>>>;

/// Sleep `total`, waking every slice to honour cancellation. False if cancelled.
fn sleep_unless_cancelled(total: Duration, token: &CancelToken) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if token.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

/// Ambient note loop on its own thread; each iteration reads fresh params.
fn spawn_ambient(engine: SharedEngine, params: Arc<SharedParams>, token: CancelToken) {
    let spawned = thread::Builder::new()
        .name("ambient".into())
        .spawn(move || {
            let mut rng = StdRng::from_entropy();
            let mut delay = NoteScheduler::first_delay();
            while sleep_unless_cancelled(delay, &token) {
                let snapshot = params.snapshot();
                let Ok(mut engine) = engine.lock() else {
                    break;
                };
                delay = engine.scheduler_step(&snapshot, &mut rng).delay;
            }
            log::info!("[audio] ambient loop stopped");
        });
    if let Err(e) = spawned {
        log::error!("[audio] ambient thread spawn failed: {e}");
    }
}

struct App {
    sketch: Sketch,
    batch: ShapeBatch,
    noise: PerlinNoise,
    rng: StdRng,
    params: Arc<SharedParams>,
    engine: SharedEngine,
    gate: AudioGate,
    cursor: ParamCursor,
    pointer: Vec2,
}

impl App {
    fn new(width: u32, height: u32, params: Arc<SharedParams>) -> Self {
        let mut rng = StdRng::from_entropy();
        let snapshot = params.snapshot();
        let sketch = Sketch::new(width as f32, height as f32, &snapshot, &mut rng);
        let noise = PerlinNoise::new(rng.gen());
        Self {
            sketch,
            batch: ShapeBatch::new(width, height),
            noise,
            rng,
            params,
            engine: Arc::new(Mutex::new(AudioEngine::new(NativeAudio::new()))),
            gate: AudioGate::new(),
            cursor: ParamCursor::default(),
            pointer: Vec2::ZERO,
        }
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut AudioEngine<NativeAudio>) -> T) -> Option<T> {
        match self.engine.lock() {
            Ok(mut engine) => Some(f(&mut engine)),
            Err(_) => {
                log::error!("[audio] engine lock poisoned");
                None
            }
        }
    }

    fn start_ambient_if_ready(&self) {
        if let Some(Some(token)) = self.with_engine(|e| e.start_loop()) {
            spawn_ambient(Arc::clone(&self.engine), Arc::clone(&self.params), token);
        }
    }

    fn enable_audio(&self) {
        match self.with_engine(|e| e.ensure_initialized()) {
            Some(Ok(true)) => self.start_ambient_if_ready(),
            Some(Err(e)) => log::warn!("[audio] enable failed, click to retry: {e}"),
            _ => {}
        }
    }

    fn press(&mut self) {
        let snapshot = self.params.snapshot();
        let outcome = {
            let Ok(mut engine) = self.engine.lock() else {
                return;
            };
            pointer_press(
                &mut self.sketch,
                &mut engine,
                &snapshot,
                self.pointer,
                &mut self.rng,
            )
        };
        if outcome.ready {
            self.start_ambient_if_ready();
        }
    }

    fn key(&mut self, key: &Key) {
        match key {
            Key::Character(c) if c.eq_ignore_ascii_case("m") => {
                let on = self.params.toggle_audio();
                log::info!("[keys] audio {}", if on { "on" } else { "off" });
            }
            Key::Character(c) => {
                if let Ok(slot) = c.parse::<usize>() {
                    self.cursor.select_slot(slot);
                }
            }
            Key::Named(NamedKey::ArrowUp) => {
                self.cursor.nudge(&self.params, 1.0);
            }
            Key::Named(NamedKey::ArrowDown) => {
                self.cursor.nudge(&self.params, -1.0);
            }
            _ => {}
        }
    }

    fn frame(&mut self, width: u32, height: u32) {
        let snapshot = self.params.snapshot();
        if self.gate.observe(snapshot.audio_enabled) {
            self.enable_audio();
        }
        self.batch.begin(width, height);
        self.sketch
            .tick(&snapshot, &mut self.batch, &self.noise, &mut self.rng);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.sketch.resize(width as f32, height as f32);
        }
    }

    fn shutdown(&self) {
        self.with_engine(|e| e.close());
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Flow Field")
        .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 800.0))
        .build(&event_loop)?;

    let mut state = pollster::block_on(GpuState::new(&window))?;
    let (width, height) = state.size();
    let mut app = App::new(width, height, SharedParams::shared(ControlParams::default()));
    log::info!("[app] keys: 1-5 select param, Up/Down adjust, M toggles audio, click plays");

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                app.shutdown();
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                state.resize(size);
                app.resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                app.pointer = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => app.press(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => app.key(&logical_key),
            _ => {}
        },
        Event::AboutToWait => {
            let (width, height) = state.size();
            app.frame(width, height);
            match state.render(app.batch.vertices()) {
                Ok(_) => state.window().request_redraw(),
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    app.shutdown();
                    elwt.exit();
                }
                Err(e) => log::debug!("[gpu] frame skipped: {e:?}"),
            }
        }
        _ => {}
    })?;
    Ok(())
}
