// Host-side tests for the audio engine lifecycle, driven through a recording
// mock backend.

use flow_core::input::pointer_press;
use flow_core::{
    midi_to_hz, nearest_midi, AudioEngine, AudioError, ControlParams, EngineState, Sketch,
    DEFAULT_REVERB, DEFAULT_VOICES,
};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

mod common;
use common::MockBackend;

fn enabled() -> ControlParams {
    ControlParams {
        audio_enabled: true,
        ..ControlParams::default()
    }
}

#[test]
fn default_voice_profiles() {
    assert_eq!(DEFAULT_VOICES.len(), 3);
    assert_eq!(DEFAULT_VOICES[0].volume_db, -25.0);
    assert_eq!(DEFAULT_VOICES[1].volume_db, -28.0);
    assert_eq!(DEFAULT_VOICES[2].volume_db, -30.0);
    assert_eq!(DEFAULT_VOICES[0].envelope.attack, 3.0);
    assert_eq!(DEFAULT_VOICES[1].envelope.release, 6.0);
    assert_eq!(DEFAULT_REVERB.decay_sec, 8.0);
    assert_eq!(DEFAULT_REVERB.wet, 0.4);
}

#[test]
fn envelope_shape() {
    let env = DEFAULT_VOICES[0].envelope;
    assert_eq!(env.level_at(-1.0, 10.0), 0.0);
    assert!((env.level_at(1.5, 10.0) - 0.5).abs() < 1e-6);
    assert!((env.level_at(3.0, 10.0) - 1.0).abs() < 1e-6);
    assert!((env.level_at(4.0, 10.0) - 0.75).abs() < 1e-6);
    assert!((env.level_at(8.0, 10.0) - 0.5).abs() < 1e-6);
    // Release from sustain over five seconds.
    assert!((env.level_at(12.5, 10.0) - 0.25).abs() < 1e-6);
    assert_eq!(env.level_at(15.0, 10.0), 0.0);
    assert_eq!(env.tail(10.0), 15.0);
}

#[test]
fn envelope_breakpoints_for_short_notes() {
    let env = DEFAULT_VOICES[0].envelope;
    let points = env.breakpoints(2.0);
    // Released mid-attack: the decay stage never starts.
    assert_eq!(points[0], (0.0, 0.0));
    assert_eq!(points[1].0, 2.0);
    assert!((points[1].1 - 2.0 / 3.0).abs() < 1e-6);
    assert_eq!(points[3].0, 2.0);
    assert_eq!(points[4], (7.0, 0.0));

    let long = env.breakpoints(10.0);
    assert_eq!(long[1], (3.0, 1.0));
    assert_eq!(long[2], (5.0, 0.5));
    assert_eq!(long[3], (10.0, 0.5));
}

#[test]
fn init_builds_graph_once() {
    let mut engine = AudioEngine::new(MockBackend::default());
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert_eq!(engine.ensure_initialized(), Ok(true));
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.voice_count(), 3);

    assert_eq!(engine.ensure_initialized(), Ok(true));
    let backend = engine.backend();
    assert_eq!(backend.starts, 1);
    assert_eq!(backend.voices_created, vec!["pad", "drift", "bell"]);
    assert_eq!(backend.reverbs_created, 1);
    assert_eq!(backend.connections, 3);
    assert_eq!(backend.outputs, 1);
    assert_eq!(backend.transport_starts, 1);
}

#[test]
fn concurrent_init_is_refused() {
    let mut engine = AudioEngine::new(MockBackend::default());
    assert!(engine.begin_init());
    assert_eq!(engine.state(), EngineState::Initializing);
    assert!(!engine.begin_init());
    assert_eq!(engine.ensure_initialized(), Ok(false));
    assert!(engine.backend().voices_created.is_empty());

    engine.finish_init().unwrap();
    assert!(engine.is_ready());
    assert_eq!(engine.backend().voices_created.len(), 3);
}

#[test]
fn running_transport_is_not_restarted() {
    let backend = MockBackend {
        transport: true,
        ..MockBackend::default()
    };
    let mut engine = AudioEngine::new(backend);
    engine.ensure_initialized().unwrap();
    assert_eq!(engine.backend().transport_starts, 0);
}

#[test]
fn failed_init_resets_and_can_retry() {
    let mut engine = AudioEngine::new(MockBackend::failing_start());
    let err = engine.ensure_initialized().unwrap_err();
    assert!(matches!(err, AudioError::Unavailable(_)));
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert_eq!(engine.voice_count(), 0);

    engine.backend_mut().fail_start = false;
    assert_eq!(engine.ensure_initialized(), Ok(true));
    assert_eq!(engine.backend().starts, 2);
}

#[test]
fn partial_graph_is_released_on_failure() {
    let backend = MockBackend {
        fail_voice_at: Some(1),
        ..MockBackend::default()
    };
    let mut engine = AudioEngine::new(backend);
    assert!(matches!(engine.ensure_initialized(), Err(AudioError::Backend(_))));
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert_eq!(engine.backend().disposed_voices, vec![0]);
    assert_eq!(engine.backend().disposed_reverbs, 1);
}

#[test]
fn dispose_is_tolerant() {
    let mut engine = AudioEngine::new(MockBackend::default());
    engine.dispose();
    assert_eq!(engine.state(), EngineState::Uninitialized);

    engine.ensure_initialized().unwrap();
    engine.dispose();
    engine.dispose();
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert_eq!(engine.backend().disposed_voices, vec![0, 1, 2]);
    assert_eq!(engine.backend().disposed_reverbs, 1);
    assert_eq!(engine.backend().transport_stops, 1);
}

#[test]
fn dispose_swallows_backend_errors() {
    let mut engine = AudioEngine::new(MockBackend::default());
    engine.ensure_initialized().unwrap();
    let token = engine.start_loop().unwrap();
    engine.backend_mut().fail_dispose = true;
    engine.dispose();
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(token.is_cancelled());
    assert_eq!(engine.voice_count(), 0);
}

#[test]
fn loop_starts_once_per_ready_period() {
    let mut engine = AudioEngine::new(MockBackend::default());
    assert!(engine.start_loop().is_none(), "not ready yet");
    engine.ensure_initialized().unwrap();
    let token = engine.start_loop().expect("first start");
    assert!(engine.start_loop().is_none());
    assert!(engine.loop_running());

    engine.dispose();
    assert!(token.is_cancelled());
    assert!(!engine.loop_running());

    engine.ensure_initialized().unwrap();
    assert!(engine.start_loop().is_some());
}

#[test]
fn scheduler_step_plays_notes_only_when_enabled() {
    let mut engine = AudioEngine::new(MockBackend::default());
    engine.ensure_initialized().unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let step = engine.scheduler_step(&ControlParams::default(), &mut rng);
    assert!(step.note.is_none());
    assert_eq!(step.delay, Duration::from_millis(1000));
    assert!(engine.backend().triggers.is_empty());

    for _ in 0..20 {
        engine.scheduler_step(&enabled(), &mut rng);
    }
    let triggers = &engine.backend().triggers;
    assert_eq!(triggers.len(), 20);
    assert!(triggers.iter().all(|(voice, hz, secs)| *voice < 3 && *hz > 60.0 && *secs >= 2.0));
}

#[test]
fn scheduler_step_before_init_is_silent() {
    let mut engine = AudioEngine::new(MockBackend::default());
    let mut rng = StdRng::seed_from_u64(6);
    let step = engine.scheduler_step(&enabled(), &mut rng);
    assert!(step.note.is_none());
    assert_eq!(step.delay, Duration::from_millis(1000));
}

#[test]
fn pointer_press_initializes_then_plays() {
    let mut rng = StdRng::seed_from_u64(7);
    let params = enabled();
    let mut sketch = Sketch::new(800.0, 600.0, &ControlParams::ZERO, &mut rng);
    let mut engine = AudioEngine::new(MockBackend::default());

    let outcome = pointer_press(&mut sketch, &mut engine, &params, Vec2::new(400.0, 300.0), &mut rng);
    assert!(outcome.ready);
    assert_eq!(outcome.puffs, 8);
    assert_eq!(sketch.smoke().len(), 8);
    let note = outcome.note.expect("note on press");
    assert_eq!(note.midi, nearest_midi(500.0));

    let (voice, hz, secs) = engine.backend().triggers[0];
    assert_eq!(voice, 0);
    assert!((hz - midi_to_hz(note.midi as f32)).abs() < 1e-3);
    assert!((secs - 2.0 / 3.0).abs() < 1e-6);
}

#[test]
fn pointer_press_with_audio_off_only_initializes() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut sketch = Sketch::new(800.0, 600.0, &ControlParams::ZERO, &mut rng);
    let mut engine = AudioEngine::new(MockBackend::default());

    let outcome = pointer_press(
        &mut sketch,
        &mut engine,
        &ControlParams::default(),
        Vec2::new(10.0, 10.0),
        &mut rng,
    );
    assert!(outcome.ready);
    assert!(outcome.note.is_none());
    assert_eq!(outcome.puffs, 0);
    assert!(sketch.smoke().is_empty());
}

#[test]
fn pointer_press_with_broken_audio_does_nothing() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut sketch = Sketch::new(800.0, 600.0, &ControlParams::ZERO, &mut rng);
    let mut engine = AudioEngine::new(MockBackend::failing_start());

    let outcome = pointer_press(&mut sketch, &mut engine, &enabled(), Vec2::new(10.0, 10.0), &mut rng);
    assert!(!outcome.ready);
    assert_eq!(outcome.puffs, 0);
    assert_eq!(engine.state(), EngineState::Uninitialized);
}

#[test]
fn dispose_stops_a_backend_left_started_by_failed_init() {
    let backend = MockBackend {
        fail_voice_at: Some(1),
        ..MockBackend::default()
    };
    let mut engine = AudioEngine::new(backend);
    assert!(engine.ensure_initialized().is_err());
    assert!(engine.backend().started);
    assert!(!engine.backend().transport);

    engine.dispose();
    assert!(!engine.backend().started);
    assert_eq!(engine.backend().transport_stops, 1);
}

#[test]
fn closed_engine_stays_silent() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut sketch = Sketch::new(800.0, 600.0, &ControlParams::ZERO, &mut rng);
    let mut engine = AudioEngine::new(MockBackend::default());
    engine.ensure_initialized().unwrap();
    let token = engine.start_loop().unwrap();

    engine.close();
    assert!(token.is_cancelled());
    assert!(engine.is_closed());
    assert_eq!(engine.backend().transport_stops, 1);

    let outcome = pointer_press(&mut sketch, &mut engine, &enabled(), Vec2::new(400.0, 300.0), &mut rng);
    assert!(!outcome.ready);
    assert!(outcome.note.is_none());
    assert_eq!(outcome.puffs, 0);
    assert_eq!(engine.ensure_initialized(), Ok(false));
    assert!(engine.start_loop().is_none());
    assert_eq!(engine.backend().starts, 1);
    assert_eq!(engine.state(), EngineState::Uninitialized);
}
