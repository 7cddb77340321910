// Shared simulation/audio tuning constants used by both web and native frontends.
//
// Tick-based quantities assume a ~60 Hz frame loop; nothing here is scaled by
// wall-clock time.

// Flow field
pub const FIELD_SCALE: f32 = 20.0; // pixels per grid cell
pub const FIELD_NOISE_STEP: f64 = 0.08; // noise-space distance between neighbouring cells
pub const FIELD_ROTATIONS: f32 = 3.0; // full turns mapped across the noise range
pub const FIELD_MAG_BASE: f32 = 0.2;
pub const FIELD_MAG_SPAN: f32 = 0.8;
pub const FIELD_ZOFF_STEP: f64 = 0.002; // per-tick time advance at flow = 0

// Colour phase
pub const COLOR_PHASE_BASE: f32 = 0.15; // degrees per tick
pub const COLOR_PHASE_SPAN: f32 = 0.4;
pub const COLOR_PHASE_PERIOD: f32 = 720.0; // blobs rotate at half rate, so wrap at two turns

// Background fade (0..255 alpha)
pub const FADE_ALPHA_BASE: f32 = 3.0;
pub const FADE_ALPHA_SPAN: f32 = 8.0;

// Particles
pub const PARTICLE_BASE_COUNT: f32 = 300.0;
pub const PARTICLE_DENSITY_SPAN: f32 = 1200.0;
pub const PARTICLE_FADE_IN_TICKS: f32 = 50.0;
pub const PARTICLE_FADE_OUT_TICKS: f32 = 100.0;
pub const PARTICLE_MAX_TRAIL: f32 = 20.0; // longer segments are treated as teleports
pub const PARTICLE_LIFESPAN_MIN: u32 = 300;
pub const PARTICLE_LIFESPAN_MAX: u32 = 700;

// Liquid blobs
pub const BLOB_BASE_COUNT: usize = 3;
pub const BLOB_GROWTH_SPAN: f32 = 4.0;
pub const BLOB_MARGIN: f32 = 100.0; // wrap boundary outside the canvas
pub const BLOB_DAMPING: f32 = 0.98;
pub const BLOB_JITTER: f32 = 0.05;
pub const BLOB_PHASE_STEP: f64 = 0.02;
pub const BLOB_ANGLE_STEP: f32 = 0.1; // radians between outline vertices
pub const BLOB_NOISE_RADIUS: f64 = 2.0; // radius of the noise-space circle per outline
pub const BLOB_NOISE_AMPLITUDE: f32 = 50.0;
pub const BLOB_LAYERS: usize = 3;
pub const BLOB_LAYER_OFFSET: f32 = 20.0;
pub const BLOB_LAYER_ALPHA: f32 = 8.0;
pub const BLOB_LAYER_ALPHA_FALLOFF: f32 = 2.0;

// Smoke puffs
pub const SMOKE_LIFESPAN: u32 = 200;
pub const SMOKE_DRAG: f32 = 0.98;
pub const SMOKE_GROWTH_PER_TICK: f32 = 0.5;
pub const SMOKE_BASE_ALPHA: f32 = 120.0;
pub const SMOKE_CADENCE_BASE: f32 = 40.0;
pub const SMOKE_GROWTH_GATE: f32 = 0.2; // no ambient smoke at or below this growth
pub const SMOKE_BURST_COUNT: usize = 3;
pub const SMOKE_BURST_JITTER: f32 = 20.0;
pub const SMOKE_PRESS_COUNT: usize = 8;
pub const SMOKE_PRESS_JITTER: f32 = 30.0;

// Glow bursts
pub const BURST_CADENCE_BASE: f32 = 120.0;
pub const BURST_RINGS: usize = 8;
pub const BURST_RING_STEP: f32 = 30.0;
pub const BURST_SIZE_BASE: f32 = 80.0;
pub const BURST_SIZE_SPAN: f32 = 250.0;
pub const BURST_HUE_SPREAD: f32 = 60.0;
pub const BURST_ALPHA_BASE: f32 = 12.0;
pub const BURST_ALPHA_FALLOFF: f32 = 1.5;

// Note scheduler (milliseconds unless stated)
pub const FIRST_NOTE_DELAY_MS: u64 = 1000;
pub const DISABLED_POLL_MS: u64 = 1000;
pub const NOTE_GAP_BASE_MS: f32 = 1000.0;
pub const NOTE_GAP_SPREAD_MS: f32 = 3000.0;
pub const NOTE_GAP_COMPLEXITY_MS: f32 = 1000.0;
pub const NOTE_GAP_MIN_MS: f32 = 500.0;
pub const NOTE_LEN_BASE_SEC: f32 = 2.0;
pub const NOTE_LEN_SPREAD_SEC: f32 = 4.0;
pub const NOTE_LEN_FLOW_SEC: f32 = 3.0;

// Pointer notes
pub const POINTER_FREQ_TOP_HZ: f32 = 200.0;
pub const POINTER_FREQ_BOTTOM_HZ: f32 = 800.0;
pub const POINTER_NOTE_SEC: f32 = 2.0 / 3.0; // triplet half at 120 bpm
