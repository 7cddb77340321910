// Host-side tests for tuning constants and their relationships.

use flow_core::constants::*;

#[test]
#[allow(clippy::assertions_on_constants)]
fn cadences_never_reach_zero() {
    // At growth 1 the divisors are 3 and 4.
    assert!(SMOKE_CADENCE_BASE / 3.0 >= 1.0);
    assert!(BURST_CADENCE_BASE / 4.0 >= 1.0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn lifespans_and_fades_fit() {
    assert!(PARTICLE_LIFESPAN_MIN < PARTICLE_LIFESPAN_MAX);
    // Fade-in and fade-out windows do not overlap for the shortest life.
    assert!(PARTICLE_FADE_IN_TICKS + PARTICLE_FADE_OUT_TICKS <= PARTICLE_LIFESPAN_MIN as f32);
    assert!(SMOKE_LIFESPAN > 0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn layered_alphas_stay_positive() {
    assert!(BLOB_LAYER_ALPHA - (BLOB_LAYERS - 1) as f32 * BLOB_LAYER_ALPHA_FALLOFF > 0.0);
    assert!(BURST_ALPHA_BASE - (BURST_RINGS - 1) as f32 * BURST_ALPHA_FALLOFF > 0.0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn scheduler_timing_bounds() {
    assert!(NOTE_GAP_MIN_MS > 0.0);
    assert!(NOTE_GAP_BASE_MS - NOTE_GAP_COMPLEXITY_MS < NOTE_GAP_MIN_MS);
    assert!(NOTE_LEN_BASE_SEC > POINTER_NOTE_SEC);
    assert!(POINTER_FREQ_TOP_HZ < POINTER_FREQ_BOTTOM_HZ);
    assert_eq!(FIRST_NOTE_DELAY_MS, DISABLED_POLL_MS);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn colour_phase_period_covers_half_rate_hues() {
    assert_eq!(COLOR_PHASE_PERIOD % 360.0, 0.0);
    assert!(COLOR_PHASE_PERIOD * 0.5 >= 360.0);
}
