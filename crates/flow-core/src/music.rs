use crate::constants::*;
use rand::prelude::*;

/// One of the three pitch ranges the ambient loop draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterBand {
    Low,
    Mid,
    High,
}

/// Pentatonic pitch sets per band, as MIDI note numbers.
pub const LOW_BAND: &[i32] = &[36, 38, 40, 43, 45, 48]; // C2 D2 E2 G2 A2 C3
pub const MID_BAND: &[i32] = &[48, 50, 52, 55, 57, 60, 62]; // C3 D3 E3 G3 A3 C4 D4
pub const HIGH_BAND: &[i32] = &[64, 67, 69, 72, 74, 76]; // E4 G4 A4 C5 D5 E5

impl RegisterBand {
    /// Nested thresholds on a single roll in [0, 1): 30% low, 40% mid, 30% high.
    #[inline]
    pub fn from_roll(r: f32) -> Self {
        if r < 0.3 {
            RegisterBand::Low
        } else if r < 0.7 {
            RegisterBand::Mid
        } else {
            RegisterBand::High
        }
    }

    pub fn pick<R: Rng>(rng: &mut R) -> Self {
        Self::from_roll(rng.gen::<f32>())
    }

    pub fn notes(self) -> &'static [i32] {
        match self {
            RegisterBand::Low => LOW_BAND,
            RegisterBand::Mid => MID_BAND,
            RegisterBand::High => HIGH_BAND,
        }
    }
}

/// A note dispatched to one voice. Never stored; played and dropped.
///
/// Fields:
/// - `voice_index`: which voice plays it (index into the engine's voice set)
/// - `midi`: MIDI note number
/// - `frequency_hz`: pitch in Hertz (already converted from MIDI)
/// - `duration_sec`: time between attack and release
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NoteEvent {
    pub voice_index: usize,
    pub midi: i32,
    pub frequency_hz: f32,
    pub duration_sec: f32,
}

impl NoteEvent {
    pub fn new(voice_index: usize, midi: i32, duration_sec: f32) -> Self {
        Self {
            voice_index,
            midi,
            frequency_hz: midi_to_hz(midi as f32),
            duration_sec,
        }
    }

    pub fn name(&self) -> String {
        midi_to_note_name(self.midi)
    }
}

/// Voice index for a roll in [0, 1): uniform over `[0, 1 + growth * 2)`, clamped to the voice set.
#[inline]
pub fn voice_index_for(roll: f32, growth: f32, voice_count: usize) -> usize {
    let idx = (roll * (1.0 + growth * 2.0)).floor().max(0.0) as usize;
    idx.min(voice_count.saturating_sub(1))
}

/// Note length in seconds for a roll in [0, 1).
#[inline]
pub fn note_duration_sec(roll: f32, flow: f32) -> f32 {
    NOTE_LEN_BASE_SEC + roll * NOTE_LEN_SPREAD_SEC + flow * NOTE_LEN_FLOW_SEC
}

/// Gap before the next note in milliseconds for a roll in [0, 1).
#[inline]
pub fn next_delay_ms(roll: f32, complexity: f32) -> f32 {
    (NOTE_GAP_BASE_MS + roll * NOTE_GAP_SPREAD_MS - complexity * NOTE_GAP_COMPLEXITY_MS)
        .max(NOTE_GAP_MIN_MS)
}

/// Linear map of a vertical pointer position to [200, 800] Hz, top to bottom.
#[inline]
pub fn pointer_frequency(y: f32, height: f32) -> f32 {
    let t = if height > 0.0 { y / height } else { 0.5 };
    POINTER_FREQ_TOP_HZ + t * (POINTER_FREQ_BOTTOM_HZ - POINTER_FREQ_TOP_HZ)
}

/// The short note a pointer press plays on the first voice.
pub fn pointer_note(y: f32, height: f32) -> NoteEvent {
    let midi = nearest_midi(pointer_frequency(y, height));
    NoteEvent::new(0, midi, POINTER_NOTE_SEC)
}

/// Convert a MIDI note number to Hertz (A4=440 Hz).
///
/// Monotonic and exhibits octave symmetry: +12 semitones doubles the frequency.
pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * (2.0_f32).powf((midi - 69.0) / 12.0)
}

/// Inverse of [`midi_to_hz`]; fractional for pitches between semitones.
pub fn hz_to_midi(hz: f32) -> f32 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Nearest equal-tempered MIDI note for a frequency.
#[inline]
pub fn nearest_midi(hz: f32) -> i32 {
    if hz > 0.0 && hz.is_finite() {
        hz_to_midi(hz).round() as i32
    } else {
        69
    }
}

/// Scientific pitch name, e.g. 60 -> "C4", 70 -> "A#4".
pub fn midi_to_note_name(midi: i32) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", NAMES[midi.rem_euclid(12) as usize], octave)
}

/// Decibels to linear amplitude.
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
