//! Pitch helpers: frequency ↔ MIDI number and note naming.

use crate::types::Pitch;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Pitch class of C, the tonic row of the grid.
pub const NOTE_C: i32 = 0;
/// Pitch class of G, the fifth row of the grid.
pub const NOTE_G: i32 = 7;

/// Convert MIDI note number to frequency in Hz (A4 = 440 Hz).
pub fn pitch_to_hz(pitch: f64) -> f64 {
    440.0 * 2.0f64.powf((pitch - 69.0) / 12.0)
}

/// Nearest MIDI note number for a frequency.
pub fn freq_to_pitch(hz: f64) -> Pitch {
    (69.0 + 12.0 * (hz / 440.0).log2()).round() as Pitch
}

/// Pitch class 0..12, with C = 0.
pub fn note_class(pitch: Pitch) -> i32 {
    pitch.rem_euclid(12)
}

/// Whether the pitch is a C or a G: the rows the grid distinguishes.
pub fn is_tonic_or_fifth(pitch: Pitch) -> bool {
    matches!(note_class(pitch), NOTE_C | NOTE_G)
}

/// Scientific octave number (MIDI 60 = C4), used in log text.
pub fn octave(pitch: Pitch) -> i32 {
    pitch.div_euclid(12) - 1
}

/// Octave shown on the grid labels: whole twelves of the MIDI number,
/// so MIDI 48 is labeled C4 and MIDI 60 is labeled C5.
pub fn label_octave(pitch: Pitch) -> i32 {
    pitch.div_euclid(12)
}

/// Single letter of the note, ignoring accidentals.
pub fn note_letter(pitch: Pitch) -> char {
    NOTE_NAMES[note_class(pitch) as usize]
        .chars()
        .next()
        .unwrap_or('?')
}

/// Grid label octave as a single digit, `'?'` when it does not fit in one.
pub fn octave_digit(pitch: Pitch) -> char {
    u32::try_from(label_octave(pitch))
        .ok()
        .and_then(|o| char::from_digit(o, 10))
        .unwrap_or('?')
}

/// Full note name, e.g. `"F#3"`.
pub fn note_name(pitch: Pitch) -> String {
    format!("{}{}", NOTE_NAMES[note_class(pitch) as usize], octave(pitch))
}
