//! # Musical Tuning Module
//!
//! Pure conversions between frequency, semitone number, note name and spectral bin
//! position, based on equal temperament with A4 = 440 Hz.
//!
//! ## Features
//! - Frequency <-> semitone conversions (semitone 69 = A4)
//! - Note names with octave numbers ("C4", "A#3", "B-1")
//! - Semitone to continuous FFT bin position
//! - Note name parsing for user input, sharps and flats accepted

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Reference pitch for A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

/// Semitone number of the reference A4.
pub const A4_SEMITONE: i32 = 69;

/// Note names in pitch-class order, starting from C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lookup table from a spelled pitch class (upper case) to its offset from C.
///
/// Built once on first use. Covers the sharp names above plus the usual flat
/// spellings and the enharmonic edge cases (Cb, B#, Fb, E#).
static PITCH_CLASSES: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let mut map: HashMap<String, i32> = NOTE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_string(), i as i32))
        .collect();
    let flats = [
        ("DB", 1),
        ("EB", 3),
        ("GB", 6),
        ("AB", 8),
        ("BB", 10),
        ("CB", -1),
        ("FB", 4),
        ("E#", 5),
        ("B#", 12),
    ];
    for (name, offset) in flats {
        map.insert(name.to_string(), offset);
    }
    map
});

/// Converts a frequency in Hz to a (continuous) semitone number.
///
/// # Arguments
/// * `frequency` - Frequency in Hz
///
/// # Returns
/// * `Some(n)` with `n = 69 + 12 * log2(f / 440)`, or `None` for `f <= 0` or
///   non-finite input, where the logarithm is undefined. The DC bin lands here.
pub fn frequency_to_semitone(frequency: f64) -> Option<f64> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }
    Some(A4_SEMITONE as f64 + 12.0 * (frequency / A4_FREQUENCY).log2())
}

/// Converts a semitone number to its frequency in Hz. Total over all reals.
pub fn semitone_to_frequency(semitone: f64) -> f64 {
    A4_FREQUENCY * 2.0_f64.powf((semitone - A4_SEMITONE as f64) / 12.0)
}

/// Returns the note name with octave, e.g. `60 -> "C4"`, `-1 -> "B-2"`.
///
/// Octaves change at C, so the octave is `floor(n / 12) - 1`.
///
/// # Arguments
/// * `semitone` - Semitone number (69 is A4), may be negative
///
/// # Returns
/// * Sharp-spelled name plus octave
pub fn semitone_to_name(semitone: i32) -> String {
    let pitch_class = semitone.rem_euclid(12) as usize;
    let octave = semitone.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[pitch_class], octave)
}

/// Continuous FFT bin position of a semitone for bin width `d_freq`.
pub fn semitone_to_bin_index(semitone: f64, d_freq: f64) -> f64 {
    semitone_to_frequency(semitone) / d_freq
}

/// Deviation of `frequency` from `reference` in cents (100 cents = 1 semitone).
pub fn cents_between(frequency: f64, reference: f64) -> f64 {
    1200.0 * (frequency / reference).log2()
}

/// Parses a note name such as `"C4"`, `"c#4"`, `"Bb3"` or `"A-1"` into a semitone.
///
/// A bare integer is accepted as a semitone number directly.
///
/// # Arguments
/// * `input` - Note name, case-insensitive, with `#` or `b` accidentals
///
/// # Returns
/// * The semitone number, or `None` if the name is not recognized
pub fn parse_note_name(input: &str) -> Option<i32> {
    let input = input.trim();
    if let Ok(semitone) = input.parse::<i32>() {
        return Some(semitone);
    }

    // The octave starts at the first digit or at a minus sign that follows the letter.
    let split = input
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c.is_ascii_digit() || c == '-')
        .map(|(i, _)| i)?;
    let (name, octave) = input.split_at(split);
    let octave: i32 = octave.parse().ok()?;

    let offset = *PITCH_CLASSES.get(&name.to_ascii_uppercase())?;
    Some((octave + 1) * 12 + offset)
}
