use crate::{C4_FREQUENCY, MIDDLE_OCTAVE, SEMITONES_PER_OCTAVE, TEMP3_OFFSET, TEMP3_SCALE};

/// Pitch classes of the chromatic scale plus the RTTTL rest (`p`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "&'static str"))]
pub enum Pitch {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
    Rest,
}

const CHROMATIC: [Pitch; 12] = [
    Pitch::C,
    Pitch::CSharp,
    Pitch::D,
    Pitch::DSharp,
    Pitch::E,
    Pitch::F,
    Pitch::FSharp,
    Pitch::G,
    Pitch::GSharp,
    Pitch::A,
    Pitch::ASharp,
    Pitch::B,
];

impl Pitch {
    /// Resolve an RTTTL pitch letter with an optional sharp.
    /// `h` is the German spelling of `b`. Returns None for sharps that do not exist (e#, b#, p#).
    pub fn from_letter(letter: char, sharp: bool) -> Option<Self> {
        let pitch = match (letter, sharp) {
            ('c', false) => Pitch::C,
            ('c', true) => Pitch::CSharp,
            ('d', false) => Pitch::D,
            ('d', true) => Pitch::DSharp,
            ('e', false) => Pitch::E,
            ('f', false) => Pitch::F,
            ('f', true) => Pitch::FSharp,
            ('g', false) => Pitch::G,
            ('g', true) => Pitch::GSharp,
            ('a', false) => Pitch::A,
            ('a', true) => Pitch::ASharp,
            ('b' | 'h', false) => Pitch::B,
            ('p', false) => Pitch::Rest,
            _ => return None,
        };
        Some(pitch)
    }

    /// Position within the octave (C=0, B=11), None for a rest
    pub fn index(self) -> Option<i32> {
        CHROMATIC.iter().position(|&p| p == self).map(|i| i as i32)
    }

    /// Pitch class for a semitone count, wrapping into a single octave
    pub fn from_semitones(semitones: i32) -> Self {
        CHROMATIC[semitones.rem_euclid(SEMITONES_PER_OCTAVE) as usize]
    }

    pub fn is_rest(self) -> bool {
        self == Pitch::Rest
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pitch::C => "c",
            Pitch::CSharp => "c#",
            Pitch::D => "d",
            Pitch::DSharp => "d#",
            Pitch::E => "e",
            Pitch::F => "f",
            Pitch::FSharp => "f#",
            Pitch::G => "g",
            Pitch::GSharp => "g#",
            Pitch::A => "a",
            Pitch::ASharp => "a#",
            Pitch::B => "b",
            Pitch::Rest => "p",
        }
    }
}

impl From<Pitch> for &'static str {
    fn from(pitch: Pitch) -> Self {
        pitch.as_str()
    }
}

impl std::fmt::Display for Pitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round half to even. Every rounding step of the codec goes through here so
/// encoder and decoder agree on ties.
pub fn round_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Semitone distance from C4
pub fn semitones_from_c4(pitch_index: i32, octave: i32) -> i32 {
    pitch_index + (octave - MIDDLE_OCTAVE) * SEMITONES_PER_OCTAVE
}

/// Equal-tempered frequency `n` semitones above C4
pub fn frequency_from_semitones(semitones: i32) -> f64 {
    C4_FREQUENCY * 2f64.powf(semitones as f64 / SEMITONES_PER_OCTAVE as f64)
}

/// Nearest semitone offset from C4 for a (non-zero) frequency
pub fn semitones_from_frequency(frequency: f64) -> i32 {
    round_even(SEMITONES_PER_OCTAVE as f64 * (frequency / C4_FREQUENCY).log2()) as i32
}

/// Frequency of a parsed RTTTL note, rounded to 0.1 Hz. Rests are 0 Hz.
pub fn note_frequency(pitch: Pitch, octave: i32) -> f64 {
    let Some(index) = pitch.index() else {
        return 0.0;
    };
    let twelfth_root = 2f64.powf(1.0 / SEMITONES_PER_OCTAVE as f64);
    let n = semitones_from_c4(index, octave);
    round_even(C4_FREQUENCY * twelfth_root.powf(n as f64) * 10.0) / 10.0
}

/// Unrounded frequency of a pitch/octave pair, used when rebuilding durations
/// from pulse counts
pub fn canonical_frequency(pitch: Pitch, octave: i32) -> f64 {
    match pitch.index() {
        Some(index) => frequency_from_semitones(semitones_from_c4(index, octave)),
        None => 0.0,
    }
}

pub fn pitch_from_frequency(frequency: f64) -> Pitch {
    if frequency == 0.0 {
        return Pitch::Rest;
    }
    Pitch::from_semitones(semitones_from_frequency(frequency))
}

/// Octave number for a frequency, 0 for a rest
pub fn octave_from_frequency(frequency: f64) -> i32 {
    if frequency == 0.0 {
        return 0;
    }
    MIDDLE_OCTAVE + semitones_from_frequency(frequency).div_euclid(SEMITONES_PER_OCTAVE)
}

/// AM32 tone generator timer code for a frequency.
/// Not clamped: callers must reject values outside 1..=255.
pub fn frequency_to_temp3(frequency: f64) -> i64 {
    if frequency == 0.0 {
        return 0;
    }
    round_even(1_000_000.0 / (frequency * TEMP3_SCALE) - TEMP3_OFFSET / TEMP3_SCALE) as i64
}

pub fn temp3_to_frequency(temp3: u8) -> f64 {
    if temp3 == 0 {
        return 0.0;
    }
    1_000_000.0 / (TEMP3_SCALE * temp3 as f64 + TEMP3_OFFSET)
}
