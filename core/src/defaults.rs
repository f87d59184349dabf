//! Section defaults of an RTTTL melody (`d=`, `o=`, `b=`) and their whitelists

/// Tempos accepted by the AM32 configurator
pub const ALLOWED_BPM: [u16; 33] = [
    25, 28, 31, 35, 40, 45, 50, 56, 63, 70, 80, 90, 100, 112, 125, 140, 160, 180, 200, 225, 250,
    285, 320, 355, 400, 450, 500, 565, 570, 635, 715, 800, 900,
];

/// Default note length, as a fraction of a whole note (1 = whole, 32 = thirty-second)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "u8"))]
pub enum NoteDuration {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl NoteDuration {
    pub const ALL: [NoteDuration; 6] = [
        NoteDuration::Whole,
        NoteDuration::Half,
        NoteDuration::Quarter,
        NoteDuration::Eighth,
        NoteDuration::Sixteenth,
        NoteDuration::ThirtySecond,
    ];

    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.value() as u32 == value)
    }

    pub fn value(self) -> u8 {
        match self {
            NoteDuration::Whole => 1,
            NoteDuration::Half => 2,
            NoteDuration::Quarter => 4,
            NoteDuration::Eighth => 8,
            NoteDuration::Sixteenth => 16,
            NoteDuration::ThirtySecond => 32,
        }
    }
}

impl From<NoteDuration> for u8 {
    fn from(duration: NoteDuration) -> Self {
        duration.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "u8"))]
pub enum Octave {
    Four,
    Five,
    Six,
    Seven,
}

impl Octave {
    pub const ALL: [Octave; 4] = [Octave::Four, Octave::Five, Octave::Six, Octave::Seven];

    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.value() as u32 == value)
    }

    pub fn value(self) -> u8 {
        match self {
            Octave::Four => 4,
            Octave::Five => 5,
            Octave::Six => 6,
            Octave::Seven => 7,
        }
    }
}

impl From<Octave> for u8 {
    fn from(octave: Octave) -> Self {
        octave.value()
    }
}

/// A tempo taken from [`ALLOWED_BPM`]. Only constructible through the whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "u16"))]
pub struct Bpm(u16);

impl Bpm {
    pub fn from_value(value: u32) -> Option<Self> {
        ALLOWED_BPM
            .iter()
            .find(|&&bpm| bpm as u32 == value)
            .map(|&bpm| Bpm(bpm))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl From<Bpm> for u16 {
    fn from(bpm: Bpm) -> Self {
        bpm.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MelodyDefaults {
    pub duration: NoteDuration,
    pub octave: Octave,
    pub bpm: Bpm,
}

impl MelodyDefaults {
    /// Length of one beat in milliseconds
    pub fn beat_ms(&self) -> f64 {
        60000.0 / self.bpm.value() as f64
    }
}

impl Default for MelodyDefaults {
    fn default() -> Self {
        Self {
            duration: NoteDuration::Quarter,
            octave: Octave::Six,
            bpm: Bpm(63),
        }
    }
}
