//! Codec between RTTTL ring-tone text and the AM32 startup melody EEPROM image
//!
//! The binary image is a fixed-size buffer: a 4 byte header (bpm, octave,
//! duration) followed by 2 byte cells of (pulse count, temp3 timer code).

pub mod error;
pub mod note;
pub mod defaults;
pub mod rtttl;
pub mod encoder;
pub mod decoder;
pub mod param;

pub use decoder::{decode, decode_notes, DecodedMelody, DecodedNote};
pub use defaults::{Bpm, MelodyDefaults, NoteDuration, Octave};
pub use encoder::{encode, encode_melody, EncodedMelody, NoteStatus};
pub use error::{MelodyError, Result};
pub use note::Pitch;
pub use param::{
    is_erased, is_melody_param, is_melody_param_name, melody_from_param_value, melody_to_param_value, ParamValueKind,
    STARTUP_TUNE_PARAM,
};
pub use rtttl::{parse, Diagnostic, Note, ParsedMelody};

// Binary layout
pub const DEFAULT_MELODY_LENGTH: usize = 128;
pub const HEADER_SIZE: usize = 4; // bpm (2, big-endian) + octave (1) + duration (1)
pub const CELL_SIZE: usize = 2; // pulse/duration count (1) + temp3 (1)
pub const MAX_CELL_COUNT: u8 = u8::MAX;

// RTTTL
pub const MAX_NAME_LENGTH: usize = 10;
pub const UNKNOWN_NAME: &str = "Unknown";
pub const DEFAULT_DECODE_NAME: &str = "Melody";

// Tone generator model
pub const C4_FREQUENCY: f64 = 261.63; // Hz
pub const SEMITONES_PER_OCTAVE: i32 = 12;
pub const MIDDLE_OCTAVE: i32 = 4;
pub const TEMP3_SCALE: f64 = 24.72;
pub const TEMP3_OFFSET: f64 = 399.3;
