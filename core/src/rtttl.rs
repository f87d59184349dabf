//! RTTTL text parser
//!
//! `name:d=4,o=6,b=63:8c,p,4e5.,...`
//!
//! Malformed default pairs and note tokens are skipped rather than rejected,
//! matching what AM32 configurators accept. Everything skipped is reported in
//! [`ParsedMelody::diagnostics`].

use crate::defaults::{Bpm, MelodyDefaults, NoteDuration, Octave};
use crate::error::{MelodyError, Result};
use crate::note::{note_frequency, Pitch};
use crate::{MAX_NAME_LENGTH, UNKNOWN_NAME};

/// Note lengths accepted inside the note list (the defaults section stops at 32)
const NOTE_DURATIONS: [u32; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Duration multiplier for 0..=4 dots. Each dot adds half of the previous addition.
const DOT_MULTIPLIERS: [f64; 5] = [1.0, 1.5, 1.75, 1.875, 1.9375];

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Note {
    pub pitch: Pitch,
    pub duration_ms: f64,
    /// 0 for a rest
    pub frequency_hz: f64,
}

/// Input that was accepted but not fully understood
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Diagnostic {
    NameTooLong { length: usize },
    MalformedDefault(String),
    UnknownDefaultKey(String),
    RejectedDefaultValue { key: String, value: String },
    UnrecognizedNote(String),
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::NameTooLong { length } => write!(
                f,
                "tune name is {} characters, should not exceed {}",
                length, MAX_NAME_LENGTH
            ),
            Diagnostic::MalformedDefault(entry) => write!(f, "malformed default '{}'", entry),
            Diagnostic::UnknownDefaultKey(key) => write!(f, "unknown default key '{}'", key),
            Diagnostic::RejectedDefaultValue { key, value } => {
                write!(f, "value '{}' not allowed for default '{}'", value, key)
            }
            Diagnostic::UnrecognizedNote(token) => write!(f, "unrecognized note '{}'", token),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParsedMelody {
    pub name: String,
    pub defaults: MelodyDefaults,
    pub notes: Vec<Note>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse an RTTTL string into its name, section defaults and notes
pub fn parse(text: &str) -> Result<ParsedMelody> {
    let sections: Vec<&str> = text.split(':').collect();
    if sections.len() != 3 {
        return Err(MelodyError::InvalidFormat {
            sections: sections.len(),
        });
    }

    let mut diagnostics = Vec::new();
    let name = parse_name(sections[0], &mut diagnostics);
    let defaults = parse_defaults(sections[1], &mut diagnostics);
    let notes = parse_notes(sections[2], &defaults, &mut diagnostics);

    Ok(ParsedMelody {
        name,
        defaults,
        notes,
        diagnostics,
    })
}

fn parse_name(name: &str, diagnostics: &mut Vec<Diagnostic>) -> String {
    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        log::warn!("Tune name should not exceed {} characters: '{}'", MAX_NAME_LENGTH, name);
        diagnostics.push(Diagnostic::NameTooLong { length });
    }

    if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name.to_string()
    }
}

fn parse_defaults(section: &str, diagnostics: &mut Vec<Diagnostic>) -> MelodyDefaults {
    let mut defaults = MelodyDefaults::default();

    for entry in section.split(',').filter(|entry| !entry.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            log::debug!("Skipping malformed default '{}'", entry);
            diagnostics.push(Diagnostic::MalformedDefault(entry.to_string()));
            continue;
        };

        let number = parse_plain_number(value);
        let accepted = match key {
            "d" => match number.and_then(NoteDuration::from_value) {
                Some(duration) => {
                    defaults.duration = duration;
                    true
                }
                None => false,
            },
            "o" => match number.and_then(Octave::from_value) {
                Some(octave) => {
                    defaults.octave = octave;
                    true
                }
                None => false,
            },
            "b" => match number.and_then(Bpm::from_value) {
                Some(bpm) => {
                    defaults.bpm = bpm;
                    true
                }
                None => false,
            },
            _ => {
                log::debug!("Ignoring unknown default key '{}'", key);
                diagnostics.push(Diagnostic::UnknownDefaultKey(key.to_string()));
                continue;
            }
        };

        if !accepted {
            log::debug!("Ignoring value '{}' for default '{}'", value, key);
            diagnostics.push(Diagnostic::RejectedDefaultValue {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }

    defaults
}

fn parse_notes(section: &str, defaults: &MelodyDefaults, diagnostics: &mut Vec<Diagnostic>) -> Vec<Note> {
    let beat_ms = defaults.beat_ms();
    let mut notes = Vec::new();

    for token in section.split(',') {
        let Some(scanned) = scan_note(token) else {
            log::debug!("Dropping unrecognized note '{}'", token);
            diagnostics.push(Diagnostic::UnrecognizedNote(token.to_string()));
            continue;
        };

        let duration = scanned.duration.unwrap_or(defaults.duration.value() as u32);
        let octave = scanned.octave.unwrap_or(defaults.octave.value() as u32);

        notes.push(Note {
            pitch: scanned.pitch,
            duration_ms: (beat_ms * 4.0) / duration as f64 * dot_multiplier(scanned.dots()),
            frequency_hz: note_frequency(scanned.pitch, octave as i32),
        });
    }

    notes
}

fn dot_multiplier(dots: usize) -> f64 {
    // More than four dots is not a valid RTTTL length; treated as undotted
    DOT_MULTIPLIERS.get(dots).copied().unwrap_or(1.0)
}

/// Decimal digits only, no sign and no leading zero
fn parse_plain_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse().ok()
}

/// One note token split into its grammar parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteToken {
    pub duration: Option<u32>,
    pub pitch: Pitch,
    pub leading_dots: usize,
    pub octave: Option<u32>,
    pub trailing_dots: usize,
}

impl NoteToken {
    /// Dots may sit on either side of the octave digit; both runs count
    pub fn dots(&self) -> usize {
        self.leading_dots + self.trailing_dots
    }
}

/// Scan `[duration][pitch]['#']['.'*][octave]['.'*]` from the start of a token.
/// Anything after the final dot run is ignored.
pub fn scan_note(token: &str) -> Option<NoteToken> {
    let bytes = token.as_bytes();
    let mut pos = 0;

    let digits = take_while(bytes, &mut pos, |b| b.is_ascii_digit());
    let duration = if digits.is_empty() {
        None
    } else {
        let value = std::str::from_utf8(digits).ok().and_then(parse_plain_number)?;
        Some(*NOTE_DURATIONS.iter().find(|&&d| d == value)?)
    };

    let letter = *bytes.get(pos)? as char;
    pos += 1;
    let sharp = bytes.get(pos) == Some(&b'#');
    if sharp {
        pos += 1;
    }
    let pitch = Pitch::from_letter(letter, sharp)?;

    let leading_dots = take_while(bytes, &mut pos, |b| b == b'.').len();

    let octave = match bytes.get(pos) {
        Some(&digit @ b'1'..=b'8') => {
            pos += 1;
            Some((digit - b'0') as u32)
        }
        _ => None,
    };

    let trailing_dots = take_while(bytes, &mut pos, |b| b == b'.').len();

    Some(NoteToken {
        duration,
        pitch,
        leading_dots,
        octave,
        trailing_dots,
    })
}

fn take_while<'a>(bytes: &'a [u8], pos: &mut usize, predicate: impl Fn(u8) -> bool) -> &'a [u8] {
    let start = *pos;
    while *pos < bytes.len() && predicate(bytes[*pos]) {
        *pos += 1;
    }
    &bytes[start..*pos]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_note(note: &Note, pitch: Pitch, duration_ms: f64, frequency_hz: f64) {
        assert_eq!(note.pitch, pitch);
        assert!(
            (note.duration_ms - duration_ms).abs() < 1e-9,
            "duration {} != {}",
            note.duration_ms,
            duration_ms
        );
        assert_eq!(note.frequency_hz, frequency_hz);
    }

    #[test]
    fn test_parse_notes_with_defaults() {
        let melody = parse("n:d=8,o=5,b=100:4c,x,h,c#.6,e6..,2p,16d#4.,64g8,c9").unwrap();

        assert_eq!(melody.name, "n");
        assert_eq!(melody.defaults.duration, NoteDuration::Eighth);
        assert_eq!(melody.defaults.octave, Octave::Five);
        assert_eq!(melody.defaults.bpm.value(), 100);
        assert_eq!(melody.notes.len(), 8);

        assert_note(&melody.notes[0], Pitch::C, 600.0, 523.3);
        assert_note(&melody.notes[1], Pitch::B, 300.0, 987.8);
        assert_note(&melody.notes[2], Pitch::CSharp, 450.0, 1108.7);
        assert_note(&melody.notes[3], Pitch::E, 525.0, 1318.5);
        assert_note(&melody.notes[4], Pitch::Rest, 1200.0, 0.0);
        assert_note(&melody.notes[5], Pitch::DSharp, 225.0, 311.1);
        assert_note(&melody.notes[6], Pitch::G, 37.5, 6272.0);
        // '9' is not an octave digit, so the default octave applies and the tail is ignored
        assert_note(&melody.notes[7], Pitch::C, 300.0, 523.3);

        assert_eq!(melody.diagnostics, vec![Diagnostic::UnrecognizedNote("x".into())]);
    }

    #[test]
    fn test_empty_sections_fall_back() {
        let melody = parse("::").unwrap();
        assert_eq!(melody.name, "Unknown");
        assert_eq!(melody.defaults, MelodyDefaults::default());
        assert!(melody.notes.is_empty());
    }

    #[test]
    fn test_long_name_is_kept() {
        let melody = parse("verylongname123::c").unwrap();
        assert_eq!(melody.name, "verylongname123");
        assert_eq!(melody.diagnostics, vec![Diagnostic::NameTooLong { length: 15 }]);
        assert_note(&melody.notes[0], Pitch::C, 60000.0 / 63.0 * 4.0 / 4.0, 1046.5);
    }

    #[test]
    fn test_wrong_section_count() {
        assert_eq!(parse("abc"), Err(MelodyError::InvalidFormat { sections: 1 }));
        assert_eq!(parse("a:b:c:d"), Err(MelodyError::InvalidFormat { sections: 4 }));
    }

    #[test]
    fn test_defaults_whitelist() {
        let melody = parse("t:d=3,o=8,b=120,x=1,bogus,d=16,o=04:c").unwrap();
        assert_eq!(melody.defaults.duration, NoteDuration::Sixteenth);
        assert_eq!(melody.defaults.octave, Octave::Six);
        assert_eq!(melody.defaults.bpm.value(), 63);
        assert_eq!(
            melody.diagnostics,
            vec![
                Diagnostic::RejectedDefaultValue { key: "d".into(), value: "3".into() },
                Diagnostic::RejectedDefaultValue { key: "o".into(), value: "8".into() },
                Diagnostic::RejectedDefaultValue { key: "b".into(), value: "120".into() },
                Diagnostic::UnknownDefaultKey("x".into()),
                Diagnostic::MalformedDefault("bogus".into()),
                Diagnostic::RejectedDefaultValue { key: "o".into(), value: "04".into() },
            ]
        );
    }

    #[test]
    fn test_scan_note_grammar() {
        let token = scan_note("16f#.5..").unwrap();
        assert_eq!(token.duration, Some(16));
        assert_eq!(token.pitch, Pitch::FSharp);
        assert_eq!(token.octave, Some(5));
        assert_eq!(token.leading_dots, 1);
        assert_eq!(token.trailing_dots, 2);
        assert_eq!(token.dots(), 3);

        let token = scan_note("p").unwrap();
        assert_eq!(token.duration, None);
        assert_eq!(token.pitch, Pitch::Rest);
        assert_eq!(token.octave, None);

        assert!(scan_note("").is_none());
        assert!(scan_note("8").is_none());
        assert!(scan_note("12c").is_none());
        assert!(scan_note("08c").is_none());
        assert!(scan_note("4e#").is_none());
        assert!(scan_note("p#").is_none());
        assert!(scan_note(" c").is_none());
        assert!(scan_note("C").is_none());
        assert_eq!(scan_note("64a").unwrap().duration, Some(64));
    }

    #[test]
    fn test_dot_multipliers() {
        let melody = parse("t:b=100,d=4:c,c.,c..,c...,c....,c.....").unwrap();
        let durations: Vec<f64> = melody.notes.iter().map(|n| n.duration_ms).collect();
        assert_eq!(durations, vec![600.0, 900.0, 1050.0, 1125.0, 1162.5, 600.0]);
    }
}
