use crate::error::{MelodyError, Result};
use crate::note::{canonical_frequency, octave_from_frequency, pitch_from_frequency, round_even, temp3_to_frequency, Pitch};
use crate::{CELL_SIZE, HEADER_SIZE, MAX_CELL_COUNT};

/// Smallest duration step the decoder emits, as a fraction of a whole note
const QUANTIZATION_STEPS: f64 = 64.0;

/// Longest single token: a dotted whole note
const MAX_TOKEN_LENGTH: f64 = 1.5;

/// Cells whose frequencies differ by less than this belong to the same pitch
const FREQUENCY_TOLERANCE_HZ: f64 = 0.01;

/// One logical note rebuilt from one or more buffer cells
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedNote {
    pub pitch: Pitch,
    /// 0 for a rest
    pub octave: i32,
    pub duration_ms: f64,
    /// Frequency of the temp3 code (not the equal-tempered pitch)
    pub frequency_hz: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedMelody {
    /// Header values are taken as stored, without whitelist checks
    pub bpm: u16,
    pub octave: u8,
    pub duration: u8,
    pub notes: Vec<DecodedNote>,
}

/// Read the header and walk the (count, temp3) cells of a melody buffer.
///
/// Cells following a saturated (255) cell at the same frequency are merged
/// back into a single note. Decoding stops at the first empty cell.
pub fn decode_notes(data: &[u8]) -> Result<DecodedMelody> {
    if data.len() < HEADER_SIZE {
        return Err(MelodyError::BufferTooSmall {
            length: data.len(),
            minimum: HEADER_SIZE,
        });
    }

    let bpm = ((data[0] as u16) << 8) | (data[1] as u16);
    let octave = data[2];
    let duration = data[3];

    let mut notes: Vec<DecodedNote> = Vec::new();
    let mut previous_count: Option<u8> = None;

    for cell in data[HEADER_SIZE..].chunks_exact(CELL_SIZE) {
        let (count, temp3) = (cell[0], cell[1]);

        let frequency = temp3_to_frequency(temp3);
        let pitch = pitch_from_frequency(frequency);
        let note_octave = octave_from_frequency(frequency);
        let cell_ms = if frequency == 0.0 {
            count as f64
        } else {
            (1000.0 / canonical_frequency(pitch, note_octave)) * count as f64
        };

        if cell_ms <= 0.0 {
            break;
        }

        let continues_previous = previous_count == Some(MAX_CELL_COUNT)
            && notes
                .last()
                .is_some_and(|last| (last.frequency_hz - frequency).abs() < FREQUENCY_TOLERANCE_HZ);

        if continues_previous {
            if let Some(last) = notes.last_mut() {
                last.duration_ms += cell_ms;
            }
        } else {
            notes.push(DecodedNote {
                pitch,
                octave: note_octave,
                duration_ms: cell_ms,
                frequency_hz: frequency,
            });
        }

        previous_count = Some(count);
    }

    Ok(DecodedMelody {
        bpm,
        octave,
        duration,
        notes,
    })
}

impl DecodedMelody {
    /// Length of a whole note in milliseconds
    fn full_note_ms(&self) -> f64 {
        4.0 * 60000.0 / self.bpm as f64
    }

    /// Render every note as one or more RTTTL note tokens.
    ///
    /// Durations are snapped to 1/64 of a whole note, then split greedily
    /// into (possibly dotted) power-of-two lengths.
    pub fn rtttl_tokens(&self) -> Vec<String> {
        if self.bpm == 0 {
            return Vec::new();
        }

        let full_note_ms = self.full_note_ms();
        let smallest_ms = full_note_ms / QUANTIZATION_STEPS;
        let mut tokens = Vec::new();

        for note in &self.notes {
            let quantized_ms = round_even(note.duration_ms / smallest_ms) * smallest_ms;
            let mut remaining = quantized_ms / full_note_ms;

            while remaining > 1.0 / QUANTIZATION_STEPS {
                let step = remaining.min(MAX_TOKEN_LENGTH);
                let exponent = -step.log2().floor();
                let rtttl_duration = 1u32 << exponent as u32;
                let dotted = step * rtttl_duration as f64 > 1.0;
                tokens.push(self.format_token(note, rtttl_duration, dotted));
                remaining -= step;
            }
        }

        tokens
    }

    fn format_token(&self, note: &DecodedNote, rtttl_duration: u32, dotted: bool) -> String {
        let mut token = String::new();
        if rtttl_duration != self.duration as u32 {
            token.push_str(&rtttl_duration.to_string());
        }
        token.push_str(note.pitch.as_str());
        if note.octave != self.octave as i32 && note.octave != 0 {
            token.push_str(&note.octave.to_string());
        }
        if dotted {
            token.push('.');
        }
        token
    }

    pub fn to_rtttl(&self, name: &str) -> String {
        format!(
            "{}:b={},o={},d={}:{}",
            name,
            self.bpm,
            self.octave,
            self.duration,
            self.rtttl_tokens().join(",")
        )
    }
}

/// Decode an AM32 startup melody buffer into RTTTL text.
///
/// An all-zero buffer is "no melody" and yields an empty string. A buffer too
/// short to hold a header yields a bare default header.
pub fn decode(data: &[u8], name: &str) -> String {
    let melody = match decode_notes(data) {
        Ok(melody) => melody,
        Err(_) => return format!("{}:d=1,o=4,bpm=100:", name),
    };

    if data.iter().all(|&b| b == 0) {
        return String::new();
    }

    melody.to_rtttl(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_buffer_is_empty() {
        assert_eq!(decode(&[0u8; 128], "Melody"), "");
        assert_eq!(decode(&[0u8; 4], "Melody"), "");
    }

    #[test]
    fn test_short_buffer_placeholder() {
        assert_eq!(decode(&[], "Melody"), "Melody:d=1,o=4,bpm=100:");
        assert_eq!(decode(&[1, 2, 3], "tune"), "tune:d=1,o=4,bpm=100:");
        assert!(decode_notes(&[0, 1]).is_err());
    }

    #[test]
    fn test_header_only() {
        assert_eq!(decode(&[0, 100, 5, 4], "z"), "z:b=100,o=5,d=4:");
    }

    #[test]
    fn test_stops_at_first_empty_cell() {
        let data = [0, 100, 5, 4, 10, 0, 0, 0, 20, 0];
        let melody = decode_notes(&data).unwrap();
        assert_eq!(melody.notes.len(), 1);
        assert_eq!(melody.notes[0].pitch, Pitch::Rest);
        assert_eq!(melody.notes[0].octave, 0);
        assert_eq!(melody.notes[0].duration_ms, 10.0);
        // 10ms is below 1/64 of a whole note at 100 bpm
        assert_eq!(decode(&data, "z"), "z:b=100,o=5,d=4:");
    }

    #[test]
    fn test_saturated_cells_coalesce() {
        let data = [0, 100, 5, 4, 255, 0, 255, 0, 255, 0, 44, 0, 255, 0];
        let melody = decode_notes(&data).unwrap();
        let durations: Vec<f64> = melody.notes.iter().map(|n| n.duration_ms).collect();
        assert_eq!(durations, vec![809.0, 255.0]);
        assert_eq!(melody.to_rtttl("z"), "z:b=100,o=5,d=4:p.,16p.");
    }

    #[test]
    fn test_only_cells_after_255_coalesce() {
        let data = [0, 100, 5, 4, 10, 30, 10, 30, 255, 30, 10, 30];
        let melody = decode_notes(&data).unwrap();
        assert_eq!(melody.notes.len(), 3);
        assert!(melody.notes.iter().all(|n| n.pitch == Pitch::A && n.octave == 5));
        assert_eq!(decode(&data, "z"), "z:b=100,o=5,d=4:8a");
    }

    #[test]
    fn test_pitch_change_breaks_run() {
        // Saturated a5 followed by c6: two notes even though the first hit 255
        let data = [0, 100, 5, 4, 255, 30, 100, 23];
        let melody = decode_notes(&data).unwrap();
        assert_eq!(melody.notes.len(), 2);
        assert_eq!(melody.notes[1].pitch, Pitch::C);
        assert_eq!(melody.notes[1].octave, 6);
    }

    #[test]
    fn test_zero_bpm_renders_no_notes() {
        assert_eq!(decode(&[0, 0, 5, 4, 100, 0], "z"), "z:b=0,o=5,d=4:");
    }

    #[test]
    fn test_greedy_token_split() {
        let melody = DecodedMelody {
            bpm: 100,
            octave: 5,
            duration: 4,
            notes: vec![DecodedNote {
                pitch: Pitch::G,
                octave: 6,
                // two whole notes: dotted whole + half
                duration_ms: 4800.0,
                frequency_hz: 1568.0,
            }],
        };
        assert_eq!(melody.rtttl_tokens(), vec!["1g6.", "2g6"]);
    }
}
