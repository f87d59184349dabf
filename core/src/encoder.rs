use crate::error::{MelodyError, Result};
use crate::note::{frequency_to_temp3, round_even};
use crate::rtttl::{parse, ParsedMelody};
use crate::{CELL_SIZE, HEADER_SIZE, MAX_CELL_COUNT};

/// Outcome of writing one note into the melody buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(into = "u8"))]
pub enum NoteStatus {
    Ok,
    /// Frequency has no temp3 code in 1..=255; nothing was written
    OutOfRange,
    /// Buffer ran out before (all of) the note could be written
    Truncated,
}

impl NoteStatus {
    pub fn code(self) -> u8 {
        match self {
            NoteStatus::Ok => 0,
            NoteStatus::OutOfRange => 1,
            NoteStatus::Truncated => 2,
        }
    }
}

impl From<NoteStatus> for u8 {
    fn from(status: NoteStatus) -> Self {
        status.code()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EncodedMelody {
    pub data: Vec<u8>,
    /// One status per parsed note. None when the input text was empty.
    pub error_codes: Option<Vec<NoteStatus>>,
}

impl EncodedMelody {
    /// True when every note made it into the buffer
    pub fn is_complete(&self) -> bool {
        self.error_codes
            .as_ref()
            .map_or(true, |codes| codes.iter().all(|&s| s == NoteStatus::Ok))
    }
}

/// Encode RTTTL text into an AM32 startup melody buffer of `length` bytes
pub fn encode(text: &str, length: usize) -> Result<EncodedMelody> {
    check_length(length)?;

    if text.is_empty() {
        return Ok(EncodedMelody {
            data: vec![0u8; length],
            error_codes: None,
        });
    }

    let melody = parse(text)?;
    encode_melody(&melody, length)
}

/// Encode an already parsed melody into a buffer of `length` bytes
pub fn encode_melody(melody: &ParsedMelody, length: usize) -> Result<EncodedMelody> {
    check_length(length)?;

    let mut writer = CellWriter::new(length);
    writer.write_header(
        melody.defaults.bpm.value(),
        melody.defaults.octave.value(),
        melody.defaults.duration.value(),
    );

    let mut error_codes = Vec::with_capacity(melody.notes.len());

    for note in &melody.notes {
        if writer.is_full() {
            error_codes.push(NoteStatus::Truncated);
            continue;
        }

        let status = if note.frequency_hz != 0.0 {
            let temp3 = frequency_to_temp3(note.frequency_hz);
            if temp3 > 0 && temp3 <= u8::MAX as i64 {
                let duration_per_pulse_ms = 1000.0 / note.frequency_hz;
                let pulses = round_even(note.duration_ms / duration_per_pulse_ms) as u64;
                writer.write_run(pulses, temp3 as u8)
            } else {
                log::debug!(
                    "{} Hz has no temp3 code (got {}), skipping note",
                    note.frequency_hz,
                    temp3
                );
                NoteStatus::OutOfRange
            }
        } else {
            let duration = round_even(note.duration_ms) as u64;
            writer.write_run(duration, 0)
        };

        error_codes.push(status);
    }

    Ok(EncodedMelody {
        data: writer.finish(),
        error_codes: Some(error_codes),
    })
}

fn check_length(length: usize) -> Result<()> {
    if length < HEADER_SIZE {
        return Err(MelodyError::BufferTooSmall {
            length,
            minimum: HEADER_SIZE,
        });
    }
    Ok(())
}

/// Fills a fixed buffer with the header followed by (count, temp3) cells
struct CellWriter {
    buffer: Vec<u8>,
    pos: usize,
}

impl CellWriter {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0u8; length],
            pos: HEADER_SIZE,
        }
    }

    fn write_header(&mut self, bpm: u16, octave: u8, duration: u8) {
        // Write bpm (2 bytes, big-endian)
        self.buffer[0] = (bpm >> 8) as u8;
        self.buffer[1] = bpm as u8;
        self.buffer[2] = octave;
        self.buffer[3] = duration;
    }

    /// No room left for a complete cell
    fn is_full(&self) -> bool {
        self.pos + CELL_SIZE > self.buffer.len()
    }

    /// Split `count` into cells of at most 255, all carrying the same temp3
    fn write_run(&mut self, mut count: u64, temp3: u8) -> NoteStatus {
        while count > 0 && !self.is_full() {
            let cell = count.min(MAX_CELL_COUNT as u64) as u8;
            log::trace!("cell @{}: count={} temp3={}", self.pos, cell, temp3);
            self.buffer[self.pos] = cell;
            self.buffer[self.pos + 1] = temp3;
            self.pos += CELL_SIZE;
            count -= cell as u64;
        }

        if count > 0 {
            NoteStatus::Truncated
        } else {
            NoteStatus::Ok
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_zeroed_buffer() {
        let encoded = encode("", 64).unwrap();
        assert_eq!(encoded.data, vec![0u8; 64]);
        assert_eq!(encoded.error_codes, None);
        assert!(encoded.is_complete());
    }

    #[test]
    fn test_buffer_too_small() {
        assert_eq!(
            encode("a:b=100:c", 3),
            Err(MelodyError::BufferTooSmall { length: 3, minimum: 4 })
        );
        assert!(encode("", 0).is_err());
    }

    #[test]
    fn test_header_only_buffer_truncates_everything() {
        let encoded = encode("bluejay:b=570,o=4,d=32:4b,p,4e5", 4).unwrap();
        assert_eq!(encoded.data, vec![2, 58, 4, 32]);
        assert_eq!(
            encoded.error_codes,
            Some(vec![NoteStatus::Truncated; 3])
        );
        assert!(!encoded.is_complete());
    }

    #[test]
    fn test_long_notes_are_split_into_cells() {
        let encoded = encode("t:b=100,o=5,d=4:1a,p,2.c6,8p.,1f4,32g#7,16b..,c8", 32).unwrap();
        assert_eq!(
            encoded.data,
            vec![
                0, 100, 5, 4, // header
                255, 30, 255, 30, 255, 30, 255, 30, 255, 30, 255, 30, 255, 30, 255, 30, 72, 30, // 1a
                255, 0, 255, 0, 90, 0, // p
                255, 0, 195, 0, // 8p.
            ]
        );
        let codes: Vec<u8> = encoded.error_codes.unwrap().into_iter().map(NoteStatus::code).collect();
        assert_eq!(codes, vec![0, 0, 0, 2, 2, 2, 2]);
    }

    #[test]
    fn test_out_of_range_note_is_skipped() {
        let encoded = encode("x:b=63,o=6,d=4:c,c4,b7,a#5.,8p,16g,32f#6..,2e", 128).unwrap();
        assert_eq!(
            &encoded.data[..60],
            &[
                0, 63, 6, 4, 255, 23, 255, 23, 255, 23, 232, 23, 249, 138, 255, 27, 255, 27, 255,
                27, 255, 27, 255, 27, 57, 27, 255, 0, 221, 0, 255, 10, 118, 10, 255, 11, 53, 11,
                255, 15, 255, 15, 255, 15, 255, 15, 255, 15, 255, 15, 255, 15, 255, 15, 255, 15,
                216, 15, 0, 0,
            ][..]
        );
        let codes: Vec<u8> = encoded.error_codes.unwrap().into_iter().map(NoteStatus::code).collect();
        assert_eq!(codes, vec![0, 0, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_odd_length_leaves_last_byte_zero() {
        let encoded = encode("t:b=100,o=5,d=4:1a", 7).unwrap();
        assert_eq!(encoded.data, vec![0, 100, 5, 4, 255, 30, 0]);
        assert_eq!(encoded.error_codes, Some(vec![NoteStatus::Truncated]));
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        assert_eq!(
            encode("no sections here", 128),
            Err(MelodyError::InvalidFormat { sections: 1 })
        );
    }
}
