//! Boundary helpers for the ESC parameter that stores the startup melody

use crate::decoder::decode;
use crate::encoder::{encode, EncodedMelody};
use crate::error::Result;
use crate::{DEFAULT_DECODE_NAME, DEFAULT_MELODY_LENGTH};

/// Name of the AM32 parameter holding the melody blob
pub const STARTUP_TUNE_PARAM: &str = "STARTUP_TUNE";

/// Type of a parameter value as reported by the ESC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValueKind {
    Empty,
    Integer,
    Real,
    Boolean,
    String,
}

/// Name-only check, for parameters loaded from a saved file where the value
/// kind is not known. Use [`is_melody_param`] for values read from a device.
pub fn is_melody_param_name(name: &str) -> bool {
    name == STARTUP_TUNE_PARAM
}

/// The melody blob travels as a string-typed parameter
pub fn is_melody_param(name: &str, kind: ParamValueKind) -> bool {
    is_melody_param_name(name) && kind == ParamValueKind::String
}

/// Erased EEPROM reads back as all 0xFF, an empty value counts as erased too
pub fn is_erased(value: &[u8]) -> bool {
    value.iter().all(|&b| b == 0xFF)
}

/// Turn a raw parameter value into RTTTL text.
///
/// Erased EEPROM (all 0xFF) means no melody is configured. Values are decoded
/// as a full-size melody buffer; shorter values are zero padded and bytes past
/// the melody length are ignored.
pub fn melody_from_param_value(value: &[u8]) -> String {
    if is_erased(value) {
        return String::new();
    }

    if value.len() > DEFAULT_MELODY_LENGTH {
        log::debug!(
            "Parameter value is {} bytes, ignoring everything past {}",
            value.len(),
            DEFAULT_MELODY_LENGTH
        );
    }

    let mut buffer = [0u8; DEFAULT_MELODY_LENGTH];
    let used = value.len().min(DEFAULT_MELODY_LENGTH);
    buffer[..used].copy_from_slice(&value[..used]);

    decode(&buffer, DEFAULT_DECODE_NAME)
}

/// Encode RTTTL text into a full-size parameter value
pub fn melody_to_param_value(text: &str) -> Result<EncodedMelody> {
    encode(text, DEFAULT_MELODY_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_name() {
        assert!(is_melody_param_name("STARTUP_TUNE"));
        assert!(!is_melody_param_name("startup_tune"));
        assert!(!is_melody_param_name("MOTOR_KV"));

        assert!(is_melody_param("STARTUP_TUNE", ParamValueKind::String));
        assert!(!is_melody_param("STARTUP_TUNE", ParamValueKind::Integer));
        assert!(!is_melody_param("MOTOR_KV", ParamValueKind::String));
    }

    #[test]
    fn test_is_erased() {
        assert!(is_erased(&[0xFF; 128]));
        assert!(is_erased(&[]));
        assert!(!is_erased(&[0xFF, 0xFF, 0xFE]));
        assert!(!is_erased(&[0u8; 4]));
    }

    #[test]
    fn test_erased_value_means_no_melody() {
        assert_eq!(melody_from_param_value(&[0xFF; 128]), "");
        assert_eq!(melody_from_param_value(&[0xFF; 16]), "");
        assert_eq!(melody_from_param_value(&[]), "");
    }

    #[test]
    fn test_short_value_is_padded() {
        assert_eq!(
            melody_from_param_value(&[0, 100, 5, 4, 255, 30, 255, 30, 12, 30]),
            "Melody:b=100,o=5,d=4:a"
        );
        // Too short for a header, padding turns it into an (almost) empty melody
        assert_eq!(melody_from_param_value(&[0, 100]), "Melody:b=100,o=0,d=0:");
    }

    #[test]
    fn test_param_round_trip() {
        let encoded = melody_to_param_value("bluejay:b=570,o=4,d=32:4b,p,4e5").unwrap();
        assert_eq!(encoded.data.len(), 128);
        assert_eq!(
            melody_from_param_value(&encoded.data),
            "Melody:b=570,o=4,d=32:4b,p,4e5"
        );
    }
}
