use am32_melody_core::{decode, encode, melody_from_param_value, EncodedMelody};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct EncodeResult {
    inner: EncodedMelody,
}

#[wasm_bindgen]
impl EncodeResult {
    /// Melody image bytes as a Uint8Array
    #[wasm_bindgen(getter)]
    pub fn data(&self) -> Vec<u8> {
        self.inner.data.clone()
    }

    /// Per-note status codes (0 ok, 1 out of range, 2 truncated), or null
    /// when the input text was empty
    #[wasm_bindgen(getter, js_name = errorCodes)]
    pub fn error_codes(&self) -> Option<js_sys::Uint8Array> {
        self.inner.error_codes.as_ref().map(|codes| {
            let codes: Vec<u8> = codes.iter().map(|status| status.code()).collect();
            js_sys::Uint8Array::from(codes.as_slice())
        })
    }

    #[wasm_bindgen(getter, js_name = isComplete)]
    pub fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }
}

/// Encode RTTTL text into an AM32 startup melody image of `length` bytes
#[wasm_bindgen(js_name = encodeRtttl)]
pub fn encode_rtttl(text: &str, length: usize) -> Result<EncodeResult, JsValue> {
    encode(text, length)
        .map(|inner| EncodeResult { inner })
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode a melody image into RTTTL text
#[wasm_bindgen(js_name = decodeMelody)]
pub fn decode_melody(data: &[u8], name: &str) -> String {
    decode(data, name)
}

/// Decode a raw STARTUP_TUNE parameter value (erased EEPROM reads as "")
#[wasm_bindgen(js_name = melodyFromParamValue)]
pub fn melody_from_param(value: &[u8]) -> String {
    melody_from_param_value(value)
}
