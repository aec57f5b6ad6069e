// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Sample encoding capability consumed by output samplers.
//!
//! Whether a codec understands the window envelope is a fixed capability
//! flag decided at registration time, never inferred by inspecting the
//! value at runtime. The sampler uses the flag to decide what the codec
//! receives: a window-aware codec gets the full [`WindowedElement`], a
//! plain codec gets only the inner value with window metadata stripped, so
//! it never sees envelope bytes it cannot decode.

use bytes::Bytes;

use crate::element::WindowedElement;
use crate::error::{Result, TapError};

/// Serialization capability for sampled elements.
pub trait SampleCodec: Send + Sync {
    /// Whether this codec encodes the full window envelope. Fixed for the
    /// codec's lifetime.
    fn is_windowed(&self) -> bool {
        false
    }

    /// Encode a bare element value in nested form.
    fn encode_value(&self, value: &serde_json::Value) -> Result<Bytes>;

    /// Encode the full window envelope in nested form. Only called for
    /// codecs whose [`is_windowed`](SampleCodec::is_windowed) is true.
    fn encode_windowed(&self, element: &WindowedElement) -> Result<Bytes> {
        let _ = element;
        Err(TapError::Encode(
            "codec does not understand window envelopes".to_string(),
        ))
    }
}

/// Nested form: u32 big-endian length prefix followed by the payload, so
/// encoded samples stay independently decodable when a transport
/// concatenates them.
fn frame(payload: Vec<u8>) -> Bytes {
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload);
    Bytes::from(out)
}

/// MessagePack codec for bare element values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackValueCodec;

impl SampleCodec for MsgPackValueCodec {
    fn encode_value(&self, value: &serde_json::Value) -> Result<Bytes> {
        let payload = rmp_serde::to_vec(value).map_err(|e| TapError::Encode(e.to_string()))?;
        Ok(frame(payload))
    }
}

/// MessagePack codec for full window envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowedMsgPackCodec;

impl SampleCodec for WindowedMsgPackCodec {
    fn is_windowed(&self) -> bool {
        true
    }

    fn encode_value(&self, value: &serde_json::Value) -> Result<Bytes> {
        let payload = rmp_serde::to_vec(value).map_err(|e| TapError::Encode(e.to_string()))?;
        Ok(frame(payload))
    }

    fn encode_windowed(&self, element: &WindowedElement) -> Result<Bytes> {
        let payload = rmp_serde::to_vec(element).map_err(|e| TapError::Encode(e.to_string()))?;
        Ok(frame(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::WindowSpan;

    #[test]
    fn test_nested_form_is_length_prefixed() {
        let encoded = MsgPackValueCodec
            .encode_value(&serde_json::Value::from("abc"))
            .unwrap();

        let prefix = u32::from_be_bytes(encoded[..4].try_into().unwrap());
        assert_eq!(prefix as usize, encoded.len() - 4);
    }

    #[test]
    fn test_encoded_value_round_trips() {
        let value = serde_json::json!({"word": "hello", "count": 3});
        let encoded = MsgPackValueCodec.encode_value(&value).unwrap();

        let decoded: serde_json::Value = rmp_serde::from_slice(&encoded[4..]).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_encoded_envelope_round_trips() {
        let element = WindowedElement::new("hello", 42, vec![WindowSpan::new(0, 100)]);
        let encoded = WindowedMsgPackCodec.encode_windowed(&element).unwrap();

        let decoded: WindowedElement = rmp_serde::from_slice(&encoded[4..]).unwrap();
        assert_eq!(decoded, element);
    }

    #[test]
    fn test_plain_codec_rejects_envelopes() {
        let element = WindowedElement::global("hello");
        let result = MsgPackValueCodec.encode_windowed(&element);
        assert!(matches!(result, Err(TapError::Encode(_))));
    }

    #[test]
    fn test_capability_flags() {
        assert!(!MsgPackValueCodec.is_windowed());
        assert!(WindowedMsgPackCodec.is_windowed());
    }
}
