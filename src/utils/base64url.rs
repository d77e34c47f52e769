//! Base64URL encoding/decoding per RFC 4648
//!
//! This module provides a thin wrapper around the `base64` crate with
//! size limit validation for security.

use crate::error::{Error, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Encode bytes to Base64URL (no padding)
pub(crate) fn encode_bytes(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Encode string to Base64URL (no padding)
pub(crate) fn encode(input: &str) -> String {
    encode_bytes(input.as_bytes())
}

/// Decode Base64URL string to bytes with maximum size limit
pub(crate) fn decode_bytes(input: &str, max_size: usize) -> Result<Vec<u8>> {
    // Reject before allocating when the encoded form already exceeds the limit
    if input.len() > crate::limits::base64url_len(max_size) {
        return Err(Error::FormatInvalidBase64(format!(
            "Encoded size exceeds limit: {} bytes (max decoded: {})",
            input.len(),
            max_size
        )));
    }

    let result = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|e| Error::FormatInvalidBase64(format!("Base64URL decode failed: {e}")))?;

    if result.len() > max_size {
        return Err(Error::FormatInvalidBase64(format!(
            "Decoded size exceeds limit: {} bytes (max: {})",
            result.len(),
            max_size
        )));
    }

    Ok(result)
}

/// Decode Base64URL string to UTF-8 string with size limit
pub(crate) fn decode_string(input: &str, max_size: usize) -> Result<String> {
    decode_bytes(input, max_size).and_then(|bytes| {
        String::from_utf8(bytes)
            .map_err(|e| Error::FormatInvalidBase64(format!("Invalid UTF-8: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_invalid() {
        assert!(decode_bytes("!!!", 1000).is_err());
        assert!(decode_bytes("SGVsbG8=", 1000).is_err()); // padding is not URL_SAFE_NO_PAD
    }

    #[test]
    fn test_decode_valid() {
        let result = decode_bytes("SGVsbG8", 1000).unwrap();
        assert_eq!(result, b"Hello");
    }

    #[test]
    fn test_decode_with_limit() {
        assert_eq!(decode_bytes("SGVsbG8", 10).unwrap(), b"Hello");
        assert!(decode_bytes("SGVsbG8", 3).is_err());
    }

    #[test]
    fn test_decode_rejects_non_canonical_trailing_bits() {
        // "SGVsbG8" is canonical; changing the final symbol sets unused bits
        assert!(decode_bytes("SGVsbG9", 10).is_err());
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(""), "");
        assert_eq!(encode("f"), "Zg");
        assert_eq!(encode("foobar"), "Zm9vYmFy");
        let encoded = encode_bytes(&[0xfb, 0xff]);
        assert!(!encoded.contains('+') && !encoded.contains('/'));
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_string("SGVsbG8", 10).unwrap(), "Hello");
        assert!(decode_string(&encode_bytes(&[0xff, 0xfe]), 10).is_err());
    }
}
