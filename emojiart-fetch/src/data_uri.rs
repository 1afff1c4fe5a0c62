//! `data:` URI payloads.
//!
//! Supports base64 (`data:image/png;base64,iVBORw0KGgo...`) and
//! percent-encoded payloads.

use base64::Engine;
use emojiart_core::FetchError;

/// Extract the payload bytes of a data URI.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the URI is malformed.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, FetchError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FetchError::Decode("not a data URI".to_string()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| FetchError::Decode("invalid data URI: missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| FetchError::Decode(format!("invalid base64 payload: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| FetchError::Decode("invalid percent encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_payload() {
        let bytes = decode_data_uri("data:image/png;base64,AQID").expect("decode");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_percent_payload() {
        let bytes = decode_data_uri("data:text/plain,a%20b%ff").expect("decode");
        assert_eq!(bytes, vec![b'a', b' ', b'b', 0xFF]);
    }

    #[test]
    fn test_malformed() {
        assert!(decode_data_uri("https://example.com").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/png;base64,@@@").is_err());
        assert!(decode_data_uri("data:,%4").is_err());
        assert!(decode_data_uri("data:,%zz").is_err());
    }
}
