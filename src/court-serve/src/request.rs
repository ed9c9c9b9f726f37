use serde_json::Value;

use crate::error::{DetectError, Result};

/// Pull the image bytes out of a handler request body. The frontend posts
/// `{"image": "<base64>", ...}`; older clients used a `"file"` key.
pub fn image_from_body(body: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(body)
        .map_err(|_| DetectError::InvalidInput("corpo da requisição não é UTF-8".to_owned()))?;

    let value: Value = serde_json::from_str(text.trim())
        .map_err(|_| DetectError::InvalidInput("corpo da requisição não é JSON".to_owned()))?;

    let encoded = value
        .get("image")
        .or_else(|| value.get("file"))
        .and_then(Value::as_str)
        .ok_or(DetectError::MissingImage)?;

    decode_base64_image(encoded)
}

/// Decode a base64 image payload, tolerating whitespace around it.
pub fn decode_base64_image(encoded: &str) -> Result<Vec<u8>> {
    Ok(base64::decode(encoded.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_key_is_decoded() {
        let body = br#"{"image":"aGVsbG8=","filename":"court.jpg"}"#;
        assert_eq!(image_from_body(body).unwrap(), b"hello");
    }

    #[test]
    fn legacy_file_key_is_accepted() {
        let body = br#"{"file":"aGVsbG8="}"#;
        assert_eq!(image_from_body(body).unwrap(), b"hello");
    }

    #[test]
    fn missing_payload_is_reported() {
        let err = image_from_body(br#"{"filename":"court.jpg"}"#).unwrap_err();
        match err {
            DetectError::MissingImage => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn non_json_body_is_invalid_input() {
        let err = image_from_body(b"not json at all").unwrap_err();
        match err {
            DetectError::InvalidInput(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn bad_base64_is_invalid_input() {
        let err = image_from_body(br#"{"image":"%%%"}"#).unwrap_err();
        match err {
            DetectError::InvalidInput(_) => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(decode_base64_image("  aGVsbG8=\n").unwrap(), b"hello");
        let body = b"  {\"image\":\"aGVsbG8=\"}  ";
        assert_eq!(image_from_body(body).unwrap(), b"hello");
    }
}
