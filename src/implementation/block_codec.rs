//! The block codec (spec §4.A): stateless UTF-8 encode/decode of a single
//! character block. Boundary alignment is the ingestion engine's
//! responsibility; this module never sees anything but whole, aligned
//! blocks.

use crate::api::error::CodecError;

/// Encodes a block of characters to its UTF-8 byte representation.
pub fn encode(chars: &str) -> Vec<u8> {
    chars.as_bytes().to_vec()
}

/// Decodes a byte range back into characters.
///
/// The caller must guarantee `bytes` is a complete, character-aligned UTF-8
/// sequence (i.e. exactly the bytes a prior `encode` produced for some
/// block, read back unmodified). Data files only ever contain bytes written
/// by `encode`, so a failure here means the data file is corrupt.
pub fn decode(bytes: &[u8]) -> Result<String, CodecError> {
    Ok(std::str::from_utf8(bytes)?.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ascii() {
        let s = "hello";
        assert_eq!(decode(&encode(s)).unwrap(), s);
    }

    #[test]
    fn round_trips_multibyte() {
        let s = "héllo, 世界";
        let encoded = encode(s);
        assert_eq!(encoded.len(), s.len());
        assert_eq!(decode(&encoded).unwrap(), s);
    }

    #[test]
    fn round_trips_empty() {
        assert_eq!(decode(&encode("")).unwrap(), "");
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let bad = vec![0xFF, 0xFE];
        assert!(decode(&bad).is_err());
    }
}
