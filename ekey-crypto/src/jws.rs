//! Generic compact-JWS assembly and parsing. This crate doesn't know the
//! shape of any particular header/payload — callers serialize their own
//! claim types to JSON and hand the bytes here.

use crate::b64;

/// The three base64url segments of a parsed compact JWS, still encoded.
#[derive(Debug, Clone, Copy)]
pub struct CompactParts<'a> {
    pub header_b64: &'a str,
    pub payload_b64: &'a str,
    pub signature_b64: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("compact JWS must have exactly three dot-separated segments")]
    WrongSegmentCount,
}

/// Split `compact` into its three segments without decoding them.
pub fn split(compact: &str) -> Result<CompactParts<'_>, ParseError> {
    let mut parts = compact.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::WrongSegmentCount);
    };
    Ok(CompactParts { header_b64, payload_b64, signature_b64 })
}

/// The exact bytes that were (or must be) signed for a compact JWS: the
/// ASCII `header_b64 + "." + payload_b64`.
pub fn signing_input(header_b64: &str, payload_b64: &str) -> Vec<u8> {
    let mut input = Vec::with_capacity(header_b64.len() + 1 + payload_b64.len());
    input.extend_from_slice(header_b64.as_bytes());
    input.push(b'.');
    input.extend_from_slice(payload_b64.as_bytes());
    input
}

/// Assemble a compact JWS from raw JSON header/payload bytes and a raw
/// signature.
pub fn assemble(header_json: &[u8], payload_json: &[u8], signature: &[u8]) -> String {
    let header_b64 = b64::encode(header_json);
    let payload_b64 = b64::encode(payload_json);
    let signature_b64 = b64::encode(signature);
    format!("{header_b64}.{payload_b64}.{signature_b64}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn split_roundtrips_with_assemble() {
        let compact = assemble(br#"{"a":1}"#, br#"{"b":2}"#, b"sig-bytes");
        let parts = split(&compact).unwrap();
        assert_eq!(b64::decode(parts.header_b64).unwrap(), br#"{"a":1}"#);
        assert_eq!(b64::decode(parts.payload_b64).unwrap(), br#"{"b":2}"#);
        assert_eq!(b64::decode(parts.signature_b64).unwrap(), b"sig-bytes");
    }

    #[test]
    fn wrong_segment_count_rejected() {
        assert_eq!(split("a.b"), Err(ParseError::WrongSegmentCount));
        assert_eq!(split("a.b.c.d"), Err(ParseError::WrongSegmentCount));
    }

    #[test]
    fn signing_input_matches_what_verifiers_expect() {
        let input = signing_input("AAA", "BBB");
        assert_eq!(input, b"AAA.BBB");
    }
}
