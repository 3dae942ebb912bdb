//! base64url (no padding) helpers. Every JWS segment and JWK coordinate in
//! this crate uses this encoding.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(s)
}
