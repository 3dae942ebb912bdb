//! Wire shapes for the E-Key token and its DPoP proof.

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// The `typ` header value for an E-Key token.
pub const TOKEN_TYP: &str = "EKEY";
/// The `typ` header value for a DPoP proof (checked case-insensitively).
pub const DPOP_TYP: &str = "dpop+jwt";

/// How the token is bound to a client's proof of possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bind {
    DPoP,
    #[serde(rename = "mTLS")]
    MTls,
}

/// Compact-JWS header for an E-Key token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    pub bind: Bind,
}

impl TokenHeader {
    pub fn new(alg: ekey_crypto::Algorithm, bind: Bind) -> Self {
        TokenHeader { alg: alg.as_str().to_string(), typ: TOKEN_TYP.to_string(), bind }
    }
}

/// The `cnf.jkt` confirmation claim: a base64url SHA-256 thumbprint,
/// either of a JWK (DPoP) or a normalized cert fingerprint (mTLS).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cnf {
    pub jkt: String,
}

/// The signed claim set carried by an E-Key token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    pub cap: Capability,
    pub cnf: Cnf,
    pub trace: String,
}

/// DPoP proof header: carries the client's own public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopHeader {
    pub alg: String,
    pub typ: String,
    pub jwk: ekey_crypto::Jwk,
}

/// DPoP proof payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopPayload {
    /// HTTP method, uppercase.
    pub htm: String,
    /// `origin + pathname` of the target request, no query/fragment.
    pub htu: String,
    /// Unix seconds the proof was created.
    pub iat: u64,
    /// Must equal the token's `trace`.
    pub nonce: String,
    /// Unique proof identifier (anti-replay at the proof level is out of
    /// scope for this core; carried verbatim for forward compatibility).
    pub jti: String,
}
