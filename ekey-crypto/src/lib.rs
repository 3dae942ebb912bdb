//! Signing, JWK, and compact-JWS primitives backing the E-Key issuer and
//! verifier. Depends only on `ring` for cryptography; deliberately has no
//! opinion about claim shapes, which live in `ekey-core`.

pub mod b64;
pub mod jwk;
pub mod jws;
pub mod keypair;

pub use jwk::{Jwk, ThumbprintError, thumbprint};
pub use keypair::{Algorithm, KeyError, KeyPair, Signature, UnknownAlgorithm, VerifyError, verify};
