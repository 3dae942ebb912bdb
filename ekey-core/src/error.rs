//! Typed error taxonomies for the issuer and verifier. Each error carries a
//! fieldless `kind()` for HTTP-status mapping and logging, and never carries
//! sensitive bytes (signatures, private keys, full tokens) in its `Display`.

use thiserror::Error;

/// Issuer-side error kinds, from the spec's §7 issuer taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuerErrorKind {
    InvalidRequest,
    InvalidBinding,
    SignerFailure,
}

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("invalid issuance request: {0}")]
    InvalidRequest(String),
    #[error("invalid binding: {0}")]
    InvalidBinding(String),
    #[error("signer failure")]
    SignerFailure,
}

impl IssuerError {
    pub fn kind(&self) -> IssuerErrorKind {
        match self {
            IssuerError::InvalidRequest(_) => IssuerErrorKind::InvalidRequest,
            IssuerError::InvalidBinding(_) => IssuerErrorKind::InvalidBinding,
            IssuerError::SignerFailure => IssuerErrorKind::SignerFailure,
        }
    }
}

/// Verifier-side error kinds, from the spec's §7 verifier taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierErrorKind {
    InvalidRequest,
    InvalidToken,
    ExpiredToken,
    CapabilityMismatch,
    ReplayDetected,
    InvalidProof,
}

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("expired token")]
    ExpiredToken,
    #[error("capability mismatch")]
    CapabilityMismatch,
    #[error("replay detected")]
    ReplayDetected,
    #[error("invalid proof of possession: {0}")]
    InvalidProof(String),
}

impl VerifierError {
    pub fn kind(&self) -> VerifierErrorKind {
        match self {
            VerifierError::InvalidRequest(_) => VerifierErrorKind::InvalidRequest,
            VerifierError::InvalidToken(_) => VerifierErrorKind::InvalidToken,
            VerifierError::ExpiredToken => VerifierErrorKind::ExpiredToken,
            VerifierError::CapabilityMismatch => VerifierErrorKind::CapabilityMismatch,
            VerifierError::ReplayDetected => VerifierErrorKind::ReplayDetected,
            VerifierError::InvalidProof(_) => VerifierErrorKind::InvalidProof,
        }
    }

    /// The audit outcome string associated with this error, for steps ≥ 5
    /// of the verifier's check order.
    pub fn audit_outcome(&self) -> &'static str {
        match self {
            VerifierError::InvalidRequest(_) | VerifierError::InvalidToken(_) => "invalid",
            VerifierError::ExpiredToken => "expired",
            VerifierError::CapabilityMismatch => "cap_mismatch",
            VerifierError::ReplayDetected => "replay_blocked",
            VerifierError::InvalidProof(_) => "invalid_proof",
        }
    }
}

/// `UsageStore::consume` outcomes other than success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageStoreError {
    #[error("token expired")]
    TokenExpired,
    #[error("usage limit exhausted")]
    LimitExhausted,
}
