//! JSON wire shapes and the `IntoResponse` mapping for the demo HTTP layer.
//!
//! Kept separate from `ekey-core`'s own error types so the core stays
//! transport-agnostic; this module is the only place that knows about
//! `axum`.

use axum::{Json, http::StatusCode, response::IntoResponse};
use ekey_core::{Capability, IssuerError, IssuerErrorKind, VerifierError, VerifierErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct VerifyApiRequest {
    pub token: Option<String>,
    pub pop: Option<String>,
    pub method: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyApiResponse {
    pub sub: String,
    pub aud: String,
    pub cap: Capability,
    pub trace: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Wraps every error this service can hand back over HTTP, mapping each to
/// a status code the way the teacher's `ApiError`/`ToHttpStatus` pair does,
/// simplified here to one service's worth of kinds.
pub enum ApiError {
    Issuer(IssuerError),
    Verifier(VerifierError),
    BadRequest(String),
}

impl From<IssuerError> for ApiError {
    fn from(e: IssuerError) -> Self {
        ApiError::Issuer(e)
    }
}

impl From<VerifierError> for ApiError {
    fn from(e: VerifierError) -> Self {
        ApiError::Verifier(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Issuer(e) => match e.kind() {
                IssuerErrorKind::InvalidRequest | IssuerErrorKind::InvalidBinding => {
                    StatusCode::BAD_REQUEST
                }
                IssuerErrorKind::SignerFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Verifier(e) => match e.kind() {
                VerifierErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                VerifierErrorKind::InvalidToken
                | VerifierErrorKind::ExpiredToken
                | VerifierErrorKind::CapabilityMismatch
                | VerifierErrorKind::ReplayDetected => StatusCode::FORBIDDEN,
                VerifierErrorKind::InvalidProof => StatusCode::UNAUTHORIZED,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::Issuer(e) => match e.kind() {
                IssuerErrorKind::InvalidRequest => "invalid_request",
                IssuerErrorKind::InvalidBinding => "invalid_binding",
                IssuerErrorKind::SignerFailure => "signer_failure",
            },
            ApiError::Verifier(e) => match e.kind() {
                VerifierErrorKind::InvalidRequest => "invalid_request",
                VerifierErrorKind::InvalidToken => "invalid_token",
                VerifierErrorKind::ExpiredToken => "expired_token",
                VerifierErrorKind::CapabilityMismatch => "capability_mismatch",
                VerifierErrorKind::ReplayDetected => "replay_detected",
                VerifierErrorKind::InvalidProof => "invalid_proof",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self_display(&self), "internal error handling request");
        } else {
            tracing::warn!(error = %self_display(&self), "request rejected");
        }
        let body = ErrorBody { error: self.code(), message: self_display(&self) };
        (status, Json(body)).into_response()
    }
}

fn self_display(e: &ApiError) -> String {
    match e {
        ApiError::BadRequest(msg) => msg.clone(),
        ApiError::Issuer(e) => e.to_string(),
        ApiError::Verifier(e) => e.to_string(),
    }
}
