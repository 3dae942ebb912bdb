//! The issuer state machine: validates a request, derives the PoP binding,
//! mints a signed compact-JWS token.

use std::sync::Arc;

use ekey_crypto::{Jwk, jws};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::{
    capability::Capability,
    cert::normalize_fingerprint,
    claims::{Bind, Cnf, TokenHeader, TokenPayload},
    clock::Clock,
    config::EKeyConfig,
    error::IssuerError,
    keyprovider::KeyProvider,
};

/// Default token TTL when a request doesn't specify one.
pub const DEFAULT_TTL_SECONDS: u64 = 60;

/// Length in bytes of the random `trace` nonce (128 bits).
const TRACE_BYTES: usize = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct IssueRequest {
    pub sub: String,
    pub aud: String,
    pub cap: Capability,
    #[serde(default = "default_ttl")]
    pub ttl: u64,
    #[serde(default = "default_bind")]
    pub bind: Bind,
    #[serde(default)]
    pub jwk: Option<Jwk>,
    #[serde(default)]
    pub cert_fingerprint: Option<String>,
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_bind() -> Bind {
    Bind::DPoP
}

impl IssueRequest {
    /// Convenience constructor for the common DPoP case, using the spec's
    /// default `ttl` and `bind`.
    pub fn dpop(sub: impl Into<String>, aud: impl Into<String>, cap: Capability, jwk: Jwk) -> Self {
        IssueRequest {
            sub: sub.into(),
            aud: aud.into(),
            cap,
            ttl: DEFAULT_TTL_SECONDS,
            bind: Bind::DPoP,
            jwk: Some(jwk),
            cert_fingerprint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub trace: String,
    pub expires_at: u64,
    pub expires_in: u64,
    pub cnf: Cnf,
}

/// Mints signed E-Key tokens. Holds only read-only/shared collaborators, so
/// it's cheap to clone (wrap in `Arc`) across request handlers.
pub struct Issuer {
    key_provider: Arc<dyn KeyProvider>,
    clock: Arc<dyn Clock>,
    config: EKeyConfig,
}

impl Issuer {
    pub fn new(key_provider: Arc<dyn KeyProvider>, clock: Arc<dyn Clock>, config: EKeyConfig) -> Self {
        Issuer { key_provider, clock, config }
    }

    pub fn issue(&self, req: IssueRequest) -> Result<TokenResponse, IssuerError> {
        if req.sub.is_empty() {
            return Err(IssuerError::InvalidRequest("sub must not be empty".to_string()));
        }
        if req.aud.is_empty() {
            return Err(IssuerError::InvalidRequest("aud must not be empty".to_string()));
        }
        req.cap
            .validate(self.config.max_limit)
            .map_err(|e| IssuerError::InvalidRequest(e.to_string()))?;
        if req.ttl < 1 || req.ttl > self.config.max_ttl_seconds {
            return Err(IssuerError::InvalidRequest(format!(
                "ttl must be in [1, {}]",
                self.config.max_ttl_seconds
            )));
        }

        let jkt = match req.bind {
            Bind::DPoP => {
                let jwk = req
                    .jwk
                    .as_ref()
                    .ok_or_else(|| IssuerError::InvalidBinding("jwk is required for DPoP".to_string()))?;
                ekey_crypto::thumbprint(jwk)
                    .map_err(|e| IssuerError::InvalidBinding(e.to_string()))?
            }
            Bind::MTls => {
                let fp = req.cert_fingerprint.as_deref().ok_or_else(|| {
                    IssuerError::InvalidBinding("cert_fingerprint is required for mTLS".to_string())
                })?;
                normalize_fingerprint(fp)
            }
        };

        let now = self.clock.now();
        let exp = now + req.ttl;
        let trace = generate_trace();

        let header = TokenHeader::new(self.key_provider.algorithm(), req.bind);
        let payload = TokenPayload {
            iss: self.config.issuer_url.clone(),
            sub: req.sub,
            aud: req.aud,
            iat: now,
            exp,
            cap: req.cap,
            cnf: Cnf { jkt: jkt.clone() },
            trace: trace.clone(),
        };

        let header_json =
            serde_json::to_vec(&header).expect("TokenHeader serialization is infallible");
        let payload_json =
            serde_json::to_vec(&payload).expect("TokenPayload serialization is infallible");
        let header_b64 = ekey_crypto::b64::encode(&header_json);
        let payload_b64 = ekey_crypto::b64::encode(&payload_json);
        let signing_input = jws::signing_input(&header_b64, &payload_b64);

        let signature = self
            .key_provider
            .sign(&signing_input)
            .map_err(|_| IssuerError::SignerFailure)?;

        let token = format!(
            "{header_b64}.{payload_b64}.{}",
            ekey_crypto::b64::encode(&signature.0)
        );

        Ok(TokenResponse { token, trace, expires_at: exp, expires_in: req.ttl, cnf: Cnf { jkt } })
    }
}

fn generate_trace() -> String {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; TRACE_BYTES];
    rng.fill(&mut bytes).expect("system RNG failure");
    ekey_hex::encode(&bytes)
}
