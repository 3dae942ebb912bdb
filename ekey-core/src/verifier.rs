//! The verifier state machine: the hard engineering of this crate.
//!
//! [`Verifier::verify`] implements the spec's check order exactly, each step
//! short-circuiting the rest: presence, signature + standard claims,
//! capability presence, action alignment, trace presence, usage
//! consumption, PoP verification, audit. Usage is consumed *before* PoP
//! verification so a replay is rejected even when the replayer also crafts
//! a bad proof — see `DESIGN.md` for the tradeoff this encodes.

use std::sync::Arc;

use ekey_crypto::jws;

use crate::{
    audit::{AuditEvent, AuditOutcome, AuditSink},
    capability::Capability,
    cert::CertExtractor,
    claims::{Bind, PopHeader, PopPayload, TokenHeader, TokenPayload, DPOP_TYP},
    clock::Clock,
    config::EKeyConfig,
    error::{UsageStoreError, VerifierError},
    keyprovider::KeyProvider,
    usage_store::UsageStore,
};

/// What the resource server hands the verifier for an inbound protected
/// request.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub token: Option<String>,
    pub pop: Option<String>,
    pub method: String,
    /// Absolute request URL; only `origin` and `pathname` are consulted.
    pub url: http::Uri,
}

/// The claims a successful verification admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub sub: String,
    pub aud: String,
    pub cap: Capability,
    pub trace: String,
}

pub struct Verifier {
    key_provider: Arc<dyn KeyProvider>,
    usage_store: Arc<dyn UsageStore>,
    audit_sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
    cert_extractor: Option<Arc<dyn CertExtractor>>,
    config: EKeyConfig,
}

impl Verifier {
    pub fn new(
        key_provider: Arc<dyn KeyProvider>,
        usage_store: Arc<dyn UsageStore>,
        audit_sink: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        cert_extractor: Option<Arc<dyn CertExtractor>>,
        config: EKeyConfig,
    ) -> Self {
        Verifier { key_provider, usage_store, audit_sink, clock, cert_extractor, config }
    }

    pub async fn verify(&self, req: VerifyRequest) -> Result<VerificationResult, VerifierError> {
        // --- 1. Presence --- //
        let token = req.token.ok_or_else(|| VerifierError::InvalidRequest("missing token".to_string()))?;

        let parts = jws::split(&token)
            .map_err(|e| VerifierError::InvalidRequest(format!("malformed token: {e}")))?;
        let header_bytes = ekey_crypto::b64::decode(parts.header_b64)
            .map_err(|_| VerifierError::InvalidToken("header is not valid base64url".to_string()))?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes)
            .map_err(|_| VerifierError::InvalidToken("header is not valid JSON".to_string()))?;

        if header.bind == Bind::DPoP && req.pop.is_none() {
            return Err(VerifierError::InvalidRequest("missing DPoP proof".to_string()));
        }

        // --- 2. Token signature + standard claims --- //
        let payload_bytes = ekey_crypto::b64::decode(parts.payload_b64)
            .map_err(|_| VerifierError::InvalidToken("payload is not valid base64url".to_string()))?;
        let payload: TokenPayload = serde_json::from_slice(&payload_bytes)
            .map_err(|_| VerifierError::InvalidToken("payload is not valid JSON".to_string()))?;
        let signature = ekey_crypto::b64::decode(parts.signature_b64)
            .map_err(|_| VerifierError::InvalidToken("signature is not valid base64url".to_string()))?;

        // Pin verification to the provider's own fixed algorithm rather
        // than trusting the attacker-controlled `alg` header; a token
        // whose header disagrees is rejected outright (classic alg
        // confusion avoidance).
        let alg = self.key_provider.algorithm();
        if header.alg != alg.as_str() {
            return Err(VerifierError::InvalidToken("alg does not match key provider".to_string()));
        }
        let signing_input = jws::signing_input(parts.header_b64, parts.payload_b64);
        ekey_crypto::verify(alg, &self.key_provider.public_jwk(), &signing_input, &signature)
            .map_err(|_| VerifierError::InvalidToken("bad signature".to_string()))?;

        if payload.iss != self.config.issuer_url {
            return Err(VerifierError::InvalidToken("iss mismatch".to_string()));
        }
        if payload.aud != self.config.audience {
            return Err(VerifierError::InvalidToken("aud mismatch".to_string()));
        }

        let now = self.clock.now();
        let tolerance = self.config.clock_tolerance_seconds;
        if now > payload.exp + tolerance {
            return Err(VerifierError::ExpiredToken);
        }

        // --- 3. Capability presence --- //
        let action = payload
            .cap
            .parsed_action()
            .map_err(|e| VerifierError::InvalidToken(format!("malformed cap.action: {e}")))?;

        // --- 4. Action alignment --- //
        let request_method = req.method.to_ascii_uppercase();
        let request_path = req.url.path();
        if request_method != action.method || request_path != action.path {
            self.audit(&payload, AuditOutcome::CapMismatch, None).await;
            return Err(VerifierError::CapabilityMismatch);
        }

        // --- 5. Trace presence --- //
        if payload.trace.is_empty() {
            return Err(VerifierError::InvalidToken("missing trace".to_string()));
        }

        // --- 6. Usage consumption --- //
        match self
            .usage_store
            .consume(&payload.trace, payload.cap.limit, payload.exp, now)
            .await
        {
            Ok(()) => {}
            Err(UsageStoreError::TokenExpired) => {
                self.audit(&payload, AuditOutcome::Expired, None).await;
                return Err(VerifierError::ExpiredToken);
            }
            Err(UsageStoreError::LimitExhausted) => {
                self.audit(&payload, AuditOutcome::ReplayBlocked, None).await;
                return Err(VerifierError::ReplayDetected);
            }
        }

        // --- 7. PoP verification --- //
        if let Err(e) = self.verify_pop(&header, &payload, &req).await {
            let outcome = match e {
                VerifierError::InvalidRequest(_) => AuditOutcome::Rejected,
                _ => AuditOutcome::InvalidProof,
            };
            self.audit(&payload, outcome, Some(e.to_string())).await;
            return Err(e);
        }

        // --- 8. Audit + result --- //
        self.audit(&payload, AuditOutcome::Allowed, None).await;
        Ok(VerificationResult {
            sub: payload.sub,
            aud: payload.aud,
            cap: payload.cap,
            trace: payload.trace,
        })
    }

    async fn verify_pop(
        &self,
        header: &TokenHeader,
        payload: &TokenPayload,
        req: &VerifyRequest,
    ) -> Result<(), VerifierError> {
        match header.bind {
            Bind::DPoP => {
                let pop = req.pop.as_ref().expect("presence already checked in step 1");
                let parts = jws::split(pop)
                    .map_err(|e| VerifierError::InvalidProof(format!("malformed proof: {e}")))?;

                let pop_header_bytes = ekey_crypto::b64::decode(parts.header_b64)
                    .map_err(|_| VerifierError::InvalidProof("bad proof header encoding".to_string()))?;
                let pop_header: PopHeader = serde_json::from_slice(&pop_header_bytes)
                    .map_err(|_| VerifierError::InvalidProof("bad proof header".to_string()))?;
                if !pop_header.typ.eq_ignore_ascii_case(DPOP_TYP) {
                    return Err(VerifierError::InvalidProof("unexpected proof typ".to_string()));
                }

                let pop_payload_bytes = ekey_crypto::b64::decode(parts.payload_b64)
                    .map_err(|_| VerifierError::InvalidProof("bad proof payload encoding".to_string()))?;
                let pop_payload: PopPayload = serde_json::from_slice(&pop_payload_bytes)
                    .map_err(|_| VerifierError::InvalidProof("bad proof payload".to_string()))?;
                let pop_signature = ekey_crypto::b64::decode(parts.signature_b64)
                    .map_err(|_| VerifierError::InvalidProof("bad proof signature encoding".to_string()))?;

                let pop_alg: ekey_crypto::Algorithm = pop_header
                    .alg
                    .parse()
                    .map_err(|_| VerifierError::InvalidProof("unknown proof alg".to_string()))?;
                let signing_input = jws::signing_input(parts.header_b64, parts.payload_b64);
                ekey_crypto::verify(pop_alg, &pop_header.jwk, &signing_input, &pop_signature)
                    .map_err(|_| VerifierError::InvalidProof("bad proof signature".to_string()))?;

                if pop_payload.htm.to_ascii_uppercase() != req.method.to_ascii_uppercase() {
                    return Err(VerifierError::InvalidProof("htm mismatch".to_string()));
                }
                let canonical_htu = canonical_origin_and_path(&req.url);
                if pop_payload.htu != canonical_htu {
                    return Err(VerifierError::InvalidProof("htu mismatch".to_string()));
                }
                if pop_payload.nonce != payload.trace {
                    return Err(VerifierError::InvalidProof("nonce does not match trace".to_string()));
                }
                let tolerance = self.config.clock_tolerance_seconds;
                let now = self.clock.now();
                if now.abs_diff(pop_payload.iat) > tolerance {
                    return Err(VerifierError::InvalidProof("proof iat outside tolerance".to_string()));
                }

                if payload.cnf.jkt.is_empty() {
                    return Err(VerifierError::InvalidToken("missing cnf.jkt".to_string()));
                }
                let computed_jkt = ekey_crypto::thumbprint(&pop_header.jwk)
                    .map_err(|_| VerifierError::InvalidProof("unsupported jwk kty".to_string()))?;
                if computed_jkt != payload.cnf.jkt {
                    return Err(VerifierError::InvalidProof("jkt mismatch".to_string()));
                }
                Ok(())
            }
            Bind::MTls => {
                let extractor = self
                    .cert_extractor
                    .as_ref()
                    .ok_or_else(|| VerifierError::InvalidRequest("no mTLS peer available".to_string()))?;
                let presented = extractor
                    .extract()
                    .ok_or_else(|| VerifierError::InvalidRequest("no client certificate presented".to_string()))?;
                if presented.fingerprint != payload.cnf.jkt {
                    return Err(VerifierError::InvalidProof("certificate fingerprint mismatch".to_string()));
                }
                Ok(())
            }
        }
    }

    async fn audit(&self, payload: &TokenPayload, outcome: AuditOutcome, reason: Option<String>) {
        self.audit_sink
            .record(AuditEvent {
                sub: Some(payload.sub.clone()),
                trace: Some(payload.trace.clone()),
                outcome,
                reason,
                timestamp: self.clock.now(),
            })
            .await;
    }
}

/// `origin + pathname`: scheme, authority, and path, dropping any query.
fn canonical_origin_and_path(url: &http::Uri) -> String {
    let scheme = url.scheme_str().unwrap_or("https");
    let authority = url.authority().map(|a| a.as_str()).unwrap_or("");
    format!("{scheme}://{authority}{}", url.path())
}
