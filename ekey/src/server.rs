//! The demo HTTP layer: a thin `axum` router over [`ekey_core::Issuer`] and
//! [`ekey_core::Verifier`]. Real deployments are expected to embed those
//! types directly into their own resource-server routing rather than run
//! this binary as-is.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use ekey_core::{
    AuditSink, CertExtractor, ChannelAuditSink, Clock, EKeyConfig, InMemoryUsageStore,
    IssueRequest, Issuer, KeyProvider, SystemClock, TokenResponse, Verifier, VerifyRequest,
};

use crate::{
    api::{ApiError, VerifyApiRequest, VerifyApiResponse},
    cli::ServeCommand,
};

struct AppState {
    issuer: Issuer,
    verifier: Verifier,
}

pub async fn serve(cmd: ServeCommand) -> anyhow::Result<()> {
    let issuer_url = cmd
        .issuer_url
        .or_else(|| std::env::var("ISSUER_URL").ok())
        .unwrap_or_else(|| "https://issuer.example.com".to_string());
    let audience = cmd.audience.unwrap_or_else(|| "https://api.example.com".to_string());
    let signing_alg: ekey_crypto::Algorithm = cmd
        .signing_alg
        .or_else(|| std::env::var("SIGNING_ALG").ok())
        .as_deref()
        .unwrap_or("ES256")
        .to_ascii_uppercase()
        .parse()
        .unwrap_or(ekey_crypto::Algorithm::Es256);

    let key_provider: Arc<dyn KeyProvider> = Arc::new(match signing_alg {
        ekey_crypto::Algorithm::Es256 => ekey_crypto::KeyPair::generate_es256()?,
        ekey_crypto::Algorithm::EdDsa => ekey_crypto::KeyPair::generate_ed25519()?,
    });
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let config = EKeyConfig::new(issuer_url, audience);

    let usage_store = InMemoryUsageStore::new(
        std::num::NonZeroUsize::new(config.usage_store_capacity)
            .unwrap_or(ekey_core::usage_store::default_capacity()),
    );
    let _eviction_task = usage_store.spawn_eviction_loop(clock.clone(), std::time::Duration::from_secs(30));

    // Every event is already logged via `tracing` inside the sink; the
    // channel exists for callers who want to tail it live. The demo server
    // has no such caller, so the receiving end is dropped immediately.
    let (audit_sink, audit_rx) = ChannelAuditSink::new(256);
    drop(audit_rx);
    let audit_sink: Arc<dyn AuditSink> = Arc::new(audit_sink);

    let cert_extractor: Option<Arc<dyn CertExtractor>> = None;

    let issuer = Issuer::new(key_provider.clone(), clock.clone(), config.clone());
    let verifier = Verifier::new(key_provider, usage_store, audit_sink, clock, cert_extractor, config);
    let state = Arc::new(AppState { issuer, verifier });

    let app = Router::new()
        .route("/health", get(health))
        .route("/token", post(issue_token))
        .route("/verify", post(verify_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(cmd.listen_addr).await?;
    tracing::info!(addr = %cmd.listen_addr, "ekey demo server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

#[tracing::instrument(skip_all, name = "(issue)")]
async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueRequest>,
) -> Result<(axum::http::StatusCode, Json<TokenResponse>), ApiError> {
    let resp = state.issuer.issue(req)?;
    Ok((axum::http::StatusCode::CREATED, Json(resp)))
}

#[tracing::instrument(skip_all, name = "(verify)")]
async fn verify_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyApiRequest>,
) -> Result<Json<VerifyApiResponse>, ApiError> {
    let url: http::Uri = req
        .url
        .parse()
        .map_err(|_| ApiError::BadRequest("url is not a valid absolute URI".to_string()))?;
    let result = state
        .verifier
        .verify(VerifyRequest { token: req.token, pop: req.pop, method: req.method, url })
        .await?;
    Ok(Json(VerifyApiResponse {
        sub: result.sub,
        aud: result.aud,
        cap: result.cap,
        trace: result.trace,
    }))
}

/// Only used by [`serve`]'s default `listen_addr`, kept here rather than in
/// `cli.rs` so `argh`'s default expression stays a single identifier.
pub fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().expect("valid hardcoded socket addr")
}
