//! Structured outcome events, optional and fire-and-forget.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// The outcome of a single `verify` call, for audit/observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Allowed,
    ReplayBlocked,
    Expired,
    CapMismatch,
    InvalidProof,
    /// Rejected for a reason outside the spec's five named outcomes: either
    /// before a `trace` was even known (steps 1-4) or a missing mTLS peer
    /// at the PoP step (no certificate to even compare a fingerprint
    /// against). Still worth recording.
    Rejected,
}

impl AuditOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOutcome::Allowed => "allowed",
            AuditOutcome::ReplayBlocked => "replay_blocked",
            AuditOutcome::Expired => "expired",
            AuditOutcome::CapMismatch => "cap_mismatch",
            AuditOutcome::InvalidProof => "invalid_proof",
            AuditOutcome::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub sub: Option<String>,
    pub trace: Option<String>,
    pub outcome: AuditOutcome,
    pub reason: Option<String>,
    pub timestamp: u64,
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record `event`. Implementations MUST NOT propagate failures into the
    /// verifier's return path; swallow and log instead.
    async fn record(&self, event: AuditEvent);
}

/// Discards every event. Useful for tests that don't care about audit
/// output.
#[derive(Debug, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::trace!(?event, "audit event (noop sink)");
    }
}

/// Logs every event via `tracing` and, best-effort, forwards it onto an
/// `mpsc` channel so a demo binary can tail audit events live. The channel
/// send is fire-and-forget: a full or disconnected channel is not an error.
pub struct ChannelAuditSink {
    tx: mpsc::Sender<AuditEvent>,
}

impl ChannelAuditSink {
    /// Returns the sink plus the receiving end of its channel.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<AuditEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (ChannelAuditSink { tx }, rx)
    }
}

#[async_trait]
impl AuditSink for ChannelAuditSink {
    async fn record(&self, event: AuditEvent) {
        match event.outcome {
            AuditOutcome::Allowed => {
                tracing::info!(sub = ?event.sub, trace = ?event.trace, "e-key verified")
            }
            _ => {
                tracing::warn!(
                    outcome = event.outcome.as_str(),
                    sub = ?event.sub,
                    trace = ?event.trace,
                    reason = ?event.reason,
                    "e-key rejected"
                )
            }
        }
        // Fire-and-forget: a dropped receiver or full buffer is fine.
        let _ = self.tx.try_send(event);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn channel_sink_forwards_events() {
        let (sink, mut rx) = ChannelAuditSink::new(4);
        sink.record(AuditEvent {
            sub: Some("agent-1".to_string()),
            trace: Some("deadbeef".to_string()),
            outcome: AuditOutcome::Allowed,
            reason: None,
            timestamp: 1_000,
        })
        .await;
        let event = rx.try_recv().unwrap();
        assert_eq!(event.outcome, AuditOutcome::Allowed);
    }

    #[tokio::test]
    async fn channel_sink_does_not_error_on_dropped_receiver() {
        let (sink, rx) = ChannelAuditSink::new(1);
        drop(rx);
        sink.record(AuditEvent {
            sub: None,
            trace: None,
            outcome: AuditOutcome::Rejected,
            reason: None,
            timestamp: 0,
        })
        .await;
    }
}
