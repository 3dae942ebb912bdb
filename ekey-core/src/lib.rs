//! Issuer and verifier state machines for ephemeral, proof-bound E-Key
//! tokens, plus the collaborator traits (`KeyProvider`, `UsageStore`,
//! `AuditSink`, `Clock`, `CertExtractor`) they're built against.

pub mod audit;
pub mod capability;
pub mod cert;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod issuer;
pub mod keyprovider;
pub mod usage_store;
pub mod verifier;

pub use audit::{AuditEvent, AuditOutcome, AuditSink, ChannelAuditSink, NoopAuditSink};
pub use capability::{Action, ActionError, Capability, CapabilityError};
pub use cert::{CertExtractor, PresentedCert, StaticCertExtractor};
pub use claims::{Bind, Cnf, TokenHeader, TokenPayload};
pub use clock::{Clock, SystemClock, TestClock};
pub use config::EKeyConfig;
pub use error::{IssuerError, IssuerErrorKind, UsageStoreError, VerifierError, VerifierErrorKind};
pub use issuer::{IssueRequest, Issuer, TokenResponse};
pub use keyprovider::KeyProvider;
pub use usage_store::{InMemoryUsageStore, UsageStore};
pub use verifier::{VerificationResult, Verifier, VerifyRequest};
