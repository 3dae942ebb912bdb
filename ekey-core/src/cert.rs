//! The mTLS-mode proof-of-possession collaborator: extracts a client
//! certificate fingerprint from an already-authenticated transport-layer
//! peer. Socket/handshake plumbing itself is out of scope for this core.

/// What an authenticated mTLS peer presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedCert {
    /// Normalized (lowercase, no `:`) hex SHA-256 fingerprint of the
    /// certificate DER.
    pub fingerprint: String,
    pub subject: Option<String>,
    pub spiffe_id: Option<String>,
}

/// Yields the presented client cert for the in-flight request, or `None`
/// if the peer wasn't authenticated via mTLS. Callers translate `None` to
/// `VerifierError::InvalidRequest`.
pub trait CertExtractor: Send + Sync {
    fn extract(&self) -> Option<PresentedCert>;
}

/// Normalize a raw fingerprint string (as commonly rendered with `:`
/// separators, e.g. from OpenSSL tooling) to the lowercase, colon-free form
/// `cnf.jkt` expects.
pub fn normalize_fingerprint(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ':')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compute the normalized SHA-256 fingerprint of a DER-encoded certificate.
pub fn fingerprint_cert_der(der: &[u8]) -> String {
    let digest = ekey_sha256::digest(der);
    ekey_hex::encode(digest.as_ref())
}

/// A fixed extractor, useful for tests and for the `mTLS` bind mode before
/// real socket plumbing is wired in.
pub struct StaticCertExtractor(pub Option<PresentedCert>);

impl CertExtractor for StaticCertExtractor {
    fn extract(&self) -> Option<PresentedCert> {
        self.0.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalize_strips_colons_and_lowercases() {
        assert_eq!(normalize_fingerprint("AB:CD:EF"), "abcdef");
        assert_eq!(normalize_fingerprint("abcdef"), "abcdef");
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let der = b"pretend-this-is-a-certificate-der";
        assert_eq!(fingerprint_cert_der(der), fingerprint_cert_der(der));
    }

    #[test]
    fn static_extractor_returns_configured_value() {
        let extractor = StaticCertExtractor(Some(PresentedCert {
            fingerprint: "abcd".to_string(),
            subject: None,
            spiffe_id: None,
        }));
        assert!(extractor.extract().is_some());

        let empty = StaticCertExtractor(None);
        assert!(empty.extract().is_none());
    }
}
