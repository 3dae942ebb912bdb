//! Verifier/issuer configuration, shared by both the library API and the
//! CLI bootstrap layer in the `ekey` binary.
//!
//! The signing algorithm is deliberately not a config field: it's owned by
//! whichever [`crate::keyprovider::KeyProvider`] is injected, and the
//! verifier always pins to `key_provider.algorithm()` rather than reading a
//! second, independently-settable source of truth.

pub const DEFAULT_CLOCK_TOLERANCE_SECONDS: u64 = 5;
pub const DEFAULT_MAX_TTL_SECONDS: u64 = 60;
pub const DEFAULT_MAX_LIMIT: u32 = 10;
pub const DEFAULT_USAGE_STORE_CAPACITY: usize = 10_000;

#[derive(Debug, Clone)]
pub struct EKeyConfig {
    pub issuer_url: String,
    pub audience: String,
    pub clock_tolerance_seconds: u64,
    pub max_ttl_seconds: u64,
    pub max_limit: u32,
    pub usage_store_capacity: usize,
}

impl EKeyConfig {
    pub fn new(issuer_url: impl Into<String>, audience: impl Into<String>) -> Self {
        EKeyConfig {
            issuer_url: issuer_url.into(),
            audience: audience.into(),
            clock_tolerance_seconds: DEFAULT_CLOCK_TOLERANCE_SECONDS,
            max_ttl_seconds: DEFAULT_MAX_TTL_SECONDS,
            max_limit: DEFAULT_MAX_LIMIT,
            usage_store_capacity: DEFAULT_USAGE_STORE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EKeyConfig::new("https://issuer.example.com", "https://api.example.com");
        assert_eq!(cfg.clock_tolerance_seconds, 5);
        assert_eq!(cfg.max_ttl_seconds, 60);
        assert_eq!(cfg.max_limit, 10);
        assert_eq!(cfg.usage_store_capacity, 10_000);
    }
}
