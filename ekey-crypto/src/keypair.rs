//! Issuer-side and verifier-side keypairs.
//!
//! Two algorithms are supported, selected once per [`KeyPair`] instance:
//! ES256 (P-256 ECDSA, [RFC 7518 §3.4]) and EdDSA (Ed25519, [RFC 8037]).
//! Both produce JWS-compatible fixed-length signatures rather than the
//! ASN.1-DER encoding TLS code tends to reach for.
//!
//! [RFC 7518 §3.4]: https://www.rfc-editor.org/rfc/rfc7518#section-3.4
//! [RFC 8037]: https://www.rfc-editor.org/rfc/rfc8037

use ring::{
    rand::SystemRandom,
    signature::{
        self, Ed25519KeyPair, EcdsaKeyPair, KeyPair as _,
        ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING, ED25519,
    },
};
use secrecy::{ExposeSecret, SecretVec};

use crate::jwk::Jwk;

/// The signing algorithm a [`KeyProvider`](crate::KeyProvider) is fixed to
/// for its process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Es256,
    EdDsa,
}

impl Algorithm {
    /// The `alg` header value per RFC 7518.
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Es256 => "ES256",
            Algorithm::EdDsa => "EdDSA",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ES256" => Ok(Algorithm::Es256),
            "EdDSA" => Ok(Algorithm::EdDsa),
            _ => Err(UnknownAlgorithm),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown or unsupported signing algorithm")]
pub struct UnknownAlgorithm;

/// A raw signature, algorithm-specific fixed length (64 bytes for both
/// ES256 and EdDSA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(pub Vec<u8>);

/// Errors constructing or using a [`KeyPair`].
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to generate key material")]
    GenerationFailed,
    #[error("pkcs8 key material was rejected: {0}")]
    Rejected(String),
    #[error("signing operation failed")]
    SigningFailed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("signature verification failed")]
pub struct VerifyError;

/// An issuer signing keypair. `ring` doesn't expose private key material
/// after construction, so the PKCS8 document used to build the keypair is
/// retained alongside it (wrapped in `secrecy::SecretVec`) for the rare case
/// a caller needs to persist or re-derive the same key.
pub enum KeyPair {
    Es256 {
        inner: EcdsaKeyPair,
        pkcs8: SecretVec<u8>,
    },
    Ed25519 {
        inner: Ed25519KeyPair,
        pkcs8: SecretVec<u8>,
    },
}

impl KeyPair {
    /// Generate a fresh ES256 (P-256) keypair using the system RNG.
    pub fn generate_es256() -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(
            &ECDSA_P256_SHA256_FIXED_SIGNING,
            &rng,
        )
        .map_err(|_| KeyError::GenerationFailed)?;
        let inner = EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_FIXED_SIGNING,
            pkcs8.as_ref(),
            &rng,
        )
        .map_err(|e| KeyError::Rejected(e.to_string()))?;
        Ok(KeyPair::Es256 {
            inner,
            pkcs8: SecretVec::new(pkcs8.as_ref().to_vec()),
        })
    }

    /// Generate a fresh EdDSA (Ed25519) keypair using the system RNG.
    pub fn generate_ed25519() -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
            .map_err(|_| KeyError::GenerationFailed)?;
        let inner = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())
            .map_err(|e| KeyError::Rejected(e.to_string()))?;
        Ok(KeyPair::Ed25519 {
            inner,
            pkcs8: SecretVec::new(pkcs8.as_ref().to_vec()),
        })
    }

    /// Reconstruct an ES256 keypair from a previously-generated PKCS8
    /// document.
    pub fn from_pkcs8_es256(pkcs8_der: &[u8]) -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let inner = EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_FIXED_SIGNING,
            pkcs8_der,
            &rng,
        )
        .map_err(|e| KeyError::Rejected(e.to_string()))?;
        Ok(KeyPair::Es256 {
            inner,
            pkcs8: SecretVec::new(pkcs8_der.to_vec()),
        })
    }

    /// Reconstruct an EdDSA keypair from a previously-generated PKCS8
    /// document.
    pub fn from_pkcs8_ed25519(pkcs8_der: &[u8]) -> Result<Self, KeyError> {
        let inner = Ed25519KeyPair::from_pkcs8(pkcs8_der)
            .map_err(|e| KeyError::Rejected(e.to_string()))?;
        Ok(KeyPair::Ed25519 {
            inner,
            pkcs8: SecretVec::new(pkcs8_der.to_vec()),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            KeyPair::Es256 { .. } => Algorithm::Es256,
            KeyPair::Ed25519 { .. } => Algorithm::EdDsa,
        }
    }

    /// The PKCS8 document backing this keypair. Private material; callers
    /// must treat the returned bytes as a secret.
    pub fn expose_pkcs8(&self) -> &[u8] {
        match self {
            KeyPair::Es256 { pkcs8, .. } => pkcs8.expose_secret(),
            KeyPair::Ed25519 { pkcs8, .. } => pkcs8.expose_secret(),
        }
    }

    /// Sign a pre-assembled JWS signing input (`base64url(header) + "." +
    /// base64url(payload)`) with the issuer private key. Never exposes
    /// private material.
    pub fn sign(&self, signing_input: &[u8]) -> Result<Signature, KeyError> {
        match self {
            KeyPair::Es256 { inner, .. } => {
                let rng = SystemRandom::new();
                let sig = inner
                    .sign(&rng, signing_input)
                    .map_err(|_| KeyError::SigningFailed)?;
                Ok(Signature(sig.as_ref().to_vec()))
            }
            KeyPair::Ed25519 { inner, .. } => {
                let sig = inner.sign(signing_input);
                Ok(Signature(sig.as_ref().to_vec()))
            }
        }
    }

    /// The public key for verifier consumption, in JWK form.
    pub fn public_jwk(&self) -> Jwk {
        match self {
            KeyPair::Es256 { inner, .. } => {
                // Uncompressed SEC1 point: 0x04 || X(32) || Y(32).
                let point = inner.public_key().as_ref();
                debug_assert_eq!(point.len(), 65);
                debug_assert_eq!(point[0], 0x04);
                Jwk::ec_p256(&point[1..33], &point[33..65])
            }
            KeyPair::Ed25519 { inner, .. } => {
                Jwk::okp_ed25519(inner.public_key().as_ref())
            }
        }
    }
}

/// Verify `signature` over `signing_input` against a presented `jwk`. Used
/// both to check an inbound E-Key token against the configured issuer key
/// and to check a DPoP proof against its self-asserted embedded key.
pub fn verify(
    alg: Algorithm,
    jwk: &Jwk,
    signing_input: &[u8],
    signature: &[u8],
) -> Result<(), VerifyError> {
    match alg {
        Algorithm::Es256 => {
            let x = crate::b64::decode(&jwk.x).map_err(|_| VerifyError)?;
            let y = jwk
                .y
                .as_deref()
                .ok_or(VerifyError)
                .and_then(|y| crate::b64::decode(y).map_err(|_| VerifyError))?;
            let mut point = Vec::with_capacity(65);
            point.push(0x04);
            point.extend_from_slice(&x);
            point.extend_from_slice(&y);
            signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, point)
                .verify(signing_input, signature)
                .map_err(|_| VerifyError)
        }
        Algorithm::EdDsa => {
            let x = crate::b64::decode(&jwk.x).map_err(|_| VerifyError)?;
            signature::UnparsedPublicKey::new(&ED25519, x)
                .verify(signing_input, signature)
                .map_err(|_| VerifyError)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn es256_sign_and_verify_roundtrip() {
        let kp = KeyPair::generate_es256().unwrap();
        let msg = b"header.payload";
        let sig = kp.sign(msg).unwrap();
        let jwk = kp.public_jwk();
        verify(Algorithm::Es256, &jwk, msg, &sig.0).unwrap();
    }

    #[test]
    fn ed25519_sign_and_verify_roundtrip() {
        let kp = KeyPair::generate_ed25519().unwrap();
        let msg = b"header.payload";
        let sig = kp.sign(msg).unwrap();
        let jwk = kp.public_jwk();
        verify(Algorithm::EdDsa, &jwk, msg, &sig.0).unwrap();
    }

    #[test]
    fn tampered_message_fails() {
        let kp = KeyPair::generate_es256().unwrap();
        let sig = kp.sign(b"original").unwrap();
        let jwk = kp.public_jwk();
        assert!(verify(Algorithm::Es256, &jwk, b"tampered", &sig.0).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let kp_a = KeyPair::generate_ed25519().unwrap();
        let kp_b = KeyPair::generate_ed25519().unwrap();
        let sig = kp_a.sign(b"msg").unwrap();
        let jwk_b = kp_b.public_jwk();
        assert!(verify(Algorithm::EdDsa, &jwk_b, b"msg", &sig.0).is_err());
    }

    #[test]
    fn pkcs8_roundtrip_preserves_signing_key() {
        let kp = KeyPair::generate_es256().unwrap();
        let pkcs8 = kp.expose_pkcs8().to_vec();
        let kp2 = KeyPair::from_pkcs8_es256(&pkcs8).unwrap();
        assert_eq!(kp.public_jwk(), kp2.public_jwk());
    }

    #[test]
    fn algorithm_str_roundtrip() {
        assert_eq!("ES256".parse::<Algorithm>().unwrap(), Algorithm::Es256);
        assert_eq!("EdDSA".parse::<Algorithm>().unwrap(), Algorithm::EdDsa);
        assert!("HS256".parse::<Algorithm>().is_err());
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

        #[test]
        fn es256_roundtrips_over_arbitrary_messages(msg in proptest::collection::vec(proptest::arbitrary::any::<u8>(), 0..256)) {
            let kp = KeyPair::generate_es256().unwrap();
            let sig = kp.sign(&msg).unwrap();
            let jwk = kp.public_jwk();
            proptest::prop_assert!(verify(Algorithm::Es256, &jwk, &msg, &sig.0).is_ok());
        }

        #[test]
        fn ed25519_roundtrips_over_arbitrary_messages(msg in proptest::collection::vec(proptest::arbitrary::any::<u8>(), 0..256)) {
            let kp = KeyPair::generate_ed25519().unwrap();
            let sig = kp.sign(&msg).unwrap();
            let jwk = kp.public_jwk();
            proptest::prop_assert!(verify(Algorithm::EdDsa, &jwk, &msg, &sig.0).is_ok());
        }
    }
}
