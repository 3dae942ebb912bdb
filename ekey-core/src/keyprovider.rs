//! The `KeyProvider` contract: owns the issuer's signing key, exposes
//! signing and the public JWK. Expressed as a trait so a KMS-backed
//! implementation can stand in for the in-process [`ekey_crypto::KeyPair`]
//! without the issuer/verifier code changing.

use ekey_crypto::{Algorithm, Jwk, KeyError, Signature};

pub trait KeyProvider: Send + Sync {
    /// Sign a pre-assembled JWS signing input. Never exposes private
    /// material; implementations may delegate to a remote signer.
    fn sign(&self, signing_input: &[u8]) -> Result<Signature, KeyError>;

    /// The public key, stable for the lifetime of this provider's key
    /// version.
    fn public_jwk(&self) -> Jwk;

    /// The fixed signing algorithm for this provider instance.
    fn algorithm(&self) -> Algorithm;
}

impl KeyProvider for ekey_crypto::KeyPair {
    fn sign(&self, signing_input: &[u8]) -> Result<Signature, KeyError> {
        ekey_crypto::KeyPair::sign(self, signing_input)
    }

    fn public_jwk(&self) -> Jwk {
        ekey_crypto::KeyPair::public_jwk(self)
    }

    fn algorithm(&self) -> Algorithm {
        ekey_crypto::KeyPair::algorithm(self)
    }
}
