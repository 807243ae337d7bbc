//! Cryptographic key pairs, signatures and the pluggable co-signature scheme.
//!
//! Committee identities are BLS12-381 (min-pk) values carried as fixed-width
//! compressed bytes. The bytes are opaque to the committee and view-change
//! code; only a [`SignatureScheme`] interprets them.

use std::fmt;

/// Size of a compressed public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 48;

/// Size of a compressed signature in bytes.
pub const SIGNATURE_SIZE: usize = 96;

/// A BLS12-381 key pair for signing.
#[derive(Clone)]
pub struct KeyPair {
    secret: blst::min_pk::SecretKey,
}

impl KeyPair {
    /// Derive a keypair from 32 bytes of key material.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let secret = blst::min_pk::SecretKey::key_gen(seed, &[])
            .expect("32-byte key material is always accepted");
        Self { secret }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.secret.sign(message, &[], &[]).to_bytes())
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.secret.sk_to_pk().to_bytes())
    }
}

/// A public key for signature verification (48 bytes compressed).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap raw key bytes without validating the curve point.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Verify a signature.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let pk = match blst::min_pk::PublicKey::from_bytes(&self.0) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let sig = match blst::min_pk::Signature::from_bytes(&signature.0) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        sig.verify(true, message, &[], &[], &pk, true) == blst::BLST_ERROR::BLST_SUCCESS
    }

    /// Aggregate multiple public keys.
    pub fn aggregate(pubkeys: &[PublicKey]) -> Result<Self, AggregateError> {
        if pubkeys.is_empty() {
            return Err(AggregateError::Empty);
        }

        let points = pubkeys
            .iter()
            .map(|pk| blst::min_pk::PublicKey::from_bytes(&pk.0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| AggregateError::InvalidPoint)?;

        let refs: Vec<&blst::min_pk::PublicKey> = points.iter().collect();
        let agg = blst::min_pk::AggregatePublicKey::aggregate(&refs, true)
            .map_err(|_| AggregateError::AggregationFailed)?;

        Ok(PublicKey(agg.to_public_key().to_bytes()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(self.0);
        write!(f, "PublicKey({}..{})", &hex[..8], &hex[hex.len() - 8..])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A signature (96 bytes compressed).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    /// Wrap raw signature bytes without validating the curve point.
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a zero/placeholder signature for testing.
    pub fn zero() -> Self {
        Self([0u8; SIGNATURE_SIZE])
    }

    /// Get signature as byte slice.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Aggregate multiple signatures.
    pub fn aggregate(signatures: &[Signature]) -> Result<Self, AggregateError> {
        if signatures.is_empty() {
            return Err(AggregateError::Empty);
        }

        let points = signatures
            .iter()
            .map(|s| blst::min_pk::Signature::from_bytes(&s.0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| AggregateError::InvalidPoint)?;

        let refs: Vec<&blst::min_pk::Signature> = points.iter().collect();
        let agg = blst::min_pk::AggregateSignature::aggregate(&refs, true)
            .map_err(|_| AggregateError::AggregationFailed)?;

        Ok(Signature(agg.to_signature().to_bytes()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &hex::encode(self.0)[..16])
    }
}

/// Errors that can occur during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// Empty list provided.
    #[error("Cannot aggregate empty list")]
    Empty,

    /// One of the inputs does not decode to a curve point.
    #[error("Input is not a valid curve point")]
    InvalidPoint,

    /// Aggregation operation failed.
    #[error("Aggregation failed")]
    AggregationFailed,
}

/// Capability interface over the co-signature primitive.
///
/// Implementations must be deterministic and side-effect-free. The view-change
/// verifier only ever talks to this trait, so the signature scheme can be
/// swapped without touching consensus logic.
pub trait SignatureScheme: Send + Sync {
    /// Aggregate a set of public keys. Returns `None` if the set is empty or
    /// any key is unusable.
    fn aggregate_keys(&self, keys: &[PublicKey]) -> Option<PublicKey>;

    /// Verify `signature` over `message` against `key`.
    fn verify(&self, message: &[u8], signature: &Signature, key: &PublicKey) -> bool;
}

/// BLS12-381 min-pk backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bls12381Scheme;

impl SignatureScheme for Bls12381Scheme {
    fn aggregate_keys(&self, keys: &[PublicKey]) -> Option<PublicKey> {
        PublicKey::aggregate(keys).ok()
    }

    fn verify(&self, message: &[u8], signature: &Signature, key: &PublicKey) -> bool {
        key.verify(message, signature)
    }
}
