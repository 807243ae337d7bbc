//! Quorum co-signature verification for view-change proofs.

use std::sync::Arc;
use tracing::{trace, warn};
use vcblock_types::{Committee, PublicKey, QuorumRule, SignatureScheme, ViewChangeProof};

/// Reasons a proof's co-signature is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoSignatureError {
    /// A bitmap does not line up with the committee.
    #[error("{bitmap} has {bitmap_size} bits but committee has {committee_size} members")]
    BitmapSizeMismatch {
        /// Which bitmap (`b1` or `b2`).
        bitmap: &'static str,
        /// Bits in the bitmap.
        bitmap_size: usize,
        /// Members in the local committee.
        committee_size: usize,
    },

    /// Too few members signed.
    #[error("co-signature has {signers} signers, {required} required")]
    InsufficientQuorum {
        /// Members flagged in B2.
        signers: usize,
        /// Threshold for this committee size.
        required: usize,
    },

    /// The signer keys could not be aggregated.
    #[error("failed to aggregate {signers} signer keys")]
    AggregationFailed {
        /// Members flagged in B2.
        signers: usize,
    },

    /// CS2 does not verify under the aggregate key.
    #[error("co-signature does not verify against {} signer keys", signers.len())]
    SignatureMismatch {
        /// Keys that were aggregated, in committee order.
        signers: Vec<PublicKey>,
    },
}

/// Verifies CS2 of a view-change proof against the local committee.
#[derive(Clone)]
pub struct CoSignatureVerifier {
    scheme: Arc<dyn SignatureScheme>,
    quorum: Arc<dyn QuorumRule>,
}

impl CoSignatureVerifier {
    /// Create a verifier from a signature backend and the consensus quorum rule.
    pub fn new(scheme: Arc<dyn SignatureScheme>, quorum: Arc<dyn QuorumRule>) -> Self {
        Self { scheme, quorum }
    }

    /// Signers required for a committee of `committee_size`.
    pub fn required_signers(&self, committee_size: usize) -> usize {
        self.quorum.num_for_consensus(committee_size)
    }

    /// Boolean form of [`Self::verify`]; the reason is logged, not returned.
    pub fn verify_quorum_co_signature(
        &self,
        committee: &Committee,
        proof: &ViewChangeProof,
    ) -> bool {
        self.verify(committee, proof).is_ok()
    }

    /// Check that a quorum of `committee`, as flagged in B2, co-signed
    /// header || CS1 || B1 with CS2.
    pub fn verify(
        &self,
        committee: &Committee,
        proof: &ViewChangeProof,
    ) -> Result<(), CoSignatureError> {
        let committee_size = committee.len();

        for (bitmap, bits) in [("b2", &proof.b2), ("b1", &proof.b1)] {
            if bits.len() != committee_size {
                warn!(
                    bitmap,
                    committee_size,
                    bitmap_size = bits.len(),
                    "Co-signature bitmap does not match committee size"
                );
                return Err(CoSignatureError::BitmapSizeMismatch {
                    bitmap,
                    bitmap_size: bits.len(),
                    committee_size,
                });
            }
        }

        let signer_keys: Vec<PublicKey> = proof
            .b2
            .set_indices()
            .filter_map(|index| committee.get(index))
            .map(|member| member.public_key)
            .collect();

        let required = self.required_signers(committee_size);
        if signer_keys.len() < required {
            warn!(
                signers = ?signer_keys,
                required,
                committee_size,
                "Co-signature was not generated by enough members"
            );
            return Err(CoSignatureError::InsufficientQuorum {
                signers: signer_keys.len(),
                required,
            });
        }

        let Some(aggregated_key) = self.scheme.aggregate_keys(&signer_keys) else {
            warn!(signers = ?signer_keys, "Aggregated key generation failed");
            return Err(CoSignatureError::AggregationFailed {
                signers: signer_keys.len(),
            });
        };

        let message = proof.co_signed_message();
        if !self.scheme.verify(&message, &proof.cs2, &aggregated_key) {
            warn!(
                signers = ?signer_keys,
                "Co-signature verification failed"
            );
            return Err(CoSignatureError::SignatureMismatch {
                signers: signer_keys,
            });
        }

        trace!(signers = signer_keys.len(), "Co-signature verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use vcblock_test_helpers::TestCommittee;
    use vcblock_types::{Bls12381Scheme, Signature, SignerBitfield, SupermajorityQuorum};

    /// Accepts every signature; isolates the bitmap and quorum checks.
    struct PermissiveScheme;

    impl SignatureScheme for PermissiveScheme {
        fn aggregate_keys(&self, keys: &[PublicKey]) -> Option<PublicKey> {
            keys.first().copied()
        }

        fn verify(&self, _: &[u8], _: &Signature, _: &PublicKey) -> bool {
            true
        }
    }

    fn bls_verifier() -> CoSignatureVerifier {
        CoSignatureVerifier::new(Arc::new(Bls12381Scheme), Arc::new(SupermajorityQuorum))
    }

    #[traced_test]
    #[test]
    fn test_quorum_boundary() {
        let fixture = TestCommittee::new(5);
        let committee = fixture.committee();
        let verifier = bls_verifier();
        assert_eq!(verifier.required_signers(5), 4);

        let at_threshold = fixture.proof_for(&committee, 1, 2, &[0, 1, 3, 4]);
        assert_eq!(verifier.verify(&committee, &at_threshold), Ok(()));

        let below = fixture.proof_for(&committee, 1, 2, &[0, 1, 3]);
        assert_eq!(
            verifier.verify(&committee, &below),
            Err(CoSignatureError::InsufficientQuorum {
                signers: 3,
                required: 4
            })
        );
        assert!(logs_contain("not generated by enough members"));
        assert!(logs_contain(&format!("{:?}", committee.leader().public_key)));
    }

    #[traced_test]
    #[test]
    fn test_b2_size_mismatch_rejects_either_direction() {
        let fixture = TestCommittee::new(5);
        let committee = fixture.committee();
        let verifier =
            CoSignatureVerifier::new(Arc::new(PermissiveScheme), Arc::new(SupermajorityQuorum));

        let mut proof = fixture.proof_for(&committee, 1, 0, &[0, 1, 2, 3, 4]);
        assert!(verifier.verify_quorum_co_signature(&committee, &proof));

        proof.b2 = SignerBitfield::from_flags(&[true; 6]);
        assert_eq!(
            verifier.verify(&committee, &proof),
            Err(CoSignatureError::BitmapSizeMismatch {
                bitmap: "b2",
                bitmap_size: 6,
                committee_size: 5
            })
        );

        proof.b2 = SignerBitfield::from_flags(&[true; 4]);
        assert_eq!(
            verifier.verify(&committee, &proof),
            Err(CoSignatureError::BitmapSizeMismatch {
                bitmap: "b2",
                bitmap_size: 4,
                committee_size: 5
            })
        );
        assert!(logs_contain("does not match committee size"));
    }

    #[traced_test]
    #[test]
    fn test_b1_size_mismatch_rejects() {
        let fixture = TestCommittee::new(4);
        let committee = fixture.committee();
        let verifier =
            CoSignatureVerifier::new(Arc::new(PermissiveScheme), Arc::new(SupermajorityQuorum));

        let mut proof = fixture.proof_for(&committee, 1, 0, &[0, 1, 2, 3]);
        proof.b1 = SignerBitfield::from_flags(&[true; 3]);
        assert!(matches!(
            verifier.verify(&committee, &proof),
            Err(CoSignatureError::BitmapSizeMismatch { bitmap: "b1", .. })
        ));
    }

    #[traced_test]
    #[test]
    fn test_tampering_with_any_signed_component_fails() {
        let fixture = TestCommittee::new(5);
        let committee = fixture.committee();
        let verifier = bls_verifier();
        let proof = fixture.proof_for(&committee, 3, 1, &[0, 1, 2, 3, 4]);
        assert!(verifier.verify_quorum_co_signature(&committee, &proof));

        // Header: flip the low bit of the timestamp.
        let mut tampered = proof.clone();
        tampered.header.timestamp ^= 1;
        assert!(matches!(
            verifier.verify(&committee, &tampered),
            Err(CoSignatureError::SignatureMismatch { .. })
        ));

        // Header: flip a bit of the epoch.
        let mut tampered = proof.clone();
        tampered.header.epoch.0 ^= 1 << 40;
        assert!(!verifier.verify_quorum_co_signature(&committee, &tampered));

        // CS1: swap in a different valid signature.
        let mut tampered = proof.clone();
        tampered.cs1 = fixture.key_for(committee.leader()).sign(b"other");
        assert!(!verifier.verify_quorum_co_signature(&committee, &tampered));

        // B1: clear one contributor.
        let mut tampered = proof.clone();
        tampered.b1.clear(4);
        assert!(!verifier.verify_quorum_co_signature(&committee, &tampered));
        assert!(logs_contain("Co-signature verification failed"));
    }

    #[traced_test]
    #[test]
    fn test_b2_claiming_non_signer_fails() {
        let fixture = TestCommittee::new(5);
        let committee = fixture.committee();
        let verifier = bls_verifier();

        // Signed by 0..4, but B2 claims member 4 instead of member 3.
        let mut proof = fixture.proof_for(&committee, 1, 0, &[0, 1, 2, 3]);
        proof.b2.clear(3);
        proof.b2.set(4);
        assert!(matches!(
            verifier.verify(&committee, &proof),
            Err(CoSignatureError::SignatureMismatch { signers }) if signers.len() == 4
        ));
    }

    #[traced_test]
    #[test]
    fn test_aggregation_failure_rejects() {
        struct NoAggregation;
        impl SignatureScheme for NoAggregation {
            fn aggregate_keys(&self, _: &[PublicKey]) -> Option<PublicKey> {
                None
            }
            fn verify(&self, _: &[u8], _: &Signature, _: &PublicKey) -> bool {
                true
            }
        }

        let fixture = TestCommittee::new(3);
        let committee = fixture.committee();
        let verifier =
            CoSignatureVerifier::new(Arc::new(NoAggregation), Arc::new(SupermajorityQuorum));
        let proof = fixture.proof_for(&committee, 1, 0, &[0, 1, 2]);

        assert_eq!(
            verifier.verify(&committee, &proof),
            Err(CoSignatureError::AggregationFailed { signers: 3 })
        );
        assert!(logs_contain("Aggregated key generation failed"));
    }

    #[test]
    fn test_zero_threshold_with_empty_b2_reaches_aggregation() {
        // A misconfigured rule must still fail closed: no keys, no aggregate.
        let fixture = TestCommittee::new(3);
        let committee = fixture.committee();
        let verifier = CoSignatureVerifier::new(
            Arc::new(Bls12381Scheme),
            Arc::new(|_: usize| -> usize { 0 }),
        );
        let mut proof = fixture.proof_for(&committee, 1, 0, &[0, 1, 2]);
        proof.b2 = SignerBitfield::new(3);

        assert_eq!(
            verifier.verify(&committee, &proof),
            Err(CoSignatureError::AggregationFailed { signers: 0 })
        );
    }
}
