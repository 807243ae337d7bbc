//! View-change proof processing.
//!
//! A received proof is accepted only if, in order:
//!
//! 1. its epoch is the local epoch,
//! 2. its counter resolves to a committee index (wrapping if configured),
//! 3. the member at that index is exactly the proof's candidate leader,
//! 4. a quorum of the committee co-signed it.
//!
//! Acceptance rotates the committee once per unit of resolved counter, so
//! every honest node derives the same leader from the same proof.

use crate::config::{CounterOverflowPolicy, ViewChangeConfig};
use crate::shared::SharedCommittee;
use crate::verifier::{CoSignatureError, CoSignatureVerifier};
use parking_lot::RwLockUpgradableReadGuard;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vcblock_messages::{CodecError, ViewChangeBlockGossip};
use vcblock_types::{
    Bls12381Scheme, Committee, CommitteeMember, Epoch, NetworkAddress, PublicKey, QuorumRule,
    SignatureScheme, ViewChangeCounter, ViewChangeProof,
};

/// Reasons a view-change proof is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewChangeError {
    /// The inbound message could not be decoded.
    #[error("malformed view change block: {0}")]
    Decode(#[from] CodecError),

    /// Stale or future proof.
    #[error("proof is for {proof} but local epoch is {local}")]
    EpochMismatch {
        /// Epoch in the proof header.
        proof: Epoch,
        /// Local epoch.
        local: Epoch,
    },

    /// Counter out of range and the policy forbids wrapping.
    #[error("view change counter {counter} exceeds committee size {committee_size}")]
    CounterOverflow {
        /// Counter in the proof header.
        counter: ViewChangeCounter,
        /// Local committee size.
        committee_size: usize,
    },

    /// The proof disagrees with this node's committee order.
    #[error("candidate at index {index} is {expected_address}, proof names {candidate_address}")]
    CandidateMismatch {
        /// Resolved committee index.
        index: usize,
        /// Address this node expects.
        expected_address: NetworkAddress,
        /// Key this node expects.
        expected_key: PublicKey,
        /// Address named by the proof.
        candidate_address: NetworkAddress,
        /// Key named by the proof.
        candidate_key: PublicKey,
    },

    /// Quorum co-signature rejected.
    #[error(transparent)]
    CoSignature(#[from] CoSignatureError),
}

/// Result of an accepted view change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedViewChange {
    /// Epoch of the proof.
    pub epoch: Epoch,
    /// Single-step rotations applied.
    pub rotations: usize,
    /// Leader after rotation.
    pub new_leader: CommitteeMember,
}

/// Verifies view-change proofs and applies accepted ones to the committee.
#[derive(Clone)]
pub struct ViewChangeProcessor {
    config: ViewChangeConfig,
    verifier: CoSignatureVerifier,
}

impl ViewChangeProcessor {
    /// Create a processor with an explicit signature backend.
    pub fn new(
        config: ViewChangeConfig,
        scheme: Arc<dyn SignatureScheme>,
        quorum: Arc<dyn QuorumRule>,
    ) -> Self {
        Self {
            config,
            verifier: CoSignatureVerifier::new(scheme, quorum),
        }
    }

    /// Create a processor using the BLS12-381 backend.
    pub fn with_bls(config: ViewChangeConfig, quorum: Arc<dyn QuorumRule>) -> Self {
        Self::new(config, Arc::new(Bls12381Scheme), quorum)
    }

    /// The co-signature verifier in use.
    pub fn verifier(&self) -> &CoSignatureVerifier {
        &self.verifier
    }

    /// Process a proof, returning whether it was accepted.
    ///
    /// On acceptance the committee has been rotated; callers re-read
    /// [`SharedCommittee::leader`] to route to the new leader.
    pub fn process_view_change_proof(
        &self,
        proof: &ViewChangeProof,
        local_epoch: Epoch,
        committee: &SharedCommittee,
    ) -> bool {
        self.try_process(proof, local_epoch, committee).is_ok()
    }

    /// Decode a view-change block from `message[offset..]` and process it.
    pub fn on_view_change_block(
        &self,
        message: &[u8],
        offset: usize,
        from: NetworkAddress,
        local_epoch: Epoch,
        committee: &SharedCommittee,
    ) -> Result<AcceptedViewChange, ViewChangeError> {
        let gossip = ViewChangeBlockGossip::decode(message, offset).map_err(|e| {
            warn!(epoch = local_epoch.0, %from, error = %e, "Failed to decode view change block");
            e
        })?;
        self.try_process(&gossip.into_proof(), local_epoch, committee)
    }

    /// Process a proof as one validate-and-apply transaction.
    ///
    /// The committee is held under an upgradable lock from the first check to
    /// the last rotation: other processors wait, plain readers continue until
    /// the rotation itself, which runs under exclusive access.
    pub fn try_process(
        &self,
        proof: &ViewChangeProof,
        local_epoch: Epoch,
        committee: &SharedCommittee,
    ) -> Result<AcceptedViewChange, ViewChangeError> {
        log_received(proof);

        let guard = committee.upgradable_read();
        let rotations = self.validate(proof, local_epoch, &guard).map_err(|e| {
            warn!(
                epoch = local_epoch.0,
                proof = %proof.hash(),
                error = %e,
                "Rejected view change block"
            );
            e
        })?;

        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        for _ in 0..rotations {
            guard.rotate_once();
        }
        let new_leader = *guard.leader();
        drop(guard);

        info!(
            epoch = local_epoch.0,
            rotations,
            leader = %new_leader.address,
            "View of leader successfully changed"
        );

        Ok(AcceptedViewChange {
            epoch: local_epoch,
            rotations,
            new_leader,
        })
    }

    /// Run every check against `committee` without mutating it.
    ///
    /// Returns the number of rotations the proof calls for.
    pub fn validate(
        &self,
        proof: &ViewChangeProof,
        local_epoch: Epoch,
        committee: &Committee,
    ) -> Result<usize, ViewChangeError> {
        let header = &proof.header;

        if header.epoch != local_epoch {
            return Err(ViewChangeError::EpochMismatch {
                proof: header.epoch,
                local: local_epoch,
            });
        }

        let index = self.resolve_candidate_index(header.counter, committee.len())?;

        // `index` was reduced below the committee size.
        let expected = committee.get(index).copied().ok_or(ViewChangeError::CounterOverflow {
            counter: header.counter,
            committee_size: committee.len(),
        })?;
        if expected.public_key != header.candidate_public_key
            || expected.address != header.candidate_address
        {
            return Err(ViewChangeError::CandidateMismatch {
                index,
                expected_address: expected.address,
                expected_key: expected.public_key,
                candidate_address: header.candidate_address,
                candidate_key: header.candidate_public_key,
            });
        }

        self.verifier.verify(committee, proof)?;

        Ok(index)
    }

    /// Map a counter onto a committee index.
    fn resolve_candidate_index(
        &self,
        counter: ViewChangeCounter,
        committee_size: usize,
    ) -> Result<usize, ViewChangeError> {
        let index = counter.as_index();
        if index < committee_size {
            return Ok(index);
        }

        match self.config.counter_overflow {
            CounterOverflowPolicy::Wrap => {
                let wrapped = index % committee_size;
                warn!(
                    counter = counter.0,
                    committee_size,
                    wrapped,
                    "View change counter exceeds committee size; local committee view may be wrong"
                );
                Ok(wrapped)
            }
            CounterOverflowPolicy::Reject => Err(ViewChangeError::CounterOverflow {
                counter,
                committee_size,
            }),
        }
    }
}

fn log_received(proof: &ViewChangeProof) {
    let header = &proof.header;
    debug!(
        epoch = header.epoch.0,
        counter = header.counter.0,
        stage = %header.stage,
        candidate_index = header.candidate_index,
        candidate_address = %header.candidate_address,
        candidate_key = %header.candidate_public_key,
        timestamp = header.timestamp,
        b1_signers = proof.b1.count_ones(),
        b2_signers = proof.b2.count_ones(),
        "Received view change block"
    );
}
