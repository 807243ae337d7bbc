//! Core types for committee view changes.
//!
//! This crate provides the foundational types used by view-change
//! verification:
//!
//! - **Primitives**: Hash, BLS keys and signatures, the pluggable signature scheme
//! - **Identifiers**: Epoch, ViewChangeCounter, NetworkAddress
//! - **Committee**: ordered roster with O(1) leader rotation
//! - **View change**: header, proof and the canonical co-signed message
//!
//! # Design Philosophy
//!
//! This crate does not depend on any other workspace crates, making it the
//! foundation layer.

mod crypto;
mod hash;
mod identifiers;
pub mod signing;

mod committee;
mod quorum;
mod signer_bitfield;
mod view_change;

pub use crypto::{
    AggregateError, Bls12381Scheme, KeyPair, PublicKey, Signature, SignatureScheme,
    PUBLIC_KEY_SIZE, SIGNATURE_SIZE,
};
pub use hash::Hash;
pub use identifiers::{Epoch, NetworkAddress, ViewChangeCounter};

pub use committee::{Committee, CommitteeError, CommitteeMember};
pub use quorum::{FixedQuorum, QuorumRule, SupermajorityQuorum};
pub use signer_bitfield::{BitfieldError, SignerBitfield};
pub use view_change::{UnknownStage, ViewChangeHeader, ViewChangeProof, ViewChangeStage};
