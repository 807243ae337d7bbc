//! View-change processing for committee-based BFT consensus.
//!
//! When a round leader fails, a quorum-signed view-change block names the
//! replacement. This crate verifies such a block against the local committee
//! and, if it holds up, rotates the committee so the new leader is at the
//! front.
//!
//! # Architecture
//!
//! - [`CoSignatureVerifier`] checks the B2 bitmap against the committee,
//!   enforces the quorum threshold and verifies CS2 over header || CS1 || B1.
//! - [`ViewChangeProcessor`] runs the epoch check, resolves the candidate
//!   index, confirms the candidate identity, delegates to the verifier and
//!   applies the rotation.
//! - [`SharedCommittee`] is the only mutable shared state; its lock discipline
//!   makes validate-and-apply a single transaction.
//!
//! All operations are synchronous and never abort the process on a bad proof.

mod config;
mod processor;
mod shared;
mod verifier;

pub use config::{CounterOverflowPolicy, ViewChangeConfig};
pub use processor::{AcceptedViewChange, ViewChangeError, ViewChangeProcessor};
pub use shared::SharedCommittee;
pub use verifier::{CoSignatureError, CoSignatureVerifier};
