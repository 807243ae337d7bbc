//! Shared handle to the committee.

use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard};
use std::sync::Arc;
use vcblock_types::{Committee, CommitteeMember};

/// The node's single committee handle, shared across consensus threads.
///
/// Readers get shared access. Mutation is only reachable through
/// [`crate::ViewChangeProcessor`], which holds an upgradable lock for the
/// whole validate-and-apply sequence and upgrades to exclusive access for
/// the rotation itself. Readers therefore never see a partially rotated
/// committee, and two proofs never interleave.
#[derive(Debug, Clone)]
pub struct SharedCommittee {
    inner: Arc<RwLock<Committee>>,
}

impl SharedCommittee {
    /// Wrap a committee.
    pub fn new(committee: Committee) -> Self {
        Self {
            inner: Arc::new(RwLock::new(committee)),
        }
    }

    /// The current leader.
    pub fn leader(&self) -> CommitteeMember {
        *self.inner.read().leader()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Always false; a committee cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Total single-step rotations applied.
    pub fn rotations(&self) -> u64 {
        self.inner.read().rotations()
    }

    /// Copy of the committee at this instant.
    pub fn snapshot(&self) -> Committee {
        self.inner.read().clone()
    }

    /// Shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, Committee> {
        self.inner.read()
    }

    pub(crate) fn upgradable_read(&self) -> RwLockUpgradableReadGuard<'_, Committee> {
        self.inner.upgradable_read()
    }
}
