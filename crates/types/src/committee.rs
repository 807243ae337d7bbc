//! Ordered committee roster and leader rotation.

use crate::{NetworkAddress, PublicKey, SignerBitfield};
use std::collections::HashSet;

/// A consensus participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitteeMember {
    /// Signing identity.
    pub public_key: PublicKey,
    /// Where the member is reached.
    pub address: NetworkAddress,
}

impl CommitteeMember {
    /// Create a new member.
    pub fn new(public_key: PublicKey, address: NetworkAddress) -> Self {
        Self {
            public_key,
            address,
        }
    }
}

/// Ordered committee. Logical index 0 is the current leader.
///
/// Members live in a fixed arena; rotation only advances `head`, so rotating
/// never moves or reallocates members. Every logical index is resolved
/// relative to `head`.
#[derive(Debug, Clone)]
pub struct Committee {
    members: Vec<CommitteeMember>,
    head: usize,
    rotations: u64,
}

impl Committee {
    /// Build a committee from members in leader-first order.
    pub fn new(members: Vec<CommitteeMember>) -> Result<Self, CommitteeError> {
        if members.is_empty() {
            return Err(CommitteeError::Empty);
        }
        if members.len() > SignerBitfield::MAX_LEN {
            return Err(CommitteeError::TooLarge {
                size: members.len(),
                max: SignerBitfield::MAX_LEN,
            });
        }

        let mut seen = HashSet::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            if !seen.insert(member.public_key) {
                return Err(CommitteeError::DuplicateKey {
                    index,
                    public_key: member.public_key,
                });
            }
        }

        Ok(Self {
            members,
            head: 0,
            rotations: 0,
        })
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The current leader.
    pub fn leader(&self) -> &CommitteeMember {
        &self.members[self.head]
    }

    /// Member at a logical index.
    pub fn get(&self, index: usize) -> Option<&CommitteeMember> {
        if index >= self.members.len() {
            return None;
        }
        Some(&self.members[(self.head + index) % self.members.len()])
    }

    /// Iterate members in logical (leader-first) order.
    pub fn iter(&self) -> impl Iterator<Item = &CommitteeMember> + '_ {
        let (tail, front) = self.members.split_at(self.head);
        front.iter().chain(tail.iter())
    }

    /// Total single-step rotations applied since construction.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Move the leader to the back, keeping everyone else's relative order.
    ///
    /// # Panics
    ///
    /// Panics on an empty committee. [`Committee::new`] never produces one,
    /// so reaching this is an internal consistency fault.
    pub fn rotate_once(&mut self) {
        assert!(
            !self.members.is_empty(),
            "rotate_once called on an empty committee"
        );
        self.head = (self.head + 1) % self.members.len();
        self.rotations += 1;
    }
}

/// Two committees are equal when they list the same members in the same
/// logical order.
impl PartialEq for Committee {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Committee {}

/// Errors building a committee.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitteeError {
    /// No members.
    #[error("committee must have at least one member")]
    Empty,

    /// A public key appears twice.
    #[error("duplicate public key {public_key:?} at index {index}")]
    DuplicateKey {
        /// Index of the second occurrence.
        index: usize,
        /// The repeated key.
        public_key: PublicKey,
    },

    /// More members than a signer bitfield can address.
    #[error("committee of {size} members exceeds maximum of {max}")]
    TooLarge {
        /// Requested size.
        size: usize,
        /// Maximum supported size.
        max: usize,
    },
}
