//! Quorum threshold rules.
//!
//! The threshold is a property of the surrounding consensus configuration.
//! View-change verification consumes it through [`QuorumRule`] and never
//! computes a fraction itself.

/// Minimum number of signers required for a committee of a given size.
pub trait QuorumRule: Send + Sync {
    /// Signers needed for consensus in a committee of `committee_size`.
    fn num_for_consensus(&self, committee_size: usize) -> usize;
}

/// Classic BFT supermajority: strictly more than two thirds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupermajorityQuorum;

impl QuorumRule for SupermajorityQuorum {
    fn num_for_consensus(&self, committee_size: usize) -> usize {
        (committee_size * 2 / 3) + 1
    }
}

/// A constant threshold supplied by configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedQuorum(pub usize);

impl QuorumRule for FixedQuorum {
    fn num_for_consensus(&self, _committee_size: usize) -> usize {
        self.0
    }
}

impl<F> QuorumRule for F
where
    F: Fn(usize) -> usize + Send + Sync,
{
    fn num_for_consensus(&self, committee_size: usize) -> usize {
        self(committee_size)
    }
}
