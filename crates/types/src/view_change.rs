//! View change header and proof.

use crate::{
    signing, CommitteeMember, Epoch, Hash, NetworkAddress, PublicKey, Signature, SignerBitfield,
    ViewChangeCounter, PUBLIC_KEY_SIZE,
};
use std::fmt;

/// Consensus stage that stalled and triggered the view change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ViewChangeStage {
    /// Waiting for proof-of-work submissions.
    PowSubmission = 0,
    /// Preparing directory block consensus.
    DsBlockConsensusPrep = 1,
    /// Directory block consensus.
    DsBlockConsensus = 2,
    /// Collecting microblocks from shards.
    MicroblockSubmission = 3,
    /// Preparing final block consensus.
    FinalBlockConsensusPrep = 4,
    /// Final block consensus.
    FinalBlockConsensus = 5,
}

impl TryFrom<u8> for ViewChangeStage {
    type Error = UnknownStage;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => Self::PowSubmission,
            1 => Self::DsBlockConsensusPrep,
            2 => Self::DsBlockConsensus,
            3 => Self::MicroblockSubmission,
            4 => Self::FinalBlockConsensusPrep,
            5 => Self::FinalBlockConsensus,
            other => return Err(UnknownStage(other)),
        })
    }
}

impl fmt::Display for ViewChangeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Stage tag outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown view change stage tag {0}")]
pub struct UnknownStage(pub u8);

/// Header of a view-change block.
///
/// Serialized as fixed-width big-endian fields in declaration order:
///
/// | Field | Bytes |
/// |-------|-------|
/// | epoch | 8 |
/// | counter | 4 |
/// | candidate_index | 4 |
/// | candidate_public_key | 48 |
/// | candidate_address | 18 |
/// | stage | 1 |
/// | timestamp | 8 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChangeHeader {
    /// Epoch the view change belongs to.
    pub epoch: Epoch,
    /// Cumulative leader failures in this epoch.
    pub counter: ViewChangeCounter,
    /// Committee index of the candidate, as claimed by the proof's author.
    pub candidate_index: u32,
    /// Candidate leader's key.
    pub candidate_public_key: PublicKey,
    /// Candidate leader's address.
    pub candidate_address: NetworkAddress,
    /// Stage that stalled.
    pub stage: ViewChangeStage,
    /// Creation time, microseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ViewChangeHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 8 + 4 + 4 + PUBLIC_KEY_SIZE + NetworkAddress::SIZE + 1 + 8;

    /// Build a header naming `candidate` as the new leader.
    pub fn new(
        epoch: Epoch,
        counter: ViewChangeCounter,
        candidate_index: u32,
        candidate: &CommitteeMember,
        stage: ViewChangeStage,
        timestamp: u64,
    ) -> Self {
        Self {
            epoch,
            counter,
            candidate_index,
            candidate_public_key: candidate.public_key,
            candidate_address: candidate.address,
            stage,
            timestamp,
        }
    }

    /// Append the serialized header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(Self::SIZE);
        out.extend_from_slice(&self.epoch.0.to_be_bytes());
        out.extend_from_slice(&self.counter.0.to_be_bytes());
        out.extend_from_slice(&self.candidate_index.to_be_bytes());
        out.extend_from_slice(self.candidate_public_key.as_bytes());
        out.extend_from_slice(&self.candidate_address.to_bytes());
        out.push(self.stage as u8);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
    }

    /// Serialize into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        self.write_to(&mut out);
        out
    }

    /// Parse a header from exactly [`Self::SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Result<Self, UnknownStage> {
        let epoch = u64::from_be_bytes(fixed(&bytes[0..8]));
        let counter = u32::from_be_bytes(fixed(&bytes[8..12]));
        let candidate_index = u32::from_be_bytes(fixed(&bytes[12..16]));
        let candidate_public_key = PublicKey::from_bytes(fixed(&bytes[16..64]));
        let candidate_address = NetworkAddress::from_bytes(&fixed(&bytes[64..82]));
        let stage = ViewChangeStage::try_from(bytes[82])?;
        let timestamp = u64::from_be_bytes(fixed(&bytes[83..91]));

        Ok(Self {
            epoch: Epoch(epoch),
            counter: ViewChangeCounter(counter),
            candidate_index,
            candidate_public_key,
            candidate_address,
            stage,
            timestamp,
        })
    }
}

fn fixed<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

/// A view-change block: a header co-signed by a quorum of the committee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChangeProof {
    /// Claimed view change.
    pub header: ViewChangeHeader,
    /// First-round co-signature over the header.
    pub cs1: Signature,
    /// Members that contributed to `cs1`.
    pub b1: SignerBitfield,
    /// Quorum co-signature over header || cs1 || b1.
    pub cs2: Signature,
    /// Members that contributed to `cs2`.
    pub b2: SignerBitfield,
}

impl ViewChangeProof {
    /// The message `cs2` signs.
    pub fn co_signed_message(&self) -> Vec<u8> {
        signing::view_change_cosig_message(&self.header, &self.cs1, &self.b1)
    }

    /// Identifier for logs.
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&self.co_signed_message())
    }
}
