//! Properly-signed view-change fixtures.
//!
//! Keys are derived from deterministic seeds so that every test run signs
//! the same bytes. Signer indices are always interpreted against the
//! committee passed in, which matters once a committee has rotated.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use vcblock_messages::ViewChangeBlockGossip;
use vcblock_types::{
    signing, Committee, CommitteeMember, Epoch, KeyPair, NetworkAddress, PublicKey, Signature,
    SignerBitfield, ViewChangeCounter, ViewChangeHeader, ViewChangeProof, ViewChangeStage,
};

/// Base port for fixture member addresses.
pub const BASE_PORT: u16 = 40_000;

/// Fixed timestamp stamped on fixture headers.
pub const FIXTURE_TIMESTAMP: u64 = 1_700_000_000_000_000;

/// A committee whose secret keys are known.
pub struct TestCommittee {
    members: Vec<CommitteeMember>,
    keys: HashMap<PublicKey, KeyPair>,
}

impl TestCommittee {
    /// Create `size` members with seeded BLS keys and loopback addresses.
    pub fn new(size: usize) -> Self {
        let mut members = Vec::with_capacity(size);
        let mut keys = HashMap::with_capacity(size);
        for i in 0..size {
            let keypair = KeyPair::from_seed(&seed(i));
            let member = CommitteeMember::new(
                keypair.public_key(),
                NetworkAddress::new(IpAddr::V4(Ipv4Addr::LOCALHOST), BASE_PORT + i as u16),
            );
            members.push(member);
            keys.insert(member.public_key, keypair);
        }
        Self { members, keys }
    }

    /// Members in construction order.
    pub fn members(&self) -> &[CommitteeMember] {
        &self.members
    }

    /// Member in construction order.
    pub fn member(&self, index: usize) -> CommitteeMember {
        self.members[index]
    }

    /// A fresh committee in construction order.
    pub fn committee(&self) -> Committee {
        Committee::new(self.members.clone()).expect("fixture members are distinct")
    }

    /// The secret key behind a member.
    pub fn key_for(&self, member: &CommitteeMember) -> &KeyPair {
        &self.keys[&member.public_key]
    }

    /// Header naming `committee[counter % n]` as the candidate.
    pub fn header_for(&self, committee: &Committee, epoch: u64, counter: u32) -> ViewChangeHeader {
        let index = counter as usize % committee.len();
        let candidate = committee.get(index).expect("index reduced modulo size");
        ViewChangeHeader::new(
            Epoch(epoch),
            ViewChangeCounter(counter),
            index as u32,
            candidate,
            ViewChangeStage::DsBlockConsensus,
            FIXTURE_TIMESTAMP,
        )
    }

    /// Co-sign `header` in two rounds.
    ///
    /// CS1 is the aggregate of `cs1_signers` over the header; CS2 is the
    /// aggregate of `cs2_signers` over header || CS1 || B1. Indices refer to
    /// `committee`'s current order.
    pub fn sign(
        &self,
        committee: &Committee,
        header: ViewChangeHeader,
        cs1_signers: &[usize],
        cs2_signers: &[usize],
    ) -> ViewChangeProof {
        let b1 = self.bitfield(committee, cs1_signers);
        let cs1 = self.aggregate(
            committee,
            cs1_signers,
            &signing::view_change_header_message(&header),
        );
        let b2 = self.bitfield(committee, cs2_signers);
        let cs2 = self.aggregate(
            committee,
            cs2_signers,
            &signing::view_change_cosig_message(&header, &cs1, &b1),
        );

        ViewChangeProof {
            header,
            cs1,
            b1,
            cs2,
            b2,
        }
    }

    /// Proof for `counter` in `epoch`, with the same signers in both rounds.
    pub fn proof_for(
        &self,
        committee: &Committee,
        epoch: u64,
        counter: u32,
        signers: &[usize],
    ) -> ViewChangeProof {
        let header = self.header_for(committee, epoch, counter);
        self.sign(committee, header, signers, signers)
    }

    /// Wire bytes for a proof.
    pub fn encode(proof: &ViewChangeProof) -> Vec<u8> {
        ViewChangeBlockGossip::new(proof.clone()).encode()
    }

    fn bitfield(&self, committee: &Committee, signers: &[usize]) -> SignerBitfield {
        let mut bits = SignerBitfield::new(committee.len());
        for &index in signers {
            bits.set(index);
        }
        bits
    }

    fn aggregate(&self, committee: &Committee, signers: &[usize], message: &[u8]) -> Signature {
        if signers.is_empty() {
            return Signature::zero();
        }
        let signatures: Vec<Signature> = signers
            .iter()
            .map(|&index| {
                let member = committee.get(index).expect("signer index within committee");
                self.key_for(member).sign(message)
            })
            .collect();
        Signature::aggregate(&signatures).expect("fixture signatures are valid points")
    }
}

/// The first `count` committee indices.
pub fn first_signers(count: usize) -> Vec<usize> {
    (0..count).collect()
}

fn seed(index: usize) -> [u8; 32] {
    let mut seed = [0x5Au8; 32];
    seed[..8].copy_from_slice(&(index as u64).to_le_bytes());
    seed
}
