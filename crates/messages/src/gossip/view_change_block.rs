//! ViewChangeBlock gossip message.
//!
//! # Wire Format
//!
//! ```text
//! header (91) || CS1 (96) || B1 (packed) || CS2 (96) || B2 (packed)
//! ```
//!
//! The first three components are byte-for-byte the message CS2 signs, so a
//! decoded proof can be verified without re-encoding anything ambiguous.

use thiserror::Error;
use vcblock_types::{
    BitfieldError, Signature, SignerBitfield, UnknownStage, ViewChangeHeader, ViewChangeProof,
    SIGNATURE_SIZE,
};

/// Errors that can occur during message decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The block would start past the end of the message.
    #[error("offset {offset} is past the end of a {len}-byte message")]
    OffsetOutOfRange {
        /// Requested start of the block.
        offset: usize,
        /// Length of the whole message.
        len: usize,
    },

    /// A fixed-width field ran past the end of the message.
    #[error("{field} truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Field being read.
        field: &'static str,
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left in the message.
        available: usize,
    },

    /// The header names a stage this node does not know.
    #[error("header: {0}")]
    Stage(#[from] UnknownStage),

    /// A membership bitmap is malformed.
    #[error("{field}: {source}")]
    Bitfield {
        /// Which bitmap (`b1` or `b2`).
        field: &'static str,
        /// Underlying bitmap error.
        source: BitfieldError,
    },

    /// Bytes remain after B2.
    #[error("{0} trailing bytes after view change block")]
    TrailingBytes(usize),
}

/// A view-change block announced to the committee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChangeBlockGossip {
    /// The co-signed proof.
    pub proof: ViewChangeProof,
}

impl ViewChangeBlockGossip {
    /// Create a new gossip message.
    pub fn new(proof: ViewChangeProof) -> Self {
        Self { proof }
    }

    /// Consume and return the inner proof.
    pub fn into_proof(self) -> ViewChangeProof {
        self.proof
    }

    /// Encode to wire format.
    pub fn encode(&self) -> Vec<u8> {
        let proof = &self.proof;
        let mut out = proof.co_signed_message();
        out.extend_from_slice(proof.cs2.as_bytes());
        proof.b2.write_packed(&mut out);
        out
    }

    /// Decode a block occupying `message[offset..]`.
    ///
    /// The block must consume the rest of the message exactly.
    pub fn decode(message: &[u8], offset: usize) -> Result<Self, CodecError> {
        if offset > message.len() {
            return Err(CodecError::OffsetOutOfRange {
                offset,
                len: message.len(),
            });
        }
        let mut reader = Reader {
            bytes: &message[offset..],
        };

        let header_bytes: [u8; ViewChangeHeader::SIZE] = reader.array("header")?;
        let header = ViewChangeHeader::from_bytes(&header_bytes)?;
        let cs1 = Signature::from_bytes(reader.array("cs1")?);
        let b1 = reader.bitfield("b1")?;
        let cs2 = Signature::from_bytes(reader.array::<SIGNATURE_SIZE>("cs2")?);
        let b2 = reader.bitfield("b2")?;

        if !reader.bytes.is_empty() {
            return Err(CodecError::TrailingBytes(reader.bytes.len()));
        }

        Ok(Self {
            proof: ViewChangeProof {
                header,
                cs1,
                b1,
                cs2,
                b2,
            },
        })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        if self.bytes.len() < N {
            return Err(CodecError::Truncated {
                field,
                needed: N,
                available: self.bytes.len(),
            });
        }
        let (head, rest) = self.bytes.split_at(N);
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        self.bytes = rest;
        Ok(out)
    }

    fn bitfield(&mut self, field: &'static str) -> Result<SignerBitfield, CodecError> {
        let (bitfield, used) = SignerBitfield::read_packed(self.bytes)
            .map_err(|source| CodecError::Bitfield { field, source })?;
        self.bytes = &self.bytes[used..];
        Ok(bitfield)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use vcblock_types::{
        CommitteeMember, Epoch, KeyPair, NetworkAddress, ViewChangeCounter, ViewChangeStage,
    };

    fn sample_block() -> ViewChangeBlockGossip {
        let keys: Vec<_> = (1..=3u8).map(|i| KeyPair::from_seed(&[i; 32])).collect();
        let candidate = CommitteeMember::new(
            keys[1].public_key(),
            NetworkAddress::new(IpAddr::V4(Ipv4Addr::new(10, 1, 1, 2)), 33133),
        );
        let header = ViewChangeHeader::new(
            Epoch(7),
            ViewChangeCounter(1),
            1,
            &candidate,
            ViewChangeStage::DsBlockConsensus,
            99,
        );
        ViewChangeBlockGossip::new(ViewChangeProof {
            cs1: keys[0].sign(&header.to_bytes()),
            cs2: keys[2].sign(b"cs2"),
            b1: SignerBitfield::from_flags(&[true, true, false]),
            b2: SignerBitfield::from_flags(&[true, false, true]),
            header,
        })
    }

    #[test]
    fn test_decode_at_offset() {
        let block = sample_block();
        let mut message = vec![0xAA, 0xBB, 0xCC];
        message.extend_from_slice(&block.encode());

        let decoded = ViewChangeBlockGossip::decode(&message, 3).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_wire_prefix_is_co_signed_message() {
        let block = sample_block();
        let encoded = block.encode();
        let signed = block.proof.co_signed_message();
        assert_eq!(&encoded[..signed.len()], signed.as_slice());
    }

    #[test]
    fn test_rejects_bad_offset() {
        assert_eq!(
            ViewChangeBlockGossip::decode(&[1, 2], 3),
            Err(CodecError::OffsetOutOfRange { offset: 3, len: 2 })
        );
    }

    #[test]
    fn test_rejects_truncated_message() {
        let encoded = sample_block().encode();

        let err = ViewChangeBlockGossip::decode(&encoded[..50], 0).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { field: "header", .. }));

        let err = ViewChangeBlockGossip::decode(&encoded[..encoded.len() - 1], 0).unwrap_err();
        assert!(matches!(err, CodecError::Bitfield { field: "b2", .. }));
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut encoded = sample_block().encode();
        encoded.push(0);
        assert_eq!(
            ViewChangeBlockGossip::decode(&encoded, 0),
            Err(CodecError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_rejects_unknown_stage() {
        let mut encoded = sample_block().encode();
        encoded[82] = 200;
        assert_eq!(
            ViewChangeBlockGossip::decode(&encoded, 0),
            Err(CodecError::Stage(UnknownStage(200)))
        );
    }
}
