//! Bitfield for tracking which committee members have signed.

/// A compact bitfield representing which committee members have signed.
///
/// Bit `i` corresponds to committee index `i`. Bits are packed MSB-first:
/// member `i` lives in byte `i / 8` under mask `0x80 >> (i % 8)`. The packed
/// wire form is prefixed with the bit count as a big-endian `u16`, and this
/// exact layout is part of the co-signed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerBitfield {
    /// The bitfield bytes.
    bits: Vec<u8>,
    /// Number of committee members (bits that are valid).
    num_members: usize,
}

impl SignerBitfield {
    /// Largest bit count the length prefix can carry.
    pub const MAX_LEN: usize = u16::MAX as usize;

    /// Size of the length prefix in the packed form.
    pub const LEN_PREFIX: usize = 2;

    /// Create a new empty bitfield for the given number of members.
    ///
    /// # Panics
    ///
    /// Panics if `num_members` exceeds [`Self::MAX_LEN`].
    pub fn new(num_members: usize) -> Self {
        assert!(
            num_members <= Self::MAX_LEN,
            "bitfield length {num_members} exceeds {}",
            Self::MAX_LEN
        );
        Self {
            bits: vec![0u8; num_members.div_ceil(8)],
            num_members,
        }
    }

    /// Build a bitfield from one flag per member.
    pub fn from_flags(flags: &[bool]) -> Self {
        let mut bf = Self::new(flags.len());
        for (i, _) in flags.iter().enumerate().filter(|(_, set)| **set) {
            bf.set(i);
        }
        bf
    }

    /// Set a bit (mark member as having signed).
    pub fn set(&mut self, index: usize) {
        if index < self.num_members {
            self.bits[index / 8] |= Self::mask(index);
        }
    }

    /// Clear a bit.
    pub fn clear(&mut self, index: usize) {
        if index < self.num_members {
            self.bits[index / 8] &= !Self::mask(index);
        }
    }

    /// Check if a bit is set.
    pub fn is_set(&self, index: usize) -> bool {
        if index >= self.num_members {
            return false;
        }
        self.bits[index / 8] & Self::mask(index) != 0
    }

    /// Count the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Number of members this bitfield represents.
    pub fn len(&self) -> usize {
        self.num_members
    }

    /// Get iterator over indices of set bits.
    pub fn set_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_members).filter(|&i| self.is_set(i))
    }

    /// Size of the packed form for a bitfield of `num_members` bits.
    pub fn packed_size(num_members: usize) -> usize {
        Self::LEN_PREFIX + num_members.div_ceil(8)
    }

    /// Append the packed form (`u16` BE length || packed bytes) to `out`.
    pub fn write_packed(&self, out: &mut Vec<u8>) {
        // `new` bounds num_members to u16.
        out.extend_from_slice(&(self.num_members as u16).to_be_bytes());
        out.extend_from_slice(&self.bits);
    }

    /// Read a packed bitfield from the front of `bytes`.
    ///
    /// Returns the bitfield and the number of bytes consumed. Padding bits in
    /// the final byte must be zero so that every bitfield has exactly one
    /// encoding and the popcount matches the set members.
    pub fn read_packed(bytes: &[u8]) -> Result<(Self, usize), BitfieldError> {
        if bytes.len() < Self::LEN_PREFIX {
            return Err(BitfieldError::Truncated {
                needed: Self::LEN_PREFIX,
                available: bytes.len(),
            });
        }
        let num_members = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let total = Self::packed_size(num_members);
        if bytes.len() < total {
            return Err(BitfieldError::Truncated {
                needed: total,
                available: bytes.len(),
            });
        }

        let bits = bytes[Self::LEN_PREFIX..total].to_vec();
        let used = num_members % 8;
        if used != 0 {
            let padding = 0xffu8 >> used;
            if bits[bits.len() - 1] & padding != 0 {
                return Err(BitfieldError::NonZeroPadding);
            }
        }

        Ok((Self { bits, num_members }, total))
    }

    fn mask(index: usize) -> u8 {
        0x80 >> (index % 8)
    }
}

/// Errors from decoding a packed bitfield.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitfieldError {
    /// Input shorter than the encoded length requires.
    #[error("bitfield truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        available: usize,
    },

    /// Unused bits in the last byte are set.
    #[error("bitfield padding bits are not zero")]
    NonZeroPadding,
}
