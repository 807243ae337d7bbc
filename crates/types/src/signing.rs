//! Canonical signed messages for view-change co-signatures.
//!
//! The layout is byte-exact and shared with every other implementation that
//! produces or checks view-change blocks. No domain tag is prepended.
//!
//! | Offset | Content |
//! |--------|---------|
//! | `0` | serialized [`ViewChangeHeader`] |
//! | [`CS1_OFFSET`] | first-round co-signature (CS1) |
//! | [`B1_OFFSET`] | packed B1 bitfield (`u16` BE length, MSB-first bits) |

use crate::{Signature, SignerBitfield, ViewChangeHeader, SIGNATURE_SIZE};

/// Offset of CS1 within the co-signed message.
pub const CS1_OFFSET: usize = ViewChangeHeader::SIZE;

/// Offset of the packed B1 bitfield within the co-signed message.
pub const B1_OFFSET: usize = ViewChangeHeader::SIZE + SIGNATURE_SIZE;

/// Build the message the first-round co-signature (CS1) signs.
pub fn view_change_header_message(header: &ViewChangeHeader) -> Vec<u8> {
    header.to_bytes()
}

/// Build the message the quorum co-signature (CS2) signs.
///
/// header || CS1 || packed B1.
pub fn view_change_cosig_message(
    header: &ViewChangeHeader,
    cs1: &Signature,
    b1: &SignerBitfield,
) -> Vec<u8> {
    let mut message = Vec::with_capacity(B1_OFFSET + SignerBitfield::packed_size(b1.len()));
    header.write_to(&mut message);
    message.extend_from_slice(cs1.as_bytes());
    b1.write_packed(&mut message);
    message
}
