//! Gossip messages broadcast to committee members.

mod view_change_block;

pub use view_change_block::{CodecError, ViewChangeBlockGossip};
