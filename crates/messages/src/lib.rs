//! Network messages for view changes.

pub mod gossip;

pub use gossip::{CodecError, ViewChangeBlockGossip};
