//! Decoded views of margin program accounts, as returned by a [`MarginVenue`].
//!
//! [`MarginVenue`]: crate::venue::MarginVenue

mod account;
mod bank;
mod cache;
mod group;

pub use {account::*, bank::*, cache::*, group::*};

/// Number of token slots in a group.
pub const MAX_TOKENS: usize = 16;
/// Slot of the quote currency; always the last one.
pub const QUOTE_INDEX: usize = MAX_TOKENS - 1;
/// Number of node bank slots in a root bank.
pub const MAX_NODE_BANKS: usize = 8;
