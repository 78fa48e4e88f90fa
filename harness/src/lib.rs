//! Fixture orchestration for exercising a margin/lending program against a
//! running network: deterministic mints, funded identities, holding accounts,
//! group lifecycle, cache refresh and sub-account deposits/withdrawals.

pub mod cache;
pub mod config;
pub mod error;
pub mod funding;
pub mod group;
pub mod ledger;
pub mod mint;
pub mod poll;
pub mod position;
pub mod scenario;
pub mod seeds;
pub mod state;
pub mod token_account;
pub mod venue;

pub use {
    config::{HarnessConfig, PollPolicy},
    error::{HarnessError, Result, VenueError},
    ledger::{Ledger, RpcLedger},
    seeds::SeedTable,
    venue::MarginVenue,
};
