//! holderwatch - live holder/seller ledger for a tracked Solana token
//!
//! Snapshots come from a chain of public holder APIs; incremental buys and
//! sells arrive by webhook. Both feed one in-memory ledger whose nice/naughty
//! projections are pushed to WebSocket subscribers.

pub mod apis;
pub mod arguments;
pub mod broadcast;
pub mod config;
pub mod errors;
pub mod holders;
pub mod logger;

#[cfg(feature = "web")]
pub mod webserver;
