#![deny(warnings)]

//! Ledger seam: the only place balances change.
//!
//! The rules engine is pure; it reads a [`PlayerState`] and a
//! [`MarketSnapshot`] and produces an [`Intent`]. A [`Ledger`] owns the
//! authoritative balances, serializes commits per user, re-checks each
//! intent against the locked state and deduplicates on `(user, nonce)`.
//! [`MemoryLedger`] is the in-process implementation used by tests and the
//! CLI.

mod apply;
pub mod memory;
pub mod snapshot;

use mine_core::{EconomyError, MarketSnapshot, PlayerState, UserId};
use mine_econ::upgrade::UpgradeOutcome;
use mine_econ::Intent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::{base_market, Account, MemoryLedger};
pub use snapshot::LedgerSnapshot;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Rule(#[from] EconomyError),
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("user {0} already has an account")]
    DuplicateUser(UserId),
    /// The intent no longer matches what the engine computes now.
    #[error("stale intent: {0}")]
    Stale(String),
    #[error("ledger lock poisoned")]
    Poisoned,
    #[error("snapshot io error: {0}")]
    Io(String),
    #[error("snapshot json error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Json(e.to_string())
    }
}

/// Proof of a committed intent. Replaying the same `(user, nonce)` returns
/// the stored receipt unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub user: UserId,
    pub nonce: u64,
    /// Ledger-wide commit order.
    pub seq: u64,
    pub kind: String,
    pub balance_after: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<UpgradeOutcome>,
    /// Instance id of a newly purchased or crafted rig.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rig_instance: Option<u64>,
}

pub trait Ledger {
    fn player_state(&self, user: &UserId) -> Result<PlayerState, LedgerError>;
    fn market_state(&self) -> Result<MarketSnapshot, LedgerError>;
    fn commit(&self, intent: &Intent) -> Result<Receipt, LedgerError>;
}
