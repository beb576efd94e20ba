//! Append-only transaction ledger.

use crate::StoreError;
use polity_types::{period_for, LunarQuarter, Money, Timestamp, TransactionKind, UserId};
use serde::{Deserialize, Serialize};

/// One entry of the transaction ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: TransactionKind,
    pub actor: UserId,
    pub amount: Money,
    pub timestamp: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerFilter {
    All,
    Income,
    NonIncome,
}

impl LedgerFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        match self {
            Self::All => true,
            Self::Income => entry.kind.is_income(),
            Self::NonIncome => !entry.kind.is_income(),
        }
    }
}

/// Trait for the transaction ledger.
pub trait LedgerStore {
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Matching entries in append order.
    fn list_entries(&self, filter: LedgerFilter) -> Result<Vec<LedgerEntry>, StoreError>;

    /// The lunar quarter of the most recent income payout. A ledger with no
    /// income yet reports `NewMoon`.
    fn last_income_period(&self) -> Result<LunarQuarter, StoreError> {
        let last = self
            .list_entries(LedgerFilter::Income)?
            .into_iter()
            .max_by_key(|e| e.timestamp);
        Ok(last
            .map(|e| period_for(e.timestamp))
            .unwrap_or(LunarQuarter::NewMoon))
    }
}
