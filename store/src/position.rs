//! Temporary position storage trait.

use crate::StoreError;
use polity_types::{ExpiryAction, Money, RoleId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A time-limited privilege held by one user. Keyed by (user, role).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub user: UserId,
    pub role: RoleId,
    pub expires_at: Timestamp,
    pub action: ExpiryAction,
    /// The exact amount a ChargedMoney renewal debits, when the role is not
    /// priced by the market.
    #[serde(default)]
    pub charge_amount: Option<Money>,
    #[serde(default)]
    pub is_elected_position: bool,
}

impl PositionRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Trait for temporary position storage operations.
pub trait PositionStore {
    fn add_position(&self, position: &PositionRecord) -> Result<(), StoreError>;
    fn get_position(&self, user: &UserId, role: &RoleId) -> Result<PositionRecord, StoreError>;
    fn put_position(&self, position: &PositionRecord) -> Result<(), StoreError>;
    fn delete_position(&self, user: &UserId, role: &RoleId) -> Result<(), StoreError>;
    fn list_positions(&self) -> Result<Vec<PositionRecord>, StoreError>;

    /// Positions whose expiry time has been reached.
    fn list_expired_positions(&self, now: Timestamp) -> Result<Vec<PositionRecord>, StoreError> {
        Ok(self
            .list_positions()?
            .into_iter()
            .filter(|p| p.is_expired(now))
            .collect())
    }
}
