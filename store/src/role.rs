//! Role storage trait.

use crate::StoreError;
use polity_types::{Money, RoleId};
use serde::{Deserialize, Serialize};

/// A platform role known to the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    #[serde(default = "default_true")]
    pub can_vote: bool,
    #[serde(default)]
    pub is_political_party: bool,
    #[serde(default)]
    pub is_elected_position: bool,
    /// Income paid to holders each period, if higher than the base income.
    #[serde(default)]
    pub salary: Option<Money>,
    /// Length of one term of a temporary position in this role.
    #[serde(default = "default_term_length_days")]
    pub term_length_days: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_term_length_days() -> Option<u64> {
    Some(14)
}

impl RoleRecord {
    /// A newly discovered platform role with default settings.
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            can_vote: true,
            is_political_party: false,
            is_elected_position: false,
            salary: None,
            term_length_days: default_term_length_days(),
        }
    }
}

/// Trait for role storage operations.
pub trait RoleStore {
    fn get_role(&self, id: &RoleId) -> Result<RoleRecord, StoreError>;
    fn put_role(&self, role: &RoleRecord) -> Result<(), StoreError>;
    fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError>;

    /// Find a role by case-insensitive name.
    fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, StoreError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list_roles()?
            .into_iter()
            .find(|r| r.name.to_lowercase() == wanted))
    }

    /// Find a recognized political party by case-insensitive name.
    fn find_party_by_name(&self, name: &str) -> Result<Option<RoleRecord>, StoreError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list_roles()?
            .into_iter()
            .find(|r| r.is_political_party && r.name.to_lowercase() == wanted))
    }
}
