//! User storage trait and the bulk-update patch.

use crate::StoreError;
use polity_types::{Money, Timestamp, UserId};
use serde::{Deserialize, Deserializer, Serialize};

/// A participant in the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    /// Whether this user's ballots are counted.
    pub can_vote: bool,
    /// The region this voter is registered at.
    pub region: String,
    /// When the voter last registered, for the re-registration cooldown.
    #[serde(default)]
    pub registered_at: Option<Timestamp>,
    /// The god-king may veto any proposal.
    #[serde(default)]
    pub is_god_king: bool,
    #[serde(default)]
    pub is_judiciary: bool,
    #[serde(default)]
    pub vetoes: u32,
    pub balance: Money,
}

impl UserRecord {
    /// A newly discovered member: may vote, registered at the home region.
    pub fn new(id: UserId, name: impl Into<String>, home_region: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            can_vote: true,
            region: home_region.into(),
            registered_at: None,
            is_god_king: false,
            is_judiciary: false,
            vetoes: 0,
            balance: Money::ZERO,
        }
    }
}

/// A partial update to one user, used for bulk updates.
///
/// `None` leaves a field unchanged. A present-but-empty string is an
/// explicit clear, and `Some(None)` clears an optional field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_vote: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub registered_at: Option<Option<Timestamp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_judiciary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Money>,
}

/// Keeps an explicit `null` distinct from an omitted field.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl UserPatch {
    pub fn for_user(id: UserId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Apply every present field to `user`.
    pub fn apply(&self, user: &mut UserRecord) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(can_vote) = self.can_vote {
            user.can_vote = can_vote;
        }
        if let Some(region) = &self.region {
            user.region = region.clone();
        }
        if let Some(registered_at) = self.registered_at {
            user.registered_at = registered_at;
        }
        if let Some(is_judiciary) = self.is_judiciary {
            user.is_judiciary = is_judiciary;
        }
        if let Some(balance) = self.balance {
            user.balance = balance;
        }
    }
}

/// Trait for user storage operations.
pub trait UserStore {
    fn get_user(&self, id: &UserId) -> Result<UserRecord, StoreError>;
    fn put_user(&self, user: &UserRecord) -> Result<(), StoreError>;
    fn add_user(&self, user: &UserRecord) -> Result<(), StoreError>;
    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Apply a batch of patches. Unknown ids are skipped; the number of
    /// users actually updated is returned.
    fn update_many_users(&self, patches: &[UserPatch]) -> Result<usize, StoreError>;

    /// Find a user by case-insensitive name.
    fn find_user_by_name(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list_users()?
            .into_iter()
            .find(|u| u.name.to_lowercase() == wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_are_unchanged_and_empty_string_clears() {
        let mut user = UserRecord::new(UserId::new("1"), "alice", "Schmuckserver");
        user.registered_at = Some(Timestamp::new(10));

        let patch = UserPatch {
            region: Some(String::new()),
            registered_at: Some(None),
            ..UserPatch::for_user(UserId::new("1"))
        };
        patch.apply(&mut user);

        assert_eq!(user.name, "alice");
        assert!(user.can_vote);
        assert_eq!(user.region, "");
        assert_eq!(user.registered_at, None);
    }

    #[test]
    fn patch_json_omits_absent_fields() {
        let patch = UserPatch {
            is_judiciary: Some(true),
            ..UserPatch::for_user(UserId::new("9"))
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"id":"9","is_judiciary":true}"#);
        let back: UserPatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn explicit_null_is_a_clear_not_an_omission() {
        let cleared: UserPatch =
            serde_json::from_str(r#"{"id":"9","registered_at":null}"#).unwrap();
        assert_eq!(cleared.registered_at, Some(None));
        let omitted: UserPatch = serde_json::from_str(r#"{"id":"9"}"#).unwrap();
        assert_eq!(omitted.registered_at, None);
    }
}
