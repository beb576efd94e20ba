//! The chat platform the community lives on, seen from the node.
//!
//! The node pulls its member and role lists from a [`RosterSource`], grants
//! and revokes privileges through a [`PrivilegeGate`], and talks to people
//! through a [`Notifier`]. [`LogPlatform`] implements all three on top of
//! `tracing`, and [`StaticRoster`] serves a roster loaded from TOML, so the
//! node can run with no platform attached.

use std::path::Path;

use serde::{Deserialize, Serialize};

use polity_types::{RoleId, UserId};

use crate::NodeError;

/// A member as the platform reports them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub name: String,
    /// Every role the member currently holds.
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRole {
    pub id: RoleId,
    pub name: String,
    /// Members may join and leave this role freely.
    #[serde(default)]
    pub is_political_party: bool,
}

pub trait RosterSource: Send + Sync {
    fn members(&self) -> Result<Vec<Member>, NodeError>;
    fn roles(&self) -> Result<Vec<PlatformRole>, NodeError>;
}

pub trait PrivilegeGate: Send + Sync {
    fn grant(&self, user: &UserId, role: &RoleId) -> Result<(), NodeError>;
    fn revoke(&self, user: &UserId, role: &RoleId) -> Result<(), NodeError>;
}

pub trait Notifier: Send + Sync {
    /// Something an operator has to look at.
    fn warn_operator(&self, message: &str) -> Result<(), NodeError>;
    /// A direct message to one member.
    fn notify_user(&self, user: &UserId, message: &str) -> Result<(), NodeError>;
    /// A message to the whole community.
    fn announce(&self, message: &str) -> Result<(), NodeError>;
}

/// Writes every platform call to the log instead of a platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPlatform;

impl PrivilegeGate for LogPlatform {
    fn grant(&self, user: &UserId, role: &RoleId) -> Result<(), NodeError> {
        tracing::info!(%user, %role, "role granted");
        Ok(())
    }

    fn revoke(&self, user: &UserId, role: &RoleId) -> Result<(), NodeError> {
        tracing::info!(%user, %role, "role revoked");
        Ok(())
    }
}

impl Notifier for LogPlatform {
    fn warn_operator(&self, message: &str) -> Result<(), NodeError> {
        tracing::warn!(target: "polity::operator", "{message}");
        Ok(())
    }

    fn notify_user(&self, user: &UserId, message: &str) -> Result<(), NodeError> {
        tracing::info!(target: "polity::notice", %user, "{message}");
        Ok(())
    }

    fn announce(&self, message: &str) -> Result<(), NodeError> {
        tracing::info!(target: "polity::announce", "{message}");
        Ok(())
    }
}

/// A fixed roster.
///
/// ```toml
/// [[roles]]
/// id = "10"
/// name = "Judiciary"
///
/// [[roles]]
/// id = "20"
/// name = "Green Party"
/// is_political_party = true
///
/// [[members]]
/// id = "1"
/// name = "alice"
/// roles = ["10"]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoster {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub roles: Vec<PlatformRole>,
}

impl StaticRoster {
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}

impl RosterSource for StaticRoster {
    fn members(&self) -> Result<Vec<Member>, NodeError> {
        Ok(self.members.clone())
    }

    fn roles(&self) -> Result<Vec<PlatformRole>, NodeError> {
        Ok(self.roles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_parses_members_and_roles() {
        let roster = StaticRoster::from_toml_str(
            r#"
            [[roles]]
            id = "10"
            name = "Judiciary"

            [[roles]]
            id = "20"
            name = "Green Party"
            is_political_party = true

            [[members]]
            id = "1"
            name = "alice"
            roles = ["10"]

            [[members]]
            id = "2"
            name = "bob"
            "#,
        )
        .unwrap();
        let members = roster.members().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].roles, vec![RoleId::new("10")]);
        assert!(members[1].roles.is_empty());
        let roles = roster.roles().unwrap();
        assert_eq!(roles[0].name, "Judiciary");
        assert!(!roles[0].is_political_party);
        assert!(roles[1].is_political_party);
    }

    #[test]
    fn empty_roster_is_valid() {
        let roster = StaticRoster::from_toml_str("").unwrap();
        assert!(roster.members().unwrap().is_empty());
    }

    #[test]
    fn missing_roster_file_is_a_config_error() {
        let result = StaticRoster::from_toml_file(Path::new("/nonexistent/roster.toml"));
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
