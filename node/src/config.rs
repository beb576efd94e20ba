//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use polity_types::{Money, RoleId, UserId, VotingRules};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a polity node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the state snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Seconds between heartbeat passes (polls, challenges, resolutions).
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Seconds between reconciliation passes (roster, payday, positions).
    #[serde(default = "default_reconcile_secs")]
    pub reconcile_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pays income and is left out of the money supply.
    #[serde(default = "default_treasury_user")]
    pub treasury_user: UserId,

    /// Role whose renewals are priced by the inflation curve.
    #[serde(default)]
    pub priced_role: Option<RoleId>,

    #[serde(default = "default_base_price")]
    pub base_price: Money,

    /// Tell holders when a plain lapse takes their role away.
    #[serde(default)]
    pub notify_on_role_loss: bool,

    /// How long the judiciary has to rule on a challenge.
    #[serde(default = "default_challenge_window_hours")]
    pub challenge_window_hours: u64,

    /// Members holding this role sit on the judiciary.
    #[serde(default)]
    pub judiciary_role: Option<RoleId>,

    /// Only holders of this role may bless.
    #[serde(default)]
    pub pope_role: Option<RoleId>,

    /// Marks a blessed member for a day.
    #[serde(default)]
    pub blessed_role: Option<RoleId>,

    /// Region newly discovered members are registered at.
    #[serde(default = "default_home_region")]
    pub home_region: String,

    /// Opening balance of a newly discovered member.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Money,

    /// TOML roster of members and roles, for running without a platform.
    #[serde(default)]
    pub roster_file: Option<PathBuf>,

    #[serde(default)]
    pub rules: VotingRules,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./polity_data")
}

fn default_heartbeat_secs() -> u64 {
    15
}

fn default_reconcile_secs() -> u64 {
    3600
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_treasury_user() -> UserId {
    UserId::new("treasury")
}

fn default_base_price() -> Money {
    Money::new(100)
}

fn default_challenge_window_hours() -> u64 {
    168
}

fn default_home_region() -> String {
    "Capital".to_string()
}

fn default_starting_balance() -> Money {
    Money::new(100)
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// The parsed `log_format`. Anything but "json" is human-readable.
    pub fn log_format(&self) -> LogFormat {
        if self.log_format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Human
        }
    }

    /// Where the state snapshot lives.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            heartbeat_secs: default_heartbeat_secs(),
            reconcile_secs: default_reconcile_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            treasury_user: default_treasury_user(),
            priced_role: None,
            base_price: default_base_price(),
            notify_on_role_loss: false,
            challenge_window_hours: default_challenge_window_hours(),
            judiciary_role: None,
            pope_role: None,
            blessed_role: None,
            home_region: default_home_region(),
            starting_balance: default_starting_balance(),
            roster_file: None,
            rules: VotingRules::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polity_types::TieBreak;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().expect("should serialize");
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.heartbeat_secs, config.heartbeat_secs);
        assert_eq!(parsed.base_price, config.base_price);
        assert_eq!(parsed.rules, config.rules);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.heartbeat_secs, 15);
        assert_eq!(config.reconcile_secs, 3600);
        assert_eq!(config.challenge_window_hours, 168);
        assert_eq!(config.base_price, Money::new(100));
        assert_eq!(config.home_region, "Capital");
        assert_eq!(config.judiciary_role, None);
        assert_eq!(config.rules.allowed_open_proposals, 10);
        assert_eq!(config.rules.ubi_amount, Money::new(500));
        assert_eq!(config.log_format(), LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            heartbeat_secs = 5
            treasury_user = "bank"
            priced_role = "baron"
            log_format = "json"

            [rules]
            tie_break = "coinflip"
            poll_availability_hours = 48
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.heartbeat_secs, 5);
        assert_eq!(config.treasury_user, UserId::new("bank"));
        assert_eq!(config.priced_role, Some(RoleId::new("baron")));
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.rules.tie_break, TieBreak::Coinflip);
        assert_eq!(config.rules.poll_availability_hours, 48);
        assert_eq!(config.rules.allowed_open_proposals, 10); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/polity.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn state_lives_in_the_data_dir() {
        let config = NodeConfig {
            data_dir: PathBuf::from("/var/lib/polity"),
            ..NodeConfig::default()
        };
        assert_eq!(config.state_path(), PathBuf::from("/var/lib/polity/state.json"));
    }
}
