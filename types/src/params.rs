//! Voting rules: the community's tunable governance settings.

use crate::amount::Money;
use crate::vote::TieBreak;
use serde::{Deserialize, Serialize};

/// Governance settings shared by every engine.
///
/// Loaded from the `[rules]` table of the node configuration; every field
/// falls back to its default when omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingRules {
    /// How an exact Yae/Nay tie is decided.
    #[serde(default)]
    pub tie_break: TieBreak,

    /// How long a proposal poll stays open.
    #[serde(default = "default_poll_availability_hours")]
    pub poll_availability_hours: u64,

    /// Maximum number of proposals that may be open at once.
    #[serde(default = "default_allowed_open_proposals")]
    pub allowed_open_proposals: usize,

    /// Income paid to every user each lunar quarter, unless a held role pays more.
    #[serde(default = "default_ubi_amount")]
    pub ubi_amount: Money,

    /// Whether voters may register to a region.
    #[serde(default = "default_true")]
    pub accepting_new_registrations: bool,

    /// Minimum hours between two registrations of the same voter.
    #[serde(default = "default_registration_cooldown_hours")]
    pub registration_cooldown_hours: u64,

    #[serde(default = "default_government_name")]
    pub name_of_government: String,

    #[serde(default = "default_judiciary_name")]
    pub name_of_judiciary: String,
}

fn default_poll_availability_hours() -> u64 {
    24
}

fn default_allowed_open_proposals() -> usize {
    10
}

fn default_ubi_amount() -> Money {
    Money::new(500)
}

fn default_true() -> bool {
    true
}

fn default_registration_cooldown_hours() -> u64 {
    72
}

fn default_government_name() -> String {
    "the Government".to_string()
}

fn default_judiciary_name() -> String {
    "the Judiciary".to_string()
}

impl Default for VotingRules {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::default(),
            poll_availability_hours: default_poll_availability_hours(),
            allowed_open_proposals: default_allowed_open_proposals(),
            ubi_amount: default_ubi_amount(),
            accepting_new_registrations: default_true(),
            registration_cooldown_hours: default_registration_cooldown_hours(),
            name_of_government: default_government_name(),
            name_of_judiciary: default_judiciary_name(),
        }
    }
}
