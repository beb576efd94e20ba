//! Ballot answers, rigging and tie-break policies, and proposal outcomes.

use crate::error::PolityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A voter's answer on a proposal poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    Yae,
    Nay,
    Abstain,
}

impl Choice {
    /// Parse a poll answer label, case-insensitively.
    ///
    /// Returns `None` for anything that is not one of the three answers; the
    /// tally drops such ballots instead of failing.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "yae" => Some(Self::Yae),
            "nay" => Some(Self::Nay),
            "abstain" => Some(Self::Abstain),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Yae => "Yae",
            Self::Nay => "Nay",
            Self::Abstain => "Abstain",
        }
    }
}

/// A judge's answer on a constitutionality ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JudicialAnswer {
    Constitutional,
    Unconstitutional,
}

impl JudicialAnswer {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "constitutional" => Some(Self::Constitutional),
            "unconstitutional" => Some(Self::Unconstitutional),
            _ => None,
        }
    }
}

impl fmt::Display for JudicialAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constitutional => write!(f, "constitutional"),
            Self::Unconstitutional => write!(f, "unconstitutional"),
        }
    }
}

/// A forced-outcome override applied before a proposal is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiggingMode {
    #[default]
    None,
    MustPass,
    MustFail,
}

impl RiggingMode {
    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::MustPass => 1,
            Self::MustFail => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, PolityError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::MustPass),
            2 => Ok(Self::MustFail),
            _ => Err(PolityError::UnknownCode {
                kind: "rigging mode",
                code,
            }),
        }
    }
}

/// How an exact Yae/Nay tie is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Uniformly random.
    Coinflip,
    /// Ties pass.
    Passes,
    /// Ties fail.
    #[default]
    Fails,
}

impl TieBreak {
    /// Decode a stored policy code. Codes other than the three known ones
    /// fall back to [`TieBreak::Fails`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Coinflip,
            1 => Self::Passes,
            _ => Self::Fails,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Coinflip => 0,
            Self::Passes => 1,
            Self::Fails => 2,
        }
    }
}

/// The decision state of a proposal.
///
/// Created `Open`; moves to `Passed` or `Failed` exactly once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Open,
    Passed,
    Failed,
}

impl Outcome {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Passed => "passed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_labels_are_case_insensitive() {
        assert_eq!(Choice::from_label("YAE"), Some(Choice::Yae));
        assert_eq!(Choice::from_label(" nay "), Some(Choice::Nay));
        assert_eq!(Choice::from_label("Abstain"), Some(Choice::Abstain));
        assert_eq!(Choice::from_label("maybe"), None);
    }

    #[test]
    fn unknown_tie_break_code_fails() {
        assert_eq!(TieBreak::from_code(0), TieBreak::Coinflip);
        assert_eq!(TieBreak::from_code(1), TieBreak::Passes);
        assert_eq!(TieBreak::from_code(2), TieBreak::Fails);
        assert_eq!(TieBreak::from_code(42), TieBreak::Fails);
    }

    #[test]
    fn unknown_rigging_code_is_an_error() {
        assert_eq!(RiggingMode::from_code(1).unwrap(), RiggingMode::MustPass);
        assert!(RiggingMode::from_code(9).is_err());
    }
}
