//! Stable identifiers for users, roles, proposals, amendments and challenges.
//!
//! Users and roles are keyed by the platform's string ids; everything the
//! simulation creates itself is numbered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A participant, keyed by the chat platform's account id.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A privilege or party role, keyed by the chat platform's role id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

macro_rules! numbered_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub fn new(n: u64) -> Self {
                Self(n)
            }

            pub fn get(&self) -> u64 {
                self.0
            }

            /// The identifier following this one.
            pub fn next(&self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

numbered_id!(
    /// A proposal (provision) number.
    ProposalId,
    "#"
);
numbered_id!(
    /// A constitutional amendment number.
    AmendmentNumber,
    "amendment #"
);
numbered_id!(
    /// A judicial challenge number.
    ChallengeId,
    "challenge #"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_ids_display_with_prefix() {
        assert_eq!(ProposalId::new(7).to_string(), "#7");
        assert_eq!(AmendmentNumber::new(3).to_string(), "amendment #3");
        assert_eq!(ChallengeId::new(1).next(), ChallengeId::new(2));
    }
}
