//! Expiry policies for temporary positions.

use crate::error::PolityError;
use serde::{Deserialize, Serialize};

/// What happens when a temporary position reaches its expiry time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpiryAction {
    /// The privilege is revoked and the position deleted.
    LoseRole,
    /// The holder is charged to renew the position for another term.
    ChargedMoney,
    /// Placeholder for elected positions; expiry performs no transition yet.
    ReElection,
}

impl ExpiryAction {
    pub fn code(&self) -> u8 {
        match self {
            Self::LoseRole => 0,
            Self::ChargedMoney => 1,
            Self::ReElection => 2,
        }
    }

    /// Decode a stored action code. An unknown code is an invariant
    /// violation, not something to coerce.
    pub fn from_code(code: u8) -> Result<Self, PolityError> {
        match code {
            0 => Ok(Self::LoseRole),
            1 => Ok(Self::ChargedMoney),
            2 => Ok(Self::ReElection),
            _ => Err(PolityError::UnknownCode {
                kind: "expiry action",
                code,
            }),
        }
    }
}
