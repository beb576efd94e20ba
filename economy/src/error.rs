use polity_store::StoreError;
use polity_types::{Money, RoleId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("no user named {0}")]
    RecipientNotFound(String),

    #[error("role {0} not found")]
    RoleNotFound(RoleId),

    #[error("insufficient funds: have {balance}, need {needed}")]
    InsufficientFunds { balance: Money, needed: Money },

    #[error("{user} already holds {role}")]
    AlreadyHeld { user: UserId, role: RoleId },

    #[error("role {0} has no term length")]
    NoTerm(RoleId),

    #[error("{0} has already been blessed")]
    AlreadyBlessed(UserId),

    #[error("{user} holds no {role} to bless")]
    NothingToBless { user: UserId, role: RoleId },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("cannot transfer to yourself")]
    SelfTransfer,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EconomyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

pub(crate) fn or_missing<T>(
    result: Result<T, StoreError>,
    missing: impl FnOnce() -> EconomyError,
) -> Result<T, EconomyError> {
    match result {
        Ok(value) => Ok(value),
        Err(StoreError::NotFound(_)) => Err(missing()),
        Err(e) => Err(e.into()),
    }
}
