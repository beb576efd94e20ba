use polity_store::StoreError;
use polity_types::AmendmentNumber;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConstiError {
    #[error("{0} not found")]
    AmendmentNotFound(AmendmentNumber),

    #[error("{0} is already repealed")]
    AlreadyRepealed(AmendmentNumber),

    #[error("{0} has already been challenged")]
    AlreadyChallenged(AmendmentNumber),

    #[error("amendment text is empty")]
    EmptyText,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ConstiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}
