use polity_consti::ConstiError;
use polity_store::StoreError;
use polity_types::{AmendmentNumber, ChallengeId, ProposalId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("{0} not found")]
    ChallengeNotFound(ChallengeId),

    #[error("{0} not found")]
    AmendmentNotFound(AmendmentNumber),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// Re-resolving a decided proposal is a caller bug.
    #[error("proposal {0} has already been resolved")]
    AlreadyResolved(ProposalId),

    #[error("proposal {0} has not been put to a vote yet")]
    NotPosted(ProposalId),

    #[error("the judicial roster is empty")]
    NoJudges,

    #[error("too many open proposals: {open} open, {allowed} allowed")]
    TooManyOpenProposals { open: usize, allowed: usize },

    #[error("an identical proposal is already open as {0}")]
    DuplicateProposal(ProposalId),

    #[error("{0} may not veto this proposal")]
    VetoNotPermitted(UserId),

    #[error("{0} has already been challenged")]
    AlreadyChallenged(String),

    #[error("{0} is closed")]
    ChallengeClosed(ChallengeId),

    #[error("{0} does not sit on the judiciary")]
    NotAJudge(UserId),

    #[error("registrations are closed")]
    RegistrationClosed,

    #[error("region {0} is not recognized")]
    UnrecognizedRegion(String),

    #[error("registered too recently: {remaining_secs}s until the cooldown ends")]
    RegistrationCooldown { remaining_secs: u64 },

    #[error("constitution error: {0}")]
    Consti(#[from] ConstiError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GovernanceError {
    /// The backing store was unreachable; the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::Consti(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Replace a store `NotFound` with the domain-specific variant.
pub(crate) fn or_missing<T>(
    result: Result<T, StoreError>,
    missing: impl FnOnce() -> GovernanceError,
) -> Result<T, GovernanceError> {
    match result {
        Ok(value) => Ok(value),
        Err(StoreError::NotFound(_)) => Err(missing()),
        Err(e) => Err(e.into()),
    }
}
