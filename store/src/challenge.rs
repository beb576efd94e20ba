//! Judicial challenge storage trait.

use crate::StoreError;
use polity_types::{AmendmentNumber, ChallengeId, JudicialAnswer, ProposalId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a judicial challenge is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeTarget {
    /// A proposal still being voted on.
    Proposal(ProposalId),
    /// A ratified amendment.
    Amendment(AmendmentNumber),
}

impl ChallengeTarget {
    pub fn is_amendment(&self) -> bool {
        matches!(self, Self::Amendment(_))
    }
}

impl fmt::Display for ChallengeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposal(id) => write!(f, "proposal {id}"),
            Self::Amendment(number) => write!(f, "{number}"),
        }
    }
}

/// A request to rule a proposal or amendment unconstitutional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub id: ChallengeId,
    pub target: ChallengeTarget,
    pub challenged_by: UserId,
    /// The author of the challenged proposal; amendments have none.
    pub original_proposer: Option<UserId>,
    /// Set at filing when the original proposer sits on the bench.
    pub recusal_required: bool,
    pub active: bool,
    /// The ruling, once the challenge has closed.
    pub ruling: Option<JudicialAnswer>,
    /// Sticky: the final-day reminder has been sent.
    pub last_day_pinged: bool,
    pub filed_at: Timestamp,
    pub closes_at: Timestamp,
}

/// Trait for judicial challenge storage operations.
pub trait ChallengeStore {
    /// Store a new challenge under the next free id and return that id.
    fn add_challenge(&self, challenge: ChallengeRecord) -> Result<ChallengeId, StoreError>;
    fn get_challenge(&self, id: ChallengeId) -> Result<ChallengeRecord, StoreError>;
    fn put_challenge(&self, challenge: &ChallengeRecord) -> Result<(), StoreError>;
    /// Challenges in id order; only active ones when `active_only`.
    fn list_challenges(&self, active_only: bool) -> Result<Vec<ChallengeRecord>, StoreError>;
}
