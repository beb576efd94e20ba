//! Proposal storage trait.

use crate::StoreError;
use polity_types::{Outcome, ProposalId, ProposalKind, RiggingMode, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A proposal (provision) put to a community vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: ProposalId,
    pub proposer: UserId,
    pub proposer_name: String,
    pub kind: ProposalKind,
    pub rigging: RiggingMode,
    pub submitted_at: Timestamp,
    /// Set when the poll is opened; `None` means the proposal is unposted.
    pub proposed_at: Option<Timestamp>,
    pub closes_at: Option<Timestamp>,
    pub outcome: Outcome,
    #[serde(default)]
    pub has_been_challenged: bool,
    /// While under judicial review the proposal neither passes nor fails.
    #[serde(default)]
    pub in_judicial_review: bool,
}

impl ProposalRecord {
    pub fn is_posted(&self) -> bool {
        self.proposed_at.is_some()
    }

    /// Open, posted, past its close time and not paused by a challenge.
    pub fn is_resolvable(&self, now: Timestamp) -> bool {
        self.outcome.is_open()
            && self.is_posted()
            && !self.in_judicial_review
            && self.closes_at.is_some_and(|close| close < now)
    }
}

/// Which proposals to list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalFilter {
    All,
    /// Outcome still `Open`.
    Open,
    /// Poll not yet opened.
    Unposted,
    /// Ready to be decided at the given time.
    Resolvable(Timestamp),
}

impl ProposalFilter {
    pub fn matches(&self, proposal: &ProposalRecord) -> bool {
        match self {
            Self::All => true,
            Self::Open => proposal.outcome.is_open(),
            Self::Unposted => !proposal.is_posted(),
            Self::Resolvable(now) => proposal.is_resolvable(*now),
        }
    }
}

/// Trait for proposal storage operations.
pub trait ProposalStore {
    /// Store a new proposal under the next free id and return that id.
    /// The `id` field of `proposal` is ignored.
    fn add_proposal(&self, proposal: ProposalRecord) -> Result<ProposalId, StoreError>;
    fn get_proposal(&self, id: ProposalId) -> Result<ProposalRecord, StoreError>;
    fn put_proposal(&self, proposal: &ProposalRecord) -> Result<(), StoreError>;
    /// Matching proposals, in id order.
    fn list_proposals(&self, filter: ProposalFilter) -> Result<Vec<ProposalRecord>, StoreError>;
}
