//! Repository traits for the polity simulation.
//!
//! Persistence is an external collaborator: every engine reads and writes
//! through these traits and never sees the backend. Each `put_*`, `add_*`
//! and `delete_*` call is a single atomic write.

pub mod ballot;
pub mod challenge;
pub mod constitution;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod position;
pub mod proposal;
pub mod region;
pub mod role;
pub mod user;

pub use ballot::BallotStore;
pub use challenge::{ChallengeRecord, ChallengeStore, ChallengeTarget};
pub use constitution::{AmendmentRecord, ConstitutionStore};
pub use error::StoreError;
pub use ledger::{LedgerEntry, LedgerFilter, LedgerStore};
pub use memory::{MemoryStore, StoreSnapshot};
pub use position::{PositionRecord, PositionStore};
pub use proposal::{ProposalFilter, ProposalRecord, ProposalStore};
pub use region::{RegionRecord, RegionStore};
pub use role::{RoleRecord, RoleStore};
pub use user::{UserPatch, UserRecord, UserStore};

/// Every store the engines use, as one bound.
pub trait Repository:
    UserStore
    + RoleStore
    + RegionStore
    + ProposalStore
    + ChallengeStore
    + PositionStore
    + LedgerStore
    + ConstitutionStore
    + BallotStore
{
}

impl<T> Repository for T where
    T: UserStore
        + RoleStore
        + RegionStore
        + ProposalStore
        + ChallengeStore
        + PositionStore
        + LedgerStore
        + ConstitutionStore
        + BallotStore
{
}
