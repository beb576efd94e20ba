//! Fundamental types for the polity simulation.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identifiers, timestamps, money, vote and outcome enums, proposal kinds,
//! expiry actions, ledger kinds, the lunar payout period, and the voting rules.

pub mod amount;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod params;
pub mod period;
pub mod position;
pub mod proposal;
pub mod time;
pub mod vote;

pub use amount::Money;
pub use error::PolityError;
pub use ids::{AmendmentNumber, ChallengeId, ProposalId, RoleId, UserId};
pub use ledger::{GoodId, TransactionKind};
pub use params::VotingRules;
pub use period::{period_for, LunarQuarter};
pub use position::ExpiryAction;
pub use proposal::{Enactment, ProposalKind};
pub use time::{Clock, SystemClock, Timestamp, SECS_PER_DAY, SECS_PER_HOUR, SECS_PER_WEEK};
pub use vote::{Choice, JudicialAnswer, Outcome, RiggingMode, TieBreak};
