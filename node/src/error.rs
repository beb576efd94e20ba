use polity_types::{RoleId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] polity_governance::GovernanceError),

    #[error("constitution error: {0}")]
    Consti(#[from] polity_consti::ConstiError),

    #[error("economy error: {0}")]
    Economy(#[from] polity_economy::EconomyError),

    #[error("store error: {0}")]
    Store(#[from] polity_store::StoreError),

    #[error("{user} does not hold {role}")]
    NotPermitted { user: UserId, role: RoleId },

    #[error("no member named {0}")]
    UnknownMember(String),

    #[error("no recognized party is called {0}")]
    UnknownParty(String),

    #[error("{user} is already a member of {party}")]
    AlreadyInParty { user: UserId, party: String },

    #[error("{user} is not a member of {party}")]
    NotInParty { user: UserId, party: String },

    #[error("platform error: {0}")]
    Platform(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// A dependency was unreachable. The scheduler retries on its next tick
    /// instead of treating the failure as a bug.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Governance(e) => e.is_transient(),
            Self::Consti(e) => e.is_transient(),
            Self::Economy(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
            Self::Platform(_) | Self::Io(_) => true,
            Self::Config(_)
            | Self::NotPermitted { .. }
            | Self::UnknownMember(_)
            | Self::UnknownParty(_)
            | Self::AlreadyInParty { .. }
            | Self::NotInParty { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polity_store::StoreError;

    #[test]
    fn backend_failures_are_transient() {
        let err = NodeError::from(StoreError::Backend("down".into()));
        assert!(err.is_transient());
        let nested = NodeError::from(polity_governance::GovernanceError::from(
            StoreError::Backend("down".into()),
        ));
        assert!(nested.is_transient());
    }

    #[test]
    fn invariant_violations_are_not() {
        let err = NodeError::from(polity_governance::GovernanceError::AlreadyResolved(
            polity_types::ProposalId::new(3),
        ));
        assert!(!err.is_transient());
        assert!(!NodeError::Config("bad".into()).is_transient());
    }
}
