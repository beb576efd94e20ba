//! The node's shared view of the community.
//!
//! Built once at startup and rebuilt by every reconciliation pass. The
//! heartbeat only reads it.

use std::collections::HashMap;

use polity_economy::RoleHoldings;
use polity_governance::{GovernanceError, JudicialRoster};
use polity_store::{RoleRecord, UserRecord};
use polity_types::{RoleId, UserId};

use crate::platform::Member;

#[derive(Clone, Debug, Default)]
pub struct CivicContext {
    pub users: HashMap<UserId, UserRecord>,
    pub roles: HashMap<RoleId, RoleRecord>,
    /// Names of the regions voters may register at.
    pub regions: Vec<String>,
    /// Roles held per member, as of the last roster pull.
    pub holdings: RoleHoldings,
}

impl CivicContext {
    pub fn set_users(&mut self, users: Vec<UserRecord>) {
        self.users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
    }

    pub fn set_roles(&mut self, roles: Vec<RoleRecord>) {
        self.roles = roles.into_iter().map(|r| (r.id.clone(), r)).collect();
    }

    pub fn set_holdings(&mut self, members: &[Member]) {
        self.holdings = members
            .iter()
            .map(|m| (m.id.clone(), m.roles.clone()))
            .collect();
    }

    /// Number of users sitting on the judiciary.
    pub fn judge_count(&self) -> u32 {
        self.users.values().filter(|u| u.is_judiciary).count() as u32
    }

    /// The bench as it stands. Fails when nobody sits on it.
    pub fn judicial_roster(&self) -> Result<JudicialRoster, GovernanceError> {
        JudicialRoster::new(self.judge_count())
    }

    pub fn holds(&self, user: &UserId, role: &RoleId) -> bool {
        self.holdings
            .get(user)
            .is_some_and(|roles| roles.contains(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judge(id: &str) -> UserRecord {
        let mut user = UserRecord::new(UserId::new(id), id, "Capital");
        user.is_judiciary = true;
        user
    }

    #[test]
    fn roster_counts_judges_only() {
        let mut ctx = CivicContext::default();
        ctx.set_users(vec![
            judge("a"),
            judge("b"),
            UserRecord::new(UserId::new("c"), "c", "Capital"),
        ]);
        let roster = ctx.judicial_roster().unwrap();
        assert_eq!(roster.raw(), 2);
        assert_eq!(roster.adjusted(), 3);
    }

    #[test]
    fn empty_bench_is_an_error() {
        let ctx = CivicContext::default();
        assert!(matches!(ctx.judicial_roster(), Err(GovernanceError::NoJudges)));
    }

    #[test]
    fn holdings_follow_the_roster() {
        let mut ctx = CivicContext::default();
        ctx.set_holdings(&[Member {
            id: UserId::new("a"),
            name: "a".into(),
            roles: vec![RoleId::new("r")],
        }]);
        assert!(ctx.holds(&UserId::new("a"), &RoleId::new("r")));
        assert!(!ctx.holds(&UserId::new("b"), &RoleId::new("r")));
    }
}
