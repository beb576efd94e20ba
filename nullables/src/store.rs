//! Nullable store: in-memory storage that can be taken offline.

use polity_store::{
    AmendmentRecord, BallotStore, ChallengeRecord, ChallengeStore, ConstitutionStore,
    LedgerEntry, LedgerFilter, LedgerStore, MemoryStore, PositionRecord, PositionStore,
    ProposalFilter, ProposalRecord, ProposalStore, RegionRecord, RegionStore, RoleRecord,
    RoleStore, StoreError, UserPatch, UserRecord, UserStore,
};
use polity_types::{AmendmentNumber, ChallengeId, JudicialAnswer, ProposalId, RoleId, UserId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An in-memory repository for testing.
///
/// While offline every call fails with [`StoreError::Backend`] and nothing
/// is read or written, like an unreachable database.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    inner: MemoryStore,
    offline: AtomicBool,
    rejected: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Calls refused while offline.
    pub fn rejected_calls(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StoreError::Backend("store offline".into()));
        }
        Ok(())
    }
}

impl UserStore for NullStore {
    fn get_user(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        self.check()?;
        self.inner.get_user(id)
    }

    fn put_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_user(user)
    }

    fn add_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.add_user(user)
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.check()?;
        self.inner.list_users()
    }

    fn update_many_users(&self, patches: &[UserPatch]) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.update_many_users(patches)
    }
}

impl RoleStore for NullStore {
    fn get_role(&self, id: &RoleId) -> Result<RoleRecord, StoreError> {
        self.check()?;
        self.inner.get_role(id)
    }

    fn put_role(&self, role: &RoleRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_role(role)
    }

    fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError> {
        self.check()?;
        self.inner.list_roles()
    }
}

impl RegionStore for NullStore {
    fn put_region(&self, region: &RegionRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_region(region)
    }

    fn list_regions(&self) -> Result<Vec<RegionRecord>, StoreError> {
        self.check()?;
        self.inner.list_regions()
    }
}

impl ProposalStore for NullStore {
    fn add_proposal(&self, proposal: ProposalRecord) -> Result<ProposalId, StoreError> {
        self.check()?;
        self.inner.add_proposal(proposal)
    }

    fn get_proposal(&self, id: ProposalId) -> Result<ProposalRecord, StoreError> {
        self.check()?;
        self.inner.get_proposal(id)
    }

    fn put_proposal(&self, proposal: &ProposalRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_proposal(proposal)
    }

    fn list_proposals(&self, filter: ProposalFilter) -> Result<Vec<ProposalRecord>, StoreError> {
        self.check()?;
        self.inner.list_proposals(filter)
    }
}

impl ChallengeStore for NullStore {
    fn add_challenge(&self, challenge: ChallengeRecord) -> Result<ChallengeId, StoreError> {
        self.check()?;
        self.inner.add_challenge(challenge)
    }

    fn get_challenge(&self, id: ChallengeId) -> Result<ChallengeRecord, StoreError> {
        self.check()?;
        self.inner.get_challenge(id)
    }

    fn put_challenge(&self, challenge: &ChallengeRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_challenge(challenge)
    }

    fn list_challenges(&self, active_only: bool) -> Result<Vec<ChallengeRecord>, StoreError> {
        self.check()?;
        self.inner.list_challenges(active_only)
    }
}

impl PositionStore for NullStore {
    fn add_position(&self, position: &PositionRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.add_position(position)
    }

    fn get_position(&self, user: &UserId, role: &RoleId) -> Result<PositionRecord, StoreError> {
        self.check()?;
        self.inner.get_position(user, role)
    }

    fn put_position(&self, position: &PositionRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_position(position)
    }

    fn delete_position(&self, user: &UserId, role: &RoleId) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete_position(user, role)
    }

    fn list_positions(&self) -> Result<Vec<PositionRecord>, StoreError> {
        self.check()?;
        self.inner.list_positions()
    }
}

impl LedgerStore for NullStore {
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.check()?;
        self.inner.append_entry(entry)
    }

    fn list_entries(&self, filter: LedgerFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        self.check()?;
        self.inner.list_entries(filter)
    }
}

impl ConstitutionStore for NullStore {
    fn get_amendment(&self, number: AmendmentNumber) -> Result<AmendmentRecord, StoreError> {
        self.check()?;
        self.inner.get_amendment(number)
    }

    fn put_amendment(&self, amendment: &AmendmentRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put_amendment(amendment)
    }

    fn list_amendments(&self) -> Result<Vec<AmendmentRecord>, StoreError> {
        self.check()?;
        self.inner.list_amendments()
    }
}

impl BallotStore for NullStore {
    fn cast_ballot(
        &self,
        proposal: ProposalId,
        voter: &UserId,
        answer: &str,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.inner.cast_ballot(proposal, voter, answer)
    }

    fn ballots_for(&self, proposal: ProposalId) -> Result<Vec<(UserId, String)>, StoreError> {
        self.check()?;
        self.inner.ballots_for(proposal)
    }

    fn cast_ruling(
        &self,
        challenge: ChallengeId,
        judge: &UserId,
        answer: JudicialAnswer,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.inner.cast_ruling(challenge, judge, answer)
    }

    fn rulings_for(
        &self,
        challenge: ChallengeId,
    ) -> Result<Vec<(UserId, JudicialAnswer)>, StoreError> {
        self.check()?;
        self.inner.rulings_for(challenge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_store_rejects_and_counts_calls() {
        let store = NullStore::new();
        store
            .add_user(&UserRecord::new(UserId::new("1"), "alice", "capital"))
            .unwrap();
        store.set_offline(true);
        assert!(matches!(store.list_users(), Err(StoreError::Backend(_))));
        assert_eq!(store.rejected_calls(), 1);
        store.set_offline(false);
        assert_eq!(store.list_users().unwrap().len(), 1);
    }
}
