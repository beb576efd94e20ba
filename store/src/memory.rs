//! Thread-safe in-memory repository with JSON snapshots.
//!
//! Backs the daemon (persisted to a single JSON file between runs) and every
//! test in the workspace.

use crate::ballot::BallotStore;
use crate::challenge::{ChallengeRecord, ChallengeStore};
use crate::constitution::{AmendmentRecord, ConstitutionStore};
use crate::ledger::{LedgerEntry, LedgerFilter, LedgerStore};
use crate::position::{PositionRecord, PositionStore};
use crate::proposal::{ProposalFilter, ProposalRecord, ProposalStore};
use crate::region::{RegionRecord, RegionStore};
use crate::role::{RoleRecord, RoleStore};
use crate::user::{UserPatch, UserRecord, UserStore};
use crate::StoreError;
use polity_types::{
    AmendmentNumber, ChallengeId, JudicialAnswer, ProposalId, RoleId, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBallot {
    pub proposal: ProposalId,
    pub voter: UserId,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRuling {
    pub challenge: ChallengeId,
    pub judge: UserId,
    pub answer: JudicialAnswer,
}

/// The complete persisted state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: BTreeMap<String, UserRecord>,
    #[serde(default)]
    pub roles: BTreeMap<String, RoleRecord>,
    #[serde(default)]
    pub regions: Vec<RegionRecord>,
    #[serde(default)]
    pub proposals: Vec<ProposalRecord>,
    #[serde(default)]
    pub challenges: Vec<ChallengeRecord>,
    #[serde(default)]
    pub positions: Vec<PositionRecord>,
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
    #[serde(default)]
    pub amendments: Vec<AmendmentRecord>,
    #[serde(default)]
    pub ballots: Vec<StoredBallot>,
    #[serde(default)]
    pub rulings: Vec<StoredRuling>,
}

pub struct MemoryStore {
    state: Mutex<StoreSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_snapshot(StoreSnapshot::default())
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }

    /// Load a snapshot file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no state file yet, starting empty");
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&contents)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current state to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.snapshot()?)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        Ok(self.state()?.clone())
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreSnapshot>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for MemoryStore {
    fn get_user(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        self.state()?
            .users
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    fn put_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.users.get_mut(user.id.as_str()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("user {}", user.id))),
        }
    }

    fn add_user(&self, user: &UserRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if state.users.contains_key(user.id.as_str()) {
            return Err(StoreError::Duplicate(format!("user {}", user.id)));
        }
        state.users.insert(user.id.as_str().to_string(), user.clone());
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.state()?.users.values().cloned().collect())
    }

    fn update_many_users(&self, patches: &[UserPatch]) -> Result<usize, StoreError> {
        let mut state = self.state()?;
        let mut updated = 0;
        for patch in patches {
            if let Some(user) = state.users.get_mut(patch.id.as_str()) {
                patch.apply(user);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

impl RoleStore for MemoryStore {
    fn get_role(&self, id: &RoleId) -> Result<RoleRecord, StoreError> {
        self.state()?
            .roles
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("role {id}")))
    }

    fn put_role(&self, role: &RoleRecord) -> Result<(), StoreError> {
        self.state()?
            .roles
            .insert(role.id.as_str().to_string(), role.clone());
        Ok(())
    }

    fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError> {
        Ok(self.state()?.roles.values().cloned().collect())
    }
}

impl RegionStore for MemoryStore {
    fn put_region(&self, region: &RegionRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.regions.iter_mut().find(|r| r.name == region.name) {
            Some(existing) => *existing = region.clone(),
            None => state.regions.push(region.clone()),
        }
        Ok(())
    }

    fn list_regions(&self) -> Result<Vec<RegionRecord>, StoreError> {
        Ok(self.state()?.regions.clone())
    }
}

impl ProposalStore for MemoryStore {
    fn add_proposal(&self, mut proposal: ProposalRecord) -> Result<ProposalId, StoreError> {
        let mut state = self.state()?;
        let id = state
            .proposals
            .iter()
            .map(|p| p.id)
            .max()
            .map(|max| max.next())
            .unwrap_or(ProposalId::new(1));
        proposal.id = id;
        state.proposals.push(proposal);
        Ok(id)
    }

    fn get_proposal(&self, id: ProposalId) -> Result<ProposalRecord, StoreError> {
        self.state()?
            .proposals
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("proposal {id}")))
    }

    fn put_proposal(&self, proposal: &ProposalRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.proposals.iter_mut().find(|p| p.id == proposal.id) {
            Some(existing) => {
                *existing = proposal.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("proposal {}", proposal.id))),
        }
    }

    fn list_proposals(&self, filter: ProposalFilter) -> Result<Vec<ProposalRecord>, StoreError> {
        let mut found: Vec<ProposalRecord> = self
            .state()?
            .proposals
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }
}

impl ChallengeStore for MemoryStore {
    fn add_challenge(&self, mut challenge: ChallengeRecord) -> Result<ChallengeId, StoreError> {
        let mut state = self.state()?;
        let id = state
            .challenges
            .iter()
            .map(|c| c.id)
            .max()
            .map(|max| max.next())
            .unwrap_or(ChallengeId::new(1));
        challenge.id = id;
        state.challenges.push(challenge);
        Ok(id)
    }

    fn get_challenge(&self, id: ChallengeId) -> Result<ChallengeRecord, StoreError> {
        self.state()?
            .challenges
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{id}")))
    }

    fn put_challenge(&self, challenge: &ChallengeRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.challenges.iter_mut().find(|c| c.id == challenge.id) {
            Some(existing) => {
                *existing = challenge.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{}", challenge.id))),
        }
    }

    fn list_challenges(&self, active_only: bool) -> Result<Vec<ChallengeRecord>, StoreError> {
        let mut found: Vec<ChallengeRecord> = self
            .state()?
            .challenges
            .iter()
            .filter(|c| !active_only || c.active)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }
}

impl PositionStore for MemoryStore {
    fn add_position(&self, position: &PositionRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if state
            .positions
            .iter()
            .any(|p| p.user == position.user && p.role == position.role)
        {
            return Err(StoreError::Duplicate(format!(
                "position {}/{}",
                position.user, position.role
            )));
        }
        state.positions.push(position.clone());
        Ok(())
    }

    fn get_position(&self, user: &UserId, role: &RoleId) -> Result<PositionRecord, StoreError> {
        self.state()?
            .positions
            .iter()
            .find(|p| &p.user == user && &p.role == role)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("position {user}/{role}")))
    }

    fn put_position(&self, position: &PositionRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state
            .positions
            .iter_mut()
            .find(|p| p.user == position.user && p.role == position.role)
        {
            Some(existing) => {
                *existing = position.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "position {}/{}",
                position.user, position.role
            ))),
        }
    }

    fn delete_position(&self, user: &UserId, role: &RoleId) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let before = state.positions.len();
        state
            .positions
            .retain(|p| !(&p.user == user && &p.role == role));
        if state.positions.len() == before {
            return Err(StoreError::NotFound(format!("position {user}/{role}")));
        }
        Ok(())
    }

    fn list_positions(&self) -> Result<Vec<PositionRecord>, StoreError> {
        Ok(self.state()?.positions.clone())
    }
}

impl LedgerStore for MemoryStore {
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.state()?.ledger.push(entry.clone());
        Ok(())
    }

    fn list_entries(&self, filter: LedgerFilter) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .state()?
            .ledger
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}

impl ConstitutionStore for MemoryStore {
    fn get_amendment(&self, number: AmendmentNumber) -> Result<AmendmentRecord, StoreError> {
        self.state()?
            .amendments
            .iter()
            .find(|a| a.number == number)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{number}")))
    }

    fn put_amendment(&self, amendment: &AmendmentRecord) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state
            .amendments
            .iter_mut()
            .find(|a| a.number == amendment.number)
        {
            Some(existing) => *existing = amendment.clone(),
            None => state.amendments.push(amendment.clone()),
        }
        Ok(())
    }

    fn list_amendments(&self) -> Result<Vec<AmendmentRecord>, StoreError> {
        let mut all = self.state()?.amendments.clone();
        all.sort_by_key(|a| a.number);
        Ok(all)
    }
}

impl BallotStore for MemoryStore {
    fn cast_ballot(
        &self,
        proposal: ProposalId,
        voter: &UserId,
        answer: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        state
            .ballots
            .retain(|b| !(b.proposal == proposal && &b.voter == voter));
        state.ballots.push(StoredBallot {
            proposal,
            voter: voter.clone(),
            answer: answer.to_string(),
        });
        Ok(())
    }

    fn ballots_for(&self, proposal: ProposalId) -> Result<Vec<(UserId, String)>, StoreError> {
        Ok(self
            .state()?
            .ballots
            .iter()
            .filter(|b| b.proposal == proposal)
            .map(|b| (b.voter.clone(), b.answer.clone()))
            .collect())
    }

    fn cast_ruling(
        &self,
        challenge: ChallengeId,
        judge: &UserId,
        answer: JudicialAnswer,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        state
            .rulings
            .retain(|r| !(r.challenge == challenge && &r.judge == judge));
        state.rulings.push(StoredRuling {
            challenge,
            judge: judge.clone(),
            answer,
        });
        Ok(())
    }

    fn rulings_for(
        &self,
        challenge: ChallengeId,
    ) -> Result<Vec<(UserId, JudicialAnswer)>, StoreError> {
        Ok(self
            .state()?
            .rulings
            .iter()
            .filter(|r| r.challenge == challenge)
            .map(|r| (r.judge.clone(), r.answer))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polity_types::{ExpiryAction, Money, Outcome, ProposalKind, RiggingMode, Timestamp};

    fn proposal() -> ProposalRecord {
        ProposalRecord {
            id: ProposalId::new(0),
            proposer: UserId::new("1"),
            proposer_name: "alice".into(),
            kind: ProposalKind::Dissolve,
            rigging: RiggingMode::MustFail,
            submitted_at: Timestamp::new(10),
            proposed_at: None,
            closes_at: None,
            outcome: Outcome::Open,
            has_been_challenged: false,
            in_judicial_review: false,
        }
    }

    #[test]
    fn proposal_ids_are_assigned_sequentially() {
        let store = MemoryStore::new();
        assert_eq!(store.add_proposal(proposal()).unwrap(), ProposalId::new(1));
        assert_eq!(store.add_proposal(proposal()).unwrap(), ProposalId::new(2));
        assert_eq!(store.list_proposals(ProposalFilter::Unposted).unwrap().len(), 2);
    }

    #[test]
    fn resolvable_filter_skips_proposals_in_review() {
        let store = MemoryStore::new();
        let id = store.add_proposal(proposal()).unwrap();
        let mut p = store.get_proposal(id).unwrap();
        p.proposed_at = Some(Timestamp::new(10));
        p.closes_at = Some(Timestamp::new(20));
        store.put_proposal(&p).unwrap();
        assert_eq!(
            store.list_proposals(ProposalFilter::Resolvable(Timestamp::new(21))).unwrap().len(),
            1
        );

        p.in_judicial_review = true;
        store.put_proposal(&p).unwrap();
        assert!(store
            .list_proposals(ProposalFilter::Resolvable(Timestamp::new(21)))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn positions_are_unique_per_user_and_role() {
        let store = MemoryStore::new();
        let position = PositionRecord {
            user: UserId::new("1"),
            role: RoleId::new("high"),
            expires_at: Timestamp::new(100),
            action: ExpiryAction::LoseRole,
            charge_amount: Some(Money::new(5)),
            is_elected_position: false,
        };
        store.add_position(&position).unwrap();
        assert!(matches!(
            store.add_position(&position),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(store.list_expired_positions(Timestamp::new(99)).unwrap().len(), 0);
        assert_eq!(store.list_expired_positions(Timestamp::new(100)).unwrap().len(), 1);
        store.delete_position(&position.user, &position.role).unwrap();
        assert!(store.get_position(&position.user, &position.role).is_err());
    }

    #[test]
    fn recasting_a_ballot_replaces_the_earlier_answer() {
        let store = MemoryStore::new();
        let voter = UserId::new("7");
        store.cast_ballot(ProposalId::new(1), &voter, "yae").unwrap();
        store.cast_ballot(ProposalId::new(1), &voter, "nay").unwrap();
        assert_eq!(
            store.ballots_for(ProposalId::new(1)).unwrap(),
            vec![(voter, "nay".to_string())]
        );
    }

    #[test]
    fn snapshot_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = MemoryStore::new();
        store
            .add_user(&UserRecord::new(UserId::new("1"), "alice", "home"))
            .unwrap();
        store.add_proposal(proposal()).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.snapshot().unwrap(), store.snapshot().unwrap());
    }

    #[test]
    fn loading_a_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.list_users().unwrap().is_empty());
    }
}
