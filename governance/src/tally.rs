//! Regional tally aggregation.
//!
//! Reduces raw per-voter ballots into per-region (yae, nay, abstain) counts.
//! Ballots from ineligible voters and unrecognized answers are dropped
//! silently; nothing here fails on bad ballot content.

use polity_store::UserRecord;
use polity_types::{Choice, UserId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One raw ballot as delivered by a ballot source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    pub voter: UserId,
    /// The answer label exactly as cast, e.g. "Yae".
    pub answer: String,
}

impl Ballot {
    pub fn new(voter: impl Into<UserId>, answer: impl Into<String>) -> Self {
        Self {
            voter: voter.into(),
            answer: answer.into(),
        }
    }
}

/// Who may vote, and where they are registered.
pub trait Electorate {
    fn region_of(&self, voter: &UserId) -> Option<&str>;
    fn is_eligible(&self, voter: &UserId) -> bool;
}

/// An [`Electorate`] snapshot built from the user records.
#[derive(Clone, Debug, Default)]
pub struct VoterRoll {
    voters: HashMap<UserId, (String, bool)>,
}

impl VoterRoll {
    pub fn from_users<'a>(users: impl IntoIterator<Item = &'a UserRecord>) -> Self {
        let voters = users
            .into_iter()
            .map(|u| (u.id.clone(), (u.region.clone(), u.can_vote)))
            .collect();
        Self { voters }
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}

impl Electorate for VoterRoll {
    fn region_of(&self, voter: &UserId) -> Option<&str> {
        self.voters.get(voter).map(|(region, _)| region.as_str())
    }

    /// Unknown users are not eligible.
    fn is_eligible(&self, voter: &UserId) -> bool {
        self.voters.get(voter).is_some_and(|(_, can_vote)| *can_vote)
    }
}

/// Vote counts for one region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegionCounts {
    pub yae: u64,
    pub nay: u64,
    pub abstain: u64,
}

impl RegionCounts {
    fn record(&mut self, choice: Choice) {
        match choice {
            Choice::Yae => self.yae += 1,
            Choice::Nay => self.nay += 1,
            Choice::Abstain => self.abstain += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.yae + self.nay + self.abstain
    }
}

/// Region name to vote counts, iterated in region-name order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegionTally(BTreeMap<String, RegionCounts>);

impl RegionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region: &str) -> Option<&RegionCounts> {
        self.0.get(region)
    }

    pub fn insert(&mut self, region: impl Into<String>, counts: RegionCounts) {
        self.0.insert(region.into(), counts);
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &RegionCounts)> {
        self.0.iter().map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ballots counted across every region.
    pub fn ballots_counted(&self) -> u64 {
        self.0.values().map(RegionCounts::total).sum()
    }
}

/// Tally ballots by the voter's registered region.
///
/// A voter that is eligible but has no known region is counted under an
/// empty region name rather than dropped.
pub fn tally_by_region<'a, E>(ballots: impl IntoIterator<Item = &'a Ballot>, electorate: &E) -> RegionTally
where
    E: Electorate + ?Sized,
{
    let mut tally = RegionTally::new();
    for ballot in ballots {
        if !electorate.is_eligible(&ballot.voter) {
            continue;
        }
        let Some(choice) = Choice::from_label(&ballot.answer) else {
            tracing::trace!(voter = %ballot.voter, answer = %ballot.answer, "ignoring unrecognized answer");
            continue;
        };
        let region = electorate.region_of(&ballot.voter).unwrap_or_default();
        tally.0.entry(region.to_string()).or_default().record(choice);
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll() -> VoterRoll {
        let mut alice = UserRecord::new(UserId::new("a"), "alice", "north");
        alice.can_vote = true;
        let bob = UserRecord::new(UserId::new("b"), "bob", "south");
        let mut carol = UserRecord::new(UserId::new("c"), "carol", "north");
        carol.can_vote = false;
        VoterRoll::from_users(&[alice, bob, carol])
    }

    #[test]
    fn counts_by_region() {
        let ballots = vec![
            Ballot::new("a", "Yae"),
            Ballot::new("b", "nay"),
            Ballot::new("b", "Abstain"),
        ];
        let tally = tally_by_region(&ballots, &roll());
        assert_eq!(
            tally.get("north"),
            Some(&RegionCounts { yae: 1, nay: 0, abstain: 0 })
        );
        assert_eq!(
            tally.get("south"),
            Some(&RegionCounts { yae: 0, nay: 1, abstain: 1 })
        );
    }

    #[test]
    fn ineligible_and_unknown_voters_are_dropped() {
        let ballots = vec![Ballot::new("c", "Yae"), Ballot::new("zed", "Yae")];
        let tally = tally_by_region(&ballots, &roll());
        assert!(tally.is_empty());
    }

    #[test]
    fn unrecognized_answers_are_ignored() {
        let ballots = vec![Ballot::new("a", "maybe"), Ballot::new("a", "YAE")];
        let tally = tally_by_region(&ballots, &roll());
        assert_eq!(tally.ballots_counted(), 1);
    }

    #[test]
    fn regions_iterate_in_name_order() {
        let ballots = vec![Ballot::new("b", "Yae"), Ballot::new("a", "Yae")];
        let tally = tally_by_region(&ballots, &roll());
        let names: Vec<&str> = tally.regions().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["north", "south"]);
    }
}
