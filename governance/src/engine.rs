//! Governance engine: moves proposals and judicial challenges through
//! their lifecycles against the repository.

use crate::ballot::BallotSource;
use crate::error::{or_missing, GovernanceError};
use crate::judicial::{evaluate, JudicialRoster, JudicialVerdict};
use crate::resolution::{resolve, CoinFlip, Totals};
use crate::tally::{tally_by_region, RegionTally, VoterRoll};
use polity_consti::ConstiEngine;
use polity_store::{
    ChallengeRecord, ChallengeTarget, ProposalFilter, ProposalRecord, Repository,
};
use polity_types::{
    ChallengeId, Enactment, JudicialAnswer, Outcome, ProposalId, ProposalKind, Timestamp,
    UserId, VotingRules, SECS_PER_HOUR,
};

/// How close to its deadline a challenge must be before the final-day
/// reminder goes out.
const FINAL_DAY_SECS: u64 = 24 * SECS_PER_HOUR;

/// A proposal that has just been decided.
#[derive(Clone, Debug)]
pub struct ResolvedProposal {
    pub id: ProposalId,
    pub proposer: UserId,
    pub kind: ProposalKind,
    pub outcome: Outcome,
    pub totals: Totals,
    pub tally: RegionTally,
    /// What the dispatcher must carry out. `Nothing` for failed proposals.
    pub enactment: Enactment,
}

/// What a closed challenge did to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RulingEffect {
    /// Upheld; the proposal returns to the normal resolution pass.
    ProposalReleased,
    /// Struck down; the proposal failed.
    ProposalStruck,
    AmendmentUpheld,
    AmendmentRepealed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeEvent {
    /// Sent once, when an undecided challenge enters its last day.
    FinalDayReminder {
        challenge: ChallengeId,
        target: ChallengeTarget,
        closes_at: Timestamp,
        votes_cast: u32,
        required: u32,
    },
    Closed {
        challenge: ChallengeId,
        target: ChallengeTarget,
        verdict: JudicialVerdict,
        effect: RulingEffect,
    },
}

pub struct GovernanceEngine {
    pub rules: VotingRules,
    pub challenge_window_hours: u64,
    consti: ConstiEngine,
}

impl GovernanceEngine {
    pub fn new(rules: VotingRules, challenge_window_hours: u64) -> Self {
        Self {
            rules,
            challenge_window_hours,
            consti: ConstiEngine,
        }
    }

    /// Submit a new proposal. It stays unposted until the next poll pass.
    pub fn submit_proposal<S: Repository + ?Sized>(
        &self,
        store: &S,
        proposer: &UserId,
        kind: ProposalKind,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        let user = or_missing(store.get_user(proposer), || {
            GovernanceError::UserNotFound(proposer.clone())
        })?;

        let open = store.list_proposals(ProposalFilter::Open)?;
        if open.len() >= self.rules.allowed_open_proposals {
            return Err(GovernanceError::TooManyOpenProposals {
                open: open.len(),
                allowed: self.rules.allowed_open_proposals,
            });
        }
        if let Some(existing) = open.iter().find(|p| p.kind == kind) {
            return Err(GovernanceError::DuplicateProposal(existing.id));
        }
        if let ProposalKind::RepealAmendment { number } = &kind {
            let amendment = or_missing(store.get_amendment(*number), || {
                GovernanceError::AmendmentNotFound(*number)
            })?;
            if amendment.deprecated {
                return Err(GovernanceError::AmendmentNotFound(*number));
            }
        }

        let record = ProposalRecord {
            id: ProposalId::new(0),
            proposer: user.id,
            proposer_name: user.name,
            rigging: kind.default_rigging(),
            kind,
            submitted_at: now,
            proposed_at: None,
            closes_at: None,
            outcome: Outcome::Open,
            has_been_challenged: false,
            in_judicial_review: false,
        };
        let id = store.add_proposal(record)?;
        tracing::info!(proposal = %id, proposer = %proposer, "proposal submitted");
        Ok(id)
    }

    /// Open a poll for every unposted proposal.
    pub fn open_polls<S: Repository + ?Sized>(
        &self,
        store: &S,
        now: Timestamp,
    ) -> Result<Vec<ProposalId>, GovernanceError> {
        let mut opened = Vec::new();
        for mut proposal in store.list_proposals(ProposalFilter::Unposted)? {
            if !proposal.outcome.is_open() {
                continue;
            }
            let closes_at = now.plus_hours(self.rules.poll_availability_hours);
            proposal.proposed_at = Some(now);
            proposal.closes_at = Some(closes_at);
            store.put_proposal(&proposal)?;
            tracing::info!(proposal = %proposal.id, %closes_at, "poll opened");
            opened.push(proposal.id);
        }
        Ok(opened)
    }

    /// Record a ballot on an open poll. Unrecognized answers are stored but
    /// will be ignored by the tally.
    pub fn cast_ballot<S: Repository + ?Sized>(
        &self,
        store: &S,
        proposal: ProposalId,
        voter: &UserId,
        answer: &str,
    ) -> Result<(), GovernanceError> {
        let record = self.proposal(store, proposal)?;
        if !record.outcome.is_open() {
            return Err(GovernanceError::AlreadyResolved(proposal));
        }
        if !record.is_posted() {
            return Err(GovernanceError::NotPosted(proposal));
        }
        or_missing(store.get_user(voter), || {
            GovernanceError::UserNotFound(voter.clone())
        })?;
        store.cast_ballot(proposal, voter, answer)?;
        Ok(())
    }

    /// Decide one proposal and persist its outcome.
    pub fn resolve_proposal<S: Repository + ?Sized>(
        &self,
        store: &S,
        id: ProposalId,
        ballots: &dyn BallotSource,
        coin: &dyn CoinFlip,
    ) -> Result<ResolvedProposal, GovernanceError> {
        let mut proposal = self.proposal(store, id)?;
        if !proposal.outcome.is_open() {
            return Err(GovernanceError::AlreadyResolved(id));
        }
        if !proposal.is_posted() {
            return Err(GovernanceError::NotPosted(id));
        }

        let cast = ballots.proposal_ballots(id)?;
        let roll = VoterRoll::from_users(&store.list_users()?);
        let tally = tally_by_region(&cast, &roll);
        let resolution = resolve(&tally, proposal.rigging, self.rules.tie_break, coin);

        proposal.outcome = Outcome::from_passed(resolution.passed);
        store.put_proposal(&proposal)?;
        tracing::info!(
            proposal = %id,
            kind = proposal.kind.key(),
            outcome = %proposal.outcome,
            yae = resolution.totals.yae,
            nay = resolution.totals.nay,
            abstain = resolution.totals.abstain,
            "proposal resolved"
        );

        let enactment = if resolution.passed {
            proposal.kind.enactment()
        } else {
            Enactment::Nothing
        };
        Ok(ResolvedProposal {
            id,
            proposer: proposal.proposer,
            kind: proposal.kind,
            outcome: proposal.outcome,
            totals: resolution.totals,
            tally,
            enactment,
        })
    }

    /// Decide every proposal whose poll has closed and is not under review.
    pub fn resolve_due_proposals<S: Repository + ?Sized>(
        &self,
        store: &S,
        ballots: &dyn BallotSource,
        coin: &dyn CoinFlip,
        now: Timestamp,
    ) -> Result<Vec<ResolvedProposal>, GovernanceError> {
        store
            .list_proposals(ProposalFilter::Resolvable(now))?
            .into_iter()
            .map(|p| self.resolve_proposal(store, p.id, ballots, coin))
            .collect()
    }

    /// Kill an open proposal. Only the god-king or the proposer may do so.
    pub fn veto<S: Repository + ?Sized>(
        &self,
        store: &S,
        actor: &UserId,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<ProposalRecord, GovernanceError> {
        let mut user = or_missing(store.get_user(actor), || {
            GovernanceError::UserNotFound(actor.clone())
        })?;
        let mut proposal = self.proposal(store, id)?;
        if !proposal.outcome.is_open() {
            return Err(GovernanceError::AlreadyResolved(id));
        }
        let own = &proposal.proposer == actor;
        if !user.is_god_king && !own {
            return Err(GovernanceError::VetoNotPermitted(actor.clone()));
        }

        proposal.outcome = Outcome::Failed;
        proposal.closes_at = Some(now);
        store.put_proposal(&proposal)?;
        if !own {
            user.vetoes = user.vetoes.saturating_add(1);
            store.put_user(&user)?;
        }
        tracing::info!(proposal = %id, by = %actor, "proposal vetoed");
        Ok(proposal)
    }

    /// File a challenge against an open proposal or an amendment in force.
    pub fn file_challenge<S: Repository + ?Sized>(
        &self,
        store: &S,
        challenger: &UserId,
        target: ChallengeTarget,
        now: Timestamp,
    ) -> Result<ChallengeId, GovernanceError> {
        or_missing(store.get_user(challenger), || {
            GovernanceError::UserNotFound(challenger.clone())
        })?;

        let original_proposer = match target {
            ChallengeTarget::Proposal(id) => {
                let mut proposal = self.proposal(store, id)?;
                if !proposal.outcome.is_open() {
                    return Err(GovernanceError::AlreadyResolved(id));
                }
                if proposal.has_been_challenged {
                    return Err(GovernanceError::AlreadyChallenged(target.to_string()));
                }
                proposal.has_been_challenged = true;
                proposal.in_judicial_review = true;
                store.put_proposal(&proposal)?;
                Some(proposal.proposer)
            }
            ChallengeTarget::Amendment(number) => {
                self.consti.mark_challenged(store, number)?;
                None
            }
        };

        let recusal_required = match &original_proposer {
            Some(proposer) => store.get_user(proposer).is_ok_and(|u| u.is_judiciary),
            None => false,
        };
        let record = ChallengeRecord {
            id: ChallengeId::new(0),
            target,
            challenged_by: challenger.clone(),
            original_proposer,
            recusal_required,
            active: true,
            ruling: None,
            last_day_pinged: false,
            filed_at: now,
            closes_at: now.plus_hours(self.challenge_window_hours),
        };
        let id = store.add_challenge(record)?;
        tracing::info!(challenge = %id, %target, by = %challenger, recusal_required, "challenge filed");
        Ok(id)
    }

    /// Record a judge's answer on an active challenge.
    pub fn cast_ruling<S: Repository + ?Sized>(
        &self,
        store: &S,
        challenge: ChallengeId,
        judge: &UserId,
        answer: JudicialAnswer,
    ) -> Result<(), GovernanceError> {
        let record = or_missing(store.get_challenge(challenge), || {
            GovernanceError::ChallengeNotFound(challenge)
        })?;
        if !record.active {
            return Err(GovernanceError::ChallengeClosed(challenge));
        }
        let user = or_missing(store.get_user(judge), || {
            GovernanceError::UserNotFound(judge.clone())
        })?;
        if !user.is_judiciary {
            return Err(GovernanceError::NotAJudge(judge.clone()));
        }
        store.cast_ruling(challenge, judge, answer)?;
        Ok(())
    }

    /// Evaluate every active challenge. Closable ones are closed and their
    /// ruling applied to the target; the rest may get a final-day reminder.
    pub fn review_challenges<S: Repository + ?Sized>(
        &self,
        store: &S,
        ballots: &dyn BallotSource,
        roster: &JudicialRoster,
        now: Timestamp,
    ) -> Result<Vec<ChallengeEvent>, GovernanceError> {
        let mut events = Vec::new();
        for mut challenge in store.list_challenges(true)? {
            let answers = ballots.challenge_ballots(challenge.id)?;
            let verdict = evaluate(
                &answers,
                roster,
                challenge.original_proposer.as_ref(),
                challenge.recusal_required,
            );

            if !verdict.closable {
                if !challenge.last_day_pinged
                    && challenge.closes_at <= now.plus_secs(FINAL_DAY_SECS)
                {
                    challenge.last_day_pinged = true;
                    store.put_challenge(&challenge)?;
                    events.push(ChallengeEvent::FinalDayReminder {
                        challenge: challenge.id,
                        target: challenge.target,
                        closes_at: challenge.closes_at,
                        votes_cast: verdict.constitutional_votes + verdict.unconstitutional_votes,
                        required: verdict.required,
                    });
                }
                continue;
            }

            challenge.active = false;
            challenge.ruling = Some(verdict.ruling());
            store.put_challenge(&challenge)?;
            let effect = self.apply_ruling(store, challenge.target, verdict.constitutional, now)?;
            tracing::info!(
                challenge = %challenge.id,
                target = %challenge.target,
                constitutional = verdict.constitutional,
                for_votes = verdict.constitutional_votes,
                against_votes = verdict.unconstitutional_votes,
                "challenge closed"
            );
            events.push(ChallengeEvent::Closed {
                challenge: challenge.id,
                target: challenge.target,
                verdict,
                effect,
            });
        }
        Ok(events)
    }

    /// Carry a closed challenge's ruling over to its target.
    fn apply_ruling<S: Repository + ?Sized>(
        &self,
        store: &S,
        target: ChallengeTarget,
        constitutional: bool,
        now: Timestamp,
    ) -> Result<RulingEffect, GovernanceError> {
        match target {
            ChallengeTarget::Proposal(id) => {
                let mut proposal = self.proposal(store, id)?;
                proposal.in_judicial_review = false;
                let struck = !constitutional && proposal.outcome.is_open();
                if struck {
                    proposal.outcome = Outcome::Failed;
                    proposal.closes_at = Some(now);
                }
                store.put_proposal(&proposal)?;
                Ok(if struck {
                    RulingEffect::ProposalStruck
                } else {
                    RulingEffect::ProposalReleased
                })
            }
            ChallengeTarget::Amendment(number) if !constitutional => {
                self.consti.repeal(store, number)?;
                Ok(RulingEffect::AmendmentRepealed)
            }
            ChallengeTarget::Amendment(_) => Ok(RulingEffect::AmendmentUpheld),
        }
    }

    /// Move a voter to a recognized region.
    pub fn register<S: Repository + ?Sized>(
        &self,
        store: &S,
        voter: &UserId,
        region: &str,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.rules.accepting_new_registrations {
            return Err(GovernanceError::RegistrationClosed);
        }
        if !store.is_recognized_region(region)? {
            return Err(GovernanceError::UnrecognizedRegion(region.to_string()));
        }
        let mut user = or_missing(store.get_user(voter), || {
            GovernanceError::UserNotFound(voter.clone())
        })?;
        let cooldown = self.rules.registration_cooldown_hours * SECS_PER_HOUR;
        if let Some(last) = user.registered_at {
            let elapsed = last.elapsed_since(now);
            if elapsed < cooldown {
                return Err(GovernanceError::RegistrationCooldown {
                    remaining_secs: cooldown - elapsed,
                });
            }
        }
        user.region = region.to_string();
        user.registered_at = Some(now);
        store.put_user(&user)?;
        tracing::info!(user = %voter, region, "voter registered");
        Ok(())
    }

    fn proposal<S: Repository + ?Sized>(
        &self,
        store: &S,
        id: ProposalId,
    ) -> Result<ProposalRecord, GovernanceError> {
        or_missing(store.get_proposal(id), || GovernanceError::ProposalNotFound(id))
    }
}
