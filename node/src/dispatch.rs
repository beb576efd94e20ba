//! Carries engine results out to the constitution and the platform.
//!
//! The engines decide; the dispatcher enacts passed proposals, announces
//! verdicts, and revokes lapsed privileges. Platform calls are best effort:
//! a failed message or role change is logged and reported to the operator
//! without undoing the state change behind it.

use std::sync::Arc;

use polity_consti::{ConstiEngine, ConstiError};
use polity_economy::{Payday, PositionEvent, RevokeReason};
use polity_governance::{ChallengeEvent, ResolvedProposal, RulingEffect};
use polity_store::Repository;
use polity_types::{Enactment, RoleId, Timestamp, UserId};
use polity_utils::format_until;

use crate::context::CivicContext;
use crate::platform::{Notifier, PrivilegeGate};
use crate::NodeError;

pub struct Dispatcher {
    consti: ConstiEngine,
    gate: Arc<dyn PrivilegeGate>,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(gate: Arc<dyn PrivilegeGate>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            consti: ConstiEngine,
            gate,
            notifier,
        }
    }

    /// Announce a decided proposal and carry out what it enacts.
    pub fn enact<S: Repository + ?Sized>(
        &self,
        store: &S,
        resolved: &ResolvedProposal,
        now: Timestamp,
    ) -> Result<(), NodeError> {
        let totals = resolved.totals;
        self.announce(&format!(
            "Proposal {} has {} ({} yae, {} nay, {} abstain).",
            resolved.id, resolved.outcome, totals.yae, totals.nay, totals.abstain
        ));

        match &resolved.enactment {
            Enactment::Nothing => {}
            Enactment::Ratify { text } => {
                let amendment = self.consti.ratify(store, text, now)?;
                self.announce(&format!("Ratified {}: {}", amendment.number, amendment.text));
            }
            Enactment::Repeal { number } => match self.consti.repeal(store, *number) {
                Ok(amendment) => self.announce(&format!("Repealed {}.", amendment.number)),
                // Struck by the judiciary while the repeal was being voted on.
                Err(ConstiError::AlreadyRepealed(_)) => {
                    tracing::info!(amendment = %number, proposal = %resolved.id, "amendment already repealed");
                }
                Err(e) => return Err(e.into()),
            },
            Enactment::PostToAgenda { text } => {
                self.announce(&format!("Resolution adopted: {text}"));
            }
        }
        Ok(())
    }

    pub fn challenge_event(&self, event: &ChallengeEvent, now: Timestamp) {
        match event {
            ChallengeEvent::FinalDayReminder {
                challenge,
                target,
                closes_at,
                votes_cast,
                required,
            } => self.announce(&format!(
                "Final day for {challenge} against {target}: {votes_cast} of {required} rulings are in, closing in {}.",
                format_until(now, *closes_at)
            )),
            ChallengeEvent::Closed {
                challenge,
                target,
                verdict,
                effect,
            } => {
                let what = match effect {
                    RulingEffect::ProposalReleased => "the proposal goes back to the vote",
                    RulingEffect::ProposalStruck => "the proposal has failed",
                    RulingEffect::AmendmentUpheld => "the amendment stands",
                    RulingEffect::AmendmentRepealed => "the amendment is repealed",
                };
                self.announce(&format!(
                    "{challenge} against {target} is decided {} ({} to {}); {what}.",
                    verdict.ruling(),
                    verdict.constitutional_votes,
                    verdict.unconstitutional_votes,
                ));
            }
        }
    }

    pub fn position_event(&self, ctx: &CivicContext, event: &PositionEvent) {
        match event {
            PositionEvent::Revoked {
                user,
                role,
                reason,
                notify,
            } => {
                if let Err(e) = self.gate.revoke(user, role) {
                    tracing::warn!(%user, %role, error = %e, "role revocation failed");
                    self.warn(&format!("could not revoke {role} from {user}: {e}"));
                }
                if *notify {
                    let name = role_name(ctx, role);
                    let message = match reason {
                        RevokeReason::Expired => format!("Your time as {name} is up."),
                        RevokeReason::RenewalFailed { expected, balance } => format!(
                            "Your subscription to {name} could not be renewed: it costs {expected} and you have {balance}."
                        ),
                    };
                    self.tell(user, &message);
                }
            }
            PositionEvent::Renewed {
                user,
                role,
                charged,
                ..
            } => {
                self.tell(
                    user,
                    &format!("Your subscription to {} was renewed for {charged}.", role_name(ctx, role)),
                );
            }
            PositionEvent::AwaitingElection { .. } => {}
            PositionEvent::Skipped { warning, .. } => self.warn(warning),
        }
    }

    /// Best-effort grant; a failure only reaches the operator.
    pub fn grant(&self, user: &UserId, role: &RoleId) {
        if let Err(e) = self.gate.grant(user, role) {
            tracing::warn!(%user, %role, error = %e, "role grant failed");
            self.warn(&format!("could not grant {role} to {user}: {e}"));
        }
    }

    pub fn payday(&self, payday: &Payday) {
        self.announce(&format!(
            "Payday: {} paid out to {} members.",
            payday.total, payday.recipients
        ));
    }

    pub fn warn(&self, message: &str) {
        if let Err(e) = self.notifier.warn_operator(message) {
            tracing::warn!(error = %e, %message, "operator warning not delivered");
        }
    }

    fn announce(&self, message: &str) {
        if let Err(e) = self.notifier.announce(message) {
            tracing::warn!(error = %e, "announcement not delivered");
        }
    }

    fn tell(&self, user: &UserId, message: &str) {
        if let Err(e) = self.notifier.notify_user(user, message) {
            tracing::warn!(%user, error = %e, "notice not delivered");
        }
    }
}

fn role_name(ctx: &CivicContext, role: &RoleId) -> String {
    ctx.roles
        .get(role)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| role.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polity_governance::{RegionTally, Totals};
    use polity_store::{ConstitutionStore, MemoryStore, RoleRecord};
    use polity_types::{AmendmentNumber, Money, Outcome, ProposalId, ProposalKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        announced: Mutex<Vec<String>>,
        told: Mutex<Vec<(UserId, String)>>,
        warned: Mutex<Vec<String>>,
        revoked: Mutex<Vec<(UserId, RoleId)>>,
    }

    impl Notifier for Recorder {
        fn warn_operator(&self, message: &str) -> Result<(), NodeError> {
            self.warned.lock().unwrap().push(message.to_string());
            Ok(())
        }
        fn notify_user(&self, user: &UserId, message: &str) -> Result<(), NodeError> {
            self.told.lock().unwrap().push((user.clone(), message.to_string()));
            Ok(())
        }
        fn announce(&self, message: &str) -> Result<(), NodeError> {
            self.announced.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    impl PrivilegeGate for Recorder {
        fn grant(&self, _: &UserId, _: &RoleId) -> Result<(), NodeError> {
            Ok(())
        }
        fn revoke(&self, user: &UserId, role: &RoleId) -> Result<(), NodeError> {
            self.revoked.lock().unwrap().push((user.clone(), role.clone()));
            Ok(())
        }
    }

    fn dispatcher() -> (Arc<Recorder>, Dispatcher) {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(recorder.clone(), recorder.clone());
        (recorder, dispatcher)
    }

    fn passed(kind: ProposalKind) -> ResolvedProposal {
        ResolvedProposal {
            id: ProposalId::new(1),
            proposer: UserId::new("a"),
            enactment: kind.enactment(),
            kind,
            outcome: Outcome::Passed,
            totals: Totals {
                yae: 3,
                nay: 1,
                abstain: 0,
            },
            tally: RegionTally::default(),
        }
    }

    #[test]
    fn passed_amendment_is_ratified() {
        let (recorder, dispatcher) = dispatcher();
        let store = MemoryStore::new();
        let resolved = passed(ProposalKind::AddAmendment {
            text: "free hotdogs".into(),
        });
        dispatcher.enact(&store, &resolved, Timestamp::new(5)).unwrap();

        let amendment = store.get_amendment(AmendmentNumber::new(1)).unwrap();
        assert_eq!(amendment.text, "free hotdogs");
        let announced = recorder.announced.lock().unwrap();
        assert_eq!(announced.len(), 2);
        assert!(announced[0].contains("passed"));
    }

    #[test]
    fn repeal_of_a_struck_amendment_is_not_an_error() {
        let (_, dispatcher) = dispatcher();
        let store = MemoryStore::new();
        let amendment = ConstiEngine.ratify(&store, "old law", Timestamp::new(1)).unwrap();
        ConstiEngine.repeal(&store, amendment.number).unwrap();

        let resolved = passed(ProposalKind::RepealAmendment {
            number: amendment.number,
        });
        assert!(dispatcher.enact(&store, &resolved, Timestamp::new(5)).is_ok());
    }

    #[test]
    fn failed_renewal_revokes_and_tells_the_holder() {
        let (recorder, dispatcher) = dispatcher();
        let mut ctx = CivicContext::default();
        ctx.set_roles(vec![RoleRecord::new(RoleId::new("r"), "baron")]);
        dispatcher.position_event(
            &ctx,
            &PositionEvent::Revoked {
                user: UserId::new("u"),
                role: RoleId::new("r"),
                reason: RevokeReason::RenewalFailed {
                    expected: Money::new(50),
                    balance: Money::new(20),
                },
                notify: true,
            },
        );
        assert_eq!(
            *recorder.revoked.lock().unwrap(),
            vec![(UserId::new("u"), RoleId::new("r"))]
        );
        let told = recorder.told.lock().unwrap();
        assert_eq!(told.len(), 1);
        assert!(told[0].1.contains("baron"));
    }

    #[test]
    fn silent_lapse_revokes_without_a_notice() {
        let (recorder, dispatcher) = dispatcher();
        dispatcher.position_event(
            &CivicContext::default(),
            &PositionEvent::Revoked {
                user: UserId::new("u"),
                role: RoleId::new("r"),
                reason: RevokeReason::Expired,
                notify: false,
            },
        );
        assert_eq!(recorder.revoked.lock().unwrap().len(), 1);
        assert!(recorder.told.lock().unwrap().is_empty());
    }

    #[test]
    fn skipped_positions_reach_the_operator() {
        let (recorder, dispatcher) = dispatcher();
        dispatcher.position_event(
            &CivicContext::default(),
            &PositionEvent::Skipped {
                user: UserId::new("u"),
                role: RoleId::new("r"),
                warning: "role r no longer exists".into(),
            },
        );
        assert_eq!(
            *recorder.warned.lock().unwrap(),
            vec!["role r no longer exists".to_string()]
        );
    }
}
