//! Temporary position lifecycle.
//!
//! Each expired position advances exactly once per tick through its expiry
//! action. A position whose user or role has gone missing is skipped with a
//! warning and retried on the next tick.

use crate::error::{or_missing, EconomyError};
use crate::pricing::PricingEngine;
use polity_store::{PositionRecord, Repository, StoreError};
use polity_types::{ExpiryAction, Money, RoleId, Timestamp, UserId};

/// Why a privilege was taken away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevokeReason {
    Expired,
    /// The renewal charge did not match the holder's balance.
    RenewalFailed { expected: Money, balance: Money },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PositionEvent {
    /// The position was deleted; the privilege must be revoked.
    Revoked {
        user: UserId,
        role: RoleId,
        reason: RevokeReason,
        /// Whether the holder should be told.
        notify: bool,
    },
    Renewed {
        user: UserId,
        role: RoleId,
        charged: Money,
        expires_at: Timestamp,
    },
    /// Elected positions have no expiry behaviour yet.
    AwaitingElection { user: UserId, role: RoleId },
    /// Nothing was changed; an operator should look at it.
    Skipped {
        user: UserId,
        role: RoleId,
        warning: String,
    },
}

/// Days a blessing adds to the blessed position.
pub const BLESSING_EXTENSION_DAYS: u64 = 2;

/// How long a member carries the blessed mark.
pub const BLESSING_DAYS: u64 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blessing {
    pub user: UserId,
    /// The position that was extended.
    pub role: RoleId,
    pub expires_at: Timestamp,
    pub blessed_role: RoleId,
    pub blessed_until: Timestamp,
}

pub struct PositionLifecycle {
    pub pricing: PricingEngine,
    /// Renewals of this role are priced by the pricing engine instead of the
    /// stored charge amount.
    pub priced_role: Option<RoleId>,
    pub notify_on_role_loss: bool,
}

impl PositionLifecycle {
    pub fn new(pricing: PricingEngine, priced_role: Option<RoleId>, notify_on_role_loss: bool) -> Self {
        Self {
            pricing,
            priced_role,
            notify_on_role_loss,
        }
    }

    /// Advance every position whose expiry time has been reached.
    pub fn process_expired<S: Repository + ?Sized>(
        &self,
        store: &S,
        now: Timestamp,
    ) -> Result<Vec<PositionEvent>, EconomyError> {
        store
            .list_expired_positions(now)?
            .into_iter()
            .map(|position| self.advance(store, position, now))
            .collect()
    }

    /// Fire the expiry action of one position.
    pub fn advance<S: Repository + ?Sized>(
        &self,
        store: &S,
        mut position: PositionRecord,
        now: Timestamp,
    ) -> Result<PositionEvent, EconomyError> {
        let user = match store.get_user(&position.user) {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                return Ok(skip(&position, format!("user {} no longer exists", position.user)))
            }
            Err(e) => return Err(e.into()),
        };
        let role = match store.get_role(&position.role) {
            Ok(role) => role,
            Err(StoreError::NotFound(_)) => {
                return Ok(skip(&position, format!("role {} no longer exists", position.role)))
            }
            Err(e) => return Err(e.into()),
        };

        match position.action {
            ExpiryAction::LoseRole => {
                self.lose(store, &position, RevokeReason::Expired, self.notify_on_role_loss)
            }
            ExpiryAction::ChargedMoney => {
                let expected = if self.priced_role.as_ref() == Some(&role.id) {
                    self.pricing.quote(store, now)?
                } else {
                    match position.charge_amount {
                        Some(amount) => amount,
                        None => {
                            return Ok(skip(&position, format!("no renewal charge recorded for {}", role.name)))
                        }
                    }
                };
                let Some(term) = role.term_length_days else {
                    return Ok(skip(&position, format!("role {} has no term length", role.name)));
                };

                // Renewal fails closed: only an exact balance match is charged.
                if user.balance != expected {
                    let reason = RevokeReason::RenewalFailed {
                        expected,
                        balance: user.balance,
                    };
                    return self.lose(store, &position, reason, true);
                }

                let mut user = user;
                user.balance = user.balance.saturating_sub(expected);
                store.put_user(&user)?;
                position.expires_at = position.expires_at.plus_days(term);
                store.put_position(&position)?;
                tracing::info!(
                    user = %position.user,
                    role = %position.role,
                    charged = expected.units(),
                    expires_at = %position.expires_at,
                    "position renewed"
                );
                Ok(PositionEvent::Renewed {
                    user: position.user,
                    role: position.role,
                    charged: expected,
                    expires_at: position.expires_at,
                })
            }
            ExpiryAction::ReElection => {
                tracing::debug!(user = %position.user, role = %position.role, "re-election positions are not advanced");
                Ok(PositionEvent::AwaitingElection {
                    user: position.user,
                    role: position.role,
                })
            }
        }
    }

    /// Push back the expiry of `user`'s position in `role` and mark them
    /// blessed for a day. A member can carry one blessing at a time.
    pub fn bless<S: Repository + ?Sized>(
        &self,
        store: &S,
        user: &UserId,
        role: &RoleId,
        blessed_role: &RoleId,
        now: Timestamp,
    ) -> Result<Blessing, EconomyError> {
        or_missing(store.get_user(user), || EconomyError::UserNotFound(user.clone()))?;
        match store.get_position(user, blessed_role) {
            Ok(_) => return Err(EconomyError::AlreadyBlessed(user.clone())),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        let mut position = or_missing(store.get_position(user, role), || {
            EconomyError::NothingToBless {
                user: user.clone(),
                role: role.clone(),
            }
        })?;

        position.expires_at = position.expires_at.plus_days(BLESSING_EXTENSION_DAYS);
        store.put_position(&position)?;
        let mark = PositionRecord {
            user: user.clone(),
            role: blessed_role.clone(),
            expires_at: now.plus_days(BLESSING_DAYS),
            action: ExpiryAction::LoseRole,
            charge_amount: None,
            is_elected_position: false,
        };
        store.add_position(&mark)?;
        tracing::info!(%user, %role, expires_at = %position.expires_at, "position blessed");

        Ok(Blessing {
            user: user.clone(),
            role: role.clone(),
            expires_at: position.expires_at,
            blessed_role: mark.role,
            blessed_until: mark.expires_at,
        })
    }

    fn lose<S: Repository + ?Sized>(
        &self,
        store: &S,
        position: &PositionRecord,
        reason: RevokeReason,
        notify: bool,
    ) -> Result<PositionEvent, EconomyError> {
        store.delete_position(&position.user, &position.role)?;
        tracing::info!(user = %position.user, role = %position.role, ?reason, "position revoked");
        Ok(PositionEvent::Revoked {
            user: position.user.clone(),
            role: position.role.clone(),
            reason,
            notify,
        })
    }
}

fn skip(position: &PositionRecord, warning: String) -> PositionEvent {
    tracing::warn!(user = %position.user, role = %position.role, %warning, "skipping position");
    PositionEvent::Skipped {
        user: position.user.clone(),
        role: position.role.clone(),
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polity_store::{MemoryStore, PositionStore, RoleRecord, RoleStore, UserRecord, UserStore};
    use polity_types::SECS_PER_DAY;

    fn lifecycle() -> PositionLifecycle {
        PositionLifecycle::new(
            PricingEngine::new(Money::new(100), UserId::new("treasury")),
            Some(RoleId::new("priced")),
            false,
        )
    }

    fn setup(balance: u64, action: ExpiryAction) -> (MemoryStore, PositionRecord) {
        let store = MemoryStore::new();
        let mut user = UserRecord::new(UserId::new("u"), "holder", "capital");
        user.balance = Money::new(balance);
        store.add_user(&user).unwrap();
        let mut role = RoleRecord::new(RoleId::new("r"), "baron");
        role.term_length_days = Some(7);
        store.put_role(&role).unwrap();
        let position = PositionRecord {
            user: user.id,
            role: role.id,
            expires_at: Timestamp::new(1_000),
            action,
            charge_amount: Some(Money::new(50)),
            is_elected_position: false,
        };
        store.add_position(&position).unwrap();
        (store, position)
    }

    #[test]
    fn exact_balance_renews_for_one_term() {
        let (store, position) = setup(50, ExpiryAction::ChargedMoney);
        let events = lifecycle().process_expired(&store, Timestamp::new(1_000)).unwrap();
        assert_eq!(
            events,
            vec![PositionEvent::Renewed {
                user: UserId::new("u"),
                role: RoleId::new("r"),
                charged: Money::new(50),
                expires_at: Timestamp::new(1_000 + 7 * SECS_PER_DAY),
            }]
        );
        assert_eq!(store.get_user(&position.user).unwrap().balance, Money::ZERO);
        let renewed = store.get_position(&position.user, &position.role).unwrap();
        assert_eq!(renewed.expires_at, Timestamp::new(1_000 + 7 * SECS_PER_DAY));
    }

    #[test]
    fn mismatched_balance_loses_the_role_and_keeps_the_money() {
        let (store, position) = setup(80, ExpiryAction::ChargedMoney);
        let events = lifecycle().process_expired(&store, Timestamp::new(2_000)).unwrap();
        assert!(matches!(
            events.as_slice(),
            [PositionEvent::Revoked {
                reason: RevokeReason::RenewalFailed { .. },
                notify: true,
                ..
            }]
        ));
        assert_eq!(store.get_user(&position.user).unwrap().balance, Money::new(80));
        assert!(store.get_position(&position.user, &position.role).is_err());
    }

    #[test]
    fn lose_role_deletes_the_position() {
        let (store, _) = setup(0, ExpiryAction::LoseRole);
        let events = lifecycle().process_expired(&store, Timestamp::new(1_500)).unwrap();
        assert!(matches!(
            events.as_slice(),
            [PositionEvent::Revoked { reason: RevokeReason::Expired, notify: false, .. }]
        ));
        assert!(store.list_positions().unwrap().is_empty());
    }

    #[test]
    fn unexpired_positions_are_left_alone() {
        let (store, _) = setup(50, ExpiryAction::ChargedMoney);
        let events = lifecycle().process_expired(&store, Timestamp::new(999)).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn re_election_is_a_no_op() {
        let (store, position) = setup(50, ExpiryAction::ReElection);
        let events = lifecycle().process_expired(&store, Timestamp::new(1_000)).unwrap();
        assert!(matches!(events.as_slice(), [PositionEvent::AwaitingElection { .. }]));
        assert_eq!(store.get_position(&position.user, &position.role).unwrap(), position);
    }

    #[test]
    fn missing_role_is_skipped_and_kept() {
        let (store, mut position) = setup(50, ExpiryAction::LoseRole);
        store.delete_position(&position.user, &position.role).unwrap();
        position.role = RoleId::new("gone");
        store.add_position(&position).unwrap();

        let events = lifecycle().process_expired(&store, Timestamp::new(1_000)).unwrap();
        assert!(matches!(events.as_slice(), [PositionEvent::Skipped { .. }]));
        assert!(store.get_position(&position.user, &position.role).is_ok());
    }

    #[test]
    fn priced_role_renews_at_the_market_price() {
        let store = MemoryStore::new();
        let mut user = UserRecord::new(UserId::new("u"), "holder", "capital");
        user.balance = Money::new(100);
        store.add_user(&user).unwrap();
        store.put_role(&RoleRecord::new(RoleId::new("priced"), "crackhead")).unwrap();
        let position = PositionRecord {
            user: user.id.clone(),
            role: RoleId::new("priced"),
            expires_at: Timestamp::new(10),
            action: ExpiryAction::ChargedMoney,
            charge_amount: None,
            is_elected_position: false,
        };
        store.add_position(&position).unwrap();

        // one holder, no sales: the raw factor is 1/(100·0.5) and the price
        // bottoms out at the base of 100
        let events = lifecycle().process_expired(&store, Timestamp::new(10)).unwrap();
        assert!(matches!(
            events.as_slice(),
            [PositionEvent::Renewed { charged, .. }] if *charged == Money::new(100)
        ));
    }

    #[test]
    fn blessing_extends_the_position_and_marks_the_holder() {
        let (store, position) = setup(50, ExpiryAction::ChargedMoney);
        let blessed = RoleId::new("blessed");
        let now = Timestamp::new(500);

        let blessing = lifecycle()
            .bless(&store, &position.user, &position.role, &blessed, now)
            .unwrap();
        assert_eq!(blessing.expires_at, Timestamp::new(1_000 + 2 * SECS_PER_DAY));
        assert_eq!(blessing.blessed_until, Timestamp::new(500 + SECS_PER_DAY));
        assert_eq!(
            store.get_position(&position.user, &position.role).unwrap().expires_at,
            blessing.expires_at
        );
        let mark = store.get_position(&position.user, &blessed).unwrap();
        assert_eq!(mark.action, ExpiryAction::LoseRole);

        assert!(matches!(
            lifecycle().bless(&store, &position.user, &position.role, &blessed, now),
            Err(EconomyError::AlreadyBlessed(_))
        ));
    }

    #[test]
    fn nothing_to_bless_without_a_position() {
        let (store, position) = setup(50, ExpiryAction::ChargedMoney);
        let result = lifecycle().bless(
            &store,
            &position.user,
            &RoleId::new("other"),
            &RoleId::new("blessed"),
            Timestamp::new(500),
        );
        assert!(matches!(result, Err(EconomyError::NothingToBless { .. })));
        assert!(store.get_position(&position.user, &RoleId::new("blessed")).is_err());
    }
}
