//! Transfers between users and purchases of temporary privileges.

use crate::error::{or_missing, EconomyError};
use crate::pricing::PricingEngine;
use polity_store::{LedgerEntry, PositionRecord, Repository, StoreError, UserPatch};
use polity_types::{ExpiryAction, GoodId, Money, RoleId, Timestamp, TransactionKind, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: UserId,
    pub to: UserId,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Purchase {
    pub buyer: UserId,
    pub role: RoleId,
    pub price: Money,
    pub expires_at: Timestamp,
}

pub struct Market {
    pub pricing: PricingEngine,
}

impl Market {
    pub fn new(pricing: PricingEngine) -> Self {
        Self { pricing }
    }

    /// Send money to the user with the given name (case-insensitive).
    pub fn transfer<S: Repository + ?Sized>(
        &self,
        store: &S,
        from: &UserId,
        to_name: &str,
        amount: Money,
    ) -> Result<Transfer, EconomyError> {
        if amount.is_zero() {
            return Err(EconomyError::ZeroAmount);
        }
        let sender = or_missing(store.get_user(from), || EconomyError::UserNotFound(from.clone()))?;
        let recipient = store
            .find_user_by_name(to_name)?
            .ok_or_else(|| EconomyError::RecipientNotFound(to_name.to_string()))?;
        if recipient.id == sender.id {
            return Err(EconomyError::SelfTransfer);
        }
        let Some(remaining) = sender.balance.checked_sub(amount) else {
            return Err(EconomyError::InsufficientFunds {
                balance: sender.balance,
                needed: amount,
            });
        };

        let mut debit = UserPatch::for_user(sender.id.clone());
        debit.balance = Some(remaining);
        let mut credit = UserPatch::for_user(recipient.id.clone());
        credit.balance = Some(recipient.balance.saturating_add(amount));
        store.update_many_users(&[debit, credit])?;

        tracing::info!(from = %sender.id, to = %recipient.id, amount = amount.units(), "transfer");
        Ok(Transfer {
            from: sender.id,
            to: recipient.id,
            amount,
        })
    }

    /// Buy a temporary role at the current market price. The position
    /// lapses after one term of the role.
    pub fn purchase_privilege<S: Repository + ?Sized>(
        &self,
        store: &S,
        buyer: &UserId,
        good: GoodId,
        role: &RoleId,
        now: Timestamp,
    ) -> Result<Purchase, EconomyError> {
        let role = or_missing(store.get_role(role), || EconomyError::RoleNotFound(role.clone()))?;
        let term = role
            .term_length_days
            .ok_or_else(|| EconomyError::NoTerm(role.id.clone()))?;
        let mut user = or_missing(store.get_user(buyer), || EconomyError::UserNotFound(buyer.clone()))?;
        match store.get_position(buyer, &role.id) {
            Ok(_) => {
                return Err(EconomyError::AlreadyHeld {
                    user: buyer.clone(),
                    role: role.id,
                })
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let price = self.pricing.quote(store, now)?;
        let Some(remaining) = user.balance.checked_sub(price) else {
            return Err(EconomyError::InsufficientFunds {
                balance: user.balance,
                needed: price,
            });
        };
        user.balance = remaining;
        store.put_user(&user)?;

        let expires_at = now.plus_days(term);
        store.add_position(&PositionRecord {
            user: buyer.clone(),
            role: role.id.clone(),
            expires_at,
            action: ExpiryAction::LoseRole,
            charge_amount: Some(price),
            is_elected_position: role.is_elected_position,
        })?;
        store.append_entry(&LedgerEntry {
            kind: TransactionKind::Purchase(good),
            actor: buyer.clone(),
            amount: price,
            timestamp: now,
        })?;
        tracing::info!(buyer = %buyer, role = %role.id, price = price.units(), %expires_at, "privilege purchased");
        Ok(Purchase {
            buyer: buyer.clone(),
            role: role.id,
            price,
            expires_at,
        })
    }
}
