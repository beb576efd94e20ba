//! Income payday.
//!
//! Once per lunar quarter every user except the treasury is paid the basic
//! income, or the best salary among the roles they hold if that is higher.

use crate::error::EconomyError;
use polity_store::{LedgerEntry, Repository, UserPatch};
use polity_types::{period_for, LunarQuarter, Money, RoleId, Timestamp, TransactionKind, UserId};
use std::collections::HashMap;

/// Which roles each user currently holds on the platform.
pub type RoleHoldings = HashMap<UserId, Vec<RoleId>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payday {
    pub period: LunarQuarter,
    pub recipients: usize,
    pub total: Money,
}

#[derive(Clone, Debug)]
pub struct Payroll {
    /// Pays the income; never paid itself.
    pub treasury: UserId,
    pub ubi: Money,
}

impl Payroll {
    pub fn new(treasury: UserId, ubi: Money) -> Self {
        Self { treasury, ubi }
    }

    /// Pay everyone if no income has gone out in the current quarter yet.
    pub fn pay_income<S: Repository + ?Sized>(
        &self,
        store: &S,
        holdings: &RoleHoldings,
        now: Timestamp,
    ) -> Result<Option<Payday>, EconomyError> {
        let period = period_for(now);
        let last = store.last_income_period()?;
        if period == last {
            tracing::debug!(?period, "income already paid this period");
            return Ok(None);
        }

        let salaries: HashMap<RoleId, Money> = store
            .list_roles()?
            .into_iter()
            .filter_map(|r| r.salary.map(|s| (r.id, s)))
            .collect();

        let mut patches = Vec::new();
        let mut total = Money::ZERO;
        for user in store.list_users()? {
            if user.id == self.treasury {
                continue;
            }
            let amount = self.income_for(&user.id, holdings, &salaries);
            total = total.saturating_add(amount);
            let mut patch = UserPatch::for_user(user.id);
            patch.balance = Some(user.balance.saturating_add(amount));
            patches.push(patch);
        }
        let recipients = store.update_many_users(&patches)?;
        store.append_entry(&LedgerEntry {
            kind: TransactionKind::Income,
            actor: self.treasury.clone(),
            amount: total,
            timestamp: now,
        })?;
        tracing::info!(?period, recipients, total = total.units(), "income paid");
        Ok(Some(Payday {
            period,
            recipients,
            total,
        }))
    }

    fn income_for(
        &self,
        user: &UserId,
        holdings: &RoleHoldings,
        salaries: &HashMap<RoleId, Money>,
    ) -> Money {
        holdings
            .get(user)
            .into_iter()
            .flatten()
            .filter_map(|role| salaries.get(role).copied())
            .fold(self.ubi, Money::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polity_store::{
        LedgerFilter, LedgerStore, MemoryStore, RoleRecord, RoleStore, UserRecord, UserStore,
    };
    use polity_types::period::REFERENCE_NEW_MOON_SECS;
    use polity_types::SECS_PER_DAY;

    fn full_moon() -> Timestamp {
        Timestamp::new(REFERENCE_NEW_MOON_SECS + 15 * SECS_PER_DAY)
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        for id in ["treasury", "a", "b"] {
            store
                .add_user(&UserRecord::new(UserId::new(id), id, "capital"))
                .unwrap();
        }
        let mut mayor = RoleRecord::new(RoleId::new("mayor"), "mayor");
        mayor.salary = Some(Money::new(900));
        store.put_role(&mayor).unwrap();
        let mut clerk = RoleRecord::new(RoleId::new("clerk"), "clerk");
        clerk.salary = Some(Money::new(100));
        store.put_role(&clerk).unwrap();
        store
    }

    #[test]
    fn pays_the_best_of_ubi_and_salary_once_per_period() {
        let store = store();
        let payroll = Payroll::new(UserId::new("treasury"), Money::new(500));
        let mut holdings = RoleHoldings::new();
        holdings.insert(UserId::new("a"), vec![RoleId::new("mayor"), RoleId::new("clerk")]);
        holdings.insert(UserId::new("b"), vec![RoleId::new("clerk")]);

        let payday = payroll.pay_income(&store, &holdings, full_moon()).unwrap().unwrap();
        assert_eq!(payday.recipients, 2);
        assert_eq!(payday.total, Money::new(1_400));
        assert_eq!(store.get_user(&UserId::new("a")).unwrap().balance, Money::new(900));
        assert_eq!(store.get_user(&UserId::new("b")).unwrap().balance, Money::new(500));
        assert_eq!(store.get_user(&UserId::new("treasury")).unwrap().balance, Money::ZERO);

        let income = store.list_entries(LedgerFilter::Income).unwrap();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].actor, UserId::new("treasury"));

        let later = full_moon().plus_days(1);
        assert!(payroll.pay_income(&store, &holdings, later).unwrap().is_none());
    }

    #[test]
    fn cold_start_counts_as_new_moon() {
        let store = store();
        let payroll = Payroll::new(UserId::new("treasury"), Money::new(500));
        let new_moon = Timestamp::new(REFERENCE_NEW_MOON_SECS + SECS_PER_DAY);
        assert!(payroll
            .pay_income(&store, &RoleHoldings::new(), new_moon)
            .unwrap()
            .is_none());
    }
}
