//! Inflation pricing.
//!
//! Prices follow the quantity theory of money, `M·V = P·Y`: the money
//! supply is every balance except the treasury's, velocity is the mean
//! purchase size, the price level is the sum of the latest sale price of
//! each good, and real output is approximated by political activity. The
//! raw factor `M·V / (P·Y)` is bent through a curve with an oblique
//! asymptote so prices keep rising without jumping.

use crate::error::EconomyError;
use polity_store::{
    ChallengeStore, LedgerEntry, LedgerFilter, LedgerStore, ProposalFilter, ProposalStore,
    UserRecord, UserStore,
};
use polity_types::{GoodId, Money, Timestamp, TransactionKind, UserId, SECS_PER_WEEK};
use serde::Serialize;
use std::collections::HashMap;

/// Price level used before any good has ever sold.
const COLD_START_PRICE_LEVEL: f64 = 100.0;
const BASE_GDP_FACTOR: f64 = 0.5;
const OPEN_PROPOSAL_WEIGHT: f64 = 0.1;
const RECENTLY_CLOSED_WEIGHT: f64 = 0.01;
const ACTIVE_CHALLENGE_WEIGHT: f64 = 0.01;
const CURVE_RADIUS: f64 = 1.0;
const SLANT: f64 = 0.15;
const Y_OFFSET: f64 = 0.35;

/// Political activity, the stand-in for real output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CivicActivity {
    /// Posted proposals whose poll is still running.
    pub open_proposals: u64,
    /// Proposals whose poll closed within the last week.
    pub recently_closed: u64,
    pub active_challenges: u64,
}

impl CivicActivity {
    pub fn measure<S>(store: &S, now: Timestamp) -> Result<Self, EconomyError>
    where
        S: ProposalStore + ChallengeStore + ?Sized,
    {
        let week_ago = now.minus_secs(SECS_PER_WEEK);
        let mut activity = Self::default();
        for proposal in store.list_proposals(ProposalFilter::All)? {
            let Some(closes_at) = proposal.closes_at else {
                continue;
            };
            if closes_at > now {
                if proposal.outcome.is_open() {
                    activity.open_proposals += 1;
                }
            } else if closes_at > week_ago {
                activity.recently_closed += 1;
            }
        }
        activity.active_challenges = store.list_challenges(true)?.len() as u64;
        Ok(activity)
    }

    pub fn gdp_factor(&self) -> f64 {
        BASE_GDP_FACTOR
            + OPEN_PROPOSAL_WEIGHT * self.open_proposals as f64
            + RECENTLY_CLOSED_WEIGHT * self.recently_closed as f64
            + ACTIVE_CHALLENGE_WEIGHT * self.active_challenges as f64
    }
}

/// Every intermediate value of a price computation. Diagnostic only; the
/// production price is [`PriceBreakdown::price`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub base_price: Money,
    pub money_supply: Money,
    pub velocity: f64,
    pub price_level: f64,
    pub gdp_factor: f64,
    pub real_gdp: f64,
    pub inflation_factor: f64,
    pub smoothed_factor: f64,
    pub unsmoothed_price: f64,
    pub smoothed_price: f64,
    pub price: Money,
}

/// Smoothing curve applied to the raw inflation factor.
pub fn smooth(factor: f64) -> f64 {
    factor * (1.0 / (1.0 + CURVE_RADIUS * factor) + SLANT) + Y_OFFSET
}

#[derive(Clone, Debug)]
pub struct PricingEngine {
    pub base_price: Money,
    /// Excluded from the money supply.
    pub treasury: UserId,
}

impl PricingEngine {
    pub fn new(base_price: Money, treasury: UserId) -> Self {
        Self {
            base_price,
            treasury,
        }
    }

    /// Compute the price from a snapshot of balances, ledger and activity.
    pub fn breakdown(
        &self,
        users: &[UserRecord],
        ledger: &[LedgerEntry],
        activity: &CivicActivity,
    ) -> PriceBreakdown {
        let money_supply: Money = users
            .iter()
            .filter(|u| u.id != self.treasury)
            .map(|u| u.balance)
            .sum();
        let m = money_supply.as_f64();

        let purchases: Vec<&LedgerEntry> =
            ledger.iter().filter(|e| !e.kind.is_income()).collect();
        let velocity = if purchases.is_empty() {
            1.0
        } else {
            let total: f64 = purchases.iter().map(|e| e.amount.as_f64()).sum();
            let mean = total / purchases.len() as f64;
            if mean == 0.0 {
                1.0
            } else {
                mean
            }
        };

        let mut price_level = latest_prices(&purchases);
        if price_level == 0.0 {
            price_level = COLD_START_PRICE_LEVEL;
        }

        let gdp_factor = activity.gdp_factor();
        let real_gdp = gdp_factor * m;
        let inflation_factor = (m * velocity) / (price_level * real_gdp);
        let smoothed_factor = smooth(inflation_factor);
        let base = self.base_price.as_f64();
        let smoothed_price = base * smoothed_factor;

        // No money in circulation gives 0/0; fall back to the base price.
        let price = if smoothed_price.is_finite() && smoothed_price > base {
            Money::new(smoothed_price.round_ties_even() as u64)
        } else {
            self.base_price
        };

        PriceBreakdown {
            base_price: self.base_price,
            money_supply,
            velocity,
            price_level,
            gdp_factor,
            real_gdp,
            inflation_factor,
            smoothed_factor,
            unsmoothed_price: base * inflation_factor,
            smoothed_price,
            price,
        }
    }

    pub fn price(
        &self,
        users: &[UserRecord],
        ledger: &[LedgerEntry],
        activity: &CivicActivity,
    ) -> Money {
        self.breakdown(users, ledger, activity).price
    }

    /// Price everything as it stands in the store.
    pub fn quote_breakdown<S>(&self, store: &S, now: Timestamp) -> Result<PriceBreakdown, EconomyError>
    where
        S: UserStore + LedgerStore + ProposalStore + ChallengeStore + ?Sized,
    {
        let users = store.list_users()?;
        let ledger = store.list_entries(LedgerFilter::NonIncome)?;
        let activity = CivicActivity::measure(store, now)?;
        let breakdown = self.breakdown(&users, &ledger, &activity);
        tracing::debug!(
            price = breakdown.price.units(),
            money_supply = breakdown.money_supply.units(),
            velocity = breakdown.velocity,
            price_level = breakdown.price_level,
            factor = breakdown.smoothed_factor,
            "price computed"
        );
        Ok(breakdown)
    }

    pub fn quote<S>(&self, store: &S, now: Timestamp) -> Result<Money, EconomyError>
    where
        S: UserStore + LedgerStore + ProposalStore + ChallengeStore + ?Sized,
    {
        Ok(self.quote_breakdown(store, now)?.price)
    }
}

/// Sum of the most recent sale amount of each good.
fn latest_prices(purchases: &[&LedgerEntry]) -> f64 {
    let mut latest: HashMap<&GoodId, (Timestamp, Money)> = HashMap::new();
    for entry in purchases {
        let TransactionKind::Purchase(good) = &entry.kind else {
            continue;
        };
        match latest.get(good) {
            Some((at, _)) if *at > entry.timestamp => {}
            _ => {
                latest.insert(good, (entry.timestamp, entry.amount));
            }
        }
    }
    latest.values().map(|(_, amount)| amount.as_f64()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PricingEngine {
        PricingEngine::new(Money::new(100), UserId::new("treasury"))
    }

    fn user(id: &str, balance: u64) -> UserRecord {
        let mut u = UserRecord::new(UserId::new(id), id, "capital");
        u.balance = Money::new(balance);
        u
    }

    fn purchase(good: &str, amount: u64, at: u64) -> LedgerEntry {
        LedgerEntry {
            kind: TransactionKind::Purchase(GoodId::new(good)),
            actor: UserId::new("a"),
            amount: Money::new(amount),
            timestamp: Timestamp::new(at),
        }
    }

    #[test]
    fn cold_start_returns_base_price() {
        let b = engine().breakdown(&[], &[], &CivicActivity::default());
        assert_eq!(b.price, Money::new(100));
        assert_eq!(b.velocity, 1.0);
        assert_eq!(b.price_level, 100.0);
    }

    #[test]
    fn treasury_is_not_money_supply() {
        let users = vec![user("a", 300), user("treasury", 1_000_000)];
        let b = engine().breakdown(&users, &[], &CivicActivity::default());
        assert_eq!(b.money_supply, Money::new(300));
    }

    #[test]
    fn price_level_uses_latest_sale_of_each_good() {
        let ledger = vec![
            purchase("crack", 100, 1),
            purchase("crack", 250, 5),
            purchase("crown", 40, 3),
        ];
        let b = engine().breakdown(&[user("a", 1000)], &ledger, &CivicActivity::default());
        assert_eq!(b.price_level, 290.0);
        assert_eq!(b.velocity, 130.0);
    }

    #[test]
    fn smoothed_price_matches_the_curve() {
        // velocity 200, price level 300, gdp factor 0.5
        let ledger = vec![purchase("crack", 100, 1), purchase("crack", 300, 2)];
        let b = engine().breakdown(&[user("a", 1000)], &ledger, &CivicActivity::default());
        assert_eq!(b.price_level, 300.0);
        let raw = 200.0 / (300.0 * 0.5);
        assert!((b.inflation_factor - raw).abs() < 1e-9);
        let expected = (100.0 * smooth(raw)).round_ties_even() as u64;
        assert_eq!(b.price, Money::new(expected));
        assert!(b.price > Money::new(100));
    }

    #[test]
    fn price_never_drops_below_base() {
        let activity = CivicActivity {
            open_proposals: 50,
            recently_closed: 50,
            active_challenges: 50,
        };
        let ledger = vec![purchase("crack", 1, 1)];
        let b = engine().breakdown(&[user("a", 10)], &ledger, &activity);
        assert!(b.smoothed_price < 100.0);
        assert_eq!(b.price, Money::new(100));
    }

    #[test]
    fn activity_weights() {
        let activity = CivicActivity {
            open_proposals: 2,
            recently_closed: 3,
            active_challenges: 1,
        };
        assert!((activity.gdp_factor() - 0.74).abs() < 1e-9);
    }
}
