use proptest::prelude::*;

use polity_economy::{CivicActivity, PricingEngine};
use polity_store::{LedgerEntry, UserRecord};
use polity_types::{GoodId, Money, Timestamp, TransactionKind, UserId};

fn engine(base: u64) -> PricingEngine {
    PricingEngine::new(Money::new(base), UserId::new("treasury"))
}

fn holders(balances: &[u64]) -> Vec<UserRecord> {
    balances
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let mut u = UserRecord::new(UserId::new(i.to_string()), format!("u{i}"), "r");
            u.balance = Money::new(*b);
            u
        })
        .collect()
}

fn ledger(sales: &[(u8, u64)]) -> Vec<LedgerEntry> {
    sales
        .iter()
        .enumerate()
        .map(|(i, (good, amount))| LedgerEntry {
            kind: TransactionKind::Purchase(GoodId::new(format!("g{good}"))),
            actor: UserId::new("0"),
            amount: Money::new(*amount),
            timestamp: Timestamp::new(i as u64),
        })
        .collect()
}

fn activity() -> impl Strategy<Value = CivicActivity> {
    (0u64..20, 0u64..50, 0u64..10).prop_map(|(open_proposals, recently_closed, active_challenges)| {
        CivicActivity {
            open_proposals,
            recently_closed,
            active_challenges,
        }
    })
}

proptest! {
    /// The price never falls below the base price.
    #[test]
    fn price_is_at_least_base(
        base in 0u64..10_000,
        balances in prop::collection::vec(0u64..1_000_000, 0..10),
        sales in prop::collection::vec((0u8..3, 0u64..10_000), 0..20),
        activity in activity(),
    ) {
        let price = engine(base).price(&holders(&balances), &ledger(&sales), &activity);
        prop_assert!(price >= Money::new(base));
    }

    /// Adding money to circulation never lowers the price.
    #[test]
    fn price_is_monotone_in_money_supply(
        base in 1u64..10_000,
        balance in 0u64..1_000_000,
        extra in 0u64..1_000_000,
        sales in prop::collection::vec((0u8..3, 1u64..10_000), 0..20),
        activity in activity(),
    ) {
        let sales = ledger(&sales);
        let low = engine(base).price(&holders(&[balance]), &sales, &activity);
        let high = engine(base).price(&holders(&[balance + extra]), &sales, &activity);
        prop_assert!(high >= low);
    }

    /// With no sales and no users every floor engages and the base comes back.
    #[test]
    fn cold_start_is_exactly_base(base in 0u64..1_000_000, activity in activity()) {
        prop_assert_eq!(engine(base).price(&[], &[], &activity), Money::new(base));
    }
}
