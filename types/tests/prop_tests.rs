use proptest::prelude::*;

use polity_types::{period_for, Choice, LunarQuarter, Money, Timestamp, TieBreak};

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Money checked_add agrees with u64 checked_add.
    #[test]
    fn money_checked_add(a in 0u64.., b in 0u64..) {
        let got = Money::new(a).checked_add(Money::new(b)).map(|m| m.units());
        prop_assert_eq!(got, a.checked_add(b));
    }

    /// Money saturating_sub never underflows.
    #[test]
    fn money_saturating_sub(a in 0u64.., b in 0u64..) {
        let got = Money::new(a).saturating_sub(Money::new(b));
        prop_assert_eq!(got.units(), a.saturating_sub(b));
    }

    /// Every timestamp maps to one of the four quarters, and the quarter
    /// only moves forward (cyclically) as time advances by a day.
    #[test]
    fn period_advances_cyclically(secs in 0u64..4_000_000_000u64) {
        let today = period_for(Timestamp::new(secs));
        let tomorrow = period_for(Timestamp::new(secs + 86_400));
        let next = match today {
            LunarQuarter::NewMoon => LunarQuarter::WaxingHalf,
            LunarQuarter::WaxingHalf => LunarQuarter::FullMoon,
            LunarQuarter::FullMoon => LunarQuarter::WaningHalf,
            LunarQuarter::WaningHalf => LunarQuarter::NewMoon,
        };
        prop_assert!(tomorrow == today || tomorrow == next);
    }

    /// Arbitrary labels never panic and only the three answers parse.
    #[test]
    fn choice_parse_is_total(label in ".{0,12}") {
        let parsed = Choice::from_label(&label);
        let lower = label.trim().to_ascii_lowercase();
        prop_assert_eq!(parsed.is_some(), matches!(lower.as_str(), "yae" | "nay" | "abstain"));
    }

    /// Tie-break decoding is total: any code yields a policy.
    #[test]
    fn tie_break_decoding_is_total(code in 0u8..) {
        let policy = TieBreak::from_code(code);
        if code > 2 {
            prop_assert_eq!(policy, TieBreak::Fails);
        } else {
            prop_assert_eq!(policy.code(), code);
        }
    }
}
