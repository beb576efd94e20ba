//! The four-phase lunar payout period.
//!
//! Income is paid at most once per quarter of the moon. The phase is derived
//! from the mean synodic month measured from a known new moon, which is
//! accurate to well under a day and plenty for a "has a payout happened in
//! this period" gate.

use crate::time::{Timestamp, SECS_PER_DAY};
use serde::{Deserialize, Serialize};

/// Mean length of a lunation in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// The new moon of 2000-01-06 18:14 UTC, in Unix seconds.
pub const REFERENCE_NEW_MOON_SECS: u64 = 947_182_440;

/// Phase scale: the cycle is divided into 28 units, seven per quarter.
const PHASE_UNITS: f64 = 28.0;

/// A quarter of the lunar cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LunarQuarter {
    #[default]
    NewMoon,
    WaxingHalf,
    FullMoon,
    WaningHalf,
}

/// Lunar age at `t` on a 0..28 scale.
pub fn lunar_phase(t: Timestamp) -> f64 {
    let delta_secs = t.as_secs() as f64 - REFERENCE_NEW_MOON_SECS as f64;
    let age_days = (delta_secs / SECS_PER_DAY as f64).rem_euclid(SYNODIC_MONTH_DAYS);
    age_days / SYNODIC_MONTH_DAYS * PHASE_UNITS
}

/// The lunar quarter containing `t`.
pub fn period_for(t: Timestamp) -> LunarQuarter {
    let phase = lunar_phase(t);
    if phase < 7.0 {
        LunarQuarter::NewMoon
    } else if phase < 14.0 {
        LunarQuarter::WaxingHalf
    } else if phase < 21.0 {
        LunarQuarter::FullMoon
    } else if phase < 28.0 {
        LunarQuarter::WaningHalf
    } else {
        LunarQuarter::NewMoon
    }
}
