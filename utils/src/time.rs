//! Time formatting helpers.

use polity_types::Timestamp;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Time left from `now` until `deadline`, or "now" once it has passed.
pub fn format_until(now: Timestamp, deadline: Timestamp) -> String {
    match deadline.as_secs().checked_sub(now.as_secs()) {
        Some(0) | None => "now".to_string(),
        Some(secs) => format_duration(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pick_two_units() {
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(7_260), "2h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }

    #[test]
    fn deadlines_in_the_past_are_now() {
        assert_eq!(format_until(Timestamp::new(10), Timestamp::new(5)), "now");
        assert_eq!(format_until(Timestamp::new(0), Timestamp::new(3_600)), "1h 0m");
    }
}
