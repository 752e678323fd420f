use std::time::{Duration, SystemTime};

/// Parse a `HH:MM` duration string into whole minutes.
///
/// Hours are not capped at 24 so long rentals like `36:30` stay expressible.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.is_empty() || minutes.len() != 2 {
        return None;
    }

    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }

    hours.checked_mul(60)?.checked_add(minutes)
}

/// Format whole minutes as a `HH:MM` duration string.
pub fn format_hhmm(total_minutes: u32) -> String {
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Projected completion instant for a countdown with `remaining` minutes left.
pub fn end_of_interval(now: SystemTime, remaining: u32) -> SystemTime {
    now + Duration::from_secs(u64::from(remaining) * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_regular_durations() {
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("01:30"), Some(90));
        assert_eq!(parse_hhmm("10:05"), Some(605));
    }

    #[test]
    fn parses_durations_beyond_a_day() {
        assert_eq!(parse_hhmm("36:30"), Some(2190));
        assert_eq!(parse_hhmm("120:00"), Some(7200));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_hhmm(""), None);
        assert_eq!(parse_hhmm("90"), None);
        assert_eq!(parse_hhmm(":30"), None);
        assert_eq!(parse_hhmm("01:75"), None);
        assert_eq!(parse_hhmm("01:5"), None);
        assert_eq!(parse_hhmm("1:5:0"), None);
        assert_eq!(parse_hhmm("aa:bb"), None);
    }

    #[test]
    fn formatting_round_trips() {
        assert_eq!(format_hhmm(0), "00:00");
        assert_eq!(format_hhmm(90), "01:30");
        assert_eq!(format_hhmm(2190), "36:30");
        assert_eq!(parse_hhmm(&format_hhmm(605)), Some(605));
    }

    #[test]
    fn end_of_interval_adds_whole_minutes() {
        let now = SystemTime::UNIX_EPOCH;
        assert_eq!(
            end_of_interval(now, 90),
            now + Duration::from_secs(90 * 60)
        );
    }
}
