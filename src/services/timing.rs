use time::PrimitiveDateTime;

/// Seconds left on a question's countdown. A pair that was never started has
/// the full duration; once started the value decays to zero and stays there.
pub(crate) fn remaining_seconds(
    duration_seconds: i64,
    started_at: Option<PrimitiveDateTime>,
    now: PrimitiveDateTime,
) -> i64 {
    match started_at {
        Some(started) => {
            let elapsed = (now - started).whole_seconds();
            (duration_seconds - elapsed).max(0)
        }
        None => duration_seconds,
    }
}

/// Whether the question may still be viewed and answered.
pub(crate) fn can_access(remaining_seconds: i64, submitted: bool) -> bool {
    remaining_seconds > 0 && !submitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Duration, Time};

    fn at(hour: u8, minute: u8, second: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, time::Month::March, 10).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(hour, minute, second).unwrap())
    }

    #[test]
    fn unstarted_pair_has_full_duration() {
        assert_eq!(remaining_seconds(600, None, at(9, 0, 0)), 600);
    }

    #[test]
    fn countdown_decreases_with_elapsed_time() {
        let started = at(9, 0, 0);
        assert_eq!(remaining_seconds(600, Some(started), at(9, 1, 0)), 540);
        assert_eq!(remaining_seconds(600, Some(started), at(9, 9, 59)), 1);
    }

    #[test]
    fn countdown_floors_at_zero() {
        let started = at(9, 0, 0);
        assert_eq!(remaining_seconds(20, Some(started), started + Duration::seconds(25)), 0);
        assert_eq!(remaining_seconds(600, Some(started), at(11, 0, 0)), 0);
    }

    #[test]
    fn countdown_is_monotonically_non_increasing() {
        let started = at(9, 0, 0);
        let mut previous = i64::MAX;
        for offset in [0, 1, 60, 300, 599, 600, 601, 3600] {
            let left = remaining_seconds(600, Some(started), started + Duration::seconds(offset));
            assert!(left <= previous);
            assert!(left >= 0);
            previous = left;
        }
    }

    #[test]
    fn access_requires_time_and_no_submission() {
        assert!(can_access(1, false));
        assert!(!can_access(0, false));
        assert!(!can_access(500, true));
        assert!(!can_access(0, true));
    }

    #[test]
    fn expired_question_denies_access_without_submission() {
        // alice starts a 20 second question and lets it run out.
        let started = at(10, 0, 0);
        let now = started + Duration::seconds(25);
        let left = remaining_seconds(20, Some(started), now);
        assert_eq!(left, 0);
        assert!(!can_access(left, false));
    }
}
