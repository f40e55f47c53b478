use time::PrimitiveDateTime;

/// Two leave reports inside this window belong to the same episode (rapid
/// tab-switch flicker) and count once.
pub(crate) const LEAVE_DEBOUNCE_SECONDS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeaveAction {
    First,
    Increment,
    Touch,
}

pub(crate) fn classify_leave(
    last_leave_at: Option<PrimitiveDateTime>,
    now: PrimitiveDateTime,
) -> LeaveAction {
    match last_leave_at {
        None => LeaveAction::First,
        Some(last) => {
            if (now - last).whole_seconds() >= LEAVE_DEBOUNCE_SECONDS {
                LeaveAction::Increment
            } else {
                LeaveAction::Touch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Duration, Time};

    fn base() -> PrimitiveDateTime {
        let date = Date::from_calendar_date(2025, time::Month::March, 10).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(12, 0, 0).unwrap())
    }

    #[test]
    fn first_leave_is_recorded_immediately() {
        assert_eq!(classify_leave(None, base()), LeaveAction::First);
    }

    #[test]
    fn leave_within_window_only_touches() {
        let last = base();
        assert_eq!(classify_leave(Some(last), last + Duration::seconds(1)), LeaveAction::Touch);
        assert_eq!(classify_leave(Some(last), last + Duration::seconds(2)), LeaveAction::Touch);
    }

    #[test]
    fn leave_past_window_increments() {
        let last = base();
        assert_eq!(classify_leave(Some(last), last + Duration::seconds(3)), LeaveAction::Increment);
        assert_eq!(classify_leave(Some(last), last + Duration::seconds(4)), LeaveAction::Increment);
    }
}
