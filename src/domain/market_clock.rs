//! Trading-session clock for a fixed-offset exchange.
//!
//! The tracked exchange runs a single continuous session, 09:00–13:30 local
//! time, Monday to Friday. Local time is a fixed offset from UTC (no DST).

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};

/// Exchange-local offset from UTC, in minutes (UTC+8).
pub const EXCHANGE_UTC_OFFSET_MINUTES: i32 = 480;

/// Minutes since local midnight at which the session opens (09:00).
const SESSION_OPEN_MINUTE: u32 = 540;

/// Minutes since local midnight of the last trading minute (13:30 inclusive).
const SESSION_CLOSE_MINUTE: u32 = 810;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    PreMarket,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionState::Open => "OPEN",
            SessionState::PreMarket => "PRE-MARKET",
            SessionState::Closed => "CLOSED",
        };
        write!(f, "{label}")
    }
}

/// Map a UTC instant to the exchange's session state.
///
/// Total over all inputs: an out-of-range offset falls back to the exchange
/// default rather than failing.
pub fn session_state(now: DateTime<Utc>, utc_offset_minutes: i32) -> SessionState {
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(EXCHANGE_UTC_OFFSET_MINUTES * 60).unwrap());
    let local = now.with_timezone(&offset);

    match local.weekday() {
        Weekday::Sat | Weekday::Sun => return SessionState::Closed,
        _ => {}
    }

    let minute_of_day = local.hour() * 60 + local.minute();
    if (SESSION_OPEN_MINUTE..=SESSION_CLOSE_MINUTE).contains(&minute_of_day) {
        SessionState::Open
    } else if minute_of_day < SESSION_OPEN_MINUTE {
        SessionState::PreMarket
    } else {
        SessionState::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Build the UTC instant corresponding to the given exchange-local time.
    fn local(y: i32, m: u32, d: u32, hour: u32, min: u32) -> DateTime<Utc> {
        let offset = FixedOffset::east_opt(EXCHANGE_UTC_OFFSET_MINUTES * 60).unwrap();
        offset
            .with_ymd_and_hms(y, m, d, hour, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn tuesday_mid_session_is_open() {
        // 2024-01-16 is a Tuesday
        let now = local(2024, 1, 16, 9, 15);
        assert_eq!(
            session_state(now, EXCHANGE_UTC_OFFSET_MINUTES),
            SessionState::Open
        );
    }

    #[test]
    fn tuesday_before_open_is_pre_market() {
        let now = local(2024, 1, 16, 8, 59);
        assert_eq!(
            session_state(now, EXCHANGE_UTC_OFFSET_MINUTES),
            SessionState::PreMarket
        );
    }

    #[test]
    fn tuesday_after_close_is_closed() {
        let now = local(2024, 1, 16, 13, 31);
        assert_eq!(
            session_state(now, EXCHANGE_UTC_OFFSET_MINUTES),
            SessionState::Closed
        );
    }

    #[test]
    fn session_boundaries_are_inclusive() {
        assert_eq!(
            session_state(local(2024, 1, 16, 9, 0), EXCHANGE_UTC_OFFSET_MINUTES),
            SessionState::Open
        );
        assert_eq!(
            session_state(local(2024, 1, 16, 13, 30), EXCHANGE_UTC_OFFSET_MINUTES),
            SessionState::Open
        );
    }

    #[test]
    fn saturday_closed_at_any_hour() {
        // 2024-01-20 is a Saturday
        for hour in [0, 9, 10, 13, 23] {
            assert_eq!(
                session_state(local(2024, 1, 20, hour, 0), EXCHANGE_UTC_OFFSET_MINUTES),
                SessionState::Closed
            );
        }
    }

    #[test]
    fn sunday_closed_mid_morning() {
        let now = local(2024, 1, 21, 10, 0);
        assert_eq!(
            session_state(now, EXCHANGE_UTC_OFFSET_MINUTES),
            SessionState::Closed
        );
    }

    #[test]
    fn weekday_is_computed_in_local_time() {
        // 2024-01-20 01:00 local on Saturday is still Friday 17:00 UTC;
        // the weekend check must use the exchange-local day.
        let now = local(2024, 1, 20, 1, 0);
        assert_eq!(
            session_state(now, EXCHANGE_UTC_OFFSET_MINUTES),
            SessionState::Closed
        );
    }

    #[test]
    fn out_of_range_offset_falls_back_to_exchange_default() {
        let now = local(2024, 1, 16, 10, 0);
        assert_eq!(session_state(now, 100_000), SessionState::Open);
    }
}
