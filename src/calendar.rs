//! Calendar-day bucketing in the league's home time zone.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

/// Schedules, retention and the nightly cleanup all bucket by US-Eastern days
pub const LOCAL_TZ: Tz = chrono_tz::America::New_York;
pub const LOCAL_TZ_NAME: &str = "America/New_York";

/// US-Eastern calendar date of an instant
pub fn local_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.with_timezone(&LOCAL_TZ).date_naive()
}

/// True during the first minute after local midnight
pub fn in_cleanup_window(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&LOCAL_TZ);
    local.hour() == 0 && local.minute() == 0
}

/// Absolute window used when the per-date games view is unavailable: `[now - 6h, now + 36h)`
pub fn participant_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::hours(6), now + Duration::hours(36))
}
