//! Shared helpers and constants.

use chrono::{Duration, SecondsFormat, Utc};

pub const APP_NAME: &str = "quorum_client";

/// ISO-8601 timestamp `days` from now, e.g. `2031-10-17T08:10:36+00:00`.
pub fn iso_days_from_now(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Today's UTC date as `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().date_naive().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn future_timestamp_parses_back() {
        let raw = iso_days_from_now(5 * 365);
        assert!(raw.ends_with("+00:00"));
        let parsed = DateTime::parse_from_rfc3339(&raw).expect("rfc3339");
        assert!(parsed > Utc::now());
    }

    #[test]
    fn today_is_a_plain_date() {
        assert_eq!(today().len(), 10);
    }
}
