//! Cumulative scan counters and the bounded recent-error log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent feed failures kept in [`Stats::errors`].
pub const MAX_ERRORS: usize = 50;

/// One recorded feed failure.
///
/// Missing fields default (the timestamp to the Unix epoch) so that one
/// incomplete entry cannot fail the whole state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorRecord {
    pub url: String,
    #[serde(alias = "error")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Counters persisted alongside the scan state.
///
/// `total_articles_sent` counts articles, not messages: it goes up by one
/// per article once delivery has been issued to every destination,
/// whatever the per-destination outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stats {
    pub total_scans: u64,
    pub total_articles_sent: u64,
    pub last_scan_time: Option<DateTime<Utc>>,
    pub errors: VecDeque<ErrorRecord>,
}

impl Stats {
    /// Count a new cycle starting at `now`.
    pub fn begin_scan(&mut self, now: DateTime<Utc>) {
        self.total_scans += 1;
        self.last_scan_time = Some(now);
    }

    pub fn record_sent(&mut self) {
        self.total_articles_sent += 1;
    }

    /// Append a failure, evicting the oldest entries past [`MAX_ERRORS`].
    pub fn record_error(
        &mut self,
        url: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.errors.push_back(ErrorRecord {
            url: url.into(),
            message: message.into(),
            timestamp: now,
        });
        self.trim_errors();
    }

    /// Enforce the error cap.  Also applied to state read from disk.
    pub fn trim_errors(&mut self) {
        while self.errors.len() > MAX_ERRORS {
            self.errors.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn begin_scan_counts_and_stamps() {
        let mut stats = Stats::default();
        stats.begin_scan(at(0));
        stats.begin_scan(at(60));

        assert_eq!(stats.total_scans, 2);
        assert_eq!(stats.last_scan_time, Some(at(60)));
    }

    #[test]
    fn error_log_keeps_fifty_most_recent_in_order() {
        let mut stats = Stats::default();
        for i in 0..60 {
            stats.record_error(format!("https://feed/{i}"), format!("failure {i}"), at(i));
        }

        assert_eq!(stats.errors.len(), MAX_ERRORS);
        let urls: Vec<_> = stats.errors.iter().map(|e| e.url.as_str()).collect();
        let expected: Vec<String> = (10..60).map(|i| format!("https://feed/{i}")).collect();
        assert_eq!(urls, expected);
    }

    #[test]
    fn trim_applies_to_oversized_logs() {
        let mut stats = Stats::default();
        for i in 0..55 {
            stats.errors.push_back(ErrorRecord {
                url: format!("u{i}"),
                message: "m".into(),
                timestamp: at(i),
            });
        }
        stats.trim_errors();

        assert_eq!(stats.errors.len(), MAX_ERRORS);
        assert_eq!(stats.errors.front().map(|e| e.url.as_str()), Some("u5"));
    }

    #[test]
    fn legacy_error_key_is_accepted() {
        let json = r#"{"url":"u","error":"boom","timestamp":"2025-07-10T07:30:45.000Z"}"#;
        let record: ErrorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.message, "boom");
    }

    #[test]
    fn incomplete_error_entry_defaults_missing_fields() {
        let json = r#"{"url":"u","timestamp":"2025-07-10T07:30:45.000Z"}"#;
        let record: ErrorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.url, "u");
        assert_eq!(record.message, "");

        let record: ErrorRecord = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(record.timestamp, Utc.timestamp_opt(0, 0).unwrap());
    }
}
