//! Audit record domain model

use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

/// Outcome recorded for a transaction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "mail_2_failed")]
    Mail2Failed,
    #[serde(rename = "failed")]
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Mail2Failed => "mail_2_failed",
            AuditStatus::Failed => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, AuditStatus::Success)
    }
}

/// One line of the audit log
///
/// Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Transaction start, ISO-8601 with second precision
    pub timestamp: String,
    pub sender: String,
    pub recipient: String,
    pub status: AuditStatus,
    /// Error message, empty on success
    #[serde(default)]
    pub error: String,
}

impl AuditRecord {
    pub fn new<Tz: TimeZone>(
        started_at: &DateTime<Tz>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        status: AuditStatus,
        error: impl Into<String>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            timestamp: started_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            sender: sender.into(),
            recipient: recipient.into(),
            status,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_serializes_as_single_line_with_expected_keys() {
        let started = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        let record = AuditRecord::new(
            &started,
            "me@example.com",
            "a@b.com",
            AuditStatus::Mail2Failed,
            "Send failed: timeout",
        );

        let line = serde_json::to_string(&record).unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(
            line,
            r#"{"timestamp":"2025-01-15T10:30:00+00:00","sender":"me@example.com","recipient":"a@b.com","status":"mail_2_failed","error":"Send failed: timeout"}"#
        );
    }

    #[test]
    fn test_timestamp_keeps_local_offset_and_drops_fraction() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let started = offset
            .with_ymd_and_hms(2025, 3, 1, 9, 5, 7)
            .unwrap()
            + chrono::Duration::milliseconds(450);
        let record = AuditRecord::new(&started, "s", "r", AuditStatus::Success, "");
        assert_eq!(record.timestamp, "2025-03-01T09:05:07+08:00");
        assert_eq!(record.error, "");
    }

    #[test]
    fn test_status_round_trips_through_json() {
        for status in [AuditStatus::Success, AuditStatus::Mail2Failed, AuditStatus::Failed] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
