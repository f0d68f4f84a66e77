//! Tracker JSON payloads and their conversion into engine records.
//!
//! Both API generations share the search result and scope chart shapes;
//! the board/sprint listings differ and live with their adapters.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;

use crate::error::TrackerError;
use crate::model::{ChangeBucket, ChangeRecord, EffortMap, Issue, ScopeChangeLog, TimePoint, WorklogEntry};

/// Naive formats seen in sprint reports, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%d/%b/%y %I:%M %p",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a zoned tracker timestamp and express it in `offset`.
pub fn parse_timestamp(value: &str, offset: FixedOffset) -> Result<TimePoint, TrackerError> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|t| t.with_timezone(&offset))
        .map_err(|_| TrackerError::Timestamp {
            value: value.to_string(),
        })
}

/// Parse a zoned or naive timestamp; naive ones are wall-clock time in `offset`.
pub fn parse_local_timestamp(value: &str, offset: FixedOffset) -> Result<TimePoint, TrackerError> {
    if let Ok(t) = parse_timestamp(value, offset) {
        return Ok(t);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| naive.and_local_timezone(offset).single())
        .ok_or_else(|| TrackerError::Timestamp {
            value: value.to_string(),
        })
}

/// Scope chart timestamps are milliseconds of local wall-clock time encoded
/// as if they were UTC.
pub fn parse_chart_millis(millis: i64, offset: FixedOffset) -> Result<TimePoint, TrackerError> {
    DateTime::from_timestamp_millis(millis)
        .and_then(|utc| utc.naive_utc().and_local_timezone(offset).single())
        .ok_or_else(|| TrackerError::Timestamp {
            value: millis.to_string(),
        })
}

#[derive(Debug, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub issues: Vec<IssuePayload>,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub key: String,
    #[serde(default)]
    pub fields: FieldsPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct FieldsPayload {
    #[serde(default)]
    pub timetracking: Option<TimeTrackingPayload>,
    #[serde(default)]
    pub resolutiondate: Option<String>,
    #[serde(default)]
    pub worklog: Option<WorklogPagePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTrackingPayload {
    #[serde(default)]
    pub original_estimate_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorklogPagePayload {
    #[serde(default)]
    pub worklogs: Vec<WorklogPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogPayload {
    pub created: String,
    pub time_spent_seconds: u64,
}

impl IssuePayload {
    fn original_estimate_seconds(&self) -> Option<u64> {
        self.fields
            .timetracking
            .as_ref()
            .and_then(|t| t.original_estimate_seconds)
    }
}

impl SearchPayload {
    pub fn into_issues(self, offset: FixedOffset) -> Result<Vec<Issue>, TrackerError> {
        self.issues
            .into_iter()
            .map(|issue| {
                let resolution_date = match issue.fields.resolutiondate.as_deref() {
                    Some(value) => Some(parse_timestamp(value, offset)?),
                    None => None,
                };
                Ok(Issue {
                    original_estimate_seconds: issue.original_estimate_seconds(),
                    key: issue.key,
                    resolution_date,
                })
            })
            .collect()
    }

    /// Unestimated issues get an effort of 0.
    pub fn into_effort(self) -> EffortMap {
        self.issues
            .into_iter()
            .map(|issue| {
                let seconds = issue.original_estimate_seconds().unwrap_or(0);
                (issue.key, seconds)
            })
            .collect()
    }

    pub fn into_worklogs(self, offset: FixedOffset) -> Result<Vec<WorklogEntry>, TrackerError> {
        let mut entries = Vec::new();
        for issue in self.issues {
            let Some(page) = issue.fields.worklog else {
                continue;
            };
            for worklog in page.worklogs {
                entries.push(WorklogEntry {
                    issue_key: issue.key.clone(),
                    created: parse_timestamp(&worklog.created, offset)?,
                    time_spent_seconds: worklog.time_spent_seconds,
                });
            }
        }
        Ok(entries)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeChartPayload {
    #[serde(default)]
    pub changes: HashMap<String, Vec<ScopeChangePayload>>,
    #[serde(default)]
    pub issue_to_parent_keys: HashMap<String, Option<String>>,
    pub now: i64,
}

#[derive(Debug, Deserialize)]
pub struct ScopeChangePayload {
    pub key: String,
    #[serde(default)]
    pub added: Option<bool>,
    #[serde(default)]
    pub column: Option<ColumnPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColumnPayload {
    #[serde(default)]
    pub done: Option<bool>,
}

impl ScopeChartPayload {
    fn is_leaf(&self, key: &str) -> bool {
        match self.issue_to_parent_keys.get(key) {
            Some(parent) => parent.as_deref().is_some_and(|p| !p.is_empty()),
            None => {
                tracing::warn!(issue = key, "issue missing from parent map, treating as parent");
                false
            }
        }
    }

    /// Typed change log with parent issues dropped, plus the chart's "now".
    pub fn into_log(self, offset: FixedOffset) -> Result<(ScopeChangeLog, TimePoint), TrackerError> {
        let now = parse_chart_millis(self.now, offset)?;

        let mut log = Vec::with_capacity(self.changes.len());
        for (millis, changes) in &self.changes {
            let millis: i64 = millis
                .parse()
                .map_err(|_| TrackerError::Timestamp { value: millis.clone() })?;
            let records = changes
                .iter()
                .filter(|change| self.is_leaf(&change.key))
                .map(|change| ChangeRecord {
                    key: change.key.clone(),
                    added: change.added,
                    done_column: matches!(
                        change.column,
                        Some(ColumnPayload { done: Some(true) })
                    ),
                })
                .collect();
            log.push(ChangeBucket {
                timestamp: parse_chart_millis(millis, offset)?,
                changes: records,
            });
        }
        log.sort_by_key(|bucket| bucket.timestamp);
        Ok((log, now))
    }
}
