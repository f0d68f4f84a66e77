//! Reconstructs the sprint's scope from the tracker's change log.
//!
//! The log arrives grouped by timestamp in no particular order. Only records
//! that carry an "added" flag are scope changes; column moves matter just for
//! spotting issues that were finished before the sprint began.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::model::{ScopeChangeLog, Sprint, TimePoint};

/// An issue entering (`added`) or leaving scope at `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeChangeEvent {
    pub timestamp: TimePoint,
    pub issue_key: String,
    pub added: bool,
}

/// Scope at sprint start plus everything that changed during the sprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeTimeline {
    /// Every issue touched by a scope change, first-seen order, no duplicates
    pub issue_keys: Vec<String>,
    /// Events at or before sprint start, ascending
    pub initial_scope: Vec<ScopeChangeEvent>,
    /// Events after sprint start up to and including sprint end, ascending
    pub scope_changes: Vec<ScopeChangeEvent>,
}

/// Split the change log into initial scope and in-sprint scope changes.
pub fn build_scope_timeline(
    sprint: &Sprint,
    log: &ScopeChangeLog,
) -> Result<ScopeTimeline, ChartError> {
    let start = sprint.start();
    let end = sprint.end();

    let mut already_done = HashSet::new();
    for bucket in log {
        sprint.check_offset(&bucket.timestamp)?;
        if bucket.timestamp > start {
            continue;
        }
        for change in bucket.changes.iter().filter(|c| c.done_column) {
            already_done.insert(change.key.as_str());
        }
    }

    let mut timeline = ScopeTimeline::default();
    let mut seen = HashSet::new();

    for bucket in log {
        for change in &bucket.changes {
            let Some(added) = change.added else {
                continue;
            };
            if already_done.contains(change.key.as_str()) {
                tracing::debug!(issue = %change.key, "ignoring issue completed before sprint start");
                continue;
            }

            let event = ScopeChangeEvent {
                timestamp: bucket.timestamp,
                issue_key: change.key.clone(),
                added,
            };
            if bucket.timestamp <= start {
                timeline.initial_scope.push(event);
            } else if bucket.timestamp <= end {
                timeline.scope_changes.push(event);
            }

            if seen.insert(change.key.as_str()) {
                timeline.issue_keys.push(change.key.clone());
            }
        }
    }

    timeline.initial_scope.sort_by_key(|e| e.timestamp);
    timeline.scope_changes.sort_by_key(|e| e.timestamp);

    tracing::debug!(
        initial = timeline.initial_scope.len(),
        changes = timeline.scope_changes.len(),
        issues = timeline.issue_keys.len(),
        "built scope timeline"
    );
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeBucket, ChangeRecord};
    use chrono::DateTime;

    fn ts(s: &str) -> TimePoint {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sprint() -> Sprint {
        Sprint::new(ts("2016-01-04T09:00:00Z"), ts("2016-01-15T17:00:00Z")).unwrap()
    }

    fn bucket(t: &str, changes: Vec<ChangeRecord>) -> ChangeBucket {
        ChangeBucket {
            timestamp: ts(t),
            changes,
        }
    }

    #[test]
    fn events_are_split_around_sprint_start_and_sorted() {
        let log = vec![
            bucket("2016-01-07T10:00:00Z", vec![ChangeRecord::removed("A-1")]),
            bucket("2016-01-03T10:00:00Z", vec![ChangeRecord::added("A-2")]),
            bucket("2016-01-05T10:00:00Z", vec![ChangeRecord::added("A-3")]),
            bucket("2016-01-02T10:00:00Z", vec![ChangeRecord::added("A-1")]),
        ];
        let timeline = build_scope_timeline(&sprint(), &log).unwrap();

        let initial: Vec<_> = timeline.initial_scope.iter().map(|e| e.issue_key.as_str()).collect();
        assert_eq!(initial, vec!["A-1", "A-2"]);

        let changes: Vec<_> = timeline
            .scope_changes
            .iter()
            .map(|e| (e.issue_key.as_str(), e.added))
            .collect();
        assert_eq!(changes, vec![("A-3", true), ("A-1", false)]);
        assert_eq!(timeline.issue_keys, vec!["A-1", "A-2", "A-3"]);
    }

    #[test]
    fn sprint_start_is_initial_scope_and_sprint_end_is_a_change() {
        let log = vec![
            bucket("2016-01-04T09:00:00Z", vec![ChangeRecord::added("A-1")]),
            bucket("2016-01-15T17:00:00Z", vec![ChangeRecord::added("A-2")]),
        ];
        let timeline = build_scope_timeline(&sprint(), &log).unwrap();
        assert_eq!(timeline.initial_scope.len(), 1);
        assert_eq!(timeline.scope_changes.len(), 1);
        assert_eq!(timeline.scope_changes[0].issue_key, "A-2");
    }

    #[test]
    fn changes_after_sprint_end_are_dropped_but_keys_recorded() {
        let log = vec![bucket("2016-01-16T10:00:00Z", vec![ChangeRecord::added("A-9")])];
        let timeline = build_scope_timeline(&sprint(), &log).unwrap();
        assert!(timeline.initial_scope.is_empty());
        assert!(timeline.scope_changes.is_empty());
        assert_eq!(timeline.issue_keys, vec!["A-9"]);
    }

    #[test]
    fn issues_done_before_the_sprint_never_count() {
        let log = vec![
            bucket("2016-01-01T10:00:00Z", vec![ChangeRecord::moved_to_done("A-1")]),
            bucket("2016-01-02T10:00:00Z", vec![ChangeRecord::added("A-1")]),
            bucket("2016-01-06T10:00:00Z", vec![ChangeRecord::added("A-1")]),
        ];
        let timeline = build_scope_timeline(&sprint(), &log).unwrap();
        assert!(timeline.initial_scope.is_empty());
        assert!(timeline.scope_changes.is_empty());
        assert!(timeline.issue_keys.is_empty());
    }

    #[test]
    fn issues_done_during_the_sprint_still_count() {
        let log = vec![
            bucket("2016-01-02T10:00:00Z", vec![ChangeRecord::added("A-1")]),
            bucket("2016-01-06T10:00:00Z", vec![ChangeRecord::moved_to_done("A-1")]),
        ];
        let timeline = build_scope_timeline(&sprint(), &log).unwrap();
        assert_eq!(timeline.initial_scope.len(), 1);
    }

    #[test]
    fn pure_column_moves_are_ignored() {
        let log = vec![bucket("2016-01-06T10:00:00Z", vec![ChangeRecord::moved_to_done("A-1")])];
        assert_eq!(build_scope_timeline(&sprint(), &log).unwrap(), ScopeTimeline::default());
    }

    #[test]
    fn mixed_offsets_fail_fast() {
        let log = vec![bucket("2016-01-06T10:00:00+01:00", vec![ChangeRecord::added("A-1")])];
        let err = build_scope_timeline(&sprint(), &log).unwrap_err();
        assert!(matches!(err, ChartError::TimezoneMismatch { .. }));
    }
}
