//! Typed records the engine consumes.
//!
//! Everything here is validated once at the tracker boundary; the engine only
//! ever sees these shapes, never raw JSON maps.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ChartError;

/// A timezone-aware instant. All instants of one computation share an offset.
pub type TimePoint = DateTime<FixedOffset>;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// The sprint window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    start: TimePoint,
    end: TimePoint,
}

impl Sprint {
    /// Create a sprint, rejecting mixed offsets and reversed bounds.
    pub fn new(start: TimePoint, end: TimePoint) -> Result<Self, ChartError> {
        let sprint = Self { start, end };
        sprint.validate()?;
        Ok(sprint)
    }

    /// Re-check the invariants, e.g. after deserializing a snapshot.
    pub fn validate(&self) -> Result<(), ChartError> {
        self.check_offset(&self.end)?;
        if self.end < self.start {
            return Err(ChartError::InvalidSprint {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn start(&self) -> TimePoint {
        self.start
    }

    pub fn end(&self) -> TimePoint {
        self.end
    }

    pub fn offset(&self) -> FixedOffset {
        *self.start.offset()
    }

    /// Whether `t` falls inside `[start, end]`, both ends inclusive.
    pub fn contains(&self, t: &TimePoint) -> bool {
        *t >= self.start && *t <= self.end
    }

    /// Fail fast when `t` was recorded in a different offset than the sprint.
    pub fn check_offset(&self, t: &TimePoint) -> Result<(), ChartError> {
        if t.offset() != self.start.offset() {
            return Err(ChartError::TimezoneMismatch {
                expected: self.offset(),
                found: *t.offset(),
            });
        }
        Ok(())
    }

    /// The instant the "actual" lines stop at: `now`, capped to the sprint window.
    pub fn last_actual_time(&self, now: TimePoint) -> TimePoint {
        now.min(self.end).max(self.start)
    }
}

/// One per-issue entry in the tracker's scope change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub key: String,
    /// `Some(true)` entered scope, `Some(false)` left it, `None` is not a scope change.
    #[serde(default)]
    pub added: Option<bool>,
    /// The issue was moved to a completed column.
    #[serde(default)]
    pub done_column: bool,
}

impl ChangeRecord {
    pub fn added(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            added: Some(true),
            done_column: false,
        }
    }

    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            added: Some(false),
            done_column: false,
        }
    }

    pub fn moved_to_done(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            added: None,
            done_column: true,
        }
    }
}

/// All change records sharing one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeBucket {
    pub timestamp: TimePoint,
    pub changes: Vec<ChangeRecord>,
}

/// Unordered scope change log, grouped by timestamp bucket.
pub type ScopeChangeLog = Vec<ChangeBucket>;

/// A leaf issue of the sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub resolution_date: Option<TimePoint>,
    #[serde(default)]
    pub original_estimate_seconds: Option<u64>,
}

impl Issue {
    /// Estimated effort in hours, 0 when unestimated.
    pub fn estimate_hours(&self) -> f64 {
        self.original_estimate_seconds.unwrap_or(0) as f64 / SECONDS_PER_HOUR
    }
}

/// Time logged against an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorklogEntry {
    pub issue_key: String,
    pub created: TimePoint,
    pub time_spent_seconds: u64,
}

/// Original estimate per issue key, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffortMap(HashMap<String, u64>);

impl EffortMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, seconds: u64) {
        self.0.insert(key.into(), seconds);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Effort for `key`; a missing key means the fetch was inconsistent.
    pub fn seconds(&self, key: &str) -> Result<u64, ChartError> {
        self.0
            .get(key)
            .copied()
            .ok_or_else(|| ChartError::MissingEffort(key.to_string()))
    }

    pub fn hours(&self, key: &str) -> Result<f64, ChartError> {
        Ok(self.seconds(key)? as f64 / SECONDS_PER_HOUR)
    }
}

impl FromIterator<(String, u64)> for EffortMap {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Hours configured for one sprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintHours {
    /// Total committed capacity in hours
    #[serde(default)]
    pub availability: u32,
    /// Hours reserved for the support/maintenance track
    #[serde(default)]
    pub burnup_budget: u32,
}

impl SprintHours {
    pub fn new(availability: u32, burnup_budget: u32) -> Self {
        Self {
            availability,
            burnup_budget,
        }
    }

    /// Burndown points per burnup hour.
    ///
    /// Equal availability and budget would divide by zero; that resolves to 0
    /// so an unconfigured sprint still renders.
    pub fn points_per_hour(&self, initial_scope_hours: f64) -> f64 {
        let planned = self.availability as f64 - self.burnup_budget as f64;
        if planned == 0.0 {
            tracing::warn!(
                availability = self.availability,
                burnup_budget = self.burnup_budget,
                "availability equals burnup budget, using 0 points per hour"
            );
            return 0.0;
        }
        initial_scope_hours / planned
    }
}

/// Everything one chart refresh needs, fetched in one go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSnapshot {
    pub sprint: Sprint,
    /// The tracker's notion of "now" at fetch time
    pub now: TimePoint,
    #[serde(default)]
    pub scope_log: ScopeChangeLog,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub effort: EffortMap,
    #[serde(default)]
    pub worklogs: Vec<WorklogEntry>,
}
