//! Issue tracker access.
//!
//! Everything that comes back from the tracker is decoded and normalized here:
//! timestamps land in the configured offset, parent issues are dropped from the
//! scope log and unestimated issues get zero effort. The engine never sees raw
//! JSON.

mod http;
mod jira6;
mod jira7;
pub mod payload;

pub use http::JiraHttp;
pub use jira6::Jira6;
pub use jira7::Jira7;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::model::{EffortMap, Issue, ScopeChangeLog, Sprint, SprintSnapshot, TimePoint, WorklogEntry};
use crate::scope::build_scope_timeline;
use crate::storage::{ApiVersion, Config};
use payload::ScopeChartPayload;

/// Timestamp format inside JQL literals.
pub const JQL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A sprint as listed for a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub state: String,
}

/// One method per tracker capability the chart needs.
#[allow(async_fn_in_trait)]
pub trait Tracker {
    /// Boards with sprint support, by id.
    async fn scrum_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError>;

    /// Boards without sprints, where support issues live.
    async fn kanban_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError>;

    async fn sprints(&self, board: u64) -> Result<BTreeMap<u64, SprintInfo>, TrackerError>;

    async fn sprint_dates(&self, board: u64, sprint: u64) -> Result<Sprint, TrackerError>;

    /// Leaf issues (sub-tasks) of the sprint.
    async fn issues(&self, board: u64, sprint: u64) -> Result<Vec<Issue>, TrackerError>;

    /// Original estimates in seconds. No request is made for an empty key list.
    async fn effort_for_issues(&self, board: u64, keys: &[String]) -> Result<EffortMap, TrackerError>;

    /// The scope change log and the tracker's current time.
    async fn scope_change_log(
        &self,
        board: u64,
        sprint: u64,
    ) -> Result<(ScopeChangeLog, TimePoint), TrackerError>;

    /// Work logs of the support issues matching the burnup query.
    async fn issue_worklogs(
        &self,
        support_board: Option<u64>,
        sprint: &Sprint,
    ) -> Result<Vec<WorklogEntry>, TrackerError>;
}

/// The tracker variant selected by configuration.
#[derive(Debug, Clone)]
pub enum TrackerClient {
    V6(Jira6),
    V7(Jira7),
}

impl TrackerClient {
    pub fn from_config(config: &Config, password: &str) -> Result<Self, TrackerError> {
        let tracker = &config.tracker;
        let http = JiraHttp::new(&tracker.url, &tracker.username, password, config.tracker_offset())?;
        let query = tracker.burnup_issue_query.clone();
        Ok(match tracker.api_version {
            ApiVersion::V6 => Self::V6(Jira6::new(http, query)),
            ApiVersion::V7 => Self::V7(Jira7::new(http, query)),
        })
    }
}

impl Tracker for TrackerClient {
    async fn scrum_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError> {
        match self {
            Self::V6(jira) => jira.scrum_boards().await,
            Self::V7(jira) => jira.scrum_boards().await,
        }
    }

    async fn kanban_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError> {
        match self {
            Self::V6(jira) => jira.kanban_boards().await,
            Self::V7(jira) => jira.kanban_boards().await,
        }
    }

    async fn sprints(&self, board: u64) -> Result<BTreeMap<u64, SprintInfo>, TrackerError> {
        match self {
            Self::V6(jira) => jira.sprints(board).await,
            Self::V7(jira) => jira.sprints(board).await,
        }
    }

    async fn sprint_dates(&self, board: u64, sprint: u64) -> Result<Sprint, TrackerError> {
        match self {
            Self::V6(jira) => jira.sprint_dates(board, sprint).await,
            Self::V7(jira) => jira.sprint_dates(board, sprint).await,
        }
    }

    async fn issues(&self, board: u64, sprint: u64) -> Result<Vec<Issue>, TrackerError> {
        match self {
            Self::V6(jira) => jira.issues(board, sprint).await,
            Self::V7(jira) => jira.issues(board, sprint).await,
        }
    }

    async fn effort_for_issues(&self, board: u64, keys: &[String]) -> Result<EffortMap, TrackerError> {
        match self {
            Self::V6(jira) => jira.effort_for_issues(board, keys).await,
            Self::V7(jira) => jira.effort_for_issues(board, keys).await,
        }
    }

    async fn scope_change_log(
        &self,
        board: u64,
        sprint: u64,
    ) -> Result<(ScopeChangeLog, TimePoint), TrackerError> {
        match self {
            Self::V6(jira) => jira.scope_change_log(board, sprint).await,
            Self::V7(jira) => jira.scope_change_log(board, sprint).await,
        }
    }

    async fn issue_worklogs(
        &self,
        support_board: Option<u64>,
        sprint: &Sprint,
    ) -> Result<Vec<WorklogEntry>, TrackerError> {
        match self {
            Self::V6(jira) => jira.issue_worklogs(support_board, sprint).await,
            Self::V7(jira) => jira.issue_worklogs(support_board, sprint).await,
        }
    }
}

/// `issuekey in (A-1,A-2)`
fn issue_key_query(keys: &[String]) -> String {
    format!("issuekey in ({})", keys.join(","))
}

/// Both API generations read scope changes from the greenhopper chart.
async fn scope_chart(
    http: &JiraHttp,
    board: u64,
    sprint: u64,
) -> Result<(ScopeChangeLog, TimePoint), TrackerError> {
    let chart: ScopeChartPayload = http
        .get(
            "rest/greenhopper/1.0/rapid/charts/scopechangeburndownchart",
            &[("rapidViewId", board.to_string()), ("sprintId", sprint.to_string())],
        )
        .await?;
    chart.into_log(http.offset())
}

/// Gather everything one chart refresh needs. Burnup work logs come from
/// `support_board`, not from the sprint's own board.
pub async fn fetch_snapshot<T: Tracker>(
    tracker: &T,
    board: u64,
    sprint: u64,
    support_board: Option<u64>,
) -> Result<SprintSnapshot> {
    let (window, (scope_log, now), issues) = tokio::try_join!(
        tracker.sprint_dates(board, sprint),
        tracker.scope_change_log(board, sprint),
        tracker.issues(board, sprint),
    )?;
    tracing::info!(board, sprint, start = %window.start(), end = %window.end(), "fetched sprint");

    let timeline = build_scope_timeline(&window, &scope_log)?;
    let (effort, worklogs) = tokio::try_join!(
        tracker.effort_for_issues(board, &timeline.issue_keys),
        tracker.issue_worklogs(support_board, &window),
    )?;
    tracing::debug!(
        issues = issues.len(),
        estimated = effort.len(),
        worklogs = worklogs.len(),
        "snapshot complete"
    );

    Ok(SprintSnapshot {
        sprint: window,
        now,
        scope_log,
        issues,
        effort,
        worklogs,
    })
}
