//! Agile REST API.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::http::{paged, JiraHttp};
use super::payload::{parse_local_timestamp, SearchPayload};
use super::{issue_key_query, scope_chart, SprintInfo, Tracker};
use crate::error::TrackerError;
use crate::model::{EffortMap, Issue, ScopeChangeLog, Sprint, TimePoint, WorklogEntry};

/// Envelope of every agile listing.
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Board {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SprintDetail {
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default)]
    complete_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Jira7 {
    http: JiraHttp,
    burnup_issue_query: String,
}

impl Jira7 {
    pub fn new(http: JiraHttp, burnup_issue_query: impl Into<String>) -> Self {
        Self {
            http,
            burnup_issue_query: burnup_issue_query.into(),
        }
    }

    /// Issues with work logged on a sprint day.
    pub fn worklog_query(&self, sprint: &Sprint) -> String {
        let mut query = format!(
            "worklogDate >= \"{}\" and worklogDate <= \"{}\"",
            sprint.start().format("%Y-%m-%d"),
            sprint.end().format("%Y-%m-%d"),
        );
        if !self.burnup_issue_query.is_empty() {
            query.push_str(" and ");
            query.push_str(&self.burnup_issue_query);
        }
        query
    }

    async fn boards(&self, kind: &str) -> Result<BTreeMap<u64, String>, TrackerError> {
        let page: Page<Board> = self
            .http
            .get("rest/agile/1.0/board", &paged([("type", kind.to_string())]))
            .await?;
        Ok(page.values.into_iter().map(|b| (b.id, b.name)).collect())
    }
}

impl Tracker for Jira7 {
    async fn scrum_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError> {
        self.boards("scrum").await
    }

    async fn kanban_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError> {
        self.boards("kanban").await
    }

    async fn sprints(&self, board: u64) -> Result<BTreeMap<u64, SprintInfo>, TrackerError> {
        let resource = format!("rest/agile/1.0/board/{board}/sprint");
        let page: Page<SprintInfo> = self.http.get(&resource, &paged([])).await?;
        Ok(page.values.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn sprint_dates(&self, _board: u64, sprint: u64) -> Result<Sprint, TrackerError> {
        let resource = format!("rest/agile/1.0/sprint/{sprint}");
        let detail: SprintDetail = self.http.get(&resource, &[]).await?;

        let missing = |field: &str| TrackerError::Payload(format!("sprint {sprint} has no {field}"));
        let start = detail.start_date.as_deref().ok_or_else(|| missing("startDate"))?;
        let end = detail
            .complete_date
            .as_deref()
            .or(detail.end_date.as_deref())
            .ok_or_else(|| missing("endDate"))?;

        let offset = self.http.offset();
        Sprint::new(
            parse_local_timestamp(start, offset)?,
            parse_local_timestamp(end, offset)?,
        )
        .map_err(|e| TrackerError::Payload(e.to_string()))
    }

    async fn issues(&self, board: u64, sprint: u64) -> Result<Vec<Issue>, TrackerError> {
        let resource = format!("rest/agile/1.0/board/{board}/sprint/{sprint}/issue");
        let params = paged([
            ("jql", "issuetype = Sub-task".to_string()),
            ("fields", "timetracking,resolutiondate".to_string()),
        ]);
        let data: SearchPayload = self.http.get(&resource, &params).await?;
        data.into_issues(self.http.offset())
    }

    async fn effort_for_issues(&self, board: u64, keys: &[String]) -> Result<EffortMap, TrackerError> {
        if keys.is_empty() {
            return Ok(EffortMap::new());
        }
        let resource = format!("rest/agile/1.0/board/{board}/issue");
        let params = paged([
            ("jql", issue_key_query(keys)),
            ("fields", "timetracking".to_string()),
        ]);
        let data: SearchPayload = self.http.get(&resource, &params).await?;
        Ok(data.into_effort())
    }

    async fn scope_change_log(
        &self,
        board: u64,
        sprint: u64,
    ) -> Result<(ScopeChangeLog, TimePoint), TrackerError> {
        scope_chart(&self.http, board, sprint).await
    }

    async fn issue_worklogs(
        &self,
        support_board: Option<u64>,
        sprint: &Sprint,
    ) -> Result<Vec<WorklogEntry>, TrackerError> {
        let board = support_board.ok_or(TrackerError::NoSupportBoard)?;
        let resource = format!("rest/agile/1.0/board/{board}/issue");
        let params = paged([
            ("jql", self.worklog_query(sprint)),
            ("fields", "worklog".to_string()),
        ]);
        let data: SearchPayload = self.http.get(&resource, &params).await?;
        data.into_worklogs(self.http.offset())
    }
}
