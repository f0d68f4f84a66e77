//! Greenhopper-era tracker API.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::http::{paged, JiraHttp};
use super::payload::{parse_local_timestamp, SearchPayload};
use super::{issue_key_query, scope_chart, SprintInfo, Tracker, JQL_TIME_FORMAT};
use crate::error::TrackerError;
use crate::model::{EffortMap, Issue, ScopeChangeLog, Sprint, TimePoint, WorklogEntry};

const SEARCH: &str = "rest/api/2/search";
const ESTIMATE_FIELDS: &str = "timetracking,resolutiondate";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectorData {
    #[serde(default)]
    rapid_views: Vec<RapidView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RapidView {
    id: u64,
    name: String,
    #[serde(default)]
    sprint_support_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct SprintQuery {
    #[serde(default)]
    sprints: Vec<SprintInfo>,
}

#[derive(Debug, Deserialize)]
struct SprintReport {
    sprint: SprintReportDates,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SprintReportDates {
    start_date: String,
    end_date: String,
    #[serde(default)]
    complete_date: Option<String>,
}

impl SprintReportDates {
    /// The completion date once the sprint is closed, the planned end before that.
    fn effective_end(&self) -> &str {
        match self.complete_date.as_deref() {
            Some(date) if date != "None" && !date.is_empty() => date,
            _ => &self.end_date,
        }
    }
}

fn jql_time(t: &TimePoint) -> String {
    format!("\"{}\"", t.format(JQL_TIME_FORMAT))
}

#[derive(Debug, Clone)]
pub struct Jira6 {
    http: JiraHttp,
    burnup_issue_query: String,
}

impl Jira6 {
    pub fn new(http: JiraHttp, burnup_issue_query: impl Into<String>) -> Self {
        Self {
            http,
            burnup_issue_query: burnup_issue_query.into(),
        }
    }

    /// Issues that could have received work logs during the sprint.
    pub fn worklog_query(&self, sprint: &Sprint) -> String {
        let start = jql_time(&sprint.start());
        let mut parts = vec![
            format!("(resolved >= {start} or resolution = unresolved)"),
            format!("(created <= {})", jql_time(&sprint.end())),
            format!("(updated >= {start})"),
        ];
        if !self.burnup_issue_query.is_empty() {
            parts.push(self.burnup_issue_query.clone());
        }
        parts.join(" and ")
    }

    /// Rapid views split by whether they run sprints.
    async fn rapid_views(&self, sprint_support: bool) -> Result<BTreeMap<u64, String>, TrackerError> {
        let data: SelectorData = self.http.get("rest/greenhopper/1.0/xboard/selectorData", &[]).await?;
        Ok(data
            .rapid_views
            .into_iter()
            .filter(|view| view.sprint_support_enabled == sprint_support)
            .map(|view| (view.id, view.name))
            .collect())
    }
}

impl Tracker for Jira6 {
    async fn scrum_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError> {
        self.rapid_views(true).await
    }

    async fn kanban_boards(&self) -> Result<BTreeMap<u64, String>, TrackerError> {
        self.rapid_views(false).await
    }

    async fn sprints(&self, board: u64) -> Result<BTreeMap<u64, SprintInfo>, TrackerError> {
        let resource = format!("rest/greenhopper/1.0/sprintquery/{board}");
        let data: SprintQuery = self.http.get(&resource, &paged([])).await?;
        Ok(data.sprints.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn sprint_dates(&self, board: u64, sprint: u64) -> Result<Sprint, TrackerError> {
        let report: SprintReport = self
            .http
            .get(
                "rest/greenhopper/1.0/rapid/charts/sprintreport",
                &[("rapidViewId", board.to_string()), ("sprintId", sprint.to_string())],
            )
            .await?;
        let offset = self.http.offset();
        let start = parse_local_timestamp(&report.sprint.start_date, offset)?;
        let end = parse_local_timestamp(report.sprint.effective_end(), offset)?;
        Sprint::new(start, end).map_err(|e| TrackerError::Payload(e.to_string()))
    }

    async fn issues(&self, _board: u64, sprint: u64) -> Result<Vec<Issue>, TrackerError> {
        let params = paged([
            ("jql", format!("issuetype = Sub-task and sprint = {sprint}")),
            ("fields", ESTIMATE_FIELDS.to_string()),
        ]);
        let data: SearchPayload = self.http.get(SEARCH, &params).await?;
        data.into_issues(self.http.offset())
    }

    async fn effort_for_issues(&self, _board: u64, keys: &[String]) -> Result<EffortMap, TrackerError> {
        if keys.is_empty() {
            return Ok(EffortMap::new());
        }
        let params = paged([
            ("jql", issue_key_query(keys)),
            ("fields", ESTIMATE_FIELDS.to_string()),
        ]);
        let data: SearchPayload = self.http.get(SEARCH, &params).await?;
        Ok(data.into_effort())
    }

    async fn scope_change_log(
        &self,
        board: u64,
        sprint: u64,
    ) -> Result<(ScopeChangeLog, TimePoint), TrackerError> {
        scope_chart(&self.http, board, sprint).await
    }

    /// Searches across all projects; the burnup query selects the support issues.
    async fn issue_worklogs(
        &self,
        _support_board: Option<u64>,
        sprint: &Sprint,
    ) -> Result<Vec<WorklogEntry>, TrackerError> {
        let params = paged([
            ("jql", self.worklog_query(sprint)),
            ("fields", "worklog".to_string()),
        ]);
        let data: SearchPayload = self.http.get(SEARCH, &params).await?;
        data.into_worklogs(self.http.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn jira(query: &str) -> Jira6 {
        let http = JiraHttp::new("http://tracker.local", "me", "", FixedOffset::east_opt(3600).unwrap())
            .unwrap();
        Jira6::new(http, query)
    }

    fn sprint() -> Sprint {
        Sprint::new(
            DateTime::parse_from_rfc3339("2016-01-04T09:00:00+01:00").unwrap(),
            DateTime::parse_from_rfc3339("2016-01-15T17:30:00+01:00").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn worklog_query_bounds_by_sprint_window() {
        assert_eq!(
            jira("").worklog_query(&sprint()),
            "(resolved >= \"2016-01-04 09:00\" or resolution = unresolved) and \
             (created <= \"2016-01-15 17:30\") and (updated >= \"2016-01-04 09:00\")"
        );
    }

    #[test]
    fn worklog_query_appends_configured_filter() {
        let query = jira("project = OPS").worklog_query(&sprint());
        assert!(query.ends_with(" and project = OPS"));
    }

    #[test]
    fn open_sprint_ends_at_planned_date() {
        let dates = SprintReportDates {
            start_date: "04/Jan/16 9:00 AM".into(),
            end_date: "15/Jan/16 5:30 PM".into(),
            complete_date: Some("None".into()),
        };
        assert_eq!(dates.effective_end(), "15/Jan/16 5:30 PM");

        let closed = SprintReportDates {
            complete_date: Some("14/Jan/16 4:00 PM".into()),
            ..dates
        };
        assert_eq!(closed.effective_end(), "14/Jan/16 4:00 PM");
    }
}
