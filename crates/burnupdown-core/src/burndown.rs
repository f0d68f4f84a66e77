//! Remaining committed work over the sprint.

use crate::error::ChartError;
use crate::model::{EffortMap, Issue, Sprint, TimePoint};
use crate::scope::ScopeChangeEvent;
use crate::series::Series;
use crate::time::to_numeric_offset;

/// Hours of work committed at sprint start.
pub fn initial_scope_hours(
    initial_scope: &[ScopeChangeEvent],
    effort: &EffortMap,
) -> Result<f64, ChartError> {
    let mut total = 0.0;
    for event in initial_scope {
        let hours = effort.hours(&event.issue_key)?;
        tracing::debug!(issue = %event.issue_key, hours, "adding to initial scope");
        total += hours;
    }
    tracing::info!(hours = total, "initial sprint scope");
    Ok(total)
}

/// Running total of scope added (positive) or removed (negative) since
/// sprint start, bracketed by points at sprint start and sprint end.
pub fn scope_change_series(
    sprint: &Sprint,
    scope_changes: &[ScopeChangeEvent],
    effort: &EffortMap,
) -> Result<Series, ChartError> {
    let mut series = Series::new("scope_change");
    let mut running = 0.0;
    series.push(sprint.start(), Some(running));

    for change in scope_changes {
        let hours = effort.hours(&change.issue_key)?;
        if change.added {
            running += hours;
        } else {
            running -= hours;
        }
        tracing::debug!(
            issue = %change.issue_key,
            added = change.added,
            hours,
            at = %change.timestamp,
            "scope change"
        );
        series.push(change.timestamp, Some(running));
    }

    tracing::debug!(hours = running, "overall scope change");
    series.push(sprint.end(), Some(running));
    Ok(series)
}

/// The scope line as drawn: how far each moment's scope is from the final
/// scope, so the line ends at zero.
pub fn scope_line(scope_change: &Series) -> Series {
    let final_change = scope_change.last_value().unwrap_or(0.0);
    let mut line = Series::new(scope_change.name.clone());
    line.compressed = scope_change.compressed;
    for point in &scope_change.points {
        line.push(point.time, point.value.map(|v| final_change - v));
    }
    line
}

/// Straight line from the final scope at sprint start to zero at sprint end.
pub fn ideal_burndown(sprint: &Sprint, final_scope: f64) -> Series {
    Series::from_values(
        "ideal_burndown",
        [(sprint.start(), final_scope), (sprint.end(), 0.0)],
    )
}

/// Linear interpolation on the ideal burndown at `t`.
///
/// A zero-width line has nothing left to burn, so it reads as 0.
pub fn ideal_burndown_value_at(t: &TimePoint, ideal: &Series) -> f64 {
    let (Some(first), Some(last)) = (ideal.first(), ideal.last()) else {
        return 0.0;
    };
    let scope = first.value.unwrap_or(0.0);
    let span = to_numeric_offset(&last.time) - to_numeric_offset(&first.time);
    if span == 0.0 {
        return 0.0;
    }
    (to_numeric_offset(&last.time) - to_numeric_offset(t)) / span * scope
}

/// Issues in resolution order, unresolved ones first.
pub fn sort_by_resolution(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        let key = |i: &Issue| i.resolution_date.as_ref().map(to_numeric_offset);
        key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Remaining work after each issue resolved inside the sprint window,
/// ending at `now` (or sprint end, whichever is earlier).
pub fn actual_burndown(
    sprint: &Sprint,
    now: TimePoint,
    final_scope: f64,
    issues: &[Issue],
) -> Result<Series, ChartError> {
    let mut sorted = issues.to_vec();
    sort_by_resolution(&mut sorted);

    let mut series = Series::new("actual_burndown");
    let mut remaining = final_scope;
    let mut completed = 0.0;
    series.push(sprint.start(), Some(remaining));

    for issue in &sorted {
        let Some(resolved) = issue.resolution_date else {
            continue;
        };
        sprint.check_offset(&resolved)?;
        if !sprint.contains(&resolved) {
            continue;
        }
        let hours = issue.estimate_hours();
        completed += hours;
        remaining -= hours;
        tracing::debug!(issue = %issue.key, hours, at = %resolved, "completed");
        series.push(resolved, Some(remaining));
    }

    tracing::debug!(hours = completed, "overall effort completed");
    series.push(sprint.last_actual_time(now), Some(remaining));
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> TimePoint {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sprint() -> Sprint {
        Sprint::new(ts("2016-01-04T00:00:00Z"), ts("2016-01-15T00:00:00Z")).unwrap()
    }

    fn event(t: &str, key: &str, added: bool) -> ScopeChangeEvent {
        ScopeChangeEvent {
            timestamp: ts(t),
            issue_key: key.into(),
            added,
        }
    }

    fn issue(key: &str, resolved: Option<&str>, hours: Option<u64>) -> Issue {
        Issue {
            key: key.into(),
            resolution_date: resolved.map(ts),
            original_estimate_seconds: hours.map(|h| h * 3600),
        }
    }

    fn effort() -> EffortMap {
        [("A-1", 8), ("A-2", 4), ("A-3", 2)]
            .into_iter()
            .map(|(k, h)| (k.to_string(), h * 3600))
            .collect()
    }

    #[test]
    fn initial_scope_sums_effort() {
        let initial = vec![
            event("2016-01-03T00:00:00Z", "A-1", true),
            event("2016-01-03T00:00:00Z", "A-2", true),
        ];
        assert_eq!(initial_scope_hours(&initial, &effort()).unwrap(), 12.0);
    }

    #[test]
    fn missing_effort_is_fatal() {
        let initial = vec![event("2016-01-03T00:00:00Z", "B-1", true)];
        assert_eq!(
            initial_scope_hours(&initial, &effort()),
            Err(ChartError::MissingEffort("B-1".into()))
        );
    }

    #[test]
    fn scope_change_series_accumulates_signed_effort() {
        let changes = vec![
            event("2016-01-05T00:00:00Z", "A-2", true),
            event("2016-01-06T00:00:00Z", "A-3", true),
            event("2016-01-07T00:00:00Z", "A-2", false),
        ];
        let series = scope_change_series(&sprint(), &changes, &effort()).unwrap();
        let values: Vec<_> = series.points.iter().map(|p| p.value.unwrap()).collect();
        assert_eq!(values, vec![0.0, 4.0, 6.0, 2.0, 2.0]);
        assert_eq!(series.last().unwrap().time, sprint().end());
    }

    #[test]
    fn scope_line_ends_at_zero() {
        let changes = vec![event("2016-01-05T00:00:00Z", "A-2", true)];
        let series = scope_change_series(&sprint(), &changes, &effort()).unwrap();
        let line = scope_line(&series);
        let values: Vec<_> = line.points.iter().map(|p| p.value.unwrap()).collect();
        assert_eq!(values, vec![4.0, 0.0, 0.0]);
    }

    #[test]
    fn ideal_burndown_interpolates() {
        let ideal = ideal_burndown(&sprint(), 44.0);
        assert_eq!(ideal_burndown_value_at(&sprint().start(), &ideal), 44.0);
        assert_eq!(ideal_burndown_value_at(&sprint().end(), &ideal), 0.0);
        let mid = ts("2016-01-09T12:00:00Z");
        assert!((ideal_burndown_value_at(&mid, &ideal) - 22.0).abs() < 1e-9);
    }

    #[test]
    fn ideal_value_on_zero_width_line_is_zero() {
        let t = ts("2016-01-04T00:00:00Z");
        let ideal = ideal_burndown(&Sprint::new(t, t).unwrap(), 10.0);
        assert_eq!(ideal_burndown_value_at(&t, &ideal), 0.0);
    }

    #[test]
    fn unresolved_issues_sort_first() {
        let mut issues = vec![
            issue("A-1", Some("2016-01-08T00:00:00Z"), Some(1)),
            issue("A-2", None, Some(1)),
            issue("A-3", Some("2016-01-05T00:00:00Z"), Some(1)),
        ];
        sort_by_resolution(&mut issues);
        let keys: Vec<_> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["A-2", "A-3", "A-1"]);
    }

    #[test]
    fn actual_burndown_follows_resolutions_in_order() {
        let issues = vec![
            issue("A-1", Some("2016-01-08T00:00:00Z"), Some(8)),
            issue("A-2", None, Some(4)),
            issue("A-3", Some("2016-01-05T00:00:00Z"), None),
            issue("A-4", Some("2016-01-20T00:00:00Z"), Some(4)),
            issue("A-5", Some("2016-01-06T00:00:00Z"), Some(2)),
        ];
        let now = ts("2016-01-12T00:00:00Z");
        let series = actual_burndown(&sprint(), now, 20.0, &issues).unwrap();
        let points: Vec<_> = series.points.iter().map(|p| (p.time, p.value.unwrap())).collect();
        assert_eq!(
            points,
            vec![
                (ts("2016-01-04T00:00:00Z"), 20.0),
                (ts("2016-01-05T00:00:00Z"), 20.0),
                (ts("2016-01-06T00:00:00Z"), 18.0),
                (ts("2016-01-08T00:00:00Z"), 10.0),
                (now, 10.0),
            ]
        );
    }

    #[test]
    fn actual_burndown_stops_at_sprint_end() {
        let now = ts("2016-02-01T00:00:00Z");
        let series = actual_burndown(&sprint(), now, 5.0, &[]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().time, sprint().end());
        assert_eq!(series.last_value(), Some(5.0));
    }
}
