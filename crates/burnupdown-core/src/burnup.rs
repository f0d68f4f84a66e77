//! Consumption of the separate support budget, and where it is heading.
//!
//! Burnup values are expressed in burndown points: the budget starts at
//! `-budget * points_per_hour` and reaches zero once the budget is used up.

use crate::error::ChartError;
use crate::model::{Sprint, TimePoint, WorklogEntry};
use crate::series::Series;
use crate::time::to_numeric_offset;

/// Work logged inside the sprint, accumulated in global time order.
pub fn actual_burnup(
    sprint: &Sprint,
    now: TimePoint,
    worklogs: &[WorklogEntry],
    burnup_budget: f64,
    points_per_hour: f64,
) -> Result<Series, ChartError> {
    let mut kept: Vec<&WorklogEntry> = Vec::new();
    let mut hours_in = 0.0;
    let mut hours_out = 0.0;

    for entry in worklogs {
        sprint.check_offset(&entry.created)?;
        let hours = entry.time_spent_seconds as f64 / 3600.0;
        if sprint.contains(&entry.created) {
            tracing::debug!(issue = %entry.issue_key, hours, "adding worklog");
            hours_in += hours;
            kept.push(entry);
        } else {
            tracing::debug!(issue = %entry.issue_key, hours, "skipping worklog outside sprint");
            hours_out += hours;
        }
    }
    tracing::debug!(hours_in, hours_out, "worklog totals");

    kept.sort_by_key(|entry| entry.created);

    let mut series = Series::new("actual_burnup");
    let height = |seconds: u64| (seconds as f64 / 3600.0 - burnup_budget) * points_per_hour;

    let mut spent = 0u64;
    series.push(sprint.start(), Some(height(spent)));
    for entry in kept {
        spent += entry.time_spent_seconds;
        series.push(entry.created, Some(height(spent)));
    }
    series.push(sprint.last_actual_time(now), Some(height(spent)));
    Ok(series)
}

/// Straight line from the whole budget at sprint start to zero at sprint end.
pub fn ideal_burnup(sprint: &Sprint, burnup_budget: f64, points_per_hour: f64) -> Series {
    Series::from_values(
        "ideal_burnup",
        [
            (sprint.start(), -burnup_budget * points_per_hour),
            (sprint.end(), 0.0),
        ],
    )
}

/// Extrapolate the actual burnup to sprint end.
///
/// Both inputs must already be weekend-compressed so the slope is measured
/// over working time. With no elapsed working time the trend is flat.
pub fn projected_burnup(zero_line: &Series, actual_burnup: &Series) -> Series {
    let mut series = Series::new("projected_burnup");
    series.compressed = true;

    let (Some(first), Some(last)) = (actual_burnup.first(), actual_burnup.last()) else {
        return series;
    };
    let (Some(sprint_start), Some(sprint_end)) = (zero_line.first(), zero_line.last()) else {
        return series;
    };

    let start_height = first.value.unwrap_or(0.0);
    let end_height = last.value.unwrap_or(0.0);
    let elapsed = to_numeric_offset(&last.time) - to_numeric_offset(&first.time);
    let sprint_length = to_numeric_offset(&sprint_end.time) - to_numeric_offset(&sprint_start.time);

    let projected_height = if elapsed == 0.0 {
        end_height
    } else {
        (end_height - start_height) / elapsed * sprint_length + start_height
    };

    series.push(last.time, Some(end_height));
    series.push(sprint_end.time, Some(projected_height));
    series
}

/// Burndown implied by a budget that is projected to be under-used: the
/// spare support hours go towards the committed scope. Empty otherwise.
pub fn expected_burndown(sprint: &Sprint, final_scope: f64, projected_height: f64) -> Series {
    if projected_height < 0.0 {
        Series::from_values(
            "expected_burndown",
            [(sprint.start(), final_scope), (sprint.end(), projected_height)],
        )
    } else {
        Series::new("expected_burndown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> TimePoint {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sprint() -> Sprint {
        Sprint::new(ts("2016-01-04T00:00:00Z"), ts("2016-01-08T00:00:00Z")).unwrap()
    }

    fn worklog(key: &str, created: &str, hours: u64) -> WorklogEntry {
        WorklogEntry {
            issue_key: key.into(),
            created: ts(created),
            time_spent_seconds: hours * 3600,
        }
    }

    fn values(series: &Series) -> Vec<f64> {
        series.points.iter().map(|p| p.value.unwrap()).collect()
    }

    #[test]
    fn actual_burnup_sorts_across_issues() {
        let worklogs = vec![
            worklog("S-1", "2016-01-06T00:00:00Z", 2),
            worklog("S-1", "2016-01-07T00:00:00Z", 1),
            worklog("S-2", "2016-01-05T00:00:00Z", 3),
            worklog("S-2", "2016-01-01T00:00:00Z", 50),
        ];
        let now = ts("2016-01-07T12:00:00Z");
        let series = actual_burnup(&sprint(), now, &worklogs, 10.0, 0.5).unwrap();

        let times: Vec<_> = series.points.iter().map(|p| p.time).collect();
        assert_eq!(
            times,
            vec![
                ts("2016-01-04T00:00:00Z"),
                ts("2016-01-05T00:00:00Z"),
                ts("2016-01-06T00:00:00Z"),
                ts("2016-01-07T00:00:00Z"),
                now,
            ]
        );
        assert_eq!(values(&series), vec![-5.0, -3.5, -2.5, -2.0, -2.0]);
    }

    #[test]
    fn empty_worklogs_give_flat_burnup() {
        let now = ts("2016-01-06T00:00:00Z");
        let series = actual_burnup(&sprint(), now, &[], 10.0, 0.5).unwrap();
        assert_eq!(values(&series), vec![-5.0, -5.0]);
    }

    #[test]
    fn ideal_burnup_rises_to_zero() {
        let ideal = ideal_burnup(&sprint(), 10.0, 0.5);
        assert_eq!(values(&ideal), vec![-5.0, 0.0]);
    }

    #[test]
    fn projection_extends_the_trend() {
        let zero = Series::from_values(
            "zero_line",
            [(ts("2016-01-04T00:00:00Z"), 0.0), (ts("2016-01-08T00:00:00Z"), 0.0)],
        );
        let actual = Series::from_values(
            "actual_burnup",
            [(ts("2016-01-04T00:00:00Z"), -8.0), (ts("2016-01-06T00:00:00Z"), -6.0)],
        );
        let projected = projected_burnup(&zero, &actual);
        assert!(projected.compressed);
        assert_eq!(projected.points[0].time, ts("2016-01-06T00:00:00Z"));
        assert_eq!(projected.points[1].time, ts("2016-01-08T00:00:00Z"));
        assert_eq!(values(&projected), vec![-6.0, -4.0]);
    }

    #[test]
    fn projection_without_elapsed_time_is_flat() {
        let zero = Series::from_values(
            "zero_line",
            [(ts("2016-01-04T00:00:00Z"), 0.0), (ts("2016-01-08T00:00:00Z"), 0.0)],
        );
        let actual = Series::from_values(
            "actual_burnup",
            [(ts("2016-01-04T00:00:00Z"), -8.0), (ts("2016-01-04T00:00:00Z"), -8.0)],
        );
        assert_eq!(values(&projected_burnup(&zero, &actual)), vec![-8.0, -8.0]);
    }

    #[test]
    fn expected_burndown_only_when_budget_is_underused() {
        let expected = expected_burndown(&sprint(), 40.0, -3.0);
        assert_eq!(values(&expected), vec![40.0, -3.0]);
        assert!(expected_burndown(&sprint(), 40.0, 0.0).is_empty());
        assert!(expected_burndown(&sprint(), 40.0, 2.0).is_empty());
    }
}
