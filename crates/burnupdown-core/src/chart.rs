//! The refresh pipeline: snapshot in, drawable chart data out.
//!
//! Scope, burndown and burnup series are derived independently from the same
//! snapshot, every series is then weekend-compressed exactly once, and only
//! after that are the projection and the annotations computed, since both
//! depend on working-time distances.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::annotate::{budget_overrun, points_behind, Annotation};
use crate::burndown::{
    actual_burndown, ideal_burndown, initial_scope_hours, scope_change_series, scope_line,
};
use crate::burnup::{actual_burnup, expected_burndown, ideal_burnup, projected_burnup};
use crate::compression::compress_weekends;
use crate::error::ChartError;
use crate::model::{SprintHours, SprintSnapshot, TimePoint};
use crate::scope::build_scope_timeline;
use crate::series::Series;
use crate::time::{day_labels, day_lines, weekends_within, zero_line};

/// Visible plot area on the compressed axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRect {
    pub x_min: TimePoint,
    pub x_max: TimePoint,
    pub y_min: f64,
    pub y_max: f64,
}

/// Everything the renderer needs, all on one compressed time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub zero_line: Series,
    /// Running scope added/removed since sprint start
    pub scope_change: Series,
    pub ideal_burndown: Series,
    pub actual_burndown: Series,
    pub ideal_burnup: Series,
    pub actual_burnup: Series,
    pub projected_burnup: Series,
    pub expected_burndown: Series,
    pub grid_lines: Series,
    pub axis_labels: Series<String>,
    /// Hours committed at sprint start
    pub initial_scope: f64,
    /// Hours committed at sprint end
    pub final_scope: f64,
    pub points_per_hour: f64,
    pub budget_overrun: Option<Annotation>,
    pub points_behind: Option<Annotation>,
    pub view: ViewRect,
}

impl ChartData {
    /// The scope-change line in the stair-step form it is drawn in.
    pub fn scope_steps(&self) -> Series {
        scope_line(&self.scope_change).stepped(true)
    }
}

/// Run the whole pipeline for one refresh.
pub fn compute_chart(snapshot: &SprintSnapshot, hours: SprintHours) -> Result<ChartData, ChartError> {
    let sprint = &snapshot.sprint;
    sprint.validate()?;
    sprint.check_offset(&snapshot.now)?;
    tracing::info!(start = %sprint.start(), end = %sprint.end(), "computing sprint chart");

    let weekends = weekends_within(sprint);

    let mut zero = zero_line(sprint);
    let mut axis_labels = day_labels(sprint);
    let mut grid_lines = day_lines(sprint);

    let timeline = build_scope_timeline(sprint, &snapshot.scope_log)?;
    let initial_scope = initial_scope_hours(&timeline.initial_scope, &snapshot.effort)?;
    let mut scope_change = scope_change_series(sprint, &timeline.scope_changes, &snapshot.effort)?;
    let final_scope = initial_scope + scope_change.last_value().unwrap_or(0.0);
    tracing::info!(initial_scope, final_scope, "sprint scope");

    let mut ideal_bd = ideal_burndown(sprint, final_scope);
    let mut actual_bd = actual_burndown(sprint, snapshot.now, final_scope, &snapshot.issues)?;

    let points_per_hour = hours.points_per_hour(initial_scope);
    let budget = f64::from(hours.burnup_budget);
    tracing::info!(points_per_hour, burnup_budget = budget, "burnup scale");

    let mut actual_bu = actual_burnup(sprint, snapshot.now, &snapshot.worklogs, budget, points_per_hour)?;
    let mut ideal_bu = ideal_burnup(sprint, budget, points_per_hour);

    for series in [
        &mut zero,
        &mut scope_change,
        &mut ideal_bd,
        &mut actual_bd,
        &mut grid_lines,
        &mut actual_bu,
        &mut ideal_bu,
    ] {
        compress_weekends(series, &weekends)?;
    }
    compress_weekends(&mut axis_labels, &weekends)?;

    let projected_bu = projected_burnup(&zero, &actual_bu);
    let projected_height = projected_bu.last_value().unwrap_or(0.0);
    let mut expected_bd = expected_burndown(sprint, final_scope, projected_height);
    compress_weekends(&mut expected_bd, &weekends)?;

    let x_min = zero.first().map_or(sprint.start(), |p| p.time);
    let x_max = zero.last().map_or(sprint.end(), |p| p.time);

    let budget_overrun = budget_overrun(x_max, &projected_bu);
    let points_behind = points_behind(&ideal_bd, &actual_bd);

    let view = ViewRect {
        x_min,
        x_max: x_max + Duration::days(1),
        y_min: -budget * points_per_hour * 1.1,
        y_max: final_scope * 1.05,
    };

    Ok(ChartData {
        zero_line: zero,
        scope_change,
        ideal_burndown: ideal_bd,
        actual_burndown: actual_bd,
        ideal_burnup: ideal_bu,
        actual_burnup: actual_bu,
        projected_burnup: projected_bu,
        expected_burndown: expected_bd,
        grid_lines,
        axis_labels,
        initial_scope,
        final_scope,
        points_per_hour,
        budget_overrun,
        points_behind,
        view,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeBucket, ChangeRecord, EffortMap, Sprint};
    use chrono::DateTime;

    fn ts(s: &str) -> TimePoint {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn empty_snapshot() -> SprintSnapshot {
        SprintSnapshot {
            sprint: Sprint::new(ts("2016-01-04T00:00:00Z"), ts("2016-01-15T00:00:00Z")).unwrap(),
            now: ts("2016-01-07T00:00:00Z"),
            scope_log: Vec::new(),
            issues: Vec::new(),
            effort: EffortMap::new(),
            worklogs: Vec::new(),
        }
    }

    #[test]
    fn every_output_series_is_compressed() {
        let chart = compute_chart(&empty_snapshot(), SprintHours::new(80, 10)).unwrap();
        for series in [
            &chart.zero_line,
            &chart.scope_change,
            &chart.ideal_burndown,
            &chart.actual_burndown,
            &chart.ideal_burnup,
            &chart.actual_burnup,
            &chart.projected_burnup,
            &chart.expected_burndown,
            &chart.grid_lines,
        ] {
            assert!(series.compressed, "{} not compressed", series.name);
        }
        assert!(chart.axis_labels.compressed);
    }

    #[test]
    fn view_spans_compressed_sprint_plus_a_day() {
        let chart = compute_chart(&empty_snapshot(), SprintHours::new(0, 0)).unwrap();
        assert_eq!(chart.view.x_min, ts("2016-01-04T00:00:00Z"));
        // Eleven calendar days minus one weekend, plus one day of margin.
        assert_eq!(chart.view.x_max, ts("2016-01-14T00:00:00Z"));
    }

    #[test]
    fn now_in_another_offset_is_rejected() {
        let mut snapshot = empty_snapshot();
        snapshot.now = ts("2016-01-07T00:00:00+02:00");
        assert!(matches!(
            compute_chart(&snapshot, SprintHours::default()),
            Err(ChartError::TimezoneMismatch { .. })
        ));
    }

    #[test]
    fn missing_effort_aborts_the_refresh() {
        let mut snapshot = empty_snapshot();
        snapshot.scope_log = vec![ChangeBucket {
            timestamp: ts("2016-01-03T00:00:00Z"),
            changes: vec![ChangeRecord::added("A-1")],
        }];
        assert_eq!(
            compute_chart(&snapshot, SprintHours::default()).unwrap_err(),
            ChartError::MissingEffort("A-1".into())
        );
    }

    #[test]
    fn scope_steps_end_at_zero() {
        let mut snapshot = empty_snapshot();
        snapshot.scope_log = vec![ChangeBucket {
            timestamp: ts("2016-01-05T00:00:00Z"),
            changes: vec![ChangeRecord::added("A-1")],
        }];
        snapshot.effort.insert("A-1", 4 * 3600);
        let chart = compute_chart(&snapshot, SprintHours::default()).unwrap();
        assert_eq!(chart.final_scope, 4.0);
        let steps = chart.scope_steps();
        assert_eq!(steps.first_value(), Some(4.0));
        assert_eq!(steps.last_value(), Some(0.0));
    }
}
