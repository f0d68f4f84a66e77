//! Point deltas used to label the chart.

use serde::{Deserialize, Serialize};

use crate::burndown::ideal_burndown_value_at;
use crate::model::TimePoint;
use crate::series::Series;

/// Deltas below this many points are not worth drawing.
pub const MIN_VISIBLE_POINTS: i64 = 2;

/// A vertical arrow between `from` and `to` at `x`, labeled with `points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: TimePoint,
    pub from: f64,
    pub to: f64,
    pub points: i64,
}

impl Annotation {
    pub fn label(&self) -> String {
        format!("{} pts", self.points)
    }
}

/// Whole points between `from` and `to`, rounded half to even.
fn rounded_delta(from: f64, to: f64) -> i64 {
    (from - to).abs().round_ties_even() as i64
}

fn visible(x: TimePoint, from: f64, to: f64) -> Option<Annotation> {
    let points = rounded_delta(from, to);
    (points >= MIN_VISIBLE_POINTS).then_some(Annotation { x, from, to, points })
}

/// How far the projected burnup ends from zero at sprint end.
pub fn budget_overrun(sprint_end: TimePoint, projected_burnup: &Series) -> Option<Annotation> {
    let height = projected_burnup.last_value()?;
    visible(sprint_end, 0.0, height)
}

/// How far the latest actual burndown value is from the ideal line.
pub fn points_behind(ideal_burndown: &Series, actual_burndown: &Series) -> Option<Annotation> {
    let current = actual_burndown.last()?;
    let actual = current.value?;
    let ideal = ideal_burndown_value_at(&current.time, ideal_burndown);
    visible(current.time, ideal, actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> TimePoint {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn ideal() -> Series {
        Series::from_values(
            "ideal_burndown",
            [(ts("2016-01-04T00:00:00Z"), 40.0), (ts("2016-01-12T00:00:00Z"), 0.0)],
        )
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(rounded_delta(2.5, 0.0), 2);
        assert_eq!(rounded_delta(0.0, 3.5), 4);
        assert_eq!(rounded_delta(1.49, 0.0), 1);
    }

    #[test]
    fn small_overruns_are_suppressed() {
        let projected = Series::from_values("projected_burnup", [(ts("2016-01-12T00:00:00Z"), -1.4)]);
        assert!(budget_overrun(ts("2016-01-12T00:00:00Z"), &projected).is_none());
    }

    #[test]
    fn overrun_spans_zero_to_projection() {
        let projected = Series::from_values("projected_burnup", [(ts("2016-01-12T00:00:00Z"), -6.2)]);
        let annotation = budget_overrun(ts("2016-01-12T00:00:00Z"), &projected).unwrap();
        assert_eq!(annotation.from, 0.0);
        assert_eq!(annotation.to, -6.2);
        assert_eq!(annotation.points, 6);
        assert_eq!(annotation.label(), "6 pts");
    }

    #[test]
    fn empty_projection_has_no_overrun() {
        assert!(budget_overrun(ts("2016-01-12T00:00:00Z"), &Series::new("projected_burnup")).is_none());
    }

    #[test]
    fn points_behind_compares_with_ideal_at_last_actual() {
        let actual = Series::from_values(
            "actual_burndown",
            [(ts("2016-01-04T00:00:00Z"), 40.0), (ts("2016-01-08T00:00:00Z"), 30.0)],
        );
        let annotation = points_behind(&ideal(), &actual).unwrap();
        assert_eq!(annotation.x, ts("2016-01-08T00:00:00Z"));
        assert_eq!(annotation.from, 20.0);
        assert_eq!(annotation.to, 30.0);
        assert_eq!(annotation.points, 10);
    }

    #[test]
    fn on_track_burndown_has_no_annotation() {
        let actual = Series::from_values(
            "actual_burndown",
            [(ts("2016-01-04T00:00:00Z"), 40.0), (ts("2016-01-08T00:00:00Z"), 21.0)],
        );
        assert!(points_behind(&ideal(), &actual).is_none());
    }
}
