//! Time series produced by the chart engine.

use serde::{Deserialize, Serialize};

use crate::model::TimePoint;
use crate::time::to_numeric_offset;

/// A single (time, value) sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point<V = Option<f64>> {
    pub time: TimePoint,
    pub value: V,
}

impl<V> Point<V> {
    pub fn new(time: TimePoint, value: V) -> Self {
        Self { time, value }
    }

    /// Plotting coordinate of this point.
    pub fn x(&self) -> f64 {
        to_numeric_offset(&self.time)
    }
}

/// An ordered, named sequence of points.
///
/// A `None` value marks a gap in the drawn line, not missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<V = Option<f64>> {
    pub name: String,
    pub points: Vec<Point<V>>,
    /// Set once weekend compression has rewritten the time coordinates.
    #[serde(default)]
    pub compressed: bool,
}

impl<V> Series<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
            compressed: false,
        }
    }

    pub fn push(&mut self, time: TimePoint, value: V) {
        self.points.push(Point::new(time, value));
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point<V>> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point<V>> {
        self.points.last()
    }

    /// Whether the time coordinates never go backwards.
    pub fn is_time_ordered(&self) -> bool {
        self.points.windows(2).all(|w| w[0].time <= w[1].time)
    }
}

impl Series<Option<f64>> {
    /// Build a series from plain numeric samples.
    pub fn from_values(
        name: impl Into<String>,
        values: impl IntoIterator<Item = (TimePoint, f64)>,
    ) -> Self {
        let mut series = Self::new(name);
        for (time, value) in values {
            series.push(time, Some(value));
        }
        series
    }

    /// Value of the first point, ignoring gaps.
    pub fn first_value(&self) -> Option<f64> {
        self.points.iter().find_map(|p| p.value)
    }

    /// Value of the last point, ignoring gaps.
    pub fn last_value(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.value)
    }

    /// Stair-step version of the line: every change is drawn as a horizontal
    /// run followed by a vertical jump. Without `connected`, a gap separates
    /// each run from the next jump.
    pub fn stepped(&self, connected: bool) -> Self {
        let mut out = Self::new(self.name.clone());
        out.compressed = self.compressed;

        let Some(first) = self.points.first() else {
            return out;
        };
        out.points.push(first.clone());
        let mut previous = first.value;

        for point in &self.points[1..] {
            out.push(point.time, previous);
            if !connected {
                out.push(point.time, None);
            }
            out.points.push(point.clone());
            previous = point.value;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> TimePoint {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn sample() -> Series {
        Series::from_values(
            "sample",
            [
                (ts("2016-01-04T00:00:00Z"), 0.0),
                (ts("2016-01-05T00:00:00Z"), 4.0),
                (ts("2016-01-06T00:00:00Z"), 2.0),
            ],
        )
    }

    #[test]
    fn stepped_connected_inserts_horizontal_runs() {
        let stepped = sample().stepped(true);
        let values: Vec<_> = stepped.points.iter().map(|p| p.value).collect();
        assert_eq!(
            values,
            vec![Some(0.0), Some(0.0), Some(4.0), Some(4.0), Some(2.0)]
        );
        assert_eq!(stepped.points[1].time, ts("2016-01-05T00:00:00Z"));
        assert!(stepped.is_time_ordered());
    }

    #[test]
    fn stepped_disconnected_inserts_gaps() {
        let stepped = sample().stepped(false);
        assert_eq!(stepped.len(), 7);
        assert_eq!(stepped.points[2].value, None);
        assert_eq!(stepped.points[5].value, None);
    }

    #[test]
    fn stepped_empty_series_stays_empty() {
        assert!(Series::new("empty").stepped(true).is_empty());
    }

    #[test]
    fn first_and_last_value_skip_gaps() {
        let mut series = Series::new("gappy");
        series.push(ts("2016-01-04T00:00:00Z"), None);
        series.push(ts("2016-01-05T00:00:00Z"), Some(3.0));
        series.push(ts("2016-01-06T00:00:00Z"), Some(1.0));
        series.push(ts("2016-01-07T00:00:00Z"), None);
        assert_eq!(series.first_value(), Some(3.0));
        assert_eq!(series.last_value(), Some(1.0));
    }
}
