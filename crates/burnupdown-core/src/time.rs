//! Time-interval helpers: plotting offsets, weekend detection inside a
//! sprint, and the per-day marks used for axis labels and gridlines.

use chrono::{Datelike, Duration, NaiveTime, Weekday};

use crate::model::{Sprint, TimePoint};
use crate::series::Series;

/// Hour of day at which working-day labels are placed.
pub const LABEL_HOUR: u32 = 12;

/// Hour of day at which working-day gridlines are placed.
pub const GRIDLINE_HOUR: u32 = 0;

/// Seconds since the Unix epoch, for plotting and sort keys only.
pub fn to_numeric_offset(t: &TimePoint) -> f64 {
    t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / 1e9
}

/// A block of non-working time, clipped to the sprint window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: TimePoint,
    pub duration: Duration,
}

impl Interval {
    pub fn new(start: TimePoint, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> TimePoint {
        self.start + self.duration
    }
}

/// Local midnight of the day `t` falls on, in `t`'s own offset.
fn start_of_day(t: TimePoint) -> TimePoint {
    t - (t.time() - NaiveTime::MIN)
}

fn is_weekend(t: &TimePoint) -> bool {
    matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Saturday-to-Monday blocks overlapping the sprint, in chronological order.
///
/// Intervals are clipped to the sprint window, so the first and last may be
/// partial and a zero-length sprint yields a zero-length interval.
pub fn weekends_within(sprint: &Sprint) -> Vec<Interval> {
    let start = sprint.start();
    let end = sprint.end();

    let days_to_week_end = 7 - i64::from(start.weekday().num_days_from_monday());
    let mut end_of_week = start_of_day(start) + Duration::days(days_to_week_end);
    let mut start_of_weekend = end_of_week - Duration::days(2);

    let mut weekends = Vec::new();
    while start_of_weekend < end {
        let from = start.max(start_of_weekend);
        let to = end.min(end_of_week);
        weekends.push(Interval::new(from, (to - from).max(Duration::zero())));

        end_of_week += Duration::weeks(1);
        start_of_weekend = end_of_week - Duration::days(2);
    }
    weekends
}

/// One instant per working day in `[start, end)`, at `at_hour` local time.
///
/// When the sprint starts after `at_hour`, its first day gets no mark.
pub fn working_day_marks(sprint: &Sprint, at_hour: u32) -> Vec<TimePoint> {
    let mut day = start_of_day(sprint.start()) + Duration::hours(i64::from(at_hour));
    if day < sprint.start() {
        day += Duration::days(1);
    }

    let mut marks = Vec::new();
    while day < sprint.end() {
        if !is_weekend(&day) {
            marks.push(day);
        }
        day += Duration::days(1);
    }
    marks
}

/// Weekday abbreviations placed at noon of every working day.
pub fn day_labels(sprint: &Sprint) -> Series<String> {
    let mut labels = Series::new("axis_labels");
    for mark in working_day_marks(sprint, LABEL_HOUR) {
        labels.push(mark, mark.format("%a").to_string());
    }
    labels
}

/// Unlabeled gridlines at midnight of every working day.
pub fn day_lines(sprint: &Sprint) -> Series {
    let mut lines = Series::new("grid_lines");
    for mark in working_day_marks(sprint, GRIDLINE_HOUR) {
        lines.push(mark, None);
    }
    lines
}

/// Flat line at zero spanning the sprint.
pub fn zero_line(sprint: &Sprint) -> Series {
    Series::from_values("zero_line", [(sprint.start(), 0.0), (sprint.end(), 0.0)])
}
