//! Weekend compression.
//!
//! Rewrites the time coordinate of a series so that every weekend collapses
//! to zero width. Points keep their order; points inside a weekend are pinned
//! to where that weekend starts on the compressed axis.
//!
//! Compression mutates the series it is given and hands the same series back.
//! A compressed series is flagged, and compressing it again is an error: the
//! offsets would otherwise be subtracted twice.
//!
//! Boundary ties: a point exactly at a weekend's start is left where it is
//! (minus earlier weekends); a point exactly at a weekend's end is pinned to
//! the weekend's start. Both land on the same compressed coordinate, so the
//! tie-break never changes the drawn line.

use chrono::Duration;

use crate::error::ChartError;
use crate::series::Series;
use crate::time::Interval;

/// Compress `series` in place against the sprint's ordered `weekends`.
pub fn compress_weekends<'a, V>(
    series: &'a mut Series<V>,
    weekends: &[Interval],
) -> Result<&'a mut Series<V>, ChartError> {
    if series.compressed {
        return Err(ChartError::AlreadyCompressed {
            series: series.name.clone(),
        });
    }

    let mut offset = Duration::zero();
    let mut i = 0;
    let mut j = 0;

    while i < series.points.len() {
        let time = series.points[i].time;
        match weekends.get(j) {
            Some(weekend) if time > weekend.start => {
                if time > weekend.end() {
                    offset += weekend.duration;
                    j += 1;
                } else {
                    series.points[i].time = weekend.start - offset;
                    i += 1;
                }
            }
            _ => {
                series.points[i].time = time - offset;
                i += 1;
            }
        }
    }

    series.compressed = true;
    Ok(series)
}

/// Total non-working time removed by compression.
pub fn total_weekend_duration(weekends: &[Interval]) -> Duration {
    weekends
        .iter()
        .fold(Duration::zero(), |acc, w| acc + w.duration)
}
