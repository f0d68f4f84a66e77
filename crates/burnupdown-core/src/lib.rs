//! # Burnupdown Core Library
//!
//! This library provides the core business logic for burnupdown, a sprint
//! burndown/burnup chart generator for issue trackers. It implements a
//! CLI-first philosophy where all operations are available through a thin
//! command-line binary over the same core library.
//!
//! ## Architecture
//!
//! - **Engine**: Pure functions turning one [`SprintSnapshot`] into chart
//!   series: scope timeline, burndown, burnup, weekend compression and
//!   deviation annotations
//! - **Storage**: TOML-based configuration, including per-sprint hours
//! - **Tracker**: Async clients for two tracker API generations, normalizing
//!   payloads into the engine's typed records
//!
//! ## Key Components
//!
//! - [`compute_chart`]: The refresh pipeline
//! - [`Config`]: Application configuration management
//! - [`Tracker`]: Trait over tracker API generations

pub mod annotate;
pub mod burndown;
pub mod burnup;
pub mod chart;
pub mod compression;
pub mod error;
pub mod model;
pub mod scope;
pub mod series;
pub mod storage;
pub mod time;
pub mod tracker;

pub use annotate::Annotation;
pub use chart::{compute_chart, ChartData, ViewRect};
pub use error::{ChartError, ConfigError, CoreError, TrackerError};
pub use model::{
    ChangeBucket, ChangeRecord, EffortMap, Issue, ScopeChangeLog, Sprint, SprintHours,
    SprintSnapshot, TimePoint, WorklogEntry,
};
pub use series::{Point, Series};
pub use storage::{ApiVersion, Config, TrackerConfig};
pub use tracker::{fetch_snapshot, SprintInfo, Tracker, TrackerClient};
