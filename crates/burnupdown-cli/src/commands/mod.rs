pub mod board;
pub mod chart;
pub mod config;
pub mod hours;

use burnupdown_core::Config;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Explicit id, else the remembered one.
pub fn resolve_id(explicit: Option<u64>, remembered: Option<u64>, what: &str) -> Result<u64, String> {
    explicit
        .or(remembered)
        .ok_or_else(|| format!("no {what} given and none remembered; pass --{what}"))
}

pub fn resolve_board(explicit: Option<u64>, config: &Config) -> Result<u64, String> {
    resolve_id(explicit, config.current_board, "board")
}

pub fn resolve_sprint(explicit: Option<u64>, config: &Config) -> Result<u64, String> {
    resolve_id(explicit, config.current_sprint, "sprint")
}
