use burnupdown_core::{Config, Tracker, TrackerClient};

use super::{resolve_board, CommandResult};

pub async fn run_boards(kanban: bool, password: &str) -> CommandResult {
    let config = Config::load()?;
    let tracker = TrackerClient::from_config(&config, password)?;
    let boards = if kanban {
        tracker.kanban_boards().await?
    } else {
        tracker.scrum_boards().await?
    };
    println!("{}", serde_json::to_string_pretty(&boards)?);
    Ok(())
}

pub async fn run_sprints(board: Option<u64>, password: &str) -> CommandResult {
    let mut config = Config::load()?;
    let board = resolve_board(board, &config)?;
    let tracker = TrackerClient::from_config(&config, password)?;
    let sprints = tracker.sprints(board).await?;
    println!("{}", serde_json::to_string_pretty(&sprints)?);

    config.current_board = Some(board);
    config.save()?;
    Ok(())
}
