use std::path::PathBuf;

use burnupdown_core::{compute_chart, fetch_snapshot, Config, SprintHours, SprintSnapshot, TrackerClient};
use chrono::DateTime;
use clap::Args;

use super::{resolve_board, resolve_sprint, CommandResult};

#[derive(Args)]
pub struct ChartArgs {
    /// Board id (defaults to the current board)
    #[arg(long)]
    board: Option<u64>,
    /// Sprint id (defaults to the current sprint)
    #[arg(long)]
    sprint: Option<u64>,
    /// Kanban board with the support issues (defaults to the configured one)
    #[arg(long)]
    support_board: Option<u64>,
    /// Read the sprint from a saved snapshot instead of the tracker
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
    /// Write the fetched snapshot to a file
    #[arg(long, value_name = "FILE")]
    save_snapshot: Option<PathBuf>,
    /// Override "now" (RFC 3339)
    #[arg(long, value_name = "TIME")]
    now: Option<String>,
}

pub async fn run(args: ChartArgs, password: &str) -> CommandResult {
    let mut config = Config::load()?;

    let (mut snapshot, ids) = match &args.snapshot {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let snapshot: SprintSnapshot = serde_json::from_str(&content)?;
            let board = args.board.or(config.current_board);
            let sprint = args.sprint.or(config.current_sprint);
            (snapshot, board.zip(sprint))
        }
        None => {
            let board = resolve_board(args.board, &config)?;
            let sprint = resolve_sprint(args.sprint, &config)?;
            let support_board = args.support_board.or(config.support_board);
            let tracker = TrackerClient::from_config(&config, password)?;
            let snapshot = fetch_snapshot(&tracker, board, sprint, support_board).await?;
            (snapshot, Some((board, sprint)))
        }
    };

    if let Some(path) = &args.save_snapshot {
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        tracing::info!(path = %path.display(), "snapshot saved");
    }

    if let Some(now) = &args.now {
        let now = DateTime::parse_from_rfc3339(now)?;
        snapshot.now = now.with_timezone(&snapshot.sprint.offset());
    }

    let hours = match ids {
        Some((board, sprint)) => config.hours(board, sprint),
        None => {
            tracing::warn!("no board/sprint known for snapshot, using zero hours");
            SprintHours::default()
        }
    };

    let chart = compute_chart(&snapshot, hours)?;
    println!("{}", serde_json::to_string_pretty(&chart)?);

    if args.snapshot.is_none() {
        if let Some((board, sprint)) = ids {
            config.current_board = Some(board);
            config.current_sprint = Some(sprint);
            if args.support_board.is_some() {
                config.support_board = args.support_board;
            }
            config.save()?;
        }
    }
    Ok(())
}
