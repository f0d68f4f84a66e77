use burnupdown_core::Config;
use clap::Subcommand;

use super::{resolve_board, resolve_sprint, CommandResult};

#[derive(Subcommand)]
pub enum HoursAction {
    /// Show availability and burnup budget of a sprint
    Show {
        #[arg(long)]
        board: Option<u64>,
        #[arg(long)]
        sprint: Option<u64>,
    },
    /// Set availability and/or burnup budget of a sprint
    Set {
        #[arg(long)]
        board: Option<u64>,
        #[arg(long)]
        sprint: Option<u64>,
        /// Team availability in hours
        #[arg(long)]
        availability: Option<u32>,
        /// Hours reserved for the burnup track
        #[arg(long)]
        budget: Option<u32>,
    },
}

pub fn run(action: HoursAction) -> CommandResult {
    let mut config = Config::load()?;
    match action {
        HoursAction::Show { board, sprint } => {
            let board = resolve_board(board, &config)?;
            let sprint = resolve_sprint(sprint, &config)?;
            let hours = config.hours(board, sprint);
            println!("{}", serde_json::to_string_pretty(&hours)?);
        }
        HoursAction::Set {
            board,
            sprint,
            availability,
            budget,
        } => {
            let board = resolve_board(board, &config)?;
            let sprint = resolve_sprint(sprint, &config)?;
            if availability.is_none() && budget.is_none() {
                return Err("nothing to set; pass --availability and/or --budget".into());
            }
            if let Some(hours) = availability {
                config.set_availability(board, sprint, hours);
            }
            if let Some(hours) = budget {
                config.set_burnup_budget(board, sprint, hours);
            }
            config.save()?;
            println!("{}", serde_json::to_string_pretty(&config.hours(board, sprint))?);
        }
    }
    Ok(())
}
