use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "burnupdown", version, about = "Sprint burndown/burnup charts from your issue tracker")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Tracker password (falls back to BURNUPDOWN_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List scrum boards
    Boards {
        /// List kanban boards instead, to pick a support board
        #[arg(long)]
        kanban: bool,
    },
    /// List sprints of a board
    Sprints {
        /// Board id (defaults to the current board)
        #[arg(long)]
        board: Option<u64>,
    },
    /// Availability and burnup budget per sprint
    Hours {
        #[command(subcommand)]
        action: commands::hours::HoursAction,
    },
    /// Compute chart data for a sprint and print it as JSON
    Chart(commands::chart::ChartArgs),
}

fn init_logging(verbose: u8) {
    // Logs go to stderr so JSON on stdout stays clean for piping.
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,burnupdown_core={level},burnupdown={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let password = cli
        .password
        .or_else(|| std::env::var("BURNUPDOWN_PASSWORD").ok())
        .unwrap_or_default();

    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Boards { kanban } => commands::board::run_boards(kanban, &password).await,
        Commands::Sprints { board } => commands::board::run_sprints(board, &password).await,
        Commands::Hours { action } => commands::hours::run(action),
        Commands::Chart(args) => commands::chart::run(args, &password).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
