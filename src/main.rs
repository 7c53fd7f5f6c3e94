use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use boardsync::config::SyncConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "boardsync")]
#[command(version, about = "Kanban board ordering and live sync client")]
pub struct Cli {
    /// Debug-level logging for boardsync
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// API base URL. Overrides boardsync.toml and BOARDSYNC_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token. Overrides boardsync.toml and BOARDSYNC_TOKEN.
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a board's columns and tasks in order
    Show {
        board: i64,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Follow a board live until interrupted
    Watch {
        board: i64,
        /// Join the workspace channel instead of the board channel
        #[arg(long)]
        workspace: Option<i64>,
    },
    /// Move a task to a column and zero-based index
    MoveTask {
        task: i64,
        #[arg(long)]
        board: i64,
        #[arg(long)]
        column: i64,
        #[arg(long)]
        index: usize,
    },
    /// Move a column to a zero-based index
    ReorderColumn {
        column: i64,
        #[arg(long)]
        board: i64,
        #[arg(long)]
        index: usize,
    },
    /// View, validate or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default boardsync.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = SyncConfig::load(&project_dir)?.with_cli_args(cli.api_url.clone(), cli.token.clone());
    let filter = if cli.verbose {
        Some("boardsync=debug")
    } else {
        config.toml.logging.filter.as_deref()
    };
    boardsync::telemetry::init(filter, cli.log_json || config.toml.logging.json)?;

    match &cli.command {
        Commands::Show { board, json } => cmd::cmd_show(&config, *board, *json).await?,
        Commands::Watch { board, workspace } => cmd::cmd_watch(&config, *board, *workspace).await?,
        Commands::MoveTask {
            task,
            board,
            column,
            index,
        } => cmd::cmd_move_task(&config, *board, *task, *column, *index).await?,
        Commands::ReorderColumn {
            column,
            board,
            index,
        } => cmd::cmd_reorder_column(&config, *board, *column, *index).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
