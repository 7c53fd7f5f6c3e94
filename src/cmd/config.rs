//! Configuration view and validation commands (`boardsync config`).

use anyhow::{Context, Result};
use boardsync::config::{SyncConfig, SyncToml};

use super::super::ConfigCommands;

pub fn cmd_config(config: &SyncConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = SyncConfig::project_file(&config.project_dir);

    match command {
        None | Some(ConfigCommands::Show) => {
            match &config.source {
                Some(path) => println!("# Config file: {}", path.display()),
                None => println!("# No boardsync.toml found, using defaults"),
            }
            println!("# Effective values (with env/CLI overrides)");
            println!();
            let rendered =
                toml::to_string_pretty(&config.effective()).context("Failed to render configuration")?;
            print!("{rendered}");
        }
        Some(ConfigCommands::Validate) => {
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("boardsync.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }
            SyncToml::default().save(&config_path)?;
            println!("Created boardsync.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] url, token, timeout_secs");
            println!("  - [realtime] url, reconnect backoff, keepalive");
            println!("  - [logging] filter, json");
        }
    }

    Ok(())
}
