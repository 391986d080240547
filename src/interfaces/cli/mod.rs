//! CLI interface module
//!
//! Commands run against the store directly, without a running server.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::config::get_config;
use crate::runtime::lifetime::startup::prepare_services;
use commands::{bulk_from_csv, config_generate, create_link, sweep_once};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::SnaplinkError> for CliError {
    fn from(err: crate::errors::SnaplinkError) -> Self {
        match err {
            crate::errors::SnaplinkError::Validation(msg) => CliError::ParseError(msg),
            crate::errors::SnaplinkError::Unavailable(_)
            | crate::errors::SnaplinkError::DatabaseConfig(_) => {
                CliError::StorageError(err.to_string())
            }
            other => CliError::CommandError(other.to_string()),
        }
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Generate doesn't need a store
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force).await;
    }

    let config = get_config();
    let context = prepare_services(&config)
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;
    let services = context.services;

    match cmd {
        Commands::Create {
            url,
            expire,
            password,
            one_time,
            code,
            owner,
        } => {
            create_link(
                &services.links,
                crate::services::CreateLinkRequest {
                    url,
                    expires_at: expire,
                    password,
                    one_time,
                    code,
                    owner,
                },
            )
            .await
        }

        Commands::Bulk { csv_path, output } => {
            bulk_from_csv(&services.bulk, csv_path, output).await
        }

        Commands::Sweep => sweep_once(&services.sweeper).await,

        // 服务器模式与配置生成不走这里
        Commands::Serve | Commands::Config { .. } => Err(CliError::CommandError(
            "Command is not handled by the CLI runner".to_string(),
        )),
    }
}
