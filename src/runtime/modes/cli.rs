//! CLI mode

use crate::cli::Commands;
use crate::interfaces::cli::{CliError, run_cli_command};

/// Run one CLI command and report the error in color
pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    run_cli_command(cmd).await.inspect_err(|e| {
        eprintln!("{}", e.format_colored());
    })
}
