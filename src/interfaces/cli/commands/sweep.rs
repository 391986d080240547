use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::Sweeper;

pub async fn sweep_once(sweeper: &Sweeper) -> Result<(), CliError> {
    let removed = sweeper.run_once().await?;
    println!(
        "{} Sweep removed {} link(s)",
        "✓".bold().green(),
        removed.to_string().cyan()
    );
    Ok(())
}
