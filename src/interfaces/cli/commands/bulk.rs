//! Bulk issuance from CSV

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use colored::Colorize;
use futures_util::stream::{self, StreamExt};

use crate::interfaces::cli::CliError;
use crate::services::BulkProcessor;
use crate::utils::csv_handler::{BulkCsvWriter, read_bulk_rows};

pub async fn bulk_from_csv(
    bulk: &BulkProcessor,
    csv_path: String,
    output: Option<String>,
) -> Result<(), CliError> {
    let file = File::open(&csv_path)
        .map_err(|e| CliError::CommandError(format!("Failed to open {}: {}", csv_path, e)))?;
    let rows = read_bulk_rows(BufReader::new(file))?;

    let sink: Box<dyn Write> = match output.as_deref() {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            CliError::CommandError(format!("Failed to create {}: {}", path, e))
        })?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BulkCsvWriter::new(sink);

    let mut issued = 0usize;
    let mut failed = 0usize;
    let mut outcomes = std::pin::pin!(bulk.process_decoded(stream::iter(rows)));
    while let Some(outcome) = outcomes.next().await {
        if outcome.is_issued() {
            issued += 1;
        } else {
            failed += 1;
        }
        writer.write(&outcome)?;
    }
    writer.finish()?;

    eprintln!(
        "{} Bulk issuance finished: {} issued, {} failed",
        if failed == 0 {
            "✓".bold().green()
        } else {
            "!".bold().yellow()
        },
        issued.to_string().green(),
        failed.to_string().red()
    );
    if let Some(path) = output {
        eprintln!("  {} {}", "Results written to".dimmed(), path.blue());
    }

    Ok(())
}
