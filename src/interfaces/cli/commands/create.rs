//! Create link command

use colored::Colorize;

use crate::interfaces::cli::CliError;
use crate::services::{CreateLinkRequest, LinkService};

pub async fn create_link(links: &LinkService, req: CreateLinkRequest) -> Result<(), CliError> {
    let result = links.create_link(req).await?;

    if result.generated_code {
        println!(
            "{} Generated random code: {}",
            "ℹ".bold().blue(),
            result.record.code.magenta()
        );
    }

    if let Some(expires_at) = result.record.expires_at {
        println!(
            "{} Issued short link: {} -> {} (expires: {})",
            "✓".bold().green(),
            result.short_url.cyan(),
            result.record.target.blue().underline(),
            expires_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .yellow()
        );
    } else {
        println!(
            "{} Issued short link: {} -> {}",
            "✓".bold().green(),
            result.short_url.cyan(),
            result.record.target.blue().underline()
        );
    }

    if result.record.one_time_use {
        println!("  {}", "One-time link: resolves once".dimmed());
    }
    if result.record.is_password_protected() {
        println!("  {}", "Password protected".dimmed());
    }

    Ok(())
}
