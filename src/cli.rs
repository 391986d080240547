//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// snaplink - short-link issuance and resolution service
#[derive(Parser)]
#[command(name = "snaplink")]
#[command(version)]
#[command(about = "Short-link issuance and resolution service", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Issue a short link
    Create {
        /// Target URL
        url: String,

        /// Expiration time (RFC3339 or relative like "30d", "1h30m")
        #[arg(long)]
        expire: Option<String>,

        /// Password protection
        #[arg(long)]
        password: Option<String>,

        /// Link resolves only once
        #[arg(long)]
        one_time: bool,

        /// Custom short code
        #[arg(long)]
        code: Option<String>,

        /// Owner tag
        #[arg(long)]
        owner: Option<String>,
    },

    /// Issue links from a CSV file with a `url` column
    Bulk {
        /// Input CSV path
        csv_path: String,

        /// Output CSV path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<String>,
    },

    /// Remove expired and consumed links once
    Sweep,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create() {
        let cli = Cli::parse_from([
            "snaplink",
            "-c",
            "custom.toml",
            "create",
            "https://example.com",
            "--expire",
            "30d",
            "--one-time",
        ]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
        match cli.command {
            Some(Commands::Create {
                url,
                expire,
                one_time,
                password,
                ..
            }) => {
                assert_eq!(url, "https://example.com");
                assert_eq!(expire.as_deref(), Some("30d"));
                assert!(one_time);
                assert!(password.is_none());
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_no_args_means_server() {
        let cli = Cli::parse_from(["snaplink"]);
        assert!(cli.command.is_none());
    }
}
