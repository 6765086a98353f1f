//! CLI module for ticketboard
//!
//! # Commands
//!
//! - `fetch` - Refresh dashboard metrics once and print them
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Fetch N1/N2 metrics for January as JSON
//! ticketboard fetch --from 2024-01-01 --to 2024-01-31 --level N1 --level N2 --json
//!
//! # Generate shell completions
//! ticketboard completions bash > ~/.bash_completion.d/ticketboard
//! ```

pub mod completions;
pub mod config;
pub mod fetch;
pub mod output;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use fetch::run_fetch;

use crate::store::{Filters, TicketStatus};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ticketboard - GLPI ticket metrics dashboard
#[derive(Parser, Debug)]
#[command(
    name = "ticketboard",
    version,
    about = "Ticket metrics dashboard for GLPI helpdesks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch dashboard metrics
    Fetch(FetchArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "ticketboard.toml")]
    pub config: PathBuf,

    /// Override API base URL
    #[arg(short = 'u', long, env = "TICKETBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "TICKETBOARD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TICKETBOARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable the response cache
    #[arg(long)]
    pub no_cache: bool,

    /// Override the number of retries per request
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Only tickets opened on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only tickets opened on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Support level to include (repeatable, e.g. N1)
    #[arg(long = "level")]
    pub levels: Vec<String>,

    /// Ticket status to include (repeatable: new, in_progress, pending, resolved, closed)
    #[arg(long = "status")]
    pub statuses: Vec<TicketStatus>,

    /// Only tickets assigned to this technician id
    #[arg(long)]
    pub technician: Option<u64>,

    /// Number of consecutive refreshes (later ones may be served from cache)
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// Also print request statistics
    #[arg(long)]
    pub stats: bool,

    /// Also print Prometheus metrics
    #[arg(long)]
    pub metrics: bool,
}

impl FetchArgs {
    pub fn filters(&self) -> Filters {
        Filters {
            start_date: self.from,
            end_date: self.to,
            levels: self.levels.clone(),
            statuses: self.statuses.clone(),
            technician: self.technician,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "ticketboard.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_fetch_defaults() {
        let cli = Cli::try_parse_from(["ticketboard", "fetch"]).unwrap();
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.config, PathBuf::from("ticketboard.toml"));
                assert_eq!(args.repeat, 1);
                assert!(!args.json);
                assert!(!args.no_cache);
                assert!(args.filters().is_empty());
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_parse_fetch_filters() {
        let cli = Cli::try_parse_from([
            "ticketboard",
            "fetch",
            "--from",
            "2024-01-01",
            "--level",
            "N1",
            "--level",
            "N2",
            "--status",
            "in_progress",
            "--technician",
            "9",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch(args) => {
                let filters = args.filters();
                assert_eq!(filters.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert!(filters.end_date.is_none());
                assert_eq!(filters.levels, vec!["N1", "N2"]);
                assert_eq!(filters.statuses, vec![TicketStatus::InProgress]);
                assert_eq!(filters.technician, Some(9));
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["ticketboard", "fetch", "--from", "yesterday"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli = Cli::try_parse_from(["ticketboard", "config", "init", "-o", "x.toml"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert_eq!(args.output, PathBuf::from("x.toml"));
                assert!(!args.force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
