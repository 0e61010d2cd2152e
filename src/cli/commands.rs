//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// HubSpot Singer tap
#[derive(Parser, Debug)]
#[command(name = "tap-hubspot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// State file from a previous run (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Stream catalog (YAML), replaces the built-in catalog
    #[arg(long, global = true)]
    pub catalog_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test connection to the API
    Check,

    /// Discover available streams and print the Singer catalog
    Discover,

    /// Read data from streams
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,

        /// Write the final state to this file
        #[arg(long)]
        state_out: Option<PathBuf>,

        /// Only emit state at the end of each stream
        #[arg(long)]
        no_state_per_page: bool,
    },

    /// List stream names (no API calls)
    Streams,
}

impl Commands {
    /// Stream names selected by `read --streams`
    pub fn selected_streams(streams: Option<&str>) -> Vec<String> {
        streams
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_read() {
        let cli = Cli::try_parse_from([
            "tap-hubspot",
            "--config",
            "config.json",
            "read",
            "--streams",
            "contacts,deals",
            "--state-out",
            "state.json",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("config.json")));
        let Commands::Read {
            streams, state_out, no_state_per_page,
        } = cli.command
        else {
            panic!("expected read");
        };
        assert_eq!(
            Commands::selected_streams(streams.as_deref()),
            vec!["contacts".to_string(), "deals".to_string()]
        );
        assert_eq!(state_out, Some(PathBuf::from("state.json")));
        assert!(!no_state_per_page);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tap-hubspot", "discover", "-c", "c.json", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::Discover));
        assert!(cli.verbose);
    }

    #[test]
    fn test_selected_streams_empty() {
        assert!(Commands::selected_streams(None).is_empty());
        assert!(Commands::selected_streams(Some(" , ")).is_empty());
    }
}
