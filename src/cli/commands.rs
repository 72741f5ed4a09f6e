//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mautic connector CLI
#[derive(Parser, Debug)]
#[command(name = "mautic-connector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connection configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline connection configuration (JSON)
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test the connection and credentials
    Check,

    /// Run a single operation
    Run {
        /// Resource name, e.g. contact
        #[arg(long)]
        resource: String,

        /// Operation name, e.g. getAll
        #[arg(long)]
        operation: String,

        /// Operation parameters (JSON object)
        #[arg(long)]
        params: Option<String>,

        /// Report failures as records instead of aborting
        #[arg(long)]
        continue_on_fail: bool,
    },

    /// Run a JSON array of operation requests from a file
    Batch {
        /// File holding `[{"resource", "operation", "params"}, ...]`
        #[arg(short, long)]
        input: PathBuf,

        /// Report failures as records instead of aborting
        #[arg(long)]
        continue_on_fail: bool,
    },

    /// List choices for an option picker
    Options {
        /// Which option list to load
        #[arg(value_enum)]
        list: OptionList,
    },

    /// Compile filter conditions into query parameters (offline)
    CompileFilter {
        /// Conditions as JSON
        #[arg(long)]
        json: String,

        /// Key prefix
        #[arg(long, default_value = "where")]
        prefix: String,
    },
}

/// Option lists served by `options`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OptionList {
    Tags,
    Segments,
    Campaigns,
    SegmentEmails,
    CampaignEmails,
    Stages,
    ContactFields,
    CompanyFields,
    Industries,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod commands_tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "mautic-connector",
            "-C",
            "mautic.yaml",
            "run",
            "--resource",
            "contact",
            "--operation",
            "getAll",
            "--params",
            r#"{"limit": 5}"#,
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("mautic.yaml")));
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Run {
                resource,
                operation,
                params,
                continue_on_fail,
            } => {
                assert_eq!(resource, "contact");
                assert_eq!(operation, "getAll");
                assert_eq!(params.as_deref(), Some(r#"{"limit": 5}"#));
                assert!(!continue_on_fail);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_options_and_format() {
        let cli =
            Cli::try_parse_from(["mautic-connector", "options", "segment-emails", "-f", "pretty"])
                .unwrap();
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(matches!(
            cli.command,
            Commands::Options {
                list: OptionList::SegmentEmails
            }
        ));
    }

    #[test]
    fn test_compile_filter_defaults_prefix() {
        let cli = Cli::try_parse_from(["mautic-connector", "compile-filter", "--json", "[]"]).unwrap();
        match cli.command {
            Commands::CompileFilter { prefix, .. } => assert_eq!(prefix, "where"),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
