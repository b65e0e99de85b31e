use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "nvd-check",
    about = "Check project dependencies against the National Vulnerability Database",
    version
)]
pub struct Cli {
    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, default_value = "pretty", value_name = "FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the classpath named in CONFIG and report known vulnerabilities
    Check {
        /// Configuration document (JSON or TOML); deleted on exit unless --keep-config
        config: PathBuf,

        /// Do not delete the configuration file on exit
        #[arg(long)]
        keep_config: bool,

        /// Only print the summary line
        #[arg(short, long)]
        quiet: bool,
    },

    /// Download or refresh the local vulnerability store
    Update {
        /// Configuration document supplying feed locations and proxy settings
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete the local vulnerability store
    Purge {
        /// Configuration document supplying the data directory
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from(["nvd-check", "check", "nvd.json", "--keep-config", "-q"]);
        match cli.command {
            Commands::Check {
                config,
                keep_config,
                quiet,
            } => {
                assert_eq!(config, PathBuf::from("nvd.json"));
                assert!(keep_config);
                assert!(quiet);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_parse_update_without_config() {
        let cli = Cli::parse_from(["nvd-check", "--log-format", "json", "update"]);
        assert!(matches!(cli.command, Commands::Update { config: None }));
        assert_eq!(cli.log_format.as_str(), "json");
    }

    #[test]
    fn test_parse_purge_with_config() {
        let cli = Cli::parse_from(["nvd-check", "purge", "--config", "nvd.toml"]);
        match cli.command {
            Commands::Purge { config } => assert_eq!(config, Some(PathBuf::from("nvd.toml"))),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_config() {
        assert!(Cli::try_parse_from(["nvd-check", "check"]).is_err());
    }
}
