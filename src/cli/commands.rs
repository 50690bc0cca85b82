use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// How the simulation report is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Invalid format: {s}. Valid options: text, json")),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "exchange-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "simulate",
        about = "Run an exchange against simulated miners and print a report"
    )]
    Simulate {
        #[arg(long, help = "TOML settings file (defaults to $EXCHANGE_CONFIG)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Number of investors to register")]
        investors: Option<usize>,
        #[arg(long, help = "Number of miners producing blocks")]
        miners: Option<usize>,
        #[arg(long, help = "How long to run, in seconds")]
        seconds: Option<u64>,
        #[arg(long, help = "Seed for reproducible runs")]
        seed: Option<u64>,
        #[arg(long, default_value_t = ReportFormat::Text, help = "Report format (text, json)")]
        format: ReportFormat,
    },
    #[command(name = "show-config", about = "Print the effective settings as TOML")]
    ShowConfig {
        #[arg(long, help = "TOML settings file (defaults to $EXCHANGE_CONFIG)")]
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate_overrides() {
        let opt = Opt::try_parse_from([
            "exchange-chain",
            "simulate",
            "--investors",
            "8",
            "--seed",
            "42",
            "--format",
            "json",
        ])
        .unwrap();

        match opt.command {
            Command::Simulate {
                investors,
                seed,
                miners,
                format,
                ..
            } => {
                assert_eq!(investors, Some(8));
                assert_eq!(seed, Some(42));
                assert_eq!(miners, None);
                assert_eq!(format, ReportFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = Opt::try_parse_from(["exchange-chain", "simulate", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_show_config() {
        let opt =
            Opt::try_parse_from(["exchange-chain", "show-config", "--config", "a.toml"]).unwrap();
        assert!(matches!(
            opt.command,
            Command::ShowConfig { config: Some(ref path) } if path == &PathBuf::from("a.toml")
        ));
    }
}
