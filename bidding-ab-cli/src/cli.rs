//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::analyze::AnalyzeArgs;
use crate::commands::compare::CompareArgs;
use crate::commands::config::ConfigCommands;
use crate::commands::variance::VarianceArgs;
use crate::commands::InputArgs;
use crate::output::OutputFormat;

/// A/B test of maximum bidding (control) against average bidding (test)
#[derive(Debug, Parser)]
#[command(name = "bidding-ab", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file layered over the user and working-directory files
    #[arg(long, global = true, env = "BIDDING_AB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: assumption checks, test selection, comparison
    Analyze(AnalyzeArgs),

    /// Summarize each group: shape, missing values, quantiles, outliers
    Describe(InputArgs),

    /// Shapiro-Wilk normality test per group
    Normality(InputArgs),

    /// Levene test for homogeneity of variances
    Variance(VarianceArgs),

    /// Run one comparison test directly
    Compare(CompareArgs),

    /// Configuration management
    Config(ConfigCommands),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidding_ab_core::Metric;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::parse_from([
            "bidding-ab",
            "analyze",
            "ab_testing.xlsx",
            "--metric",
            "earning",
            "--alpha",
            "0.01",
            "--cap-outliers",
            "-o",
            "json",
        ]);

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.input.metric, Some(Metric::Earning));
                assert_eq!(args.input.alpha, Some(0.01));
                assert!(args.cap_outliers);
                assert!(!args.all_metrics);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_metric() {
        let result = Cli::try_parse_from(["bidding-ab", "normality", "ab.xlsx", "--metric", "revenue"]);
        assert!(result.is_err());
    }
}
