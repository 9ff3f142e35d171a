//! bidding-ab: A/B test of two ad bidding strategies

use anyhow::Result;
use bidding_ab_core::LogFormat;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;
mod context;
mod output;

use crate::cli::{Cli, Commands};
use crate::config::ConfigPaths;
use crate::context::Context;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = ConfigPaths::discover(cli.config.as_deref());
    let config = paths.load()?;

    init_tracing(cli.verbose, config.logging.format);
    tracing::debug!(layers = ?paths.layers(), "Configuration sources");

    let ctx = Context::new(&cli, paths, config);

    match cli.command {
        Commands::Analyze(args) => commands::analyze::execute(&ctx, args),
        Commands::Describe(args) => commands::describe::execute(&ctx, args),
        Commands::Normality(args) => commands::normality::execute(&ctx, args),
        Commands::Variance(args) => commands::variance::execute(&ctx, args),
        Commands::Compare(args) => commands::compare::execute(&ctx, args),
        Commands::Config(cmd) => commands::config::execute(&ctx, cmd),
    }
}

/// Logs go to stderr so that JSON and YAML output stay parseable
fn init_tracing(verbose: bool, format: LogFormat) {
    let default_directive = if verbose { "bidding_ab=debug" } else { "bidding_ab=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
