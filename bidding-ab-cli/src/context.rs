//! CLI execution context

use anyhow::{Context as _, Result};
use bidding_ab_core::{AnalysisConfig, DataSettings, ExperimentTable, Group};
use bidding_ab_storage::open_source;
use std::path::Path;

use crate::cli::Cli;
use crate::config::ConfigPaths;
use crate::output::OutputWriter;

/// Execution context for CLI commands
pub struct Context {
    /// Configuration after files and environment, before command flags
    pub config: AnalysisConfig,

    /// Where the configuration was looked up
    pub paths: ConfigPaths,

    /// Output writer
    pub output: OutputWriter,
}

impl Context {
    /// Create a new context from CLI arguments and the loaded configuration
    pub fn new(cli: &Cli, paths: ConfigPaths, config: AnalysisConfig) -> Self {
        Self {
            config,
            paths,
            output: OutputWriter::new(cli.output, cli.no_color),
        }
    }

    /// Configuration with command flags applied, validated
    pub fn settings<F>(&self, overrides: F) -> Result<AnalysisConfig>
    where
        F: FnOnce(&mut AnalysisConfig),
    {
        let mut config = self.config.clone();
        overrides(&mut config);
        config.validated().context("Invalid configuration")
    }

    /// Opens the input by extension and loads both groups
    pub fn load_table(&self, path: &Path, data: &DataSettings) -> Result<ExperimentTable> {
        let source = open_source(path, data)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        tracing::info!(source = %source.describe(), "Loading samples");

        let table = source
            .load()
            .with_context(|| format!("Failed to load {}", source.describe()))?;

        for group in Group::ALL {
            if let Some(stats) = table.load_stats(group) {
                if stats.rows_dropped > 0 {
                    self.output.warning(&format!(
                        "{} group: dropped {} row(s) with missing values",
                        group, stats.rows_dropped
                    ));
                }
            }
        }

        Ok(table)
    }
}
