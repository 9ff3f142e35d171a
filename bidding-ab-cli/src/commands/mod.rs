//! Command implementations

pub mod analyze;
pub mod compare;
pub mod config;
pub mod describe;
pub mod normality;
pub mod variance;

use bidding_ab_core::{AnalysisConfig, Metric};
use clap::Args;
use std::path::PathBuf;

/// Input file plus the overrides every analysis command accepts
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Workbook (.xlsx, .xlsm, .xls, .xlsb, .ods) with one sheet per group, or a merged .csv
    pub file: PathBuf,

    /// Metric to analyze (impression, click, purchase, earning, ctr, conversion_rate)
    #[arg(short, long)]
    pub metric: Option<Metric>,

    /// Significance level
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Sheet holding the control group (maximum bidding)
    #[arg(long)]
    pub control_sheet: Option<String>,

    /// Sheet holding the test group (average bidding)
    #[arg(long)]
    pub test_sheet: Option<String>,
}

impl InputArgs {
    /// Applies the flags that were given on top of the loaded configuration
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(metric) = self.metric {
            config.analysis.metric = metric;
        }
        if let Some(alpha) = self.alpha {
            config.analysis.alpha = alpha;
        }
        if let Some(sheet) = &self.control_sheet {
            config.data.control_sheet = sheet.clone();
        }
        if let Some(sheet) = &self.test_sheet {
            config.data.test_sheet = sheet.clone();
        }
    }
}
