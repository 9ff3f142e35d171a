//! Levene test across both groups

use anyhow::{Context as _, Result};
use bidding_ab_core::{Group, LeveneCenter, Metric};
use bidding_ab_stats::{StatisticalAnalyzer, VarianceTest};
use clap::Args;
use comfy_table::Cell;
use serde::Serialize;

use super::InputArgs;
use crate::context::Context;
use crate::output::{assumption_badge, format_test_result, print_field, print_section, TableDisplay};

#[derive(Debug, Args)]
pub struct VarianceArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Center for the absolute deviations (median, mean)
    #[arg(long)]
    pub center: Option<LeveneCenter>,
}

#[derive(Debug, Serialize)]
pub struct VarianceReport {
    pub metric: Metric,
    pub alpha: f64,
    #[serde(flatten)]
    pub test: VarianceTest,
    pub homogeneous: bool,
}

pub fn execute(ctx: &Context, args: VarianceArgs) -> Result<()> {
    let config = ctx.settings(|config| {
        args.input.apply(config);
        if let Some(center) = args.center {
            config.analysis.levene_center = center;
        }
    })?;
    let table = ctx.load_table(&args.input.file, &config.data)?;
    let metric = config.analysis.metric;
    let alpha = config.analysis.alpha;

    let control = table.sample(Group::Control, metric);
    let test = table.sample(Group::Test, metric);
    let result = StatisticalAnalyzer::levene(&[&control, &test], config.analysis.levene_center)
        .context("Levene test failed")?;

    ctx.output.write(&VarianceReport {
        metric,
        alpha,
        homogeneous: result.is_homogeneous(alpha),
        test: result,
    })
}

impl TableDisplay for VarianceReport {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.metric),
            Cell::new(self.test.center),
            Cell::new(format!("{:.4}", self.test.statistic)),
            Cell::new(format!("{:.4}", self.test.p_value)),
            Cell::new(self.homogeneous),
        ]
    }

    fn display_single(&self) {
        print_section(&format!("Levene test: {} (center = {})", self.metric, self.test.center));
        print_field("H0", "the group variances are equal");
        print_field(
            "Result",
            &format_test_result(self.test.statistic, self.test.p_value),
        );
        print_field(
            "Degrees of freedom",
            &format!("({}, {})", self.test.df_between, self.test.df_within),
        );
        print_field(
            &format!("At alpha = {}", self.alpha),
            &assumption_badge(self.homogeneous, "homogeneous", "heterogeneous"),
        );
    }

    fn display_compact(&self) {
        println!(
            "{}\t{}\t{:.4}\t{:.4}\t{}",
            self.metric,
            self.test.center,
            self.test.statistic,
            self.test.p_value,
            if self.homogeneous { "homogeneous" } else { "heterogeneous" }
        );
    }
}
