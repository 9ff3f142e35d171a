//! One comparison test chosen by the user

use anyhow::{Context as _, Result};
use bidding_ab_core::{Group, Metric};
use bidding_ab_stats::{run_comparison, Aggregator, ComparisonKind, ComparisonTest, Decision};
use clap::{Args, ValueEnum};
use comfy_table::Cell;
use serde::Serialize;

use super::InputArgs;
use crate::context::Context;
use crate::output::{decision_badge, format_test_result, format_value, print_field, print_section, TableDisplay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestChoice {
    /// Independent two-sample t-test with pooled variance
    Student,
    /// Welch's t-test (unequal variances)
    Welch,
    /// Mann-Whitney U rank test
    MannWhitney,
}

impl From<TestChoice> for ComparisonKind {
    fn from(choice: TestChoice) -> Self {
        match choice {
            TestChoice::Student => ComparisonKind::StudentT,
            TestChoice::Welch => ComparisonKind::WelchT,
            TestChoice::MannWhitney => ComparisonKind::MannWhitneyU,
        }
    }
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Test to run regardless of the assumption checks
    #[arg(long = "test", value_enum)]
    pub test: TestChoice,
}

#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub metric: Metric,
    pub alpha: f64,
    pub control_mean: f64,
    pub test_mean: f64,
    #[serde(flatten)]
    pub comparison: ComparisonTest,
    pub decision: Decision,
}

pub fn execute(ctx: &Context, args: CompareArgs) -> Result<()> {
    let config = ctx.settings(|config| args.input.apply(config))?;
    let table = ctx.load_table(&args.input.file, &config.data)?;
    let metric = config.analysis.metric;
    let alpha = config.analysis.alpha;

    let control = table.sample(Group::Control, metric);
    let test = table.sample(Group::Test, metric);
    let kind = ComparisonKind::from(args.test);
    let comparison = run_comparison(kind, &control, &test)
        .with_context(|| format!("{} failed", kind))?;

    ctx.output.write(&CompareReport {
        metric,
        alpha,
        control_mean: Aggregator::mean(&control),
        test_mean: Aggregator::mean(&test),
        decision: Decision::from_comparison(&comparison, alpha),
        comparison,
    })
}

impl TableDisplay for CompareReport {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.metric),
            Cell::new(self.comparison.kind),
            Cell::new(format!("{:.4}", self.comparison.statistic)),
            Cell::new(format!("{:.4}", self.comparison.p_value)),
            Cell::new(self.decision),
        ]
    }

    fn display_single(&self) {
        print_section(&format!("{}: {}", self.comparison.kind, self.metric));
        print_field("Control mean", &format_value(self.control_mean));
        print_field("Test mean", &format_value(self.test_mean));
        print_field(
            "Result",
            &format_test_result(self.comparison.statistic, self.comparison.p_value),
        );
        if let Some(df) = self.comparison.df {
            print_field("Degrees of freedom", &format!("{:.2}", df));
        }
        print_field(
            &format!("At alpha = {}", self.alpha),
            &decision_badge(self.decision == Decision::RejectNull, &self.decision.to_string()),
        );
    }

    fn display_compact(&self) {
        println!(
            "{}\t{}\t{:.4}\t{:.4}\t{}",
            self.metric,
            self.comparison.kind,
            self.comparison.statistic,
            self.comparison.p_value,
            self.decision
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_maps_to_kind() {
        assert_eq!(ComparisonKind::from(TestChoice::Student), ComparisonKind::StudentT);
        assert_eq!(ComparisonKind::from(TestChoice::Welch), ComparisonKind::WelchT);
        assert_eq!(
            ComparisonKind::from(TestChoice::MannWhitney),
            ComparisonKind::MannWhitneyU
        );
        assert_eq!(
            TestChoice::from_str("mann-whitney", true).unwrap(),
            TestChoice::MannWhitney
        );
    }
}
