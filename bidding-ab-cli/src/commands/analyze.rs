//! Full A/B pipeline

use anyhow::{Context as _, Result};
use bidding_ab_stats::{AbTestAnalysis, AbTestReport};
use clap::Args;
use comfy_table::Cell;

use super::InputArgs;
use crate::context::Context;
use crate::output::{
    assumption_badge, decision_badge, format_test_result, format_timestamp, format_value,
    print_field, print_section, styled_table, TableDisplay,
};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Run the comparison for every base metric
    #[arg(long, conflicts_with = "metric")]
    pub all_metrics: bool,

    /// Cap each group's values at its outlier thresholds before testing
    #[arg(long)]
    pub cap_outliers: bool,

    /// Bootstrap resamples for a confidence interval of the mean difference
    #[arg(long, value_name = "N")]
    pub bootstrap: Option<usize>,

    /// Seed for the bootstrap resampling
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn execute(ctx: &Context, args: AnalyzeArgs) -> Result<()> {
    let config = ctx.settings(|config| {
        args.input.apply(config);
        if args.cap_outliers {
            config.outliers.cap = true;
        }
        if let Some(iterations) = args.bootstrap {
            config.analysis.bootstrap_iterations = iterations;
        }
        if args.seed.is_some() {
            config.analysis.seed = args.seed;
        }
    })?;

    let table = ctx.load_table(&args.input.file, &config.data)?;
    let analysis = AbTestAnalysis::new(&table, &config);

    if args.all_metrics {
        let reports = analysis
            .run_all_metrics()
            .context("A/B analysis failed")?;
        ctx.output.write_list(
            &reports,
            &["Metric", "Control mean", "Test mean", "Test", "Statistic", "p-value", "Decision"],
        )
    } else {
        let report = analysis
            .run()
            .with_context(|| format!("A/B analysis of {} failed", config.analysis.metric))?;
        ctx.output.write(&report)
    }
}

impl TableDisplay for AbTestReport {
    fn to_row(&self) -> Vec<Cell> {
        let mean = |i: usize| {
            self.group_means
                .get(i)
                .map(|m| format_value(m.mean))
                .unwrap_or_else(|| "-".to_string())
        };
        vec![
            Cell::new(self.metric),
            Cell::new(mean(0)),
            Cell::new(mean(1)),
            Cell::new(self.comparison.kind),
            Cell::new(format!("{:.4}", self.comparison.statistic)),
            Cell::new(format!("{:.4}", self.comparison.p_value)),
            Cell::new(decision_badge(self.is_significant(), &self.decision.to_string())),
        ]
    }

    fn display_single(&self) {
        print_section(&format!("A/B Test: {} (alpha = {})", self.metric, self.alpha));
        print_field("H0", &self.hypotheses.null);
        print_field("H1", &self.hypotheses.alternative);

        print_section("Group means");
        let mut means = styled_table(&["Group", "Bidding", "n", "Mean", "Capped"]);
        for m in &self.group_means {
            means.add_row(vec![
                Cell::new(m.group),
                Cell::new(m.bidding_method),
                Cell::new(m.n),
                Cell::new(format_value(m.mean)),
                Cell::new(m.capped),
            ]);
        }
        println!("{means}");

        print_section("Assumptions");
        for n in &self.assumptions.normality {
            print_field(
                &format!("Shapiro-Wilk ({})", n.group),
                &format!(
                    "{} -> {}",
                    format_test_result(n.test.w, n.test.p_value),
                    assumption_badge(n.normal, "normal", "not normal")
                ),
            );
        }
        let variance = &self.assumptions.variance;
        print_field(
            &format!("Levene ({})", variance.center),
            &format!(
                "{} -> {}",
                format_test_result(variance.statistic, variance.p_value),
                assumption_badge(self.assumptions.homogeneous, "homogeneous", "heterogeneous")
            ),
        );

        print_section("Test");
        print_field("Selected", &self.selection.kind.to_string());
        print_field("Why", &self.selection.rationale);
        print_field(
            "Result",
            &format_test_result(self.comparison.statistic, self.comparison.p_value),
        );
        if let Some(df) = self.comparison.df {
            print_field("Degrees of freedom", &format!("{:.2}", df));
        }
        if let Some(effect) = self.comparison.effect_size {
            print_field("Effect size", &format!("{:.4}", effect));
        }
        if self.comparison.exact {
            print_field("p-value", "exact");
        }
        print_field(
            "Decision",
            &decision_badge(self.is_significant(), &self.decision.to_string()),
        );
        println!("\n{}", self.interpretation);

        if let Some(ci) = &self.bootstrap {
            print_section("Bootstrap");
            print_field(
                &format!("{:.0}% CI of mean difference", ci.confidence * 100.0),
                &format!(
                    "[{}, {}] ({} resamples)",
                    format_value(ci.lower),
                    format_value(ci.upper),
                    ci.iterations
                ),
            );
        }

        if let Some(conversion) = &self.conversion {
            print_section("Conversion (purchases / clicks)");
            print_field(
                "Rates",
                &format!(
                    "control {} vs test {}",
                    format_value(conversion.proportions[0]),
                    format_value(conversion.proportions[1])
                ),
            );
            print_field(
                "Two-proportion z-test",
                &format_test_result(conversion.statistic, conversion.p_value),
            );
        }

        println!();
        print_field("Generated", &format_timestamp(&self.generated_at));
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
