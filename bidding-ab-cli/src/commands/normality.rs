//! Shapiro-Wilk per group

use anyhow::{Context as _, Result};
use bidding_ab_core::{Group, Metric};
use bidding_ab_stats::{GroupNormality, StatisticalAnalyzer};
use comfy_table::Cell;
use serde::Serialize;

use super::InputArgs;
use crate::context::Context;
use crate::output::{assumption_badge, format_test_result, print_field, TableDisplay};

#[derive(Debug, Serialize)]
pub struct NormalityRow {
    pub metric: Metric,
    pub alpha: f64,
    #[serde(flatten)]
    pub result: GroupNormality,
}

pub fn execute(ctx: &Context, args: InputArgs) -> Result<()> {
    let config = ctx.settings(|config| args.apply(config))?;
    let table = ctx.load_table(&args.file, &config.data)?;
    let metric = config.analysis.metric;
    let alpha = config.analysis.alpha;

    let rows = Group::ALL
        .iter()
        .map(|&group| {
            let sample = table.sample(group, metric);
            let test = StatisticalAnalyzer::shapiro_wilk(&sample)
                .with_context(|| format!("Shapiro-Wilk failed for the {} group", group))?;
            Ok(NormalityRow {
                metric,
                alpha,
                result: GroupNormality {
                    group,
                    normal: test.is_normal(alpha),
                    test,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ctx.output.info(&format!(
        "H0: the {} sample is normally distributed (alpha = {})",
        metric, alpha
    ));
    ctx.output
        .write_list(&rows, &["Group", "Metric", "n", "W", "p-value", "Normal"])
}

impl TableDisplay for NormalityRow {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.result.group),
            Cell::new(self.metric),
            Cell::new(self.result.test.n),
            Cell::new(format!("{:.4}", self.result.test.w)),
            Cell::new(format!("{:.4}", self.result.test.p_value)),
            Cell::new(assumption_badge(self.result.normal, "yes", "no")),
        ]
    }

    fn display_single(&self) {
        print_field(
            &format!("{} ({})", self.result.group, self.metric),
            &format_test_result(self.result.test.w, self.result.test.p_value),
        );
    }

    fn display_compact(&self) {
        println!(
            "{}\t{}\t{:.4}\t{:.4}\t{}",
            self.result.group,
            self.metric,
            self.result.test.w,
            self.result.test.p_value,
            if self.result.normal { "normal" } else { "not_normal" }
        );
    }
}
