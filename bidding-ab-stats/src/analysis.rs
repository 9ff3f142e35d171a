//! The end-to-end comparison: hypotheses, assumption checks, test selection,
//! the comparison itself and its interpretation.

use bidding_ab_core::{AnalysisConfig, BiddingMethod, ExperimentTable, Group, Metric, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregators::Aggregator;
use crate::outliers::{cap_outliers, count_outliers, OutlierThresholds};
use crate::selection::{run_comparison, select_test, AssumptionChecks, TestSelection};
use crate::statistical::{BootstrapInterval, ComparisonTest, ProportionTest, StatisticalAnalyzer};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hypotheses {
    pub null: String,
    pub alternative: String,
}

impl Hypotheses {
    pub fn for_metric(metric: Metric) -> Self {
        let arms = format!(
            "between the Control group ({}) and the Test group ({})",
            BiddingMethod::MaximumBidding,
            BiddingMethod::AverageBidding
        );
        Self {
            null: format!(
                "M1 = M2: there is no statistically significant difference in mean {} {}",
                metric, arms
            ),
            alternative: format!(
                "M1 != M2: there is a statistically significant difference in mean {} {}",
                metric, arms
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    RejectNull,
    FailToRejectNull,
}

impl Decision {
    /// H0 is rejected when p < alpha.
    pub fn from_comparison(comparison: &ComparisonTest, alpha: f64) -> Self {
        if comparison.is_significant(alpha) {
            Decision::RejectNull
        } else {
            Decision::FailToRejectNull
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::RejectNull => write!(f, "H0 rejected"),
            Decision::FailToRejectNull => write!(f, "H0 cannot be rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupMean {
    pub group: Group,
    pub bidding_method: BiddingMethod,
    pub n: usize,
    pub mean: f64,
    /// Values moved onto an outlier fence before testing.
    pub capped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestReport {
    pub metric: Metric,
    pub alpha: f64,
    pub hypotheses: Hypotheses,
    pub group_means: Vec<GroupMean>,
    pub assumptions: AssumptionChecks,
    pub selection: TestSelection,
    pub comparison: ComparisonTest,
    pub decision: Decision,
    pub interpretation: String,
    pub bootstrap: Option<BootstrapInterval>,
    /// Conversion (total purchases / total clicks) compared across arms.
    pub conversion: Option<ProportionTest>,
    pub generated_at: DateTime<Utc>,
}

impl AbTestReport {
    pub fn is_significant(&self) -> bool {
        self.decision == Decision::RejectNull
    }
}

pub struct AbTestAnalysis<'a> {
    table: &'a ExperimentTable,
    config: &'a AnalysisConfig,
}

impl<'a> AbTestAnalysis<'a> {
    pub fn new(table: &'a ExperimentTable, config: &'a AnalysisConfig) -> Self {
        Self { table, config }
    }

    /// Runs the comparison for the configured metric.
    pub fn run(&self) -> Result<AbTestReport> {
        self.run_metric(self.config.analysis.metric)
    }

    /// Runs the comparison once per base metric.
    pub fn run_all_metrics(&self) -> Result<Vec<AbTestReport>> {
        Metric::BASE
            .iter()
            .map(|&metric| self.run_metric(metric))
            .collect()
    }

    pub fn run_metric(&self, metric: Metric) -> Result<AbTestReport> {
        let settings = &self.config.analysis;
        let alpha = settings.alpha;

        tracing::info!(%metric, alpha, "Starting A/B comparison");

        let (control, control_capped) = self.prepared_sample(Group::Control, metric)?;
        let (test, test_capped) = self.prepared_sample(Group::Test, metric)?;

        let group_means = vec![
            group_mean(Group::Control, &control, control_capped),
            group_mean(Group::Test, &test, test_capped),
        ];

        let assumptions = AssumptionChecks::run(&control, &test, settings.levene_center, alpha)?;
        let selection = select_test(&assumptions);
        tracing::info!(test = %selection.kind, "Selected comparison test");

        let comparison = run_comparison(selection.kind, &control, &test)?;
        let decision = Decision::from_comparison(&comparison, alpha);
        tracing::info!(
            statistic = comparison.statistic,
            p_value = comparison.p_value,
            %decision,
            "Comparison finished"
        );

        let bootstrap = if settings.bootstrap_iterations > 0 {
            Some(StatisticalAnalyzer::bootstrap_mean_difference(
                &control,
                &test,
                settings.bootstrap_iterations,
                settings.bootstrap_confidence,
                settings.seed,
            )?)
        } else {
            None
        };

        Ok(AbTestReport {
            metric,
            alpha,
            hypotheses: Hypotheses::for_metric(metric),
            interpretation: interpret(metric, alpha, &comparison, &group_means),
            group_means,
            assumptions,
            selection,
            comparison,
            decision,
            bootstrap,
            conversion: self.conversion_test()?,
            generated_at: Utc::now(),
        })
    }

    fn prepared_sample(&self, group: Group, metric: Metric) -> Result<(Vec<f64>, usize)> {
        let values = self.table.sample(group, metric);
        if !self.config.outliers.cap {
            return Ok((values, 0));
        }

        let thresholds = OutlierThresholds::from_settings(&values, &self.config.outliers)?;
        let capped = count_outliers(&values, &thresholds);
        if capped > 0 {
            tracing::info!(
                %group,
                %metric,
                capped,
                low = thresholds.low,
                up = thresholds.up,
                "Capping outliers"
            );
        }
        Ok((cap_outliers(&values, &thresholds), capped))
    }

    fn conversion_test(&self) -> Result<Option<ProportionTest>> {
        let control = Aggregator::totals(self.table.group_records(Group::Control))?;
        let test = Aggregator::totals(self.table.group_records(Group::Test))?;

        match StatisticalAnalyzer::proportions_z_test(
            [control.purchase, test.purchase],
            [control.click, test.click],
        ) {
            Ok(result) => Ok(Some(result)),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping conversion proportion test");
                Ok(None)
            }
        }
    }
}

fn group_mean(group: Group, values: &[f64], capped: usize) -> GroupMean {
    GroupMean {
        group,
        bidding_method: group.bidding_method(),
        n: values.len(),
        mean: Aggregator::mean(values),
        capped,
    }
}

fn interpret(metric: Metric, alpha: f64, comparison: &ComparisonTest, means: &[GroupMean]) -> String {
    let arms = format!(
        "between the Control group ({}) and the Test group ({})",
        BiddingMethod::MaximumBidding,
        BiddingMethod::AverageBidding
    );

    if comparison.is_significant(alpha) {
        let direction = match means {
            [control, test] if test.mean > control.mean => "higher",
            [control, test] if test.mean < control.mean => "lower",
            _ => "different",
        };
        format!(
            "p-value = {:.4} < {}: H0 is rejected. There is a statistically significant difference in mean {} {}; the Test group's mean is {}.",
            comparison.p_value, alpha, metric, arms, direction
        )
    } else {
        format!(
            "p-value = {:.4} >= {}: H0 cannot be rejected. There is no statistically significant difference in mean {} {}; the observed difference is consistent with chance.",
            comparison.p_value, alpha, metric, arms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistical::ComparisonKind;

    #[test]
    fn test_hypotheses_name_metric_and_methods() {
        let h = Hypotheses::for_metric(Metric::Purchase);
        assert!(h.null.contains("no statistically significant difference in mean Purchase"));
        assert!(h.null.contains("maximum bidding"));
        assert!(h.alternative.contains("average bidding"));
    }

    #[test]
    fn test_interpret_direction() {
        let comparison = ComparisonTest {
            kind: ComparisonKind::StudentT,
            statistic: -3.0,
            p_value: 0.004,
            df: Some(78.0),
            effect_size: None,
            exact: false,
        };
        let means = vec![
            group_mean(Group::Control, &[1.0, 2.0], 0),
            group_mean(Group::Test, &[3.0, 4.0], 0),
        ];

        let text = interpret(Metric::Earning, 0.05, &comparison, &means);
        assert!(text.starts_with("p-value = 0.0040 < 0.05: H0 is rejected"));
        assert!(text.ends_with("the Test group's mean is higher."));
    }
}
