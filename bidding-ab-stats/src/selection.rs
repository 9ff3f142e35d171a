use bidding_ab_core::{Group, LeveneCenter, Result};
use serde::{Deserialize, Serialize};

use crate::statistical::{ComparisonKind, ComparisonTest, NormalityTest, StatisticalAnalyzer, VarianceTest};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupNormality {
    pub group: Group,
    #[serde(flatten)]
    pub test: NormalityTest,
    pub normal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssumptionChecks {
    pub alpha: f64,
    pub normality: Vec<GroupNormality>,
    pub variance: VarianceTest,
    pub homogeneous: bool,
}

impl AssumptionChecks {
    /// Shapiro-Wilk per arm and Levene across both, all at `alpha`.
    pub fn run(
        control: &[f64],
        test: &[f64],
        center: LeveneCenter,
        alpha: f64,
    ) -> Result<Self> {
        let mut normality = Vec::with_capacity(2);
        for (group, sample) in [(Group::Control, control), (Group::Test, test)] {
            let result = StatisticalAnalyzer::shapiro_wilk(sample)?;
            tracing::info!(
                %group,
                w = result.w,
                p_value = result.p_value,
                "Normality check"
            );
            normality.push(GroupNormality {
                group,
                normal: result.is_normal(alpha),
                test: result,
            });
        }

        let variance = StatisticalAnalyzer::levene(&[control, test], center)?;
        tracing::info!(
            statistic = variance.statistic,
            p_value = variance.p_value,
            "Variance homogeneity check"
        );

        Ok(Self {
            alpha,
            normality,
            homogeneous: variance.is_homogeneous(alpha),
            variance,
        })
    }

    pub fn all_normal(&self) -> bool {
        self.normality.iter().all(|n| n.normal)
    }

    pub fn non_normal_groups(&self) -> Vec<Group> {
        self.normality
            .iter()
            .filter(|n| !n.normal)
            .map(|n| n.group)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestSelection {
    pub kind: ComparisonKind,
    pub rationale: String,
}

/// Normal arms with equal variances get Student's t-test, normal arms with
/// unequal variances get Welch's t-test, anything non-normal gets
/// Mann-Whitney U.
pub fn select_test(checks: &AssumptionChecks) -> TestSelection {
    let alpha = checks.alpha;

    if !checks.all_normal() {
        let groups: Vec<String> = checks
            .non_normal_groups()
            .iter()
            .map(|g| g.to_string())
            .collect();
        return TestSelection {
            kind: ComparisonKind::MannWhitneyU,
            rationale: format!(
                "Normality is rejected for {} (Shapiro-Wilk p < {}), so the non-parametric Mann-Whitney U test is used",
                groups.join(" and "),
                alpha
            ),
        };
    }

    if checks.homogeneous {
        TestSelection {
            kind: ComparisonKind::StudentT,
            rationale: format!(
                "Both groups are normal and variances are homogeneous (Levene p = {:.4} >= {}), so the independent two-sample t-test is used",
                checks.variance.p_value, alpha
            ),
        }
    } else {
        TestSelection {
            kind: ComparisonKind::WelchT,
            rationale: format!(
                "Both groups are normal but variances differ (Levene p = {:.4} < {}), so Welch's t-test (equal_var = false) is used",
                checks.variance.p_value, alpha
            ),
        }
    }
}

pub fn run_comparison(kind: ComparisonKind, control: &[f64], test: &[f64]) -> Result<ComparisonTest> {
    match kind {
        ComparisonKind::StudentT => StatisticalAnalyzer::t_test(control, test, true),
        ComparisonKind::WelchT => StatisticalAnalyzer::t_test(control, test, false),
        ComparisonKind::MannWhitneyU => StatisticalAnalyzer::mann_whitney_u(control, test),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks(control_p: f64, test_p: f64, levene_p: f64) -> AssumptionChecks {
        let alpha = 0.05;
        let normality = [(Group::Control, control_p), (Group::Test, test_p)]
            .into_iter()
            .map(|(group, p)| GroupNormality {
                group,
                test: NormalityTest {
                    n: 40,
                    w: 0.97,
                    p_value: p,
                },
                normal: p >= alpha,
            })
            .collect();
        AssumptionChecks {
            alpha,
            normality,
            variance: VarianceTest {
                center: LeveneCenter::Median,
                statistic: 1.0,
                p_value: levene_p,
                df_between: 1.0,
                df_within: 78.0,
            },
            homogeneous: levene_p >= alpha,
        }
    }

    #[test]
    fn test_select_student_when_assumptions_hold() {
        assert_eq!(select_test(&checks(0.59, 0.15, 0.11)).kind, ComparisonKind::StudentT);
    }

    #[test]
    fn test_select_welch_when_variances_differ() {
        assert_eq!(select_test(&checks(0.59, 0.15, 0.01)).kind, ComparisonKind::WelchT);
    }

    #[test]
    fn test_select_mann_whitney_when_not_normal() {
        let selection = select_test(&checks(0.01, 0.15, 0.5));
        assert_eq!(selection.kind, ComparisonKind::MannWhitneyU);
        assert!(selection.rationale.contains("Control"));
        assert!(!selection.rationale.contains("Test and"));
    }

    #[test]
    fn test_non_normality_wins_over_variance() {
        assert_eq!(select_test(&checks(0.2, 0.001, 0.001)).kind, ComparisonKind::MannWhitneyU);
    }
}
