use bidding_ab_core::{CoreError, LeveneCenter, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};
use statrs::statistics::Statistics;
use std::fmt;

use crate::aggregators::Aggregator;

// ===== Result Types =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    /// Independent two-sample t-test with pooled variance.
    StudentT,
    /// Independent two-sample t-test without the equal-variance assumption.
    WelchT,
    MannWhitneyU,
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonKind::StudentT => write!(f, "Independent two-sample t-test"),
            ComparisonKind::WelchT => write!(f, "Welch's t-test"),
            ComparisonKind::MannWhitneyU => write!(f, "Mann-Whitney U test"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalityTest {
    pub n: usize,
    /// Shapiro-Wilk W, in (0, 1]. Values near 1 look normal.
    pub w: f64,
    pub p_value: f64,
}

impl NormalityTest {
    /// H0 (normality) survives at `alpha`.
    pub fn is_normal(&self, alpha: f64) -> bool {
        self.p_value >= alpha
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VarianceTest {
    pub center: LeveneCenter,
    pub statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
}

impl VarianceTest {
    /// H0 (equal variances) survives at `alpha`.
    pub fn is_homogeneous(&self, alpha: f64) -> bool {
        self.p_value >= alpha
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ComparisonTest {
    pub kind: ComparisonKind,
    pub statistic: f64,
    pub p_value: f64,
    /// Degrees of freedom; absent for rank tests.
    pub df: Option<f64>,
    /// Cohen's d for t-tests, rank-biserial correlation for Mann-Whitney.
    pub effect_size: Option<f64>,
    /// Whether the exact null distribution was used (Mann-Whitney only).
    pub exact: bool,
}

impl ComparisonTest {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProportionTest {
    pub proportions: [f64; 2],
    pub pooled_proportion: f64,
    pub statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BootstrapInterval {
    /// Observed mean(a) - mean(b).
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
    pub iterations: usize,
}

impl BootstrapInterval {
    pub fn contains_zero(&self) -> bool {
        self.lower <= 0.0 && self.upper >= 0.0
    }
}

// ===== Shapiro-Wilk constants (Royston 1995, AS R94) =====

const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -2.0322e-3];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 3.8915e-3];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 3.0302e-3];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// Above this size the Royston approximation is no longer calibrated.
const SW_MAX_CALIBRATED_N: usize = 5000;

/// Smaller sample size up to which Mann-Whitney uses the exact distribution.
const MWU_EXACT_MAX_N: usize = 8;

pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Shapiro-Wilk test of normality.
    ///
    /// H0: the sample was drawn from a normal distribution. Uses the exact
    /// distribution for n = 3 and Royston's normalizing transformation
    /// otherwise.
    pub fn shapiro_wilk(sample: &[f64]) -> Result<NormalityTest> {
        let n = sample.len();
        if n < 3 {
            return Err(CoreError::InsufficientData(format!(
                "Shapiro-Wilk needs at least 3 values, got {}",
                n
            )));
        }
        ensure_finite(sample, "Shapiro-Wilk")?;

        let mut x = sample.to_vec();
        x.sort_by(|a, b| a.total_cmp(b));

        let range = x[n - 1] - x[0];
        if range <= f64::EPSILON * x[n - 1].abs().max(1.0) {
            return Err(CoreError::DegenerateSample(
                "Shapiro-Wilk is undefined for a sample with zero range".to_string(),
            ));
        }
        if n > SW_MAX_CALIBRATED_N {
            tracing::warn!(n, "Shapiro-Wilk p-value may be inaccurate for n > 5000");
        }

        let mean = x.iter().sum::<f64>() / n as f64;
        let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();

        if n == 3 {
            let a = std::f64::consts::FRAC_1_SQRT_2;
            let w = ((a * (x[2] - x[0])).powi(2) / ss).clamp(0.75, 1.0);
            let p = 6.0 / std::f64::consts::PI
                * (w.sqrt().asin() - 0.75_f64.sqrt().asin());
            return Ok(NormalityTest {
                n,
                w,
                p_value: p.clamp(0.0, 1.0),
            });
        }

        let coefficients = shapiro_wilk_coefficients(n)?;
        let numerator: f64 = coefficients
            .iter()
            .enumerate()
            .map(|(i, a)| a * (x[n - 1 - i] - x[i]))
            .sum();
        let w = (numerator * numerator / ss).min(1.0);
        let p_value = shapiro_wilk_p_value(w, n)?;

        tracing::debug!(n, w, p_value, "Shapiro-Wilk computed");

        Ok(NormalityTest { n, w, p_value })
    }

    /// Levene's test for equality of variances across groups.
    ///
    /// With `LeveneCenter::Median` this is the Brown-Forsythe variant.
    pub fn levene(samples: &[&[f64]], center: LeveneCenter) -> Result<VarianceTest> {
        let k = samples.len();
        if k < 2 {
            return Err(CoreError::InsufficientData(format!(
                "Levene's test needs at least 2 groups, got {}",
                k
            )));
        }
        for sample in samples {
            if sample.len() < 2 {
                return Err(CoreError::InsufficientData(
                    "Levene's test needs at least 2 values per group".to_string(),
                ));
            }
            ensure_finite(sample, "Levene")?;
        }

        let deviations: Vec<Vec<f64>> = samples
            .iter()
            .map(|sample| {
                let c = match center {
                    LeveneCenter::Mean => Aggregator::mean(sample),
                    LeveneCenter::Median => Aggregator::median(sample),
                };
                sample.iter().map(|v| (v - c).abs()).collect()
            })
            .collect();

        let total_n: usize = deviations.iter().map(Vec::len).sum();
        let group_means: Vec<f64> = deviations.iter().map(|z| Aggregator::mean(z)).collect();
        let grand_mean = deviations.iter().flatten().sum::<f64>() / total_n as f64;

        let between: f64 = deviations
            .iter()
            .zip(&group_means)
            .map(|(z, m)| z.len() as f64 * (m - grand_mean).powi(2))
            .sum();
        let within: f64 = deviations
            .iter()
            .zip(&group_means)
            .map(|(z, m)| z.iter().map(|v| (v - m).powi(2)).sum::<f64>())
            .sum();

        if within <= 0.0 {
            return Err(CoreError::DegenerateSample(
                "Levene's test is undefined when every group has constant spread".to_string(),
            ));
        }

        let df_between = (k - 1) as f64;
        let df_within = (total_n - k) as f64;
        let statistic = (df_within / df_between) * (between / within);

        let f_dist = FisherSnedecor::new(df_between, df_within).map_err(distribution_error)?;
        let p_value = f_dist.sf(statistic).clamp(0.0, 1.0);

        tracing::debug!(%center, statistic, p_value, "Levene computed");

        Ok(VarianceTest {
            center,
            statistic,
            p_value,
            df_between,
            df_within,
        })
    }

    /// Two-sided independent two-sample t-test.
    ///
    /// `equal_var = true` pools the variances (Student); `false` runs
    /// Welch's test with Welch-Satterthwaite degrees of freedom.
    pub fn t_test(sample1: &[f64], sample2: &[f64], equal_var: bool) -> Result<ComparisonTest> {
        if sample1.len() < 2 || sample2.len() < 2 {
            return Err(CoreError::InsufficientData(
                "t-test needs at least 2 values per sample".to_string(),
            ));
        }
        ensure_finite(sample1, "t-test")?;
        ensure_finite(sample2, "t-test")?;

        let mean1 = sample1.mean();
        let mean2 = sample2.mean();
        let var1 = sample1.variance();
        let var2 = sample2.variance();
        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;

        let (std_err, df) = if equal_var {
            let df = n1 + n2 - 2.0;
            let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df;
            ((pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
        } else {
            let se1 = var1 / n1;
            let se2 = var2 / n2;
            let df = (se1 + se2).powi(2)
                / (se1.powi(2) / (n1 - 1.0) + se2.powi(2) / (n2 - 1.0));
            ((se1 + se2).sqrt(), df)
        };

        if std_err == 0.0 || !std_err.is_finite() {
            return Err(CoreError::DegenerateSample(
                "t-test is undefined when both samples have zero variance".to_string(),
            ));
        }

        let t_stat = (mean1 - mean2) / std_err;
        let t_dist = StudentsT::new(0.0, 1.0, df).map_err(distribution_error)?;
        let p_value = (2.0 * t_dist.sf(t_stat.abs())).clamp(0.0, 1.0);

        Ok(ComparisonTest {
            kind: if equal_var {
                ComparisonKind::StudentT
            } else {
                ComparisonKind::WelchT
            },
            statistic: t_stat,
            p_value,
            df: Some(df),
            effect_size: Some(Self::cohens_d(sample1, sample2)),
            exact: false,
        })
    }

    /// Two-sided Mann-Whitney U test (non-parametric alternative to the t-test).
    ///
    /// The reported statistic is U of `sample1`. When the smaller sample has
    /// at most 8 values and nothing is tied, the p-value comes from the exact
    /// null distribution; otherwise from the normal approximation with tie
    /// and continuity corrections.
    pub fn mann_whitney_u(sample1: &[f64], sample2: &[f64]) -> Result<ComparisonTest> {
        if sample1.is_empty() || sample2.is_empty() {
            return Err(CoreError::InsufficientData(
                "Mann-Whitney U needs at least 1 value per sample".to_string(),
            ));
        }
        ensure_finite(sample1, "Mann-Whitney U")?;
        ensure_finite(sample2, "Mann-Whitney U")?;

        let n1 = sample1.len();
        let n2 = sample2.len();
        let n = n1 + n2;

        let mut combined: Vec<(f64, bool)> = sample1
            .iter()
            .map(|&x| (x, true))
            .chain(sample2.iter().map(|&x| (x, false)))
            .collect();
        combined.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Average ranks over tie blocks
        let mut rank_sum1 = 0.0;
        let mut tie_term = 0.0;
        let mut i = 0;
        while i < n {
            let mut j = i;
            while j < n && combined[j].0 == combined[i].0 {
                j += 1;
            }
            let rank = (i + j + 1) as f64 / 2.0;
            let in_first = combined[i..j].iter().filter(|(_, first)| *first).count();
            rank_sum1 += rank * in_first as f64;

            let t = (j - i) as f64;
            tie_term += t * t * t - t;
            i = j;
        }

        let n1f = n1 as f64;
        let n2f = n2 as f64;
        let u1 = rank_sum1 - n1f * (n1f + 1.0) / 2.0;
        let u2 = n1f * n2f - u1;
        let has_ties = tie_term > 0.0;
        let exact = n1.min(n2) <= MWU_EXACT_MAX_N && !has_ties;

        let p_value = if exact {
            let distribution = mann_whitney_distribution(n1.min(n2), n1.max(n2));
            let total: f64 = distribution.iter().sum();
            let u_min = u1.min(u2).round() as usize;
            let lower_tail: f64 = distribution[..=u_min].iter().sum::<f64>() / total;
            (2.0 * lower_tail).min(1.0)
        } else {
            let nf = n as f64;
            let mean_u = n1f * n2f / 2.0;
            let var_u = n1f * n2f / 12.0 * ((nf + 1.0) - tie_term / (nf * (nf - 1.0)));
            if var_u <= 0.0 {
                return Err(CoreError::DegenerateSample(
                    "Mann-Whitney U is undefined when every value is tied".to_string(),
                ));
            }
            let z = (u1.max(u2) - mean_u - 0.5) / var_u.sqrt();
            (2.0 * standard_normal()?.sf(z)).clamp(0.0, 1.0)
        };

        Ok(ComparisonTest {
            kind: ComparisonKind::MannWhitneyU,
            statistic: u1,
            p_value,
            df: None,
            effect_size: Some(2.0 * u1 / (n1f * n2f) - 1.0),
            exact,
        })
    }

    /// Confidence interval for the mean at the given confidence level.
    pub fn confidence_interval(values: &[f64], confidence: f64) -> Result<(f64, f64)> {
        if values.len() < 2 {
            return Err(CoreError::InsufficientData(
                "Confidence interval needs at least 2 values".to_string(),
            ));
        }
        ensure_confidence(confidence)?;

        let mean = values.mean();
        let std_dev = values.std_dev();
        let n = values.len() as f64;

        let t_dist = StudentsT::new(0.0, 1.0, n - 1.0).map_err(distribution_error)?;
        let t_value = t_dist.inverse_cdf((1.0 + confidence) / 2.0);
        let margin = t_value * (std_dev / n.sqrt());

        Ok((mean - margin, mean + margin))
    }

    /// Percentile bootstrap interval for mean(sample1) - mean(sample2).
    pub fn bootstrap_mean_difference(
        sample1: &[f64],
        sample2: &[f64],
        iterations: usize,
        confidence: f64,
        seed: Option<u64>,
    ) -> Result<BootstrapInterval> {
        if sample1.is_empty() || sample2.is_empty() {
            return Err(CoreError::InsufficientData(
                "Bootstrap needs non-empty samples".to_string(),
            ));
        }
        ensure_finite(sample1, "Bootstrap")?;
        ensure_finite(sample2, "Bootstrap")?;
        if iterations == 0 {
            return Err(CoreError::Validation(
                "Bootstrap needs at least one iteration".to_string(),
            ));
        }
        ensure_confidence(confidence)?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut differences: Vec<f64> = (0..iterations)
            .map(|_| resample_mean(sample1, &mut rng) - resample_mean(sample2, &mut rng))
            .collect();
        differences.sort_by(|a, b| a.total_cmp(b));

        let alpha = (1.0 - confidence) / 2.0;
        let lower_idx = ((iterations as f64 * alpha).floor() as usize).min(iterations - 1);
        let upper_idx = ((iterations as f64 * (1.0 - alpha)).ceil() as usize)
            .saturating_sub(1)
            .min(iterations - 1);

        Ok(BootstrapInterval {
            estimate: sample1.mean() - sample2.mean(),
            lower: differences[lower_idx],
            upper: differences[upper_idx],
            confidence,
            iterations,
        })
    }

    /// Two-sample pooled z-test for proportions, `successes[i] / trials[i]`.
    pub fn proportions_z_test(successes: [f64; 2], trials: [f64; 2]) -> Result<ProportionTest> {
        for (s, t) in successes.iter().zip(&trials) {
            if *t <= 0.0 {
                return Err(CoreError::InsufficientData(
                    "Proportion test needs a positive number of trials".to_string(),
                ));
            }
            if *s < 0.0 || s > t {
                return Err(CoreError::Validation(format!(
                    "Successes ({}) must lie between 0 and trials ({})",
                    s, t
                )));
            }
        }

        let p1 = successes[0] / trials[0];
        let p2 = successes[1] / trials[1];
        let pooled = (successes[0] + successes[1]) / (trials[0] + trials[1]);
        let variance = pooled * (1.0 - pooled) * (1.0 / trials[0] + 1.0 / trials[1]);
        if variance <= 0.0 {
            return Err(CoreError::DegenerateSample(
                "Proportion test is undefined when the pooled proportion is 0 or 1".to_string(),
            ));
        }

        let z = (p1 - p2) / variance.sqrt();
        let p_value = (2.0 * standard_normal()?.sf(z.abs())).clamp(0.0, 1.0);

        Ok(ProportionTest {
            proportions: [p1, p2],
            pooled_proportion: pooled,
            statistic: z,
            p_value,
        })
    }

    /// Calculate effect size (Cohen's d)
    pub fn cohens_d(sample1: &[f64], sample2: &[f64]) -> f64 {
        if sample1.len() < 2 || sample2.len() < 2 {
            return 0.0;
        }

        let mean1 = sample1.mean();
        let mean2 = sample2.mean();
        let var1 = sample1.variance();
        let var2 = sample2.variance();
        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;

        let pooled_std = (((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0)).sqrt();

        if pooled_std == 0.0 {
            return 0.0;
        }

        (mean1 - mean2) / pooled_std
    }
}

// ===== Helpers =====

fn ensure_finite(sample: &[f64], test: &str) -> Result<()> {
    if sample.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{} received a non-finite value",
            test
        )))
    }
}

fn ensure_confidence(confidence: f64) -> Result<()> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Confidence level must be in (0, 1), got {}",
            confidence
        )))
    }
}

fn distribution_error(err: impl fmt::Display) -> CoreError {
    CoreError::Validation(format!("Invalid distribution parameters: {}", err))
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(distribution_error)
}

fn resample_mean(sample: &[f64], rng: &mut StdRng) -> f64 {
    let n = sample.len();
    (0..n).map(|_| sample[rng.gen_range(0..n)]).sum::<f64>() / n as f64
}

/// Horner evaluation of `c[0] + c[1] x + c[2] x^2 + ...`.
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, coef| acc * x + coef)
}

/// Lower half of the Shapiro-Wilk weights for n >= 4, all positive.
///
/// `m` holds the (negative) expected lower normal order statistics; the full
/// weight vector is antisymmetric with unit norm.
fn shapiro_wilk_coefficients(n: usize) -> Result<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;
    let normal = standard_normal()?;

    let m: Vec<f64> = (0..half)
        .map(|i| normal.inverse_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; half];
    a[0] = poly(&SW_C1, rsn) - m[0] / ssumm2;

    let (first_plain, fac) = if n > 5 {
        a[1] = -m[1] / ssumm2 + poly(&SW_C2, rsn);
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a[0] * a[0] - 2.0 * a[1] * a[1]))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a[0] * a[0])).sqrt();
        (1, fac)
    };

    if !fac.is_finite() || fac <= 0.0 {
        return Err(CoreError::DegenerateSample(format!(
            "Shapiro-Wilk weights are undefined for n = {}",
            n
        )));
    }

    for i in first_plain..half {
        a[i] = -m[i] / fac;
    }

    Ok(a)
}

fn shapiro_wilk_p_value(w: f64, n: usize) -> Result<f64> {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }
    let nf = n as f64;
    let normal = standard_normal()?;

    let z = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        let y = w1.ln();
        if y >= gamma {
            return Ok(0.0);
        }
        let y = -(gamma - y).ln();
        let mean = poly(&SW_C3, nf);
        let sd = poly(&SW_C4, nf).exp();
        (y - mean) / sd
    } else {
        let ln_n = nf.ln();
        let mean = poly(&SW_C5, ln_n);
        let sd = poly(&SW_C6, ln_n).exp();
        (w1.ln() - mean) / sd
    };

    Ok(normal.sf(z).clamp(0.0, 1.0))
}

/// Frequencies of U under H0 for sample sizes `m <= n`, indexed by U.
///
/// These are the coefficients of the Gaussian binomial coefficient
/// [m + n choose m]_q, built as prod (1 - q^(n+i)) / (1 - q^i).
fn mann_whitney_distribution(m: usize, n: usize) -> Vec<f64> {
    let max_u = m * n;
    let mut coefficients = vec![0.0; max_u + 1];
    coefficients[0] = 1.0;

    for i in 1..=m {
        let shift = n + i;
        if shift <= max_u {
            for k in (shift..=max_u).rev() {
                coefficients[k] -= coefficients[k - shift];
            }
        }
        for k in i..=max_u {
            coefficients[k] += coefficients[k - i];
        }
    }

    coefficients
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_poly_horner() {
        assert_relative_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 17.0);
        assert_relative_eq!(poly(&SW_G, 10.0), 2.317, epsilon = 1e-12);
    }

    #[test]
    fn test_mann_whitney_distribution_small() {
        // m = 2, n = 2: U in 0..=4 with frequencies 1, 1, 2, 1, 1
        assert_eq!(mann_whitney_distribution(2, 2), vec![1.0, 1.0, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_mann_whitney_distribution_total() {
        // C(10, 5) = 252 orderings
        let total: f64 = mann_whitney_distribution(5, 5).iter().sum();
        assert_relative_eq!(total, 252.0);
    }

    #[test]
    fn test_shapiro_coefficients_unit_norm() {
        for n in [4, 5, 6, 11, 12, 40] {
            let a = shapiro_wilk_coefficients(n).unwrap();
            let norm: f64 = 2.0 * a.iter().map(|v| v * v).sum::<f64>();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-9);
        }
    }
}
