use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bidding_ab_core::{CampaignRecord, CoreError, Result};

/// The quantile grid used when exploring each arm.
pub const EXPLORATION_QUANTILES: [f64; 6] = [0.0, 0.05, 0.50, 0.95, 0.99, 1.0];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DescriptiveSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QuantilePoint {
    pub quantile: f64,
    pub value: f64,
}

/// Column sums for one arm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupTotals {
    pub impression: f64,
    pub click: f64,
    pub purchase: f64,
    /// Rounded to cents.
    pub earning: Decimal,
}

pub struct Aggregator;

impl Aggregator {
    pub fn describe(values: &[f64]) -> DescriptiveSummary {
        if values.is_empty() {
            return Self::empty();
        }

        let sorted = Self::sorted(values);
        let mean = Self::mean(values);
        let std = if values.len() > 1 {
            let ss: f64 = values.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (values.len() - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        DescriptiveSummary {
            count: values.len(),
            mean,
            std,
            min: sorted[0],
            q25: Self::quantile_sorted(&sorted, 0.25),
            median: Self::quantile_sorted(&sorted, 0.50),
            q75: Self::quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        }
    }

    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    pub fn median(values: &[f64]) -> f64 {
        Self::quantile(values, 0.5)
    }

    /// Linearly interpolated quantile, `q` in [0, 1].
    pub fn quantile(values: &[f64], q: f64) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        Self::quantile_sorted(&Self::sorted(values), q)
    }

    pub fn quantiles(values: &[f64], qs: &[f64]) -> Vec<QuantilePoint> {
        let sorted = Self::sorted(values);
        qs.iter()
            .map(|&q| QuantilePoint {
                quantile: q,
                value: if sorted.is_empty() {
                    f64::NAN
                } else {
                    Self::quantile_sorted(&sorted, q)
                },
            })
            .collect()
    }

    /// Column sums; the earning total is rounded to cents.
    pub fn totals<'a>(records: impl IntoIterator<Item = &'a CampaignRecord>) -> Result<GroupTotals> {
        let mut impression = 0.0;
        let mut click = 0.0;
        let mut purchase = 0.0;
        let mut earning = 0.0;
        for r in records {
            impression += r.impression;
            click += r.click;
            purchase += r.purchase;
            earning += r.earning;
        }

        let earning = Decimal::from_f64(earning).ok_or_else(|| {
            CoreError::Validation(format!(
                "Earning total {} cannot be represented as a decimal",
                earning
            ))
        })?;

        Ok(GroupTotals {
            impression,
            click,
            purchase,
            earning: earning.round_dp(2),
        })
    }

    fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
        let q = q.clamp(0.0, 1.0);
        let position = q * (sorted.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let fraction = position - lower as f64;
        sorted[lower] + fraction * (sorted[upper] - sorted[lower])
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    fn empty() -> DescriptiveSummary {
        DescriptiveSummary {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}
