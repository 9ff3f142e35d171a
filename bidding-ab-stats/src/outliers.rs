use bidding_ab_core::{CoreError, OutlierSettings, Result};
use serde::{Deserialize, Serialize};

use crate::aggregators::Aggregator;

/// Tukey-style fences around the inter-quantile range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutlierThresholds {
    pub low: f64,
    pub up: f64,
}

impl OutlierThresholds {
    pub fn from_settings(values: &[f64], settings: &OutlierSettings) -> Result<Self> {
        outlier_thresholds(
            values,
            settings.lower_quantile,
            settings.upper_quantile,
            settings.multiplier,
        )
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.up
    }
}

/// Fences at `q1 - multiplier * IQR` and `q3 + multiplier * IQR`.
///
/// Requires `0 <= q1 < q3 <= 1` and a non-negative multiplier, so that
/// `low <= up` whenever `values` is non-empty.
pub fn outlier_thresholds(values: &[f64], q1: f64, q3: f64, multiplier: f64) -> Result<OutlierThresholds> {
    if !(0.0..=1.0).contains(&q1) || !(0.0..=1.0).contains(&q3) || q1 >= q3 {
        return Err(CoreError::Validation(format!(
            "Outlier quantiles must satisfy 0 <= lower < upper <= 1, got {} and {}",
            q1, q3
        )));
    }
    if !(multiplier >= 0.0 && multiplier.is_finite()) {
        return Err(CoreError::Validation(format!(
            "Outlier multiplier must be a non-negative number, got {}",
            multiplier
        )));
    }

    let lower = Aggregator::quantile(values, q1);
    let upper = Aggregator::quantile(values, q3);
    let range = upper - lower;

    Ok(OutlierThresholds {
        low: lower - multiplier * range,
        up: upper + multiplier * range,
    })
}

pub fn count_outliers(values: &[f64], thresholds: &OutlierThresholds) -> usize {
    values.iter().filter(|v| !thresholds.contains(**v)).count()
}

/// Replaces values outside the fences with the nearest fence.
///
/// Values above `up` become `up` even when hand-built fences are inverted.
pub fn cap_outliers(values: &[f64], thresholds: &OutlierThresholds) -> Vec<f64> {
    values
        .iter()
        .map(|v| v.max(thresholds.low).min(thresholds.up))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn with_spike() -> Vec<f64> {
        vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 100.0]
    }

    #[test]
    fn test_thresholds_iqr() {
        // q25 = 12.25, q75 = 16.75, IQR = 4.5
        let t = outlier_thresholds(&with_spike(), 0.25, 0.75, 1.5).unwrap();
        assert_relative_eq!(t.low, 5.5);
        assert_relative_eq!(t.up, 23.5);
    }

    #[test]
    fn test_count_and_cap() {
        let values = with_spike();
        let t = outlier_thresholds(&values, 0.25, 0.75, 1.5).unwrap();

        assert_eq!(count_outliers(&values, &t), 1);

        let capped = cap_outliers(&values, &t);
        assert_eq!(capped.len(), values.len());
        assert_relative_eq!(capped[9], 23.5);
        assert_relative_eq!(capped[0], 10.0);
    }

    #[test]
    fn test_from_settings_defaults() {
        let t = OutlierThresholds::from_settings(&with_spike(), &OutlierSettings::default()).unwrap();
        assert!(t.contains(18.0));
        assert!(!t.contains(100.0));
    }

    #[test]
    fn test_inverted_quantiles_are_rejected() {
        let err = outlier_thresholds(&[1.0, 2.0, 3.0, 10.0], 0.75, 0.25, 1.5).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = outlier_thresholds(&[1.0, 2.0, 3.0, 10.0], 0.5, 0.5, 1.5).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_out_of_range_quantile_or_negative_multiplier_rejected() {
        let values = [1.0, 2.0, 3.0, 10.0];
        assert!(outlier_thresholds(&values, -0.1, 0.75, 1.5).is_err());
        assert!(outlier_thresholds(&values, 0.25, 1.2, 1.5).is_err());
        assert!(outlier_thresholds(&values, 0.25, 0.75, -1.0).is_err());
        assert!(outlier_thresholds(&values, 0.25, 0.75, f64::NAN).is_err());
    }

    #[test]
    fn test_cap_with_inverted_fences_does_not_panic() {
        let t = OutlierThresholds { low: 9.25, up: -2.75 };
        let capped = cap_outliers(&[1.0, 2.0, 3.0, 10.0], &t);
        assert_eq!(capped, vec![-2.75; 4]);
    }

    #[test]
    fn test_from_settings_propagates_invalid_order() {
        let settings = OutlierSettings {
            lower_quantile: 0.9,
            upper_quantile: 0.1,
            ..OutlierSettings::default()
        };
        assert!(OutlierThresholds::from_settings(&with_spike(), &settings).is_err());
    }
}
