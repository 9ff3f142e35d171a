use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use super::metric::Metric;
use crate::error::{CoreError, Result};

// ===== Root Configuration =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    #[validate(nested)]
    pub analysis: AnalysisSettings,
    #[validate(nested)]
    pub outliers: OutlierSettings,
    #[validate(nested)]
    pub data: DataSettings,
    pub logging: LoggingSettings,
}

impl AnalysisConfig {
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

// ===== Hypothesis Testing =====

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LeveneCenter {
    Mean,
    #[default]
    Median,
}

impl fmt::Display for LeveneCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeveneCenter::Mean => write!(f, "mean"),
            LeveneCenter::Median => write!(f, "median"),
        }
    }
}

impl FromStr for LeveneCenter {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(LeveneCenter::Mean),
            "median" => Ok(LeveneCenter::Median),
            _ => Err(CoreError::Validation(format!(
                "Invalid Levene center: {}. Valid centers: mean, median",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct AnalysisSettings {
    pub metric: Metric,
    /// Significance level shared by the assumption checks and the comparison test.
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub alpha: f64,
    pub levene_center: LeveneCenter,
    /// Bootstrap resamples for the mean-difference interval; 0 disables it.
    #[validate(range(max = 1_000_000))]
    pub bootstrap_iterations: usize,
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub bootstrap_confidence: f64,
    pub seed: Option<u64>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            metric: Metric::Purchase,
            alpha: 0.05,
            levene_center: LeveneCenter::Median,
            bootstrap_iterations: 0,
            bootstrap_confidence: 0.95,
            seed: None,
        }
    }
}

// ===== Outlier Handling =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_quantile_order"))]
pub struct OutlierSettings {
    /// Winsorize each group's sample to its thresholds before testing.
    pub cap: bool,
    #[validate(range(min = 0.0, max = 1.0))]
    pub lower_quantile: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub upper_quantile: f64,
    #[validate(range(min = 0.0))]
    pub multiplier: f64,
}

impl Default for OutlierSettings {
    fn default() -> Self {
        Self {
            cap: false,
            lower_quantile: 0.25,
            upper_quantile: 0.75,
            multiplier: 1.5,
        }
    }
}

fn validate_quantile_order(settings: &OutlierSettings) -> std::result::Result<(), ValidationError> {
    if settings.lower_quantile >= settings.upper_quantile {
        return Err(ValidationError::new("lower_quantile_not_below_upper"));
    }
    Ok(())
}

// ===== Input Layout =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct DataSettings {
    #[validate(length(min = 1))]
    pub control_sheet: String,
    #[validate(length(min = 1))]
    pub test_sheet: String,
    /// Group column of a merged CSV table.
    #[validate(length(min = 1))]
    pub group_column: String,
    #[validate(length(min = 1))]
    pub control_label: String,
    #[validate(length(min = 1))]
    pub test_label: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            control_sheet: "Control Group".to_string(),
            test_sheet: "Test Group".to_string(),
            group_column: "Group".to_string(),
            control_label: "Control".to_string(),
            test_label: "Test".to_string(),
        }
    }
}

// ===== Logging =====

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
}
