use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::record::CampaignRecord;
use crate::error::CoreError;

/// Outcome measured per campaign record.
///
/// The four base metrics are read straight from the input; the two ratio
/// metrics are derived per record and are undefined when their denominator
/// is zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Impression,
    Click,
    #[default]
    Purchase,
    Earning,
    ClickThroughRate,
    ConversionRate,
}

impl Metric {
    pub const BASE: [Metric; 4] = [
        Metric::Impression,
        Metric::Click,
        Metric::Purchase,
        Metric::Earning,
    ];

    pub const ALL: [Metric; 6] = [
        Metric::Impression,
        Metric::Click,
        Metric::Purchase,
        Metric::Earning,
        Metric::ClickThroughRate,
        Metric::ConversionRate,
    ];

    /// Column header used by the input sheets.
    pub fn column_name(&self) -> &'static str {
        match self {
            Metric::Impression => "Impression",
            Metric::Click => "Click",
            Metric::Purchase => "Purchase",
            Metric::Earning => "Earning",
            Metric::ClickThroughRate => "CTR",
            Metric::ConversionRate => "ConversionRate",
        }
    }

    pub fn value(&self, record: &CampaignRecord) -> Option<f64> {
        match self {
            Metric::Impression => Some(record.impression),
            Metric::Click => Some(record.click),
            Metric::Purchase => Some(record.purchase),
            Metric::Earning => Some(record.earning),
            Metric::ClickThroughRate => ratio(record.click, record.impression),
            Metric::ConversionRate => ratio(record.purchase, record.click),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "impression" | "impressions" => Ok(Metric::Impression),
            "click" | "clicks" => Ok(Metric::Click),
            "purchase" | "purchases" => Ok(Metric::Purchase),
            "earning" | "earnings" => Ok(Metric::Earning),
            "ctr" | "click_through_rate" => Ok(Metric::ClickThroughRate),
            "conversion_rate" | "conversionrate" | "cr" => Ok(Metric::ConversionRate),
            _ => Err(CoreError::Validation(format!(
                "Unknown metric: {}. Valid metrics: impression, click, purchase, earning, ctr, conversion_rate",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric_aliases() {
        assert_eq!("Purchase".parse::<Metric>().unwrap(), Metric::Purchase);
        assert_eq!("earnings".parse::<Metric>().unwrap(), Metric::Earning);
        assert_eq!("click-through-rate".parse::<Metric>().unwrap(), Metric::ClickThroughRate);
        assert!("revenue".parse::<Metric>().is_err());
    }

    #[test]
    fn test_derived_metric_zero_denominator() {
        let record = CampaignRecord::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(Metric::ClickThroughRate.value(&record), None);
        assert_eq!(Metric::ConversionRate.value(&record), None);
        assert_eq!(Metric::Purchase.value(&record), Some(0.0));
    }
}
