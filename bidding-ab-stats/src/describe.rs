//! Per-arm exploration: shape, missing values, summaries, quantiles and outliers.

use bidding_ab_core::{ExperimentTable, Group, Metric, MissingValues, OutlierSettings, Result};
use serde::{Deserialize, Serialize};

use crate::aggregators::{Aggregator, DescriptiveSummary, GroupTotals, QuantilePoint, EXPLORATION_QUANTILES};
use crate::outliers::{count_outliers, OutlierThresholds};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricOverview {
    pub metric: Metric,
    pub summary: DescriptiveSummary,
    pub quantiles: Vec<QuantilePoint>,
    pub thresholds: OutlierThresholds,
    pub outliers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOverview {
    pub group: Group,
    pub origin: Option<String>,
    pub rows: usize,
    pub rows_dropped: usize,
    pub missing: MissingValues,
    pub totals: GroupTotals,
    pub metrics: Vec<MetricOverview>,
}

impl GroupOverview {
    pub fn metric(&self, metric: Metric) -> Option<&MetricOverview> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

pub fn describe_group(
    table: &ExperimentTable,
    group: Group,
    outliers: &OutlierSettings,
) -> Result<GroupOverview> {
    let stats = table.load_stats(group);

    let metrics = Metric::ALL
        .iter()
        .map(|&metric| {
            let values = table.sample(group, metric);
            let thresholds = OutlierThresholds::from_settings(&values, outliers)?;
            Ok(MetricOverview {
                metric,
                summary: Aggregator::describe(&values),
                quantiles: Aggregator::quantiles(&values, &EXPLORATION_QUANTILES),
                outliers: count_outliers(&values, &thresholds),
                thresholds,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GroupOverview {
        group,
        origin: stats.map(|s| s.origin.clone()),
        rows: table.group_len(group),
        rows_dropped: stats.map(|s| s.rows_dropped).unwrap_or(0),
        missing: stats.map(|s| s.missing).unwrap_or_default(),
        totals: Aggregator::totals(table.group_records(group))?,
        metrics,
    })
}

pub fn describe_table(table: &ExperimentTable, outliers: &OutlierSettings) -> Result<Vec<GroupOverview>> {
    table
        .groups()
        .into_iter()
        .map(|group| {
            tracing::debug!(%group, "Describing group");
            describe_group(table, group, outliers)
        })
        .collect()
}
