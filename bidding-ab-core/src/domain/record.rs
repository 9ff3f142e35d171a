use serde::{Deserialize, Serialize};

use super::group::Group;
use super::metric::Metric;
use crate::error::{CoreError, Result};

// ===== Records =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CampaignRecord {
    pub impression: f64,
    pub click: f64,
    pub purchase: f64,
    pub earning: f64,
}

impl CampaignRecord {
    pub fn new(impression: f64, click: f64, purchase: f64, earning: f64) -> Self {
        Self {
            impression,
            click,
            purchase,
            earning,
        }
    }

    /// Builds a record from the four base columns in `Metric::BASE` order.
    pub fn from_base_values(values: [f64; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LabeledRecord {
    pub group: Group,
    #[serde(flatten)]
    pub record: CampaignRecord,
}

// ===== Load bookkeeping =====

/// Per-column count of blank cells seen while loading one group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingValues {
    pub impression: usize,
    pub click: usize,
    pub purchase: usize,
    pub earning: usize,
}

impl MissingValues {
    pub fn record(&mut self, metric: Metric) {
        match metric {
            Metric::Impression => self.impression += 1,
            Metric::Click => self.click += 1,
            Metric::Purchase => self.purchase += 1,
            Metric::Earning => self.earning += 1,
            Metric::ClickThroughRate | Metric::ConversionRate => {}
        }
    }

    pub fn get(&self, metric: Metric) -> usize {
        match metric {
            Metric::Impression => self.impression,
            Metric::Click => self.click,
            Metric::Purchase => self.purchase,
            Metric::Earning => self.earning,
            Metric::ClickThroughRate | Metric::ConversionRate => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.impression + self.click + self.purchase + self.earning
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupLoadStats {
    pub group: Group,
    /// Where the rows came from, e.g. a sheet name.
    pub origin: String,
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub missing: MissingValues,
}

impl GroupLoadStats {
    pub fn new(group: Group, origin: impl Into<String>) -> Self {
        Self {
            group,
            origin: origin.into(),
            rows_loaded: 0,
            rows_dropped: 0,
            missing: MissingValues::default(),
        }
    }
}

// ===== Experiment Table =====

/// Concatenation of both arms, control rows first. Read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentTable {
    records: Vec<LabeledRecord>,
    load_stats: Vec<GroupLoadStats>,
}

impl ExperimentTable {
    pub fn concat(
        control: Vec<CampaignRecord>,
        test: Vec<CampaignRecord>,
        load_stats: Vec<GroupLoadStats>,
    ) -> Result<Self> {
        for (group, rows) in [(Group::Control, &control), (Group::Test, &test)] {
            if rows.is_empty() {
                return Err(CoreError::InsufficientData(format!(
                    "{} group contains no complete records",
                    group
                )));
            }
        }

        let records = control
            .into_iter()
            .map(|record| LabeledRecord {
                group: Group::Control,
                record,
            })
            .chain(test.into_iter().map(|record| LabeledRecord {
                group: Group::Test,
                record,
            }))
            .collect();

        Ok(Self {
            records,
            load_stats,
        })
    }

    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn group_records(&self, group: Group) -> impl Iterator<Item = &CampaignRecord> {
        self.records
            .iter()
            .filter(move |r| r.group == group)
            .map(|r| &r.record)
    }

    pub fn group_len(&self, group: Group) -> usize {
        self.group_records(group).count()
    }

    /// Distinct group labels in table order.
    pub fn groups(&self) -> Vec<Group> {
        let mut seen = Vec::new();
        for r in &self.records {
            if !seen.contains(&r.group) {
                seen.push(r.group);
            }
        }
        seen
    }

    /// Values of `metric` for one group, skipping records where it is undefined.
    pub fn sample(&self, group: Group, metric: Metric) -> Vec<f64> {
        self.group_records(group)
            .filter_map(|r| metric.value(r))
            .collect()
    }

    pub fn load_stats(&self, group: Group) -> Option<&GroupLoadStats> {
        self.load_stats.iter().find(|s| s.group == group)
    }
}
