//! Header matching and row accumulation shared by every tabular source.

use bidding_ab_core::{CampaignRecord, CoreError, Group, GroupLoadStats, Metric, Result};

/// Positions of the four base columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnLayout {
    indices: [usize; 4],
}

impl ColumnLayout {
    /// Matches column names case-insensitively, ignoring surrounding
    /// whitespace. Unrelated columns (such as an index column) are ignored.
    pub(crate) fn from_headers<'a, I>(headers: I, origin: &str) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let mut indices = [0usize; 4];
        let mut missing = Vec::new();
        for (slot, metric) in indices.iter_mut().zip(Metric::BASE) {
            let wanted = metric.column_name().to_lowercase();
            match headers.iter().position(|h| *h == wanted) {
                Some(index) => *slot = index,
                None => missing.push(metric.column_name()),
            }
        }

        if !missing.is_empty() {
            return Err(CoreError::Validation(format!(
                "{} is missing required column(s): {}",
                origin,
                missing.join(", ")
            )));
        }

        Ok(Self { indices })
    }

    /// Base metrics paired with their column positions.
    pub(crate) fn columns(&self) -> impl Iterator<Item = (Metric, usize)> + '_ {
        Metric::BASE.into_iter().zip(self.indices.iter().copied())
    }
}

/// Collects complete rows for one group and counts the incomplete ones.
#[derive(Debug)]
pub(crate) struct RecordCollector {
    records: Vec<CampaignRecord>,
    stats: GroupLoadStats,
}

impl RecordCollector {
    pub(crate) fn new(group: Group, origin: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            stats: GroupLoadStats::new(group, origin),
        }
    }

    /// Blank rows are skipped silently; rows with some but not all values
    /// are dropped and their missing cells counted per column.
    pub(crate) fn push(&mut self, values: [Option<f64>; 4]) {
        if values.iter().all(Option::is_none) {
            return;
        }

        match values {
            [Some(impression), Some(click), Some(purchase), Some(earning)] => {
                self.records
                    .push(CampaignRecord::new(impression, click, purchase, earning));
                self.stats.rows_loaded += 1;
            }
            _ => {
                for (metric, value) in Metric::BASE.into_iter().zip(values) {
                    if value.is_none() {
                        self.stats.missing.record(metric);
                    }
                }
                self.stats.rows_dropped += 1;
            }
        }
    }

    pub(crate) fn finish(self) -> (Vec<CampaignRecord>, GroupLoadStats) {
        if self.stats.rows_dropped > 0 {
            tracing::warn!(
                group = %self.stats.group,
                origin = %self.stats.origin,
                dropped = self.stats.rows_dropped,
                missing = self.stats.missing.total(),
                "Dropped rows with missing values"
            );
        }
        tracing::debug!(
            group = %self.stats.group,
            rows = self.stats.rows_loaded,
            "Group loaded"
        );
        (self.records, self.stats)
    }
}

/// Textual spellings of a missing cell, matched case-sensitively after
/// trimming. Same set pandas reads as NaN by default.
const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parses a textual cell; blank text and missing markers count as missing.
pub(crate) fn parse_number(text: &str, origin: &str, row: usize, metric: Metric) -> Result<Option<f64>> {
    let text = text.trim();
    if text.is_empty() || MISSING_MARKERS.contains(&text) {
        return Ok(None);
    }

    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(CoreError::Parse(format!(
            "{} row {}, column {}: '{}' is not a number",
            origin,
            row,
            metric.column_name(),
            text
        ))),
    }
}
