use bidding_ab_core::{CoreError, DataSettings, ExperimentTable, Group, Result, SampleSource};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::PathBuf;

use crate::columns::{parse_number, ColumnLayout, RecordCollector};

/// A single merged CSV table where a group column labels each row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    group_column: String,
    control_label: String,
    test_label: String,
}

impl CsvSource {
    pub fn new(
        path: impl Into<PathBuf>,
        group_column: impl Into<String>,
        control_label: impl Into<String>,
        test_label: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            group_column: group_column.into(),
            control_label: control_label.into(),
            test_label: test_label.into(),
        }
    }

    pub fn from_settings(path: impl Into<PathBuf>, settings: &DataSettings) -> Self {
        Self::new(
            path,
            &settings.group_column,
            &settings.control_label,
            &settings.test_label,
        )
    }

    fn group_for(&self, label: &str, row: usize) -> Result<Group> {
        if label.eq_ignore_ascii_case(&self.control_label) {
            Ok(Group::Control)
        } else if label.eq_ignore_ascii_case(&self.test_label) {
            Ok(Group::Test)
        } else {
            Err(CoreError::Parse(format!(
                "{} row {}: unknown group label '{}' (expected '{}' or '{}')",
                self.path.display(),
                row,
                label,
                self.control_label,
                self.test_label
            )))
        }
    }

    fn group_column_index(&self, headers: &StringRecord) -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(&self.group_column))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "{} has no '{}' column",
                    self.path.display(),
                    self.group_column
                ))
            })
    }
}

impl SampleSource for CsvSource {
    fn load(&self) -> Result<ExperimentTable> {
        tracing::info!(path = %self.path.display(), "Opening CSV table");

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(&self.path)
            .map_err(|e| CoreError::Csv(format!("Failed to open {}: {}", self.path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| CoreError::Csv(e.to_string()))?
            .clone();
        let origin = self.path.display().to_string();
        let layout = ColumnLayout::from_headers(headers.iter(), &origin)?;
        let group_index = self.group_column_index(&headers)?;

        let mut control = RecordCollector::new(Group::Control, self.control_label.clone());
        let mut test = RecordCollector::new(Group::Test, self.test_label.clone());

        for (offset, record) in reader.records().enumerate() {
            let record = record.map_err(|e| CoreError::Csv(e.to_string()))?;
            // Header is line 1
            let row = offset + 2;

            let mut values = [None; 4];
            for ((metric, index), slot) in layout.columns().zip(values.iter_mut()) {
                *slot = match record.get(index) {
                    Some(text) => parse_number(text, &origin, row, metric)?,
                    None => None,
                };
            }

            let label = record.get(group_index).unwrap_or_default();
            if label.is_empty() && values.iter().all(Option::is_none) {
                continue;
            }
            match self.group_for(label, row)? {
                Group::Control => control.push(values),
                Group::Test => test.push(values),
            }
        }

        let (control, control_stats) = control.finish();
        let (test, test_stats) = test.finish();
        ExperimentTable::concat(control, test, vec![control_stats, test_stats])
    }

    fn describe(&self) -> String {
        format!(
            "CSV table {} (column '{}': '{}' vs '{}')",
            self.path.display(),
            self.group_column,
            self.control_label,
            self.test_label
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> CsvSource {
        CsvSource::new("merged.csv", "Group", "Control", "Test")
    }

    #[test]
    fn test_group_labels_ignore_case() {
        assert_eq!(source().group_for("control", 2).unwrap(), Group::Control);
        assert_eq!(source().group_for("TEST", 3).unwrap(), Group::Test);
    }

    #[test]
    fn test_unknown_label() {
        let err = source().group_for("Holdout", 4).unwrap_err();
        assert!(err.to_string().contains("unknown group label 'Holdout'"));
    }

    #[test]
    fn test_group_column_lookup() {
        let headers = StringRecord::from(vec!["Impression", " group ", "Click"]);
        assert_eq!(source().group_column_index(&headers).unwrap(), 1);

        let headers = StringRecord::from(vec!["Impression", "Click"]);
        assert!(source().group_column_index(&headers).is_err());
    }
}
