use bidding_ab_core::{
    CampaignRecord, CoreError, DataSettings, ExperimentTable, Group, GroupLoadStats, Metric,
    Result, SampleSource,
};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crate::columns::{parse_number, ColumnLayout, RecordCollector};

/// A spreadsheet with one sheet per group (xlsx, xlsm, xls, xlsb or ods).
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
    control_sheet: String,
    test_sheet: String,
}

impl WorkbookSource {
    pub fn new(
        path: impl Into<PathBuf>,
        control_sheet: impl Into<String>,
        test_sheet: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            control_sheet: control_sheet.into(),
            test_sheet: test_sheet.into(),
        }
    }

    pub fn from_settings(path: impl Into<PathBuf>, settings: &DataSettings) -> Self {
        Self::new(path, &settings.control_sheet, &settings.test_sheet)
    }

    pub fn sheet_for(&self, group: Group) -> &str {
        match group {
            Group::Control => &self.control_sheet,
            Group::Test => &self.test_sheet,
        }
    }

    fn read_group(
        &self,
        workbook: &mut Sheets<BufReader<File>>,
        available: &[String],
        group: Group,
    ) -> Result<LoadedGroup> {
        let sheet = self.sheet_for(group);
        if !available.iter().any(|name| name == sheet) {
            return Err(CoreError::NotFound(format!(
                "Sheet '{}' not found in {} (available: {})",
                sheet,
                self.path.display(),
                available.join(", ")
            )));
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| CoreError::Workbook(format!("Failed to read sheet '{}': {}", sheet, e)))?;
        read_sheet(&range, group, sheet)
    }
}

impl SampleSource for WorkbookSource {
    fn load(&self) -> Result<ExperimentTable> {
        tracing::info!(path = %self.path.display(), "Opening workbook");

        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            CoreError::Workbook(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        let available = workbook.sheet_names();

        let (control, control_stats) = self.read_group(&mut workbook, &available, Group::Control)?;
        let (test, test_stats) = self.read_group(&mut workbook, &available, Group::Test)?;

        ExperimentTable::concat(control, test, vec![control_stats, test_stats])
    }

    fn describe(&self) -> String {
        format!(
            "workbook {} (sheets '{}' and '{}')",
            self.path.display(),
            self.control_sheet,
            self.test_sheet
        )
    }
}

type LoadedGroup = (Vec<CampaignRecord>, GroupLoadStats);

/// The first row of the sheet is the header; every later row is a record.
fn read_sheet(range: &Range<Data>, group: Group, sheet: &str) -> Result<LoadedGroup> {
    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| {
        CoreError::InsufficientData(format!("Sheet '{}' is empty", sheet))
    })?;

    let header_text: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();
    let layout = ColumnLayout::from_headers(header_text.iter().map(String::as_str), sheet)?;

    // Spreadsheet row numbers are 1-based and the header sits at the start row
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0) + 1;

    let mut collector = RecordCollector::new(group, sheet);
    for (offset, row) in rows.enumerate() {
        let row_number = first_row + offset + 1;
        let mut values = [None; 4];
        for ((metric, index), slot) in layout.columns().zip(values.iter_mut()) {
            *slot = match row.get(index) {
                Some(cell) => cell_value(cell, sheet, row_number, metric)?,
                None => None,
            };
        }
        collector.push(values);
    }

    Ok(collector.finish())
}

fn cell_value(cell: &Data, sheet: &str, row: usize, metric: Metric) -> Result<Option<f64>> {
    match cell {
        Data::Int(value) => Ok(Some(*value as f64)),
        Data::Float(value) => Ok(Some(*value)),
        Data::Empty => Ok(None),
        // #N/A, #DIV/0! and friends read as missing
        Data::Error(_) => Ok(None),
        Data::String(text) => parse_number(text, sheet, row, metric),
        other => Err(CoreError::Parse(format!(
            "{} row {}, column {}: unsupported cell value '{}'",
            sheet,
            row,
            metric.column_name(),
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Int(3), "s", 2, Metric::Click).unwrap(), Some(3.0));
        assert_eq!(cell_value(&Data::Float(2.5), "s", 2, Metric::Click).unwrap(), Some(2.5));
        assert_eq!(cell_value(&Data::Empty, "s", 2, Metric::Click).unwrap(), None);
        assert_eq!(
            cell_value(&Data::String("41.5".into()), "s", 2, Metric::Click).unwrap(),
            Some(41.5)
        );
        assert!(cell_value(&Data::Bool(true), "s", 2, Metric::Click).is_err());
    }

    #[test]
    fn test_sheet_for_group() {
        let source = WorkbookSource::new("ab.xlsx", "Control Group", "Test Group");
        assert_eq!(source.sheet_for(Group::Control), "Control Group");
        assert_eq!(source.sheet_for(Group::Test), "Test Group");
        assert!(source.describe().contains("ab.xlsx"));
    }
}
