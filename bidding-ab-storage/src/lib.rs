mod columns;
pub mod delimited;
pub mod workbook;

pub use delimited::CsvSource;
pub use workbook::WorkbookSource;

use bidding_ab_core::{CoreError, DataSettings, Result, SampleSource};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Input layouts understood by [`open_source`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// One sheet per group.
    Workbook,
    /// One merged table with a group column.
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(SourceFormat::Workbook),
            "csv" => Ok(SourceFormat::Csv),
            other => Err(CoreError::Validation(format!(
                "Unsupported input format '{}' for {} (expected xlsx, xlsm, xls, xlsb, ods or csv)",
                other,
                path.display()
            ))),
        }
    }
}

/// Picks the source for `path` by its extension.
pub fn open_source(path: &Path, settings: &DataSettings) -> Result<Box<dyn SampleSource>> {
    let format = SourceFormat::from_path(path)?;
    if !path.exists() {
        return Err(CoreError::NotFound(format!(
            "Input file {} does not exist",
            path.display()
        )));
    }

    tracing::debug!(path = %path.display(), ?format, "Resolved input source");
    Ok(match format {
        SourceFormat::Workbook => Box::new(WorkbookSource::from_settings(path, settings)),
        SourceFormat::Csv => Box::new(CsvSource::from_settings(path, settings)),
    })
}
