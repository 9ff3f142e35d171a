use crate::domain::ExperimentTable;
use crate::error::Result;

/// Anything that can produce the labeled control/test table.
pub trait SampleSource {
    fn load(&self) -> Result<ExperimentTable>;

    /// Short human-readable description used in logs and reports.
    fn describe(&self) -> String;
}
