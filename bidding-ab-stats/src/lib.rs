pub mod aggregators;
pub mod analysis;
pub mod describe;
pub mod outliers;
pub mod selection;
pub mod statistical;

pub use aggregators::*;
pub use analysis::*;
pub use describe::*;
pub use outliers::*;
pub use selection::*;
pub use statistical::*;
