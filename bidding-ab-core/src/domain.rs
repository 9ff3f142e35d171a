pub mod group;
pub mod metric;
pub mod record;
pub mod config;

pub use group::*;
pub use metric::*;
pub use record::*;
pub use config::*;
