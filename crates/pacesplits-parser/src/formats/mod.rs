mod common;
mod full_split;
pub mod schema;
mod time_in_only;

pub use common::{ColumnLayout, ColumnRole};
pub use full_split::FullSplitParser;
pub use time_in_only::TimeInOnlyParser;
