pub mod arrow;
pub mod series;
pub mod types;

pub use arrow::canonical_schema;
pub use series::SeriesField;
pub use types::{Continent, WideRow, Year, YearLabelError, STRUCTURAL_COLUMNS, WORLD};
