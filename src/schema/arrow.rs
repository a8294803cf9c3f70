// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::series::SeriesField;

pub const COL_COUNTRY_NAME: &str = "country_name";
pub const COL_COUNTRY_CODE: &str = "country_code";
pub const COL_YEAR: &str = "year";
pub const COL_CONTINENT: &str = "continent";

/// Arrow schema of the canonical table:
/// - `country_name`, `country_code` → Utf8
/// - `year`                          → Utf8, always four digits
/// - one nullable Float64 per `SeriesField`, named by its short column
/// - `continent`                     → nullable Utf8
pub fn canonical_schema() -> Arc<ArrowSchema> {
    let mut fields = Vec::with_capacity(SeriesField::COUNT + 4);
    fields.push(ArrowField::new(COL_COUNTRY_NAME, DataType::Utf8, false));
    fields.push(ArrowField::new(COL_COUNTRY_CODE, DataType::Utf8, false));
    fields.push(ArrowField::new(COL_YEAR, DataType::Utf8, false));
    for f in SeriesField::ALL {
        fields.push(ArrowField::new(f.column(), DataType::Float64, true));
    }
    fields.push(ArrowField::new(COL_CONTINENT, DataType::Utf8, true));
    Arc::new(ArrowSchema::new(fields))
}

/// Position of a series column inside `canonical_schema()`.
pub fn series_column_index(field: SeriesField) -> usize {
    3 + field.index()
}

pub fn continent_column_index() -> usize {
    3 + SeriesField::COUNT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_indices() {
        let schema = canonical_schema();
        assert_eq!(schema.fields().len(), 13);
        for f in SeriesField::ALL {
            let fld = schema.field(series_column_index(f));
            assert_eq!(fld.name(), f.column());
            assert_eq!(fld.data_type(), &DataType::Float64);
            assert!(fld.is_nullable());
        }
        assert_eq!(schema.field(continent_column_index()).name(), COL_CONTINENT);
    }
}
