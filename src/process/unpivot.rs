use rayon::prelude::*;

use crate::process::raw_table::RawTable;

/// One source cell: (country, series, year column) → value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongRow<'a> {
    pub country_name: &'a str,
    pub country_code: &'a str,
    pub series_name: &'a str,
    pub series_code: &'a str,
    pub year_label: &'a str,
    pub rate: Option<f64>,
}

/// Turn every year column into rows, year-column-major: all rows of the
/// first year column, then all rows of the next. Only the first
/// `row_limit` source rows take part.
pub fn unpivot(table: &RawTable, row_limit: Option<usize>) -> Vec<LongRow<'_>> {
    let rows = match row_limit {
        Some(limit) => &table.rows[..table.rows.len().min(limit)],
        None => &table.rows[..],
    };

    table
        .year_labels
        .par_iter()
        .enumerate()
        .flat_map_iter(move |(col, label)| {
            rows.iter().map(move |row| LongRow {
                country_name: &row.country_name,
                country_code: &row.country_code,
                series_name: &row.series_name,
                series_code: &row.series_code,
                year_label: label,
                rate: row.values.get(col).copied().flatten(),
            })
        })
        .collect()
}
