use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::process::unpivot::LongRow;

/// One (country, year column) key with one value slot per distinct series.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow<'a> {
    pub country_name: &'a str,
    pub country_code: &'a str,
    pub year_label: &'a str,
    /// Aligned with `PivotTable::series`.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable<'a> {
    /// Distinct `Series Name`s in first-appearance order.
    pub series: Vec<&'a str>,
    /// Rows in first-appearance order of their key.
    pub rows: Vec<PivotRow<'a>>,
    /// Cells seen more than once; the first value was kept.
    pub duplicate_cells: usize,
}

/// Re-key long rows by (country name, country code, year label) with one
/// column per series.
pub fn pivot<'a>(long: &[LongRow<'a>]) -> PivotTable<'a> {
    let mut series: Vec<&'a str> = Vec::new();
    let mut series_idx: HashMap<&'a str, usize> = HashMap::new();
    for r in long {
        series_idx.entry(r.series_name).or_insert_with(|| {
            series.push(r.series_name);
            series.len() - 1
        });
    }

    let mut rows: Vec<PivotRow<'a>> = Vec::new();
    let mut row_idx: HashMap<(&'a str, &'a str, &'a str), usize> = HashMap::new();
    let mut filled: HashSet<(usize, usize)> = HashSet::new();
    let mut duplicate_cells = 0;

    for r in long {
        let key = (r.country_name, r.country_code, r.year_label);
        let ri = *row_idx.entry(key).or_insert_with(|| {
            rows.push(PivotRow {
                country_name: r.country_name,
                country_code: r.country_code,
                year_label: r.year_label,
                values: vec![None; series.len()],
            });
            rows.len() - 1
        });
        let si = series_idx[r.series_name];

        if !filled.insert((ri, si)) {
            duplicate_cells += 1;
            warn!(
                country = r.country_code,
                year = r.year_label,
                series = r.series_name,
                "duplicate cell; keeping first value"
            );
            continue;
        }
        rows[ri].values[si] = r.rate;
    }

    PivotTable {
        series,
        rows,
        duplicate_cells,
    }
}
