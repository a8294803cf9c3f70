// src/process/mod.rs
pub mod pivot;
pub mod raw_table;
pub mod unpivot;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::{
    collections::{hash_map::Entry, BTreeSet, HashMap},
    path::Path,
    str::FromStr,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::continent::ContinentResolver;
use crate::error::ReshapeError;
use crate::schema::{SeriesField, WideRow, Year};

pub use raw_table::{RawIndicatorRow, RawTable};

/// Number of source rows the World-Bank extract is cut to before reshaping.
pub const DEFAULT_ROW_LIMIT: usize = 1962;

/// Whether `World` rows are kept in the main table or split into their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldRows {
    #[default]
    Split,
    Inline,
}

impl WorldRows {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldRows::Split => "split",
            WorldRows::Inline => "inline",
        }
    }

}

impl FromStr for WorldRows {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "split" => Ok(WorldRows::Split),
            "inline" => Ok(WorldRows::Inline),
            other => Err(format!("expected `split` or `inline`, got `{}`", other)),
        }
    }
}

/// Knobs that change the canonical table; all of them feed the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReshapeOptions {
    pub row_limit: Option<usize>,
    pub world_rows: WorldRows,
    pub zip_entry: Option<String>,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        ReshapeOptions {
            row_limit: Some(DEFAULT_ROW_LIMIT),
            world_rows: WorldRows::Split,
            zip_entry: None,
        }
    }
}

/// The immutable, continent-annotated table every view reads from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    rows: Vec<WideRow>,
    /// `Some` in split mode, holding the `World` rows.
    world: Option<Vec<WideRow>>,
}

impl CanonicalTable {
    /// Partition `rows` according to `mode`, preserving row order.
    pub fn from_rows(rows: Vec<WideRow>, mode: WorldRows) -> Self {
        match mode {
            WorldRows::Inline => CanonicalTable { rows, world: None },
            WorldRows::Split => {
                let (world, rows): (Vec<_>, Vec<_>) = rows.into_iter().partition(|r| r.is_world());
                CanonicalTable {
                    rows,
                    world: Some(world),
                }
            }
        }
    }

    pub fn mode(&self) -> WorldRows {
        if self.world.is_some() {
            WorldRows::Split
        } else {
            WorldRows::Inline
        }
    }

    /// Main table: without `World` rows in split mode, with them inline.
    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    /// `World` rows in either mode.
    pub fn world(&self) -> impl Iterator<Item = &WideRow> + '_ {
        let (split, inline): (&[WideRow], &[WideRow]) = match &self.world {
            Some(w) => (w.as_slice(), &[][..]),
            None => (&[][..], self.rows.as_slice()),
        };
        split.iter().chain(inline.iter().filter(|r| r.is_world()))
    }

    /// Per-country rows; never yields `World`.
    pub fn country_rows(&self) -> impl Iterator<Item = &WideRow> + '_ {
        self.rows.iter().filter(|r| !r.is_world())
    }

    /// Every row, main table first.
    pub fn all_rows(&self) -> impl Iterator<Item = &WideRow> + '_ {
        self.rows.iter().chain(self.world.iter().flatten())
    }

    pub fn len(&self) -> usize {
        self.rows.len() + self.world.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the pipeline saw and discarded along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReshapeReport {
    pub raw_rows: usize,
    pub year_columns: usize,
    pub long_rows: usize,
    pub pivot_rows: usize,
    pub canonical_rows: usize,
    pub duplicate_cells: usize,
    /// Rows folded into an earlier row with the same (code, year).
    pub merged_rows: usize,
    pub rejected_labels: Vec<String>,
    pub dropped_series: Vec<String>,
    pub missing_fields: Vec<SeriesField>,
    pub unresolved_codes: Vec<String>,
}

/// Run every reshaping step over an already-parsed source table:
/// truncate → unpivot → pivot → rename → year → continent → world split.
#[tracing::instrument(level = "info", skip_all, fields(raw_rows = raw.len()))]
pub fn reshape(
    raw: &RawTable,
    resolver: &ContinentResolver,
    opts: &ReshapeOptions,
) -> (CanonicalTable, ReshapeReport) {
    let start = Instant::now();
    let mut report = ReshapeReport {
        raw_rows: raw.len(),
        year_columns: raw.year_labels.len(),
        ..Default::default()
    };

    // 1-2) truncate + unpivot
    let long = unpivot::unpivot(raw, opts.row_limit);
    report.long_rows = long.len();

    // 3) pivot
    let pivoted = pivot::pivot(&long);
    report.pivot_rows = pivoted.rows.len();
    report.duplicate_cells = pivoted.duplicate_cells;

    // 4) rename: map each pivoted series onto a canonical field, drop the rest
    let fields: Vec<Option<SeriesField>> = pivoted
        .series
        .iter()
        .map(|s| SeriesField::from_series_name(s))
        .collect();
    for (name, field) in pivoted.series.iter().zip(&fields) {
        if field.is_none() {
            debug!(series = %name, "dropping unmapped series");
            report.dropped_series.push(name.to_string());
        }
    }
    report.missing_fields = SeriesField::ALL
        .into_iter()
        .filter(|f| !fields.contains(&Some(*f)))
        .collect();
    if !report.missing_fields.is_empty() {
        debug!(missing = ?report.missing_fields, "series absent from source; fields stay null");
    }

    // 5) year labels, normalised once per distinct label
    let mut years: HashMap<&str, Option<Year>> = HashMap::new();
    // 6-7) continent join, overrides, merge
    let mut unresolved: BTreeSet<&str> = BTreeSet::new();

    let mut rows: Vec<WideRow> = Vec::with_capacity(pivoted.rows.len());
    let mut by_key: HashMap<(&str, Year), usize> = HashMap::new();
    for prow in &pivoted.rows {
        let year = *years.entry(prow.year_label).or_insert_with(|| {
            match Year::from_label(prow.year_label) {
                Ok(y) => Some(y),
                Err(e) => {
                    warn!(error = %e, "rejecting rows with malformed year label");
                    report.rejected_labels.push(prow.year_label.to_string());
                    None
                }
            }
        });
        let Some(year) = year else {
            continue;
        };

        let mut row = WideRow::new(prow.country_name, prow.country_code, year);
        for (value, field) in prow.values.iter().zip(&fields) {
            if let Some(f) = field {
                row.set(*f, *value);
            }
        }

        // one row per (code, year): later labels or names only fill gaps
        match by_key.entry((prow.country_code, year)) {
            Entry::Occupied(e) => {
                let kept = &mut rows[*e.get()];
                warn!(
                    country = prow.country_code,
                    name = prow.country_name,
                    kept_name = %kept.country_name,
                    year = prow.year_label,
                    "duplicate country/year; merging into first row"
                );
                for f in SeriesField::ALL {
                    if kept.get(f).is_none() {
                        kept.set(f, row.get(f));
                    }
                }
                report.merged_rows += 1;
                continue;
            }
            Entry::Vacant(v) => {
                v.insert(rows.len());
            }
        }

        row.continent = resolver.annotate(prow.country_name, prow.country_code);
        if row.continent.is_none() {
            unresolved.insert(prow.country_code);
        }
        rows.push(row);
    }
    report.unresolved_codes = unresolved.into_iter().map(str::to_string).collect();
    report.canonical_rows = rows.len();

    // 8) world rows
    let table = CanonicalTable::from_rows(rows, opts.world_rows);

    info!(
        rows = table.rows().len(),
        world = table.world().count(),
        dropped_series = report.dropped_series.len(),
        rejected_labels = report.rejected_labels.len(),
        merged_rows = report.merged_rows,
        unresolved = report.unresolved_codes.len(),
        elapsed = ?start.elapsed(),
        "canonical table built"
    );
    (table, report)
}

/// Parse `bytes` (plain CSV, or a ZIP when `path` ends in `.zip`) and reshape.
pub fn reshape_source(
    bytes: &[u8],
    path: &Path,
    resolver: &ContinentResolver,
    opts: &ReshapeOptions,
) -> Result<(CanonicalTable, ReshapeReport), ReshapeError> {
    let raw = RawTable::from_source_bytes(bytes, path, opts.zip_entry.as_deref(), opts.row_limit)?;
    Ok(reshape(&raw, resolver, opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Continent;
    use anyhow::Result;
    use std::collections::HashSet;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,wdicrunch::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    /// Two countries × two years × all nine series, plus one unmapped series.
    fn synthetic_source(skip: Option<SeriesField>) -> String {
        let mut out =
            String::from("Country Name,Country Code,Series Name,Series Code,2000 [YR2000],2001 [YR2001]\n");
        for (name, code, base) in [("Kenya", "KEN", 10.0), ("Italy", "ITA", 90.0)] {
            for (i, f) in SeriesField::ALL.iter().enumerate() {
                if Some(*f) == skip {
                    continue;
                }
                out.push_str(&format!(
                    "{},{},\"{}\",S{},{},{}\n",
                    name,
                    code,
                    f.series_name(),
                    i,
                    base + i as f64 + 0.25,
                    base + i as f64 + 0.5
                ));
            }
            out.push_str(&format!(
                "{},{},\"Population, total\",SP.POP.TOTL,1,2\n",
                name, code
            ));
        }
        out
    }

    fn run(src: &str, opts: &ReshapeOptions) -> Result<(CanonicalTable, ReshapeReport)> {
        Ok(reshape_source(
            src.as_bytes(),
            Path::new("WDICSV.csv"),
            &ContinentResolver::new(),
            opts,
        )?)
    }

    #[test]
    fn end_to_end_two_countries_two_years() -> Result<()> {
        init_test_logging();
        let (table, report) = run(&synthetic_source(None), &ReshapeOptions::default())?;

        assert_eq!(table.len(), 4);
        assert_eq!(report.pivot_rows, 4);
        assert!(report.missing_fields.is_empty());

        for row in table.rows() {
            let base = if row.country_code == "KEN" { 10.0 } else { 90.0 };
            let offset = if row.year.get() == 2000 { 0.25 } else { 0.5 };
            for (i, f) in SeriesField::ALL.iter().enumerate() {
                assert_eq!(row.get(*f), Some(base + i as f64 + offset));
            }
            let expected = if row.country_code == "KEN" {
                Continent::Africa
            } else {
                Continent::Europe
            };
            assert_eq!(row.continent, Some(expected));
        }
        Ok(())
    }

    #[test]
    fn unmapped_series_are_dropped() -> Result<()> {
        let (table, report) = run(&synthetic_source(None), &ReshapeOptions::default())?;
        assert_eq!(report.dropped_series, vec!["Population, total".to_string()]);
        assert_eq!(table.len(), 4);
        Ok(())
    }

    #[test]
    fn one_row_per_code_and_year() -> Result<()> {
        let (table, _) = run(&synthetic_source(None), &ReshapeOptions::default())?;
        let keys: HashSet<(String, Year)> = table
            .all_rows()
            .map(|r| (r.country_code.clone(), r.year))
            .collect();
        assert_eq!(keys.len(), table.len());
        Ok(())
    }

    #[test]
    fn missing_series_leaves_field_null() -> Result<()> {
        let (full, _) = run(&synthetic_source(None), &ReshapeOptions::default())?;
        let (partial, report) = run(
            &synthetic_source(Some(SeriesField::Nuclear)),
            &ReshapeOptions::default(),
        )?;
        assert_eq!(report.missing_fields, vec![SeriesField::Nuclear]);
        assert_eq!(partial.len(), full.len());
        for (a, b) in full.rows().iter().zip(partial.rows()) {
            assert_eq!(b.get(SeriesField::Nuclear), None);
            for f in SeriesField::ALL.iter().filter(|f| **f != SeriesField::Nuclear) {
                assert_eq!(a.get(*f), b.get(*f));
            }
        }
        Ok(())
    }

    #[test]
    fn row_limit_truncates_source() -> Result<()> {
        // Kenya contributes ten source rows; the limit keeps only those.
        let opts = ReshapeOptions {
            row_limit: Some(10),
            ..Default::default()
        };
        let (table, report) = run(&synthetic_source(None), &opts)?;
        assert_eq!(report.raw_rows, 10);
        assert!(table.rows().iter().all(|r| r.country_code == "KEN"));
        assert_eq!(table.len(), 2);
        Ok(())
    }

    #[test]
    fn malformed_year_labels_are_rejected() -> Result<()> {
        let src = "Country Name,Country Code,Series Name,Series Code,2000 [YR2000],99\n\
                   Kenya,KEN,Access to electricity (% of population),EG,1.5,2.5\n";
        let (table, report) = run(src, &ReshapeOptions::default())?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].year.label(), "2000");
        assert_eq!(report.rejected_labels, vec!["99".to_string()]);
        Ok(())
    }

    fn with_world() -> String {
        let mut src = synthetic_source(None);
        src.push_str("World,WLD,Access to electricity (% of population),EG,73.4,74.0\n");
        src
    }

    #[test]
    fn world_rows_split_by_default() -> Result<()> {
        let (table, _) = run(&with_world(), &ReshapeOptions::default())?;
        assert_eq!(table.mode(), WorldRows::Split);
        assert_eq!(table.rows().len(), 4);
        let world: Vec<_> = table.world().collect();
        assert_eq!(world.len(), 2);
        assert!(world.iter().all(|r| r.continent == Some(Continent::World)));
        assert_eq!(world[0].get(SeriesField::TotalRate), Some(73.4));
        Ok(())
    }

    #[test]
    fn world_rows_inline_are_still_reachable() -> Result<()> {
        let opts = ReshapeOptions {
            world_rows: WorldRows::Inline,
            ..Default::default()
        };
        let (table, _) = run(&with_world(), &opts)?;
        assert_eq!(table.rows().len(), 6);
        assert_eq!(table.world().count(), 2);
        assert_eq!(table.country_rows().count(), 4);
        assert!(table
            .world()
            .all(|r| r.continent == Some(Continent::World)));
        Ok(())
    }

    #[test]
    fn aggregates_have_no_continent() -> Result<()> {
        let mut src = synthetic_source(None);
        src.push_str("Sub-Saharan Africa,SSF,Access to electricity (% of population),EG,30,31\n");
        let (table, report) = run(&src, &ReshapeOptions::default())?;
        let ssf: Vec<_> = table
            .rows()
            .iter()
            .filter(|r| r.country_code == "SSF")
            .collect();
        assert_eq!(ssf.len(), 2);
        assert!(ssf.iter().all(|r| r.continent.is_none()));
        assert_eq!(report.unresolved_codes, vec!["SSF".to_string()]);
        Ok(())
    }

    #[test]
    fn repeated_year_prefix_merges_into_one_row() -> Result<()> {
        let src = "Country Name,Country Code,Series Name,Series Code,2000 [YR2000],2000,2001 [YR2001]\n\
                   Kenya,KEN,Access to electricity (% of population),EG,..,15.2,16.0\n\
                   Kenya,KEN,\"Access to electricity, rural (% of rural population)\",EG.R,4.5,9.9,5.0\n";
        let (table, report) = run(src, &ReshapeOptions::default())?;
        assert_eq!(table.len(), 2);
        assert_eq!(report.merged_rows, 1);

        let y2000 = &table.rows()[0];
        assert_eq!(y2000.year.label(), "2000");
        // gap filled from the second label, existing value kept from the first
        assert_eq!(y2000.get(SeriesField::TotalRate), Some(15.2));
        assert_eq!(y2000.get(SeriesField::RuralRate), Some(4.5));
        Ok(())
    }

    #[test]
    fn renamed_country_merges_by_code() -> Result<()> {
        let src = "Country Name,Country Code,Series Name,Series Code,2000 [YR2000]\n\
                   Turkey,TUR,Access to electricity (% of population),EG,100\n\
                   Turkiye,TUR,GDP per capita (constant 2015 US$),NY,4316.5\n";
        let (table, report) = run(src, &ReshapeOptions::default())?;
        assert_eq!(table.len(), 1);
        assert_eq!(report.merged_rows, 1);

        let row = &table.rows()[0];
        assert_eq!(row.country_name, "Turkey");
        assert_eq!(row.get(SeriesField::TotalRate), Some(100.0));
        assert_eq!(row.get(SeriesField::Gdp), Some(4316.5));
        assert_eq!(row.continent, Some(Continent::AsiaOceania));

        let keys: HashSet<(String, Year)> = table
            .all_rows()
            .map(|r| (r.country_code.clone(), r.year))
            .collect();
        assert_eq!(keys.len(), table.len());
        Ok(())
    }

    #[test]
    fn world_rows_parse_from_config_text() {
        assert_eq!(" Split ".parse::<WorldRows>(), Ok(WorldRows::Split));
        assert_eq!("inline".parse::<WorldRows>(), Ok(WorldRows::Inline));
        assert!("both".parse::<WorldRows>().is_err());
    }

    #[test]
    fn structural_error_surfaces() {
        let err = run("Country Name,Series Name\nKenya,S\n", &ReshapeOptions::default()).unwrap_err();
        let err = err.downcast::<ReshapeError>().unwrap();
        assert!(matches!(err, ReshapeError::SourceFormat { ref missing } if missing.len() == 2));
    }
}
