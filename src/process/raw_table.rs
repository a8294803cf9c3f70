use csv::ReaderBuilder;
use std::{
    io::{Cursor, Read},
    path::Path,
};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::ReshapeError;
use crate::process::utils::{clean_header, clean_str, parse_rate};
use crate::schema::STRUCTURAL_COLUMNS;

/// Preferred entry inside a World-Bank bulk download archive.
pub const DEFAULT_ZIP_ENTRY: &str = "WDICSV.csv";

/// One source row: a (country, series) pair with one value per year column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawIndicatorRow {
    pub country_name: String,
    pub country_code: String,
    pub series_name: String,
    pub series_code: String,
    /// Aligned with `RawTable::year_labels`.
    pub values: Vec<Option<f64>>,
}

/// The wide source table as read from disk, before any reshaping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Every non-structural header, in file order (e.g. `1990 [YR1990]`).
    pub year_labels: Vec<String>,
    pub rows: Vec<RawIndicatorRow>,
}

impl RawTable {
    /// Parse a delimited source. Records past `row_limit` are never parsed.
    pub fn from_reader<R: Read>(reader: R, row_limit: Option<usize>) -> Result<Self, ReshapeError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(clean_header).collect();
        if headers.is_empty() {
            return Err(ReshapeError::EmptySource);
        }

        let indices: Vec<Option<usize>> = STRUCTURAL_COLUMNS
            .iter()
            .map(|c| headers.iter().position(|h| h == c))
            .collect();
        let missing: Vec<String> = STRUCTURAL_COLUMNS
            .iter()
            .zip(&indices)
            .filter(|(_, idx)| idx.is_none())
            .map(|(c, _)| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ReshapeError::SourceFormat { missing });
        }
        // order follows STRUCTURAL_COLUMNS: name, code, series name, series code
        let structural: Vec<usize> = indices.into_iter().flatten().collect();
        let (name_idx, code_idx, series_idx, scode_idx) =
            (structural[0], structural[1], structural[2], structural[3]);

        let year_columns: Vec<usize> = (0..headers.len())
            .filter(|i| !structural.contains(i))
            .collect();
        let year_labels: Vec<String> = year_columns.iter().map(|&i| headers[i].clone()).collect();

        let limit = row_limit.unwrap_or(usize::MAX);
        let mut rows = Vec::new();
        for result in rdr.records().take(limit) {
            let record = result?;
            let text = |i: usize| record.get(i).map(clean_str).unwrap_or_default();
            rows.push(RawIndicatorRow {
                country_name: text(name_idx),
                country_code: text(code_idx),
                series_name: text(series_idx),
                series_code: text(scode_idx),
                values: year_columns
                    .iter()
                    .map(|&i| record.get(i).and_then(parse_rate))
                    .collect(),
            });
        }

        debug!(
            rows = rows.len(),
            year_columns = year_labels.len(),
            "parsed source table"
        );
        Ok(RawTable { year_labels, rows })
    }

    /// Parse source bytes, unpacking a `.zip` archive when `path` names one.
    #[tracing::instrument(level = "info", skip(bytes), fields(path = %path.display(), bytes = bytes.len()))]
    pub fn from_source_bytes(
        bytes: &[u8],
        path: &Path,
        zip_entry: Option<&str>,
        row_limit: Option<usize>,
    ) -> Result<Self, ReshapeError> {
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("zip"));

        if is_zip {
            let (entry, csv) = read_zip_entry(bytes, path, zip_entry)?;
            info!(entry = %entry, "reading archive entry");
            Self::from_reader(Cursor::new(csv), row_limit)
        } else {
            Self::from_reader(Cursor::new(bytes), row_limit)
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Buffer one `.csv` entry: the requested one, else `WDICSV.csv`, else the
/// first `.csv` in archive order.
fn read_zip_entry(
    bytes: &[u8],
    path: &Path,
    wanted: Option<&str>,
) -> Result<(String, Vec<u8>), ReshapeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut names = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_file() && entry.name().to_lowercase().ends_with(".csv") {
            names.push(entry.name().to_string());
        }
    }

    let chosen = match wanted {
        Some(w) => names.iter().find(|n| n.as_str() == w).cloned(),
        None => names
            .iter()
            .find(|n| file_name_of(n) == DEFAULT_ZIP_ENTRY)
            .or_else(|| names.first())
            .cloned(),
    };
    let Some(name) = chosen else {
        return Err(ReshapeError::NoCsvEntry {
            archive: path.display().to_string(),
        });
    };

    let mut entry = archive.by_name(&name)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok((name, buf))
}

fn file_name_of(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    const SAMPLE: &str = "\
Country Name,Country Code,Series Name,Series Code,1990 [YR1990],1991 [YR1991]
Kenya,KEN,Access to electricity (% of population),EG.ELC.ACCS.ZS,..,12.5
Italy,ITA,Access to electricity (% of population),EG.ELC.ACCS.ZS,100,100
";

    #[test]
    fn parses_structural_and_year_columns() -> Result<()> {
        let t = RawTable::from_reader(SAMPLE.as_bytes(), None)?;
        assert_eq!(t.year_labels, vec!["1990 [YR1990]", "1991 [YR1991]"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[0].country_code, "KEN");
        assert_eq!(t.rows[0].values, vec![None, Some(12.5)]);
        assert_eq!(t.rows[1].values, vec![Some(100.0), Some(100.0)]);
        Ok(())
    }

    #[test]
    fn structural_columns_found_by_name() -> Result<()> {
        let src = "Series Code,1990,Country Code,Series Name,Country Name\nX,1.5,KEN,S,Kenya\n";
        let t = RawTable::from_reader(src.as_bytes(), None)?;
        assert_eq!(t.year_labels, vec!["1990"]);
        assert_eq!(t.rows[0].country_name, "Kenya");
        assert_eq!(t.rows[0].series_code, "X");
        assert_eq!(t.rows[0].values, vec![Some(1.5)]);
        Ok(())
    }

    #[test]
    fn missing_structural_column_is_fatal() {
        let src = "Country Name,Country Code,Series Name,1990\nKenya,KEN,S,1\n";
        match RawTable::from_reader(src.as_bytes(), None) {
            Err(ReshapeError::SourceFormat { missing }) => {
                assert_eq!(missing, vec!["Series Code".to_string()])
            }
            other => panic!("expected SourceFormat, got {:?}", other),
        }
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(matches!(
            RawTable::from_reader("".as_bytes(), None),
            Err(ReshapeError::EmptySource)
        ));
    }

    #[test]
    fn row_limit_stops_before_footer() -> Result<()> {
        let src = format!(
            "{}\n\nData from database: World Development Indicators\nLast Updated: 12/16/2024\n",
            SAMPLE.trim_end()
        );
        let t = RawTable::from_reader(src.as_bytes(), Some(2))?;
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[1].country_name, "Italy");
        Ok(())
    }

    #[test]
    fn ragged_records_pad_with_missing() -> Result<()> {
        let src = "Country Name,Country Code,Series Name,Series Code,1990,1991\nKenya,KEN,S,C,4\n";
        let t = RawTable::from_reader(src.as_bytes(), None)?;
        assert_eq!(t.rows[0].values, vec![Some(4.0), None]);
        Ok(())
    }

    fn zip_with(entries: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, content) in entries {
                zip.start_file(*name, options)?;
                zip.write_all(content.as_bytes())?;
            }
            zip.finish()?;
        }
        Ok(buf)
    }

    #[test]
    fn zip_prefers_wdicsv_entry() -> Result<()> {
        let bytes = zip_with(&[
            ("WDICountry.csv", "Code,Name\nKEN,Kenya\n"),
            ("WDICSV.csv", SAMPLE),
        ])?;
        let t = RawTable::from_source_bytes(&bytes, Path::new("WDI_CSV.zip"), None, None)?;
        assert_eq!(t.len(), 2);
        Ok(())
    }

    #[test]
    fn zip_named_entry_and_missing_entry() -> Result<()> {
        let bytes = zip_with(&[("data/extract.csv", SAMPLE), ("readme.txt", "hi")])?;
        let t = RawTable::from_source_bytes(
            &bytes,
            Path::new("bulk.ZIP"),
            Some("data/extract.csv"),
            Some(1),
        )?;
        assert_eq!(t.len(), 1);

        let err = RawTable::from_source_bytes(&bytes, Path::new("bulk.zip"), Some("nope.csv"), None)
            .unwrap_err();
        assert!(matches!(err, ReshapeError::NoCsvEntry { .. }));
        Ok(())
    }
}
