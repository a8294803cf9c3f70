// src/cache/snapshot.rs

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Float64Builder, StringArray, StringBuilder},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::debug;

use crate::process::{CanonicalTable, WorldRows};
use crate::schema::{
    arrow::{
        canonical_schema, continent_column_index, series_column_index, COL_CONTINENT, COL_COUNTRY_CODE,
        COL_COUNTRY_NAME, COL_YEAR,
    },
    Continent, SeriesField, WideRow, Year,
};

/// Convert canonical rows into one RecordBatch laid out as `canonical_schema()`.
pub fn rows_to_batch<'a, I>(rows: I) -> Result<RecordBatch>
where
    I: IntoIterator<Item = &'a WideRow>,
{
    let mut names = StringBuilder::new();
    let mut codes = StringBuilder::new();
    let mut years = StringBuilder::new();
    let mut values: Vec<Float64Builder> =
        (0..SeriesField::COUNT).map(|_| Float64Builder::new()).collect();
    let mut continents = StringBuilder::new();

    for row in rows {
        names.append_value(&row.country_name);
        codes.append_value(&row.country_code);
        years.append_value(row.year.label());
        for (b, v) in values.iter_mut().zip(row.values.iter()) {
            b.append_option(*v);
        }
        continents.append_option(row.continent.map(|c| c.as_str()));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(SeriesField::COUNT + 4);
    columns.push(Arc::new(names.finish()));
    columns.push(Arc::new(codes.finish()));
    columns.push(Arc::new(years.finish()));
    for mut b in values {
        columns.push(Arc::new(b.finish()));
    }
    columns.push(Arc::new(continents.finish()));

    RecordBatch::try_new(canonical_schema(), columns).context("building canonical record batch")
}

fn string_column<'b>(batch: &'b RecordBatch, idx: usize, name: &str) -> Result<&'b StringArray> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("column `{}` is not Utf8", name))
}

/// Inverse of `rows_to_batch`. Rejects batches whose layout differs.
pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<WideRow>> {
    let expected = canonical_schema();
    if batch.schema().fields() != expected.fields() {
        return Err(anyhow!(
            "snapshot schema does not match canonical layout: {:?}",
            batch.schema()
        ));
    }

    let names = string_column(batch, 0, COL_COUNTRY_NAME)?;
    let codes = string_column(batch, 1, COL_COUNTRY_CODE)?;
    let years = string_column(batch, 2, COL_YEAR)?;
    let continents = string_column(batch, continent_column_index(), COL_CONTINENT)?;
    let values: Vec<&Float64Array> = SeriesField::ALL
        .iter()
        .map(|f| {
            batch
                .column(series_column_index(*f))
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| anyhow!("column `{}` is not Float64", f.column()))
        })
        .collect::<Result<_>>()?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let year = Year::from_label(years.value(i))
            .with_context(|| format!("bad year in snapshot row {}", i))?;
        let mut row = WideRow::new(names.value(i), codes.value(i), year);
        for (f, arr) in SeriesField::ALL.iter().zip(&values) {
            row.set(*f, (!arr.is_null(i)).then(|| arr.value(i)));
        }
        row.continent = if continents.is_null(i) {
            None
        } else {
            let name = continents.value(i);
            Some(
                Continent::from_name(name)
                    .ok_or_else(|| anyhow!("unknown continent `{}` in snapshot row {}", name, i))?,
            )
        };
        rows.push(row);
    }
    Ok(rows)
}

/// Write every row of `table` to `path` (tmp file, then rename).
pub fn write_snapshot(table: &CanonicalTable, path: &Path) -> Result<u64> {
    let batch = rows_to_batch(table.all_rows())?;
    let tmp = path.with_extension("parquet.tmp");

    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(&batch).context("writing snapshot batch")?;
    writer.close().context("closing parquet writer")?;

    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    let size = fs::metadata(path)?.len();
    debug!(path = %path.display(), rows = batch.num_rows(), bytes = size, "wrote snapshot");
    Ok(size)
}

/// Read a snapshot back, re-partitioning `World` rows per `mode`.
pub fn read_snapshot(path: &Path, mode: WorldRows) -> Result<CanonicalTable> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet metadata of {}", path.display()))?
        .with_batch_size(8192)
        .build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.context("reading snapshot batch")?;
        rows.extend(batch_to_rows(&batch)?);
    }
    debug!(path = %path.display(), rows = rows.len(), "read snapshot");
    Ok(CanonicalTable::from_rows(rows, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_rows() -> Vec<WideRow> {
        let y = |s: &str| Year::from_label(s).unwrap();
        let mut kenya = WideRow::new("Kenya", "KEN", y("2000"));
        kenya.set(SeriesField::TotalRate, Some(15.2));
        kenya.set(SeriesField::Gdp, Some(1195.41));
        kenya.continent = Some(Continent::Africa);

        let mut world = WideRow::new("World", "WLD", y("2000"));
        world.set(SeriesField::TotalRate, Some(78.0));
        world.continent = Some(Continent::World);

        let agg = WideRow::new("Arab World", "ARB", y("2001"));
        vec![kenya, world, agg]
    }

    #[test]
    fn snapshot_preserves_rows_and_nulls() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("table.parquet");
        let table = CanonicalTable::from_rows(sample_rows(), WorldRows::Split);

        write_snapshot(&table, &path)?;
        assert!(!path.with_extension("parquet.tmp").exists());

        let back = read_snapshot(&path, WorldRows::Split)?;
        assert_eq!(back, table);

        let inline = read_snapshot(&path, WorldRows::Inline)?;
        assert_eq!(inline.rows().len(), 3);
        assert_eq!(inline.world().count(), 1);
        Ok(())
    }

    #[test]
    fn batch_layout_checked() -> Result<()> {
        let batch = rows_to_batch(&sample_rows())?;
        assert_eq!(batch.num_rows(), 3);
        let projected = batch.project(&[0, 1, 2])?;
        assert!(batch_to_rows(&projected).is_err());
        Ok(())
    }
}
