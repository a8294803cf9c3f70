use anyhow::{bail, Context, Result};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{collections::BTreeMap, env, fs::File, path::Path};
use wdicrunch::{
    cache::snapshot::read_snapshot,
    process::WorldRows,
    schema::{SeriesField, WideRow},
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        bail!("Usage: {} <SNAPSHOT.parquet>", args[0]);
    }
    let path = Path::new(&args[1]);
    print_metadata(path)?;
    print_contents(path)
}

/// File-level metadata plus per-column null counts summed over row groups.
fn print_metadata(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = SerializedFileReader::new(file)?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    println!("=== Snapshot: {} ===", path.display());
    println!(
        "Created by:           {}",
        file_meta.created_by().unwrap_or("<unknown>")
    );
    println!("Total rows:           {}", file_meta.num_rows());
    println!("Row groups:           {}", meta.num_row_groups());
    println!("Size on disk:         {} bytes", std::fs::metadata(path)?.len());
    println!();

    println!("=== Columns ===");
    for (idx, col) in file_meta.schema_descr().columns().iter().enumerate() {
        let mut nulls = 0u64;
        let mut compressed = 0i64;
        let mut compression = String::from("<none>");
        for rg in meta.row_groups() {
            let chunk = rg.column(idx);
            compressed += chunk.compressed_size();
            compression = format!("{:?}", chunk.compression());
            if let Some(n) = chunk.statistics().and_then(|s| s.null_count_opt()) {
                nulls += n;
            }
        }
        println!(
            "- {:<16} | {:<10} | {:<8} | nulls: {:>6} | {} bytes",
            col.name(),
            format!("{:?}", col.physical_type()),
            compression,
            nulls,
            compressed
        );
    }
    println!();
    Ok(())
}

/// Row counts per continent and value coverage per series.
fn print_contents(path: &Path) -> Result<()> {
    let table = read_snapshot(path, WorldRows::Inline)?;
    let rows: Vec<&WideRow> = table.all_rows().collect();

    let mut by_continent: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &rows {
        *by_continent
            .entry(r.continent.map_or("<none>", |c| c.as_str()))
            .or_insert(0) += 1;
    }
    println!("=== Continents ===");
    for (continent, n) in &by_continent {
        println!("- {:<16} {:>6}", continent, n);
    }
    println!();

    let years = rows.iter().map(|r| r.year);
    if let (Some(lo), Some(hi)) = (years.clone().min(), years.max()) {
        println!("Years: {} - {}", lo, hi);
    }
    println!("=== Series coverage ===");
    for f in SeriesField::ALL {
        let present = rows.iter().filter(|r| r.get(f).is_some()).count();
        println!("- {:<16} {:>6} / {}", f.column(), present, rows.len());
    }
    Ok(())
}
