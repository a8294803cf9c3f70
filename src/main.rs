use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path, sync::Arc};
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use wdicrunch::{
    cache::{CacheOrigin, TableCache},
    config::Config,
    continent::ContinentResolver,
    fetch,
    process::CanonicalTable,
    schema::SeriesField,
    views::{self, YearRange, YearValue},
};

#[derive(Debug, Serialize)]
struct Summary<'a> {
    source: String,
    fingerprint: &'a str,
    origin: CacheOrigin,
    built_at: String,
    rows: usize,
    world_rows: usize,
    continents: BTreeMap<String, usize>,
    world_access: Vec<YearValue>,
    latest_year: Option<u16>,
    latest_year_countries: usize,
    report: Option<&'a wdicrunch::process::ReshapeReport>,
}

fn continent_counts(table: &CanonicalTable) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in table.country_rows() {
        let key = row
            .continent
            .map_or("unclassified", |c| c.as_str())
            .to_string();
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wdicrunch=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configure dirs ───────────────────────────────────────────
    let cfg = Config::from_env()?;
    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("could not create `{}`", cfg.output_dir.display()))?;

    // ─── 3) build or load the canonical table ────────────────────────
    let start = Instant::now();
    let resolver = Arc::new(ContinentResolver::new());
    let cache = match &cfg.cache_dir {
        Some(dir) => TableCache::with_snapshot_dir(Arc::clone(&resolver), dir)?,
        None => TableCache::in_memory(Arc::clone(&resolver)),
    };
    let cached = cache.get_or_build(&cfg.source, &cfg.reshape_options())?;
    let table = &cached.table;
    info!(
        origin = ?cached.origin,
        fingerprint = cached.fingerprint.short(),
        rows = table.len(),
        elapsed = ?start.elapsed(),
        "canonical table ready"
    );
    if let Some(report) = &cached.report {
        if !report.unresolved_codes.is_empty() {
            info!(codes = ?report.unresolved_codes, "rows without a continent");
        }
        if !report.missing_fields.is_empty() {
            warn!(fields = ?report.missing_fields, "series absent from source");
        }
    }
    match cache.prune() {
        Ok(n) if n > 0 => info!(removed = n, "pruned stale snapshots"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "snapshot prune failed"),
    }

    // ─── 4) summary ──────────────────────────────────────────────────
    let world_access = views::world_series(table, SeriesField::TotalRate, YearRange::ALL);
    let latest_year = world_access.iter().map(|p| p.year.get()).max();
    let latest_map = latest_year
        .map(|y| views::choropleth(table, SeriesField::TotalRate, y))
        .unwrap_or_default();

    let summary = Summary {
        source: cfg.source.display().to_string(),
        fingerprint: cached.fingerprint.as_str(),
        origin: cached.origin,
        built_at: cached.built_at.to_rfc3339(),
        rows: table.rows().len(),
        world_rows: table.world().count(),
        continents: continent_counts(table),
        world_access,
        latest_year,
        latest_year_countries: latest_map.len(),
        report: cached.report.as_deref(),
    };
    let summary_path = cfg.output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_vec_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    info!(path = %summary_path.display(), "wrote summary");

    // ─── 5) boundaries + latest-year access map ──────────────────────
    let Some(year) = latest_year else {
        warn!("no World access data; skipping map output");
        return Ok(());
    };
    let client = Client::new();
    let url = cfg.boundaries_url()?;
    match fetch::fetch_boundaries(&client, &url, &cfg.boundaries_cache).await {
        Ok(mut boundaries) => {
            let matched = boundaries.attach("total_rate", &latest_map);
            let out = cfg.output_dir.join(format!("access_{}.geo.json", year));
            write_map(&boundaries, &out)?;
            info!(year, matched, features = boundaries.len(), path = %out.display(), "wrote access map");
        }
        Err(e) => error!(error = %format!("{:#}", e), "boundary fetch failed; map skipped"),
    }

    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}

fn write_map(boundaries: &wdicrunch::geo::BoundaryCollection, path: &Path) -> Result<()> {
    boundaries
        .write(path)
        .with_context(|| format!("writing map {}", path.display()))
}
