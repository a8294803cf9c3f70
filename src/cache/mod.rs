// src/cache/mod.rs
pub mod fingerprint;
pub mod snapshot;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use glob::glob;
use serde::Serialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::continent::ContinentResolver;
use crate::process::{reshape_source, CanonicalTable, ReshapeOptions, ReshapeReport};

pub use fingerprint::Fingerprint;

/// Where a table handed out by `TableCache` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOrigin {
    Memory,
    Snapshot,
    Built,
}

#[derive(Debug, Clone)]
pub struct CachedTable {
    pub table: Arc<CanonicalTable>,
    pub fingerprint: Fingerprint,
    pub origin: CacheOrigin,
    pub built_at: DateTime<Utc>,
    /// Only present when the table was reshaped in this call or memoised from one.
    pub report: Option<Arc<ReshapeReport>>,
}

#[derive(Debug, Clone)]
struct Entry {
    fingerprint: Fingerprint,
    table: Arc<CanonicalTable>,
    built_at: DateTime<Utc>,
    report: Option<Arc<ReshapeReport>>,
}

/// Builds each canonical table at most once per source content.
///
/// Lookups go memory → parquet snapshot (when a snapshot dir is set) →
/// full reshape. A changed source file yields a new fingerprint, so the
/// stale entry is replaced rather than served.
pub struct TableCache {
    resolver: Arc<ContinentResolver>,
    snapshot_dir: Option<PathBuf>,
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl TableCache {
    pub fn in_memory(resolver: Arc<ContinentResolver>) -> Self {
        TableCache {
            resolver,
            snapshot_dir: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_snapshot_dir(
        resolver: Arc<ContinentResolver>,
        dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("could not create cache dir `{}`", dir.display()))?;
        Ok(TableCache {
            resolver,
            snapshot_dir: Some(dir),
            entries: RwLock::new(HashMap::new()),
        })
    }

    pub fn snapshot_path(&self, fp: &Fingerprint) -> Option<PathBuf> {
        self.snapshot_dir
            .as_ref()
            .map(|d| d.join(format!("{}.parquet", fp)))
    }

    /// Read `source` and return its canonical table, reshaping only when
    /// neither memory nor disk holds one for the current content.
    #[tracing::instrument(level = "info", skip(self, opts), fields(source = %source.display()))]
    pub fn get_or_build(&self, source: &Path, opts: &ReshapeOptions) -> Result<CachedTable> {
        let bytes = fs::read(source)
            .with_context(|| format!("failed to read source `{}`", source.display()))?;
        let fp = Fingerprint::compute(&bytes, opts);

        if let Some(hit) = self.lookup(source, &fp) {
            debug!(fingerprint = fp.short(), "memory hit");
            return Ok(hit);
        }

        if let Some(path) = self.snapshot_path(&fp).filter(|p| p.exists()) {
            match snapshot::read_snapshot(&path, opts.world_rows) {
                Ok(table) => {
                    info!(fingerprint = fp.short(), rows = table.len(), "loaded snapshot");
                    let built_at = fs::metadata(&path)
                        .and_then(|m| m.modified())
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|_| Utc::now());
                    let entry = Entry {
                        fingerprint: fp,
                        table: Arc::new(table),
                        built_at,
                        report: None,
                    };
                    return Ok(self.store(source, entry, CacheOrigin::Snapshot));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable snapshot; rebuilding"),
            }
        }

        let start = Instant::now();
        let (table, report) = reshape_source(&bytes, source, &self.resolver, opts)
            .with_context(|| format!("failed to reshape `{}`", source.display()))?;
        info!(
            fingerprint = fp.short(),
            rows = table.len(),
            elapsed = ?start.elapsed(),
            "built canonical table"
        );

        if let Some(path) = self.snapshot_path(&fp) {
            if let Err(e) = snapshot::write_snapshot(&table, &path) {
                warn!(path = %path.display(), error = %e, "could not write snapshot");
            }
        }

        let entry = Entry {
            fingerprint: fp,
            table: Arc::new(table),
            built_at: Utc::now(),
            report: Some(Arc::new(report)),
        };
        Ok(self.store(source, entry, CacheOrigin::Built))
    }

    fn lookup(&self, source: &Path, fp: &Fingerprint) -> Option<CachedTable> {
        let entries = self.entries.read().ok()?;
        let e = entries.get(source)?;
        (e.fingerprint == *fp).then(|| CachedTable {
            table: Arc::clone(&e.table),
            fingerprint: e.fingerprint.clone(),
            origin: CacheOrigin::Memory,
            built_at: e.built_at,
            report: e.report.clone(),
        })
    }

    fn store(&self, source: &Path, entry: Entry, origin: CacheOrigin) -> CachedTable {
        let out = CachedTable {
            table: Arc::clone(&entry.table),
            fingerprint: entry.fingerprint.clone(),
            origin,
            built_at: entry.built_at,
            report: entry.report.clone(),
        };
        match self.entries.write() {
            Ok(mut entries) => {
                if let Some(old) = entries.insert(source.to_path_buf(), entry) {
                    if old.fingerprint != out.fingerprint {
                        debug!(old = old.fingerprint.short(), "replaced stale entry");
                    }
                }
            }
            Err(_) => warn!("cache lock poisoned; entry not memoised"),
        }
        out
    }

    /// Delete every snapshot whose fingerprint is not currently memoised.
    /// Returns the number of files removed.
    pub fn prune(&self) -> Result<usize> {
        let Some(dir) = &self.snapshot_dir else {
            return Ok(0);
        };
        let live: Vec<Fingerprint> = match self.entries.read() {
            Ok(entries) => entries.values().map(|e| e.fingerprint.clone()).collect(),
            Err(_) => return Ok(0),
        };

        let pattern = format!("{}/*.parquet", dir.display());
        let mut removed = 0;
        for entry in glob(&pattern).context("invalid glob pattern for prune")? {
            let path = entry?;
            let Some(fp) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(Fingerprint::parse)
            else {
                continue;
            };
            if live.contains(&fp) {
                continue;
            }
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove `{}`", path.display()))?;
            debug!(path = %path.display(), "pruned snapshot");
            removed += 1;
        }
        if removed > 0 {
            info!(removed, "pruned stale snapshots");
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::WorldRows;
    use crate::schema::{Continent, SeriesField};
    use tempfile::tempdir;

    const SOURCE: &str = "\
Country Name,Country Code,Series Name,Series Code,2000 [YR2000],2001 [YR2001]
Kenya,KEN,Access to electricity (% of population),EG.ELC.ACCS.ZS,15.2,16.0
Italy,ITA,Access to electricity (% of population),EG.ELC.ACCS.ZS,100,100
World,WLD,Access to electricity (% of population),EG.ELC.ACCS.ZS,78.0,78.5
";

    fn resolver() -> Arc<ContinentResolver> {
        Arc::new(ContinentResolver::new())
    }

    #[test]
    fn memoises_until_source_changes() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("wdi.csv");
        fs::write(&src, SOURCE)?;
        let cache = TableCache::in_memory(resolver());
        let opts = ReshapeOptions::default();

        let first = cache.get_or_build(&src, &opts)?;
        assert_eq!(first.origin, CacheOrigin::Built);
        assert_eq!(first.table.rows().len(), 4);
        assert_eq!(first.table.world().count(), 2);
        assert!(first.report.is_some());

        let second = cache.get_or_build(&src, &opts)?;
        assert_eq!(second.origin, CacheOrigin::Memory);
        assert!(Arc::ptr_eq(&first.table, &second.table));

        fs::write(&src, SOURCE.replace("15.2", "17.5"))?;
        let third = cache.get_or_build(&src, &opts)?;
        assert_eq!(third.origin, CacheOrigin::Built);
        assert_ne!(third.fingerprint, first.fingerprint);
        let kenya = third
            .table
            .rows()
            .iter()
            .find(|r| r.country_code == "KEN" && r.year.get() == 2000)
            .map(|r| r.get(SeriesField::TotalRate));
        assert_eq!(kenya, Some(Some(17.5)));
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn snapshot_survives_a_new_cache() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("wdi.csv");
        fs::write(&src, SOURCE)?;
        let snaps = dir.path().join("cache");
        let opts = ReshapeOptions::default();

        let built = TableCache::with_snapshot_dir(resolver(), &snaps)?.get_or_build(&src, &opts)?;
        let path = snaps.join(format!("{}.parquet", built.fingerprint));
        assert!(path.exists());

        let fresh = TableCache::with_snapshot_dir(resolver(), &snaps)?;
        let loaded = fresh.get_or_build(&src, &opts)?;
        assert_eq!(loaded.origin, CacheOrigin::Snapshot);
        assert_eq!(*loaded.table, *built.table);
        assert!(loaded.report.is_none());
        assert!(loaded
            .table
            .rows()
            .iter()
            .any(|r| r.continent == Some(Continent::Europe)));
        Ok(())
    }

    #[test]
    fn world_mode_is_part_of_the_key() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("wdi.csv");
        fs::write(&src, SOURCE)?;
        let cache = TableCache::in_memory(resolver());

        let split = cache.get_or_build(&src, &ReshapeOptions::default())?;
        let inline = cache.get_or_build(
            &src,
            &ReshapeOptions {
                world_rows: WorldRows::Inline,
                ..Default::default()
            },
        )?;
        assert_eq!(inline.origin, CacheOrigin::Built);
        assert_eq!(split.table.rows().len(), 4);
        assert_eq!(inline.table.rows().len(), 6);
        Ok(())
    }

    #[test]
    fn prune_keeps_live_snapshots() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path().join("wdi.csv");
        fs::write(&src, SOURCE)?;
        let snaps = dir.path().join("cache");
        let cache = TableCache::with_snapshot_dir(resolver(), &snaps)?;
        let opts = ReshapeOptions::default();

        let old = cache.get_or_build(&src, &opts)?;
        fs::write(&src, SOURCE.replace("16.0", "16.4"))?;
        let new = cache.get_or_build(&src, &opts)?;
        fs::write(snaps.join("countries.geo.parquet"), b"not a snapshot")?;

        assert_eq!(cache.prune()?, 1);
        assert!(!snaps.join(format!("{}.parquet", old.fingerprint)).exists());
        assert!(snaps.join(format!("{}.parquet", new.fingerprint)).exists());
        assert!(snaps.join("countries.geo.parquet").exists());
        Ok(())
    }

    #[test]
    fn missing_source_is_an_error() {
        let cache = TableCache::in_memory(resolver());
        let err = cache
            .get_or_build(Path::new("/nonexistent/wdi.csv"), &ReshapeOptions::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read source"));
    }
}
