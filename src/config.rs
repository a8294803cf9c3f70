// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;
use url::Url;

use crate::process::{ReshapeOptions, WorldRows, DEFAULT_ROW_LIMIT};

pub const CONFIG_ENV: &str = "WDICRUNCH_CONFIG";
pub const DEFAULT_BOUNDARIES_URL: &str =
    "https://raw.githubusercontent.com/johan/world.geo.json/master/countries.geo.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV export, or a `.zip` bulk download containing one.
    pub source: PathBuf,
    pub zip_entry: Option<String>,
    pub row_limit: Option<usize>,
    pub world_rows: WorldRows,
    /// Parquet snapshot directory; `None` keeps the cache in memory only.
    pub cache_dir: Option<PathBuf>,
    pub boundaries_url: String,
    pub boundaries_cache: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: PathBuf::from("WDICSV.csv"),
            zip_entry: None,
            row_limit: Some(DEFAULT_ROW_LIMIT),
            world_rows: WorldRows::Split,
            cache_dir: Some(PathBuf::from("cache")),
            boundaries_url: DEFAULT_BOUNDARIES_URL.to_string(),
            boundaries_cache: PathBuf::from("cache/countries.geo.json"),
            output_dir: PathBuf::from("out"),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("parsing config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read config `{}`", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in config `{}`", path.display()))
    }

    /// Defaults (or the file named by `WDICRUNCH_CONFIG`) with `WDI_*`
    /// variables layered on top.
    pub fn from_env() -> Result<Self> {
        let base = match env::var(CONFIG_ENV) {
            Ok(path) => {
                info!(path = %path, "loading config file");
                Self::load(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| env::var(key).ok())
    }

    /// Apply `WDI_*` overrides read through `get`.
    pub fn with_overrides<F>(mut self, get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("WDI_SOURCE") {
            self.source = PathBuf::from(v);
        }
        if let Some(v) = get("WDI_ROW_LIMIT") {
            self.row_limit = if v.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(
                    v.trim()
                        .parse()
                        .with_context(|| format!("WDI_ROW_LIMIT must be a number or `none`, got `{}`", v))?,
                )
            };
        }
        if let Some(v) = get("WDI_WORLD_ROWS") {
            self.world_rows = v
                .parse()
                .map_err(|e: String| anyhow!("WDI_WORLD_ROWS: {}", e))?;
        }
        if let Some(v) = get("WDI_CACHE_DIR") {
            self.cache_dir = if v.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(v))
            };
        }
        if let Some(v) = get("WDI_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        self.boundaries_url()?;
        Ok(())
    }

    pub fn boundaries_url(&self) -> Result<Url> {
        Url::parse(&self.boundaries_url)
            .with_context(|| format!("invalid boundaries_url `{}`", self.boundaries_url))
    }

    pub fn reshape_options(&self) -> ReshapeOptions {
        ReshapeOptions {
            row_limit: self.row_limit,
            world_rows: self.world_rows,
            zip_entry: self.zip_entry.clone(),
        }
    }
}
