// src/geo/mod.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::debug;

/// One country outline. `id` is the alpha-3 code the table joins on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub geometry: Value,
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// A GeoJSON `FeatureCollection` of country boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl BoundaryCollection {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let coll: BoundaryCollection =
            serde_json::from_slice(bytes).context("parsing boundary GeoJSON")?;
        anyhow::ensure!(
            coll.kind == "FeatureCollection",
            "expected a FeatureCollection, got `{}`",
            coll.kind
        );
        Ok(coll)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_slice(&bytes).with_context(|| format!("in {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Set `property` on every feature to the looked-up value rounded to two
    /// decimals, or `null` when the feature's id has no value.
    /// Returns how many features received a value.
    pub fn attach(&mut self, property: &str, lookup: &BTreeMap<String, f64>) -> usize {
        let mut matched = 0;
        for f in &mut self.features {
            let value = f
                .id
                .as_deref()
                .and_then(|id| lookup.get(id))
                .and_then(|v| serde_json::Number::from_f64(round2(*v)))
                .map(Value::Number);
            if value.is_some() {
                matched += 1;
            }
            f.properties
                .insert(property.to_string(), value.unwrap_or(Value::Null));
        }
        debug!(property, matched, features = self.features.len(), "attached values");
        matched
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("tmp");
        let body = serde_json::to_vec(self).context("serializing boundaries")?;
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
