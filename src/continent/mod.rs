// src/continent/mod.rs

pub mod iso;

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::schema::Continent;

/// Forced continent for an entity the ISO classification gets wrong or
/// does not cover. A row matches on either its code or its exact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinentOverride {
    pub country_code: &'static str,
    pub country_name: &'static str,
    pub continent: Continent,
}

pub const OVERRIDES: [ContinentOverride; 5] = [
    ContinentOverride {
        country_code: "TLS",
        country_name: "Timor-Leste",
        continent: Continent::Asia,
    },
    ContinentOverride {
        country_code: "CHI",
        country_name: "Channel Islands",
        continent: Continent::Europe,
    },
    ContinentOverride {
        country_code: "XKX",
        country_name: "Kosovo",
        continent: Continent::Europe,
    },
    ContinentOverride {
        country_code: "SXM",
        country_name: "Sint Maarten (Dutch part)",
        continent: Continent::NorthAmerica,
    },
    ContinentOverride {
        country_code: "WLD",
        country_name: "World",
        continent: Continent::World,
    },
];

/// Folds `Asia` and `Oceania` into the shared `Asia/Oceania` bucket.
/// Every other value, including `None` and `World`, passes through.
pub fn merge_asia_oceania(continent: Option<Continent>) -> Option<Continent> {
    match continent {
        Some(Continent::Asia) | Some(Continent::Oceania) => Some(Continent::AsiaOceania),
        other => other,
    }
}

/// Maps alpha-3 country codes to continents.
///
/// Built once from a classification and immutable afterwards. Annotation
/// always runs join → override → merge, in that order.
#[derive(Debug, Clone)]
pub struct ContinentResolver {
    by_code: HashMap<String, Option<Continent>>,
    overrides: Vec<ContinentOverride>,
}

impl Default for ContinentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ContinentResolver {
    /// Classify every country of the ISO register via
    /// alpha-2 → continent code → continent.
    pub fn new() -> Self {
        let entries = iso::countries().map(|c| {
            let continent =
                iso::alpha2_to_continent_code(c.alpha2).and_then(iso::continent_code_to_continent);
            if continent.is_none() {
                trace!(alpha3 = c.alpha3, "no continent classification");
            }
            (c.alpha3.to_string(), continent)
        });
        Self::from_classification(entries)
    }

    /// Build from an arbitrary `alpha-3 → continent` classification, keeping
    /// the standard override table.
    pub fn from_classification<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<Continent>)>,
    {
        let by_code: HashMap<String, Option<Continent>> = entries.into_iter().collect();
        debug!(
            codes = by_code.len(),
            classified = by_code.values().filter(|c| c.is_some()).count(),
            "built continent map"
        );
        ContinentResolver {
            by_code,
            overrides: OVERRIDES.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Left-join step: `None` for codes absent from the map or unclassified.
    pub fn classify(&self, country_code: &str) -> Option<Continent> {
        self.by_code.get(country_code).copied().flatten()
    }

    /// Override step, applied to the joined value.
    pub fn apply_override(
        &self,
        country_name: &str,
        country_code: &str,
        joined: Option<Continent>,
    ) -> Option<Continent> {
        self.overrides
            .iter()
            .find(|o| o.country_name == country_name || o.country_code == country_code)
            .map(|o| o.continent)
            .or(joined)
    }

    /// Full annotation for one canonical row.
    pub fn annotate(&self, country_name: &str, country_code: &str) -> Option<Continent> {
        let joined = self.classify(country_code);
        let overridden = self.apply_override(country_name, country_code, joined);
        merge_asia_oceania(overridden)
    }
}
