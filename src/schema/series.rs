// src/schema/series.rs

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The nine indicators the dashboard consumes, keyed by their World-Bank
/// `Series Name`. Any other series in the source is dropped after the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesField {
    TotalRate,
    RuralRate,
    UrbanRate,
    OilGasCoal,
    Nuclear,
    Hydroelectric,
    Renewable,
    #[serde(rename = "GDP")]
    Gdp,
    EnergyImports,
}

impl SeriesField {
    pub const COUNT: usize = 9;

    pub const ALL: [SeriesField; SeriesField::COUNT] = [
        SeriesField::TotalRate,
        SeriesField::RuralRate,
        SeriesField::UrbanRate,
        SeriesField::OilGasCoal,
        SeriesField::Nuclear,
        SeriesField::Hydroelectric,
        SeriesField::Renewable,
        SeriesField::Gdp,
        SeriesField::EnergyImports,
    ];

    /// Electricity production shares, in the order the mix charts stack them.
    pub const ENERGY_SOURCES: [SeriesField; 4] = [
        SeriesField::OilGasCoal,
        SeriesField::Nuclear,
        SeriesField::Hydroelectric,
        SeriesField::Renewable,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Short column name in the canonical table.
    pub fn column(self) -> &'static str {
        match self {
            SeriesField::TotalRate => "total_rate",
            SeriesField::RuralRate => "rural_rate",
            SeriesField::UrbanRate => "urban_rate",
            SeriesField::OilGasCoal => "oil_gas_coal",
            SeriesField::Nuclear => "nuclear",
            SeriesField::Hydroelectric => "hydroelectric",
            SeriesField::Renewable => "renewable",
            SeriesField::Gdp => "GDP",
            SeriesField::EnergyImports => "energy_imports",
        }
    }

    /// Exact `Series Name` in the World-Bank export.
    pub fn series_name(self) -> &'static str {
        match self {
            SeriesField::TotalRate => "Access to electricity (% of population)",
            SeriesField::RuralRate => "Access to electricity, rural (% of rural population)",
            SeriesField::UrbanRate => "Access to electricity, urban (% of urban population)",
            SeriesField::OilGasCoal => {
                "Electricity production from oil, gas and coal sources (% of total)"
            }
            SeriesField::Nuclear => "Electricity production from nuclear sources (% of total)",
            SeriesField::Hydroelectric => {
                "Electricity production from hydroelectric sources (% of total)"
            }
            SeriesField::Renewable => {
                "Electricity production from renewable sources, excluding hydroelectric (% of total)"
            }
            SeriesField::Gdp => "GDP per capita (constant 2015 US$)",
            SeriesField::EnergyImports => "Energy imports, net (% of energy use)",
        }
    }

    pub fn from_series_name(name: &str) -> Option<Self> {
        BY_SERIES_NAME.get(name).copied()
    }
}

impl fmt::Display for SeriesField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

static BY_SERIES_NAME: Lazy<HashMap<&'static str, SeriesField>> = Lazy::new(|| {
    SeriesField::ALL
        .into_iter()
        .map(|f| (f.series_name(), f))
        .collect()
});
