// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::series::SeriesField;

/// Header names of the four key columns every source must carry.
pub const COUNTRY_NAME: &str = "Country Name";
pub const COUNTRY_CODE: &str = "Country Code";
pub const SERIES_NAME: &str = "Series Name";
pub const SERIES_CODE: &str = "Series Code";

pub const STRUCTURAL_COLUMNS: [&str; 4] = [COUNTRY_NAME, COUNTRY_CODE, SERIES_NAME, SERIES_CODE];

/// Name of the aggregate row that is split out (or filtered) as world data.
pub const WORLD: &str = "World";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum YearLabelError {
    #[error("year label `{0}` is shorter than four characters")]
    TooShort(String),
    #[error("year label `{0}` does not start with four digits")]
    NotNumeric(String),
}

/// Calendar year taken from the first four characters of a column label
/// such as `1990 [YR1990]`. Always renders back as exactly four digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Year(u16);

impl Year {
    pub fn new(year: u16) -> Option<Self> {
        (year <= 9999).then_some(Year(year))
    }

    pub fn from_label(label: &str) -> Result<Self, YearLabelError> {
        let prefix: String = label.chars().take(4).collect();
        if prefix.chars().count() < 4 {
            return Err(YearLabelError::TooShort(label.to_string()));
        }
        if !prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(YearLabelError::NotNumeric(label.to_string()));
        }
        prefix
            .parse::<u16>()
            .map(Year)
            .map_err(|_| YearLabelError::NotNumeric(label.to_string()))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// The canonical four-character form, e.g. `"1990"`.
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl From<Year> for String {
    fn from(y: Year) -> Self {
        y.label()
    }
}

impl TryFrom<String> for Year {
    type Error = YearLabelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Year::from_label(&s)
    }
}

/// Continent bucket attached to every canonical row.
///
/// `Asia` and `Oceania` only exist between classification and the merge
/// step; the canonical table carries `AsiaOceania` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Continent {
    Africa,
    Asia,
    Europe,
    #[serde(rename = "North America")]
    NorthAmerica,
    Oceania,
    #[serde(rename = "South America")]
    SouthAmerica,
    #[serde(rename = "Asia/Oceania")]
    AsiaOceania,
    World,
}

impl Continent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Continent::Africa => "Africa",
            Continent::Asia => "Asia",
            Continent::Europe => "Europe",
            Continent::NorthAmerica => "North America",
            Continent::Oceania => "Oceania",
            Continent::SouthAmerica => "South America",
            Continent::AsiaOceania => "Asia/Oceania",
            Continent::World => "World",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "Africa" => Some(Continent::Africa),
            "Asia" => Some(Continent::Asia),
            "Europe" => Some(Continent::Europe),
            "North America" => Some(Continent::NorthAmerica),
            "Oceania" => Some(Continent::Oceania),
            "South America" => Some(Continent::SouthAmerica),
            "Asia/Oceania" => Some(Continent::AsiaOceania),
            "World" => Some(Continent::World),
            _ => None,
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the canonical table: a (country, year) pair with its nine
/// indicator values. Every value is optional; sparse data is the norm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub country_name: String,
    pub country_code: String,
    pub year: Year,
    pub values: [Option<f64>; SeriesField::COUNT],
    pub continent: Option<Continent>,
}

impl WideRow {
    pub fn new(country_name: impl Into<String>, country_code: impl Into<String>, year: Year) -> Self {
        WideRow {
            country_name: country_name.into(),
            country_code: country_code.into(),
            year,
            values: [None; SeriesField::COUNT],
            continent: None,
        }
    }

    pub fn get(&self, field: SeriesField) -> Option<f64> {
        self.values[field.index()]
    }

    pub fn set(&mut self, field: SeriesField, value: Option<f64>) {
        self.values[field.index()] = value;
    }

    pub fn is_world(&self) -> bool {
        self.country_name == WORLD
    }
}
