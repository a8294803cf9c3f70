// src/views/mod.rs
//! Read-only chart queries over a `CanonicalTable`.
//!
//! Every query skips missing values. Only `world_*` reads the `World` rows;
//! everything else sees per-country rows. Empty filters give empty results.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::process::CanonicalTable;
use crate::schema::{Continent, SeriesField, WideRow, Year};

/// Inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: u16,
    pub end: u16,
}

impl YearRange {
    pub const ALL: YearRange = YearRange {
        start: 0,
        end: u16::MAX,
    };

    /// Bounds may be given in either order.
    pub fn new(a: u16, b: u16) -> Self {
        YearRange {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn single(year: u16) -> Self {
        YearRange {
            start: year,
            end: year,
        }
    }

    pub fn contains(&self, year: Year) -> bool {
        (self.start..=self.end).contains(&year.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: Year,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceShare {
    pub source: SeriesField,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearSourceShare {
    pub year: Year,
    pub source: SeriesField,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryValue {
    pub country: String,
    pub year: Year,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrbanRural {
    pub country: String,
    pub continent: Option<Continent>,
    pub urban: f64,
    pub rural: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Disparity {
    /// urban − rural
    pub gap: f64,
    pub urban: f64,
    pub rural: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersusPoint {
    pub country: String,
    pub continent: Option<Continent>,
    pub total_rate: f64,
    pub other: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryShare {
    pub country: String,
    pub source: SeriesField,
    pub percentage: f64,
}

fn at_year(table: &CanonicalTable, year: u16) -> impl Iterator<Item = &WideRow> + '_ {
    table.country_rows().filter(move |r| r.year.get() == year)
}

fn shares(row: &WideRow) -> impl Iterator<Item = SourceShare> + '_ {
    SeriesField::ENERGY_SOURCES.into_iter().filter_map(move |source| {
        row.get(source).map(|percentage| SourceShare { source, percentage })
    })
}

/// `(year, value)` of the `World` rows, in table order.
pub fn world_series(table: &CanonicalTable, field: SeriesField, range: YearRange) -> Vec<YearValue> {
    table
        .world()
        .filter(|r| range.contains(r.year))
        .filter_map(|r| r.get(field).map(|value| YearValue { year: r.year, value }))
        .collect()
}

/// Energy-source shares of the `World` rows, one entry per present source.
pub fn world_energy_mix(table: &CanonicalTable, range: YearRange) -> Vec<YearSourceShare> {
    table
        .world()
        .filter(|r| range.contains(r.year))
        .flat_map(|r| {
            shares(r).map(move |s| YearSourceShare {
                year: r.year,
                source: s.source,
                percentage: s.percentage,
            })
        })
        .collect()
}

/// Sorted country names with at least one row where every field is present.
pub fn countries_with(table: &CanonicalTable, fields: &[SeriesField]) -> Vec<String> {
    if fields.is_empty() {
        return Vec::new();
    }
    table
        .country_rows()
        .filter(|r| fields.iter().all(|f| r.get(*f).is_some()))
        .map(|r| r.country_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn country_series<S: AsRef<str>>(
    table: &CanonicalTable,
    countries: &[S],
    field: SeriesField,
    range: YearRange,
) -> Vec<CountryValue> {
    table
        .country_rows()
        .filter(|r| range.contains(r.year))
        .filter(|r| countries.iter().any(|c| c.as_ref() == r.country_name))
        .filter_map(|r| {
            r.get(field).map(|value| CountryValue {
                country: r.country_name.clone(),
                year: r.year,
                value,
            })
        })
        .collect()
}

/// Rows of `year` that have an urban rate; the rural rate may be missing.
pub fn urban_rural(table: &CanonicalTable, year: u16) -> Vec<UrbanRural> {
    at_year(table, year)
        .filter_map(|r| {
            r.get(SeriesField::UrbanRate).map(|urban| UrbanRural {
                country: r.country_name.clone(),
                continent: r.continent,
                urban,
                rural: r.get(SeriesField::RuralRate),
            })
        })
        .collect()
}

/// Urban/rural gap per country code, where both rates are present.
pub fn disparity(table: &CanonicalTable, year: u16) -> BTreeMap<String, Disparity> {
    at_year(table, year)
        .filter_map(|r| {
            let urban = r.get(SeriesField::UrbanRate)?;
            let rural = r.get(SeriesField::RuralRate)?;
            Some((
                r.country_code.clone(),
                Disparity {
                    gap: urban - rural,
                    urban,
                    rural,
                },
            ))
        })
        .collect()
}

/// Total access rate against another field. `continents: None` keeps every
/// row; `Some(list)` keeps rows whose continent is listed.
pub fn versus(
    table: &CanonicalTable,
    field: SeriesField,
    year: u16,
    continents: Option<&[Continent]>,
) -> Vec<VersusPoint> {
    at_year(table, year)
        .filter(|r| match continents {
            None => true,
            Some(list) => r.continent.map_or(false, |c| list.contains(&c)),
        })
        .filter_map(|r| {
            Some(VersusPoint {
                country: r.country_name.clone(),
                continent: r.continent,
                total_rate: r.get(SeriesField::TotalRate)?,
                other: r.get(field)?,
            })
        })
        .collect()
}

/// `(min, max)` of `field` over the range, for a fixed colour scale.
pub fn field_range(table: &CanonicalTable, field: SeriesField, range: YearRange) -> Option<(f64, f64)> {
    table
        .country_rows()
        .filter(|r| range.contains(r.year))
        .filter_map(|r| r.get(field))
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// `CountryCode → value` for map joins.
pub fn choropleth(table: &CanonicalTable, field: SeriesField, year: u16) -> BTreeMap<String, f64> {
    at_year(table, year)
        .filter_map(|r| r.get(field).map(|v| (r.country_code.clone(), v)))
        .collect()
}

/// Present energy-source shares of one country in one year.
pub fn energy_mix(table: &CanonicalTable, country: &str, year: u16) -> Vec<SourceShare> {
    at_year(table, year)
        .filter(|r| r.country_name == country)
        .flat_map(shares)
        .collect()
}

pub fn energy_mix_by_country<S: AsRef<str>>(
    table: &CanonicalTable,
    countries: &[S],
    year: u16,
) -> Vec<CountryShare> {
    at_year(table, year)
        .filter(|r| countries.iter().any(|c| c.as_ref() == r.country_name))
        .flat_map(|r| {
            shares(r).map(move |s| CountryShare {
                country: r.country_name.clone(),
                source: s.source,
                percentage: s.percentage,
            })
        })
        .collect()
}
