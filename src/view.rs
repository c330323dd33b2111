// src/view.rs

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::PopulationRecord;

/// Labels and values for one chart, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub title: String,
}

impl ChartSeries {
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// How the table view is keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Country,
    Year,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Country => "country",
            Self::Year => "year",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown display mode '{0}', expected 'country' or 'year'")]
pub struct ParseModeError(String);

impl FromStr for DisplayMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "country" => Ok(Self::Country),
            "year" => Ok(Self::Year),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

fn default_country() -> String {
    "India".to_string()
}
fn default_min_year() -> i32 {
    1960
}
fn default_max_year() -> i32 {
    2023
}
fn default_snapshot_limit() -> usize {
    50
}
fn default_page_size() -> usize {
    10
}

/// Parameters of the derived views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Country shown when the caller has not selected one.
    #[serde(default = "default_country")]
    pub default_country: String,
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    #[serde(default = "default_max_year")]
    pub max_year: i32,
    /// Number of countries kept in a year snapshot.
    #[serde(default = "default_snapshot_limit")]
    pub snapshot_limit: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_country: default_country(),
            min_year: default_min_year(),
            max_year: default_max_year(),
            snapshot_limit: default_snapshot_limit(),
            page_size: default_page_size(),
        }
    }
}

/// Stateless projections of a merged table. All filter/sort rules for the
/// chart and table views live here.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    config: ViewConfig,
}

impl Projector {
    pub fn new(config: ViewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The requested country, or the configured default when none (or a blank one) is given.
    pub fn resolve_country<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.config.default_country.as_str())
    }

    fn range_label(&self) -> String {
        format!("{}-{}", self.config.min_year, self.config.max_year)
    }

    /// Rows for one country inside the configured year range, oldest first.
    fn country_rows(&self, table: &[PopulationRecord], country: &str) -> Vec<PopulationRecord> {
        let wanted = country.trim().to_lowercase();
        let years = self.config.min_year..=self.config.max_year;
        let mut rows: Vec<PopulationRecord> = table
            .iter()
            .filter(|r| r.country_name.trim().to_lowercase() == wanted)
            .filter(|r| years.contains(&r.year))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.year);
        rows
    }

    /// Rows for one year, largest value first. Ties keep table order.
    fn year_rows(&self, table: &[PopulationRecord], year: i32) -> Vec<PopulationRecord> {
        let mut rows: Vec<PopulationRecord> =
            table.iter().filter(|r| r.year == year).cloned().collect();
        rows.sort_by(|a, b| b.value.total_cmp(&a.value));
        rows
    }

    /// Population over time for `country` (default country when `None`).
    pub fn country_series(
        &self,
        table: &[PopulationRecord],
        country: Option<&str>,
    ) -> ChartSeries {
        let country = self.resolve_country(country);
        let rows = self.country_rows(table, country);
        let Some(first) = rows.first() else {
            return ChartSeries::empty(format!("Population ({})", self.range_label()));
        };

        ChartSeries {
            title: format!("{} Population ({})", first.country_name, self.range_label()),
            labels: rows.iter().map(|r| r.year.to_string()).collect(),
            values: rows.iter().map(|r| r.value).collect(),
        }
    }

    /// Largest countries in `year`, capped at the snapshot limit.
    pub fn year_snapshot(&self, table: &[PopulationRecord], year: i32) -> ChartSeries {
        let rows: Vec<PopulationRecord> = self
            .year_rows(table, year)
            .into_iter()
            .filter(|r| !r.country_name.trim().is_empty())
            .take(self.config.snapshot_limit)
            .collect();

        ChartSeries {
            title: format!("Population by Country ({year})"),
            labels: rows.iter().map(|r| r.country_name.clone()).collect(),
            values: rows.iter().map(|r| r.value).collect(),
        }
    }

    /// Rows backing the table view.
    ///
    /// In country mode `selector` names a country; in year mode it is a year.
    /// Without a selector the default country's rows are returned. A year
    /// selector that does not parse matches nothing.
    pub fn table_rows(
        &self,
        table: &[PopulationRecord],
        mode: DisplayMode,
        selector: Option<&str>,
    ) -> Vec<PopulationRecord> {
        let selector = selector.map(str::trim).filter(|s| !s.is_empty());
        match (mode, selector) {
            (DisplayMode::Year, Some(raw)) => match raw.parse::<i32>() {
                Ok(year) => self.year_rows(table, year),
                Err(_) => Vec::new(),
            },
            (DisplayMode::Country, Some(country)) => self.country_rows(table, country),
            (_, None) => self.country_rows(table, &self.config.default_country),
        }
    }

    /// [`paginate`] with the configured page size.
    pub fn page(&self, series: &ChartSeries, page: usize) -> ChartSeries {
        paginate(series, page, self.config.page_size)
    }
}

/// The 1-based `page` of `items`; empty when out of range.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let Some(start) = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
    else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Window of a series for a pager. Labels and values stay aligned.
pub fn paginate(series: &ChartSeries, page: usize, page_size: usize) -> ChartSeries {
    ChartSeries {
        labels: page_slice(&series.labels, page, page_size).to_vec(),
        values: page_slice(&series.values, page, page_size).to_vec(),
        title: series.title.clone(),
    }
}

/// Number of pages needed to show `len` items.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Distinct non-blank country names, sorted case-insensitively.
pub fn countries(table: &[PopulationRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = table
        .iter()
        .map(|r| r.country_name.trim())
        .filter(|n| !n.is_empty())
        .collect();
    let mut names: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    names.sort_by_cached_key(|n| n.to_lowercase());
    names
}

/// Distinct years present in the table, ascending.
pub fn years(table: &[PopulationRecord]) -> Vec<i32> {
    table
        .iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
