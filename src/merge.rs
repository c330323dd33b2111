// src/merge.rs

use std::collections::HashMap;

use tracing::debug;

use crate::model::{normalize_code, BoundaryRecord, PopulationRecord};

/// Normalized `iso3` → first boundary record carrying it.
#[derive(Debug, Default)]
pub struct BoundaryLookup<'a> {
    by_iso3: HashMap<String, &'a BoundaryRecord>,
}

impl<'a> BoundaryLookup<'a> {
    /// Later records with an already-seen key are ignored; records with a
    /// missing or blank `iso3` never enter the lookup.
    pub fn build(boundaries: &'a [BoundaryRecord]) -> Self {
        let mut by_iso3 = HashMap::with_capacity(boundaries.len());
        for b in boundaries {
            if let Some(key) = b.join_key() {
                by_iso3.entry(key).or_insert(b);
            }
        }
        Self { by_iso3 }
    }

    pub fn get(&self, country_code: &str) -> Option<&'a BoundaryRecord> {
        normalize_code(country_code).and_then(|k| self.by_iso3.get(&k).copied())
    }

    pub fn len(&self) -> usize {
        self.by_iso3.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_iso3.is_empty()
    }
}

/// Left join of population records onto boundary records by country code.
///
/// The output has exactly one record per input record, in input order.
/// Unmatched records pass through unchanged.
pub fn merge(
    population: &[PopulationRecord],
    boundaries: Option<&[BoundaryRecord]>,
) -> Vec<PopulationRecord> {
    let lookup = BoundaryLookup::build(boundaries.unwrap_or_default());
    if lookup.is_empty() {
        return population.to_vec();
    }

    let mut matched = 0usize;
    let merged: Vec<PopulationRecord> = population
        .iter()
        .map(|p| match lookup.get(&p.country_code) {
            Some(b) => {
                matched += 1;
                p.enriched_with(b)
            }
            None => p.clone(),
        })
        .collect();

    debug!(
        rows = merged.len(),
        matched,
        keys = lookup.len(),
        "merged population with boundaries"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn boundary(value: Value) -> BoundaryRecord {
        serde_json::from_value(value).unwrap()
    }

    fn population() -> Vec<PopulationRecord> {
        vec![
            PopulationRecord::new("United States", "usa ", 2020, 331.0e6),
            PopulationRecord::new("Atlantis", "ATL", 2020, 1.0),
            PopulationRecord::new("France", "FRA", 2019, 67.0e6),
            PopulationRecord::new("Nowhere", "", 2019, 2.0),
        ]
    }

    #[test]
    fn test_identity_without_boundaries() {
        let pop = population();
        assert_eq!(merge(&pop, None), pop);
        assert_eq!(merge(&pop, Some(&[][..])), pop);
    }

    #[test]
    fn test_cardinality_and_order() {
        let pop = population();
        let boundaries = vec![
            boundary(json!({"iso3": "FRA", "continent": "Europe"})),
            boundary(json!({"iso3": "USA", "continent": "Americas"})),
            boundary(json!({"iso3": "DEU", "continent": "Europe"})),
        ];
        let merged = merge(&pop, Some(boundaries.as_slice()));
        assert_eq!(merged.len(), pop.len());
        let names: Vec<&str> = merged.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, vec!["United States", "Atlantis", "France", "Nowhere"]);
        assert_eq!(merged[0].continent(), Some("Americas"));
        assert_eq!(merged[1], pop[1]);
        assert_eq!(merged[2].continent(), Some("Europe"));
        assert!(!merged[3].is_enriched());
    }

    #[test]
    fn test_first_boundary_wins() {
        let boundaries = vec![
            boundary(json!({"iso3": "USA", "region": "first"})),
            boundary(json!({"iso3": " usa", "region": "second"})),
        ];
        let lookup = BoundaryLookup::build(&boundaries);
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.get("USA").and_then(|b| b.fields()["region"].as_str()), Some("first"));

        let merged = merge(&population(), Some(boundaries.as_slice()));
        assert_eq!(merged[0].region(), Some("first"));
    }

    #[test]
    fn test_blank_iso3_excluded() {
        let boundaries = vec![
            boundary(json!({"iso3": "   ", "region": "blank"})),
            boundary(json!({"region": "missing"})),
        ];
        assert!(BoundaryLookup::build(&boundaries).is_empty());
        let pop = population();
        assert_eq!(merge(&pop, Some(boundaries.as_slice())), pop);
    }

    #[test]
    fn test_inputs_untouched() {
        let pop = population();
        let before = pop.clone();
        let boundaries = vec![boundary(json!({"iso3": "FRA", "status": "Member State"}))];
        let _ = merge(&pop, Some(boundaries.as_slice()));
        assert_eq!(pop, before);
    }
}
