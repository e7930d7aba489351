//! Coverage aggregation: observed intents/pages versus a known inventory.
//!
//! A pure set-reduction with no state across calls; safe to run repeatedly
//! against a growing result set.

use std::collections::BTreeSet;

use crate::domain::models::{AgentInventory, CoverageReport, TurnResult};

/// Reduce a result set to a coverage report.
///
/// Without an inventory only the observed sets are populated. With one,
/// coverage fractions and the complementary untested lists are included;
/// inventory ordering is irrelevant to the math.
pub fn coverage_report(results: &[TurnResult], inventory: Option<&AgentInventory>) -> CoverageReport {
    let mut observed_intents = BTreeSet::new();
    let mut observed_pages = BTreeSet::new();

    for result in results {
        if let Some(ref intent) = result.matched_intent {
            observed_intents.insert(intent.clone());
        }
        if let Some(ref page) = result.page {
            observed_pages.insert(page.clone());
        }
    }

    let mut report = CoverageReport {
        observed_intents,
        observed_pages,
        ..CoverageReport::default()
    };

    if let Some(inventory) = inventory {
        let (intent_coverage, untested_intents) =
            coverage_of(&inventory.intents, &report.observed_intents);
        let (page_coverage, untested_pages) = coverage_of(&inventory.pages, &report.observed_pages);
        report.intent_coverage = intent_coverage;
        report.page_coverage = page_coverage;
        report.untested_intents = untested_intents;
        report.untested_pages = untested_pages;
    }

    report
}

fn coverage_of(inventory: &[String], observed: &BTreeSet<String>) -> (Option<f64>, Vec<String>) {
    if inventory.is_empty() {
        return (None, Vec::new());
    }

    let distinct: BTreeSet<&String> = inventory.iter().collect();
    let covered = distinct.iter().filter(|name| observed.contains(**name)).count();
    let untested = distinct
        .iter()
        .filter(|name| !observed.contains(**name))
        .map(|name| (*name).clone())
        .collect();

    (Some(covered as f64 / distinct.len() as f64), untested)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(intent: Option<&str>, page: Option<&str>) -> TurnResult {
        let mut result = TurnResult::blank("conv", 1, "in", "out");
        result.matched_intent = intent.map(String::from);
        result.page = page.map(String::from);
        result
    }

    #[test]
    fn test_observed_sets_are_distinct() {
        let results = vec![
            result_with(Some("greet"), Some("Start")),
            result_with(Some("greet"), Some("Start")),
            result_with(Some("book"), None),
            result_with(None, Some("Checkout")),
        ];

        let report = coverage_report(&results, None);
        assert_eq!(report.observed_intents.len(), 2);
        assert_eq!(report.observed_pages.len(), 2);
        assert!(report.intent_coverage.is_none());
    }

    #[test]
    fn test_inventory_coverage_and_untested() {
        let results = vec![result_with(Some("greet"), Some("Start"))];
        let inventory = AgentInventory {
            intents: vec!["greet".to_string(), "book".to_string(), "cancel".to_string()],
            pages: vec!["Start".to_string(), "Checkout".to_string()],
        };

        let report = coverage_report(&results, Some(&inventory));
        assert!((report.intent_coverage.unwrap() - 1.0 / 3.0).abs() < 1e-9);
        assert!((report.page_coverage.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(report.untested_intents, vec!["book".to_string(), "cancel".to_string()]);
        assert_eq!(report.untested_pages, vec!["Checkout".to_string()]);
    }

    #[test]
    fn test_idempotent_over_same_results() {
        let results = vec![result_with(Some("greet"), None)];
        let first = coverage_report(&results, None);
        let second = coverage_report(&results, None);
        assert_eq!(first, second);
    }
}
