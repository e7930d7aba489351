//! Coverage models: observed intents/pages versus a known inventory.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The agent's full inventory of intents and pages, supplied by an external
/// collaborator (the agent's definition). Ordering is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInventory {
    #[serde(default)]
    pub intents: Vec<String>,
    #[serde(default)]
    pub pages: Vec<String>,
}

/// Result of the coverage reduction over a set of turn results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub observed_intents: BTreeSet<String>,
    pub observed_pages: BTreeSet<String>,
    /// Fraction of inventory intents observed; `None` without an inventory
    pub intent_coverage: Option<f64>,
    /// Fraction of inventory pages observed; `None` without an inventory
    pub page_coverage: Option<f64>,
    pub untested_intents: Vec<String>,
    pub untested_pages: Vec<String>,
}
