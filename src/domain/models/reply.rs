//! Normalized reply from the external dialog agent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The strict internal shape every agent adapter maps its wire format into.
///
/// Internal code never branches on raw external response shapes; the
/// adapter boundary owns that mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    /// Fulfillment text returned for the utterance
    pub response_text: String,
    /// Intent the agent matched, if any
    pub matched_intent: Option<String>,
    /// Detection confidence in `[0, 1]`
    pub confidence: f64,
    /// Extracted structured parameters
    pub parameters: Option<Value>,
    /// Dialog page/state after processing the turn
    pub current_page: Option<String>,
}

impl AgentReply {
    pub fn text(response_text: impl Into<String>) -> Self {
        Self {
            response_text: response_text.into(),
            ..Default::default()
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>, confidence: f64) -> Self {
        self.matched_intent = Some(intent.into());
        self.confidence = confidence;
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.current_page = Some(page.into());
        self
    }
}
