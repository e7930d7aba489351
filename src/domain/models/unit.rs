//! Units of work: conversations and adversarial prompts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One utterance/response exchange within a unit.
///
/// Absent `expected_*` fields mean "no assertion required, always matches".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTurn {
    /// 1-based position within the unit
    pub turn_number: u32,
    /// Literal text sent to the agent
    pub input: String,
    pub expected_intent: Option<String>,
    pub expected_response: Option<String>,
    pub expected_parameters: Option<Value>,
    /// Prompt category for adversarial units
    pub category: Option<String>,
}

impl TestTurn {
    pub fn new(turn_number: u32, input: impl Into<String>) -> Self {
        Self {
            turn_number,
            input: input.into(),
            expected_intent: None,
            expected_response: None,
            expected_parameters: None,
            category: None,
        }
    }

    pub fn with_expected_intent(mut self, intent: impl Into<String>) -> Self {
        self.expected_intent = Some(intent.into());
        self
    }

    pub fn with_expected_response(mut self, response: impl Into<String>) -> Self {
        self.expected_response = Some(response.into());
        self
    }

    pub fn with_expected_parameters(mut self, parameters: Value) -> Self {
        self.expected_parameters = Some(parameters);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// An independently schedulable item of work.
///
/// Turns within a unit share one agent session and run strictly in order;
/// different units are independent and may interleave freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestUnit {
    pub id: Uuid,
    /// Stable name carried into every result of this unit
    pub conversation_id: String,
    pub turns: Vec<TestTurn>,
}

impl TestUnit {
    /// A scripted multi-turn conversation.
    pub fn conversation(conversation_id: impl Into<String>, turns: Vec<TestTurn>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id: conversation_id.into(),
            turns,
        }
    }

    /// A single adversarial prompt: a degenerate conversation of one turn.
    pub fn adversarial(category: impl Into<String>, prompt: impl Into<String>) -> Self {
        let category = category.into();
        Self {
            id: Uuid::new_v4(),
            conversation_id: format!("adversarial-{category}"),
            turns: vec![TestTurn::new(1, prompt).with_category(category)],
        }
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.turns.is_empty() {
            return Err(format!("unit '{}' has no turns", self.conversation_id));
        }
        for turn in &self.turns {
            if turn.input.trim().is_empty() {
                return Err(format!(
                    "unit '{}' turn {} has an empty input",
                    self.conversation_id, turn.turn_number
                ));
            }
        }
        Ok(())
    }
}
