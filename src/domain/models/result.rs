//! Per-turn result model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::reply::AgentReply;
use super::unit::TestTurn;

/// Outcome of replaying one turn against the agent.
///
/// Created exactly once when the adapter call returns (success or failure)
/// and immutable thereafter. The `id` doubles as the store's idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub id: Uuid,
    pub conversation_id: String,
    pub turn_number: u32,
    pub category: Option<String>,

    /// Literal text sent
    pub input: String,
    /// Literal text received, or an error surrogate
    pub agent_response: String,

    pub expected_intent: Option<String>,
    pub expected_response: Option<String>,
    pub expected_parameters: Option<Value>,

    pub matched_intent: Option<String>,
    pub confidence: Option<f64>,
    pub parameters: Option<Value>,
    pub page: Option<String>,

    pub intent_matched: bool,
    pub response_matched: bool,
    pub parameters_matched: bool,
    /// Similarity score in `[0, 1]`
    pub score: f64,
    /// Human-readable differences for reporting
    pub differences: Vec<String>,

    /// Wall-clock duration of the single external call
    pub execution_time_ms: u64,
    /// Present when the adapter call failed
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl TurnResult {
    /// Result skeleton carrying only the turn's identity and texts.
    ///
    /// Scoring fields default to non-matching; callers fill them in.
    pub fn blank(
        conversation_id: impl Into<String>,
        turn_number: u32,
        input: impl Into<String>,
        agent_response: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id: conversation_id.into(),
            turn_number,
            category: None,
            input: input.into(),
            agent_response: agent_response.into(),
            expected_intent: None,
            expected_response: None,
            expected_parameters: None,
            matched_intent: None,
            confidence: None,
            parameters: None,
            page: None,
            intent_matched: false,
            response_matched: false,
            parameters_matched: false,
            score: 0.0,
            differences: Vec::new(),
            execution_time_ms: 0,
            error: None,
            created_at: Utc::now(),
        }
    }

    fn from_turn(conversation_id: &str, turn: &TestTurn, agent_response: String) -> Self {
        let mut result = Self::blank(conversation_id, turn.turn_number, turn.input.clone(), agent_response);
        result.category = turn.category.clone();
        result.expected_intent = turn.expected_intent.clone();
        result.expected_response = turn.expected_response.clone();
        result.expected_parameters = turn.expected_parameters.clone();
        result
    }

    /// Build a result from a successful adapter reply plus its evaluation.
    #[allow(clippy::too_many_arguments)]
    pub fn from_reply(
        conversation_id: &str,
        turn: &TestTurn,
        reply: &AgentReply,
        intent_matched: bool,
        response_matched: bool,
        parameters_matched: bool,
        score: f64,
        differences: Vec<String>,
        execution_time_ms: u64,
    ) -> Self {
        let mut result = Self::from_turn(conversation_id, turn, reply.response_text.clone());
        result.matched_intent = reply.matched_intent.clone();
        result.confidence = Some(reply.confidence);
        result.parameters = reply.parameters.clone();
        result.page = reply.current_page.clone();
        result.intent_matched = intent_matched;
        result.response_matched = response_matched;
        result.parameters_matched = parameters_matched;
        result.score = score;
        result.differences = differences;
        result.execution_time_ms = execution_time_ms;
        result
    }

    /// Build a result for a failed adapter call.
    ///
    /// All matched flags stay false and the score stays 0.0.
    pub fn from_error(
        conversation_id: &str,
        turn: &TestTurn,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        let error = error.into();
        let mut result = Self::from_turn(conversation_id, turn, format!("<error: {error}>"));
        result.error = Some(error);
        result.execution_time_ms = execution_time_ms;
        result
    }

    /// Overall verdict: every configured assertion held.
    pub fn passed(&self) -> bool {
        self.error.is_none()
            && self.intent_matched
            && self.response_matched
            && self.parameters_matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result_never_passes() {
        let turn = TestTurn::new(1, "hello");
        let result = TurnResult::from_error("conv", &turn, "agent not found", 12);

        assert!(result.error.is_some());
        assert!(!result.intent_matched);
        assert!(!result.response_matched);
        assert!(!result.parameters_matched);
        assert_eq!(result.score, 0.0);
        assert!(!result.passed());
        assert!(result.agent_response.contains("agent not found"));
    }

    #[test]
    fn test_reply_result_echoes_expectations() {
        let turn = TestTurn::new(2, "book it")
            .with_expected_intent("flight.book")
            .with_expected_response("Done");
        let reply = AgentReply::text("Done").with_intent("flight.book", 0.93);

        let result = TurnResult::from_reply("conv", &turn, &reply, true, true, true, 1.0, vec![], 40);

        assert_eq!(result.turn_number, 2);
        assert_eq!(result.expected_intent.as_deref(), Some("flight.book"));
        assert_eq!(result.matched_intent.as_deref(), Some("flight.book"));
        assert!(result.passed());
    }
}
