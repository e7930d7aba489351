//! Concurrency-limited batch executor.
//!
//! Fans units out across a bounded worker pool while keeping the turns of
//! each unit strictly sequential, since the external agent holds
//! session-scoped dialog state. Every result is surfaced through the
//! channel the instant it exists, never batched.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::domain::models::{EvaluationConfig, TestTurn, TestUnit, TurnResult};
use crate::domain::ports::AgentClient;
use crate::services::evaluator;

/// Configuration for one batch execution.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Units allowed in flight simultaneously
    pub max_concurrent: usize,
    /// Language sent with every utterance
    pub language_code: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            language_code: "en".to_string(),
        }
    }
}

/// Replays a batch of units against the agent under a concurrency bound.
///
/// The semaphore is owned by the executor instance, so every call site's
/// concurrency policy is independent and testable.
pub struct BatchExecutor {
    client: Arc<dyn AgentClient>,
    evaluation: EvaluationConfig,
    config: ExecutorConfig,
}

impl BatchExecutor {
    pub fn new(
        client: Arc<dyn AgentClient>,
        evaluation: EvaluationConfig,
        config: ExecutorConfig,
    ) -> Self {
        Self { client, evaluation, config }
    }

    /// Run every unit to completion, sending each result as it is produced.
    ///
    /// Unit scheduling order is unspecified; completion order is whatever
    /// the agent's latencies make it. A turn failure is captured in its
    /// result and the unit continues with its remaining turns.
    pub async fn run(self, units: Vec<TestUnit>, results: mpsc::Sender<TurnResult>) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(units.len());

        for unit in units {
            let client = Arc::clone(&self.client);
            let evaluation = self.evaluation.clone();
            let language_code = self.config.language_code.clone();
            let semaphore = Arc::clone(&semaphore);
            let results = results.clone();

            handles.push(tokio::spawn(async move {
                // Closed semaphore means the batch was torn down.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                // Fresh session per unit: dialog state never leaks across units.
                let session_id = Uuid::new_v4().to_string();

                for turn in &unit.turns {
                    let result = run_turn(
                        client.as_ref(),
                        &evaluation,
                        &unit.conversation_id,
                        &session_id,
                        &language_code,
                        turn,
                    )
                    .await;

                    if results.send(result).await.is_err() {
                        // Receiver dropped; nothing left to report to.
                        return;
                    }
                }
            }));
        }

        drop(results);

        for outcome in futures::future::join_all(handles).await {
            if let Err(err) = outcome {
                tracing::warn!(error = %err, "unit task aborted");
            }
        }
    }
}

/// Execute one turn: call the adapter, time it, evaluate the reply.
async fn run_turn(
    client: &dyn AgentClient,
    evaluation: &EvaluationConfig,
    conversation_id: &str,
    session_id: &str,
    language_code: &str,
    turn: &TestTurn,
) -> TurnResult {
    let started = Instant::now();
    let outcome = client.detect_response(session_id, &turn.input, language_code).await;
    let execution_time_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(reply) => {
            let eval = evaluator::evaluate_turn(turn, &reply, evaluation);
            TurnResult::from_reply(
                conversation_id,
                turn,
                &reply,
                eval.intent_matched,
                eval.response_matched,
                eval.parameters_matched,
                eval.score,
                eval.differences,
                execution_time_ms,
            )
        }
        Err(err) => {
            tracing::warn!(
                conversation = conversation_id,
                turn = turn.turn_number,
                error = %err,
                "adapter call failed; recording error result"
            );
            TurnResult::from_error(conversation_id, turn, err.to_string(), execution_time_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::agent::{MockAgentClient, ScriptedResponse};

    fn unit_with_turns(name: &str, count: u32) -> TestUnit {
        TestUnit::conversation(
            name,
            (1..=count).map(|i| TestTurn::new(i, format!("{name} turn {i}"))).collect(),
        )
    }

    #[tokio::test]
    async fn test_all_turns_produce_results() {
        let client = Arc::new(MockAgentClient::new());
        let executor =
            BatchExecutor::new(client, EvaluationConfig::default(), ExecutorConfig::default());

        let (tx, mut rx) = mpsc::channel(16);
        executor.run(vec![unit_with_turns("a", 2), unit_with_turns("b", 3)], tx).await;

        let mut received = Vec::new();
        while let Some(result) = rx.recv().await {
            received.push(result);
        }
        assert_eq!(received.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_turn_does_not_stop_unit() {
        let client = Arc::new(MockAgentClient::new());
        client
            .script("a turn 1", ScriptedResponse::Error("boom".to_string()))
            .await;

        let executor = BatchExecutor::new(
            Arc::clone(&client) as Arc<dyn AgentClient>,
            EvaluationConfig::default(),
            ExecutorConfig::default(),
        );

        let (tx, mut rx) = mpsc::channel(16);
        executor.run(vec![unit_with_turns("a", 2)], tx).await;

        let mut received = Vec::new();
        while let Some(result) = rx.recv().await {
            received.push(result);
        }

        assert_eq!(received.len(), 2);
        let first = received.iter().find(|r| r.turn_number == 1).unwrap();
        assert!(first.error.is_some());
        assert!(!first.passed());
        let second = received.iter().find(|r| r.turn_number == 2).unwrap();
        assert!(second.error.is_none());
    }
}
