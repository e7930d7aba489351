//! Concurrency properties of the batch executor.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gauntlet::adapters::agent::MockAgentClient;
use gauntlet::domain::models::{EvaluationConfig, TestTurn, TestUnit};
use gauntlet::services::{BatchExecutor, ExecutorConfig};
use tokio::sync::mpsc;

fn units(count: usize, turns_per_unit: u32) -> Vec<TestUnit> {
    (0..count)
        .map(|u| {
            TestUnit::conversation(
                format!("unit-{u}"),
                (1..=turns_per_unit)
                    .map(|t| TestTurn::new(t, format!("unit-{u} turn-{t}")))
                    .collect(),
            )
        })
        .collect()
}

async fn drain(mut rx: mpsc::Receiver<gauntlet::TurnResult>) -> Vec<gauntlet::TurnResult> {
    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}

#[tokio::test]
async fn test_bound_is_never_exceeded() {
    let client = Arc::new(MockAgentClient::new().with_delay(Duration::from_millis(25)));
    let executor = BatchExecutor::new(
        Arc::clone(&client) as Arc<dyn gauntlet::AgentClient>,
        EvaluationConfig::default(),
        ExecutorConfig { max_concurrent: 3, language_code: "en".to_string() },
    );

    let (tx, rx) = mpsc::channel(64);
    executor.run(units(10, 1), tx).await;
    let results = drain(rx).await;

    assert_eq!(results.len(), 10);
    assert!(
        client.max_in_flight() <= 3,
        "observed {} calls in flight",
        client.max_in_flight()
    );
    // With 10 one-turn units and a 25ms call, the pool actually overlaps.
    assert!(client.max_in_flight() >= 2);
}

#[tokio::test]
async fn test_turns_within_a_unit_stay_ordered() {
    let client = Arc::new(MockAgentClient::new().with_delay(Duration::from_millis(5)));
    let executor = BatchExecutor::new(
        Arc::clone(&client) as Arc<dyn gauntlet::AgentClient>,
        EvaluationConfig::default(),
        ExecutorConfig { max_concurrent: 3, language_code: "en".to_string() },
    );

    let (tx, rx) = mpsc::channel(64);
    executor.run(units(6, 4), tx).await;
    let results = drain(rx).await;
    assert_eq!(results.len(), 24);

    // The adapter must observe each session's turns in strictly
    // increasing order.
    let mut per_session: HashMap<String, Vec<u32>> = HashMap::new();
    for call in client.calls().await {
        let turn: u32 = call
            .utterance
            .rsplit("turn-")
            .next()
            .and_then(|t| t.parse().ok())
            .expect("utterance carries its turn number");
        per_session.entry(call.session_id).or_default().push(turn);
    }

    assert_eq!(per_session.len(), 6);
    for (session, turns) in per_session {
        assert!(
            turns.windows(2).all(|w| w[0] < w[1]),
            "session {session} saw turns out of order: {turns:?}"
        );
    }
}

#[tokio::test]
async fn test_one_failing_unit_does_not_cancel_siblings() {
    let client = Arc::new(MockAgentClient::new());
    client
        .script(
            "unit-0 turn-1",
            gauntlet::adapters::agent::ScriptedResponse::Unavailable("denied".to_string()),
        )
        .await;

    let executor = BatchExecutor::new(
        Arc::clone(&client) as Arc<dyn gauntlet::AgentClient>,
        EvaluationConfig::default(),
        ExecutorConfig { max_concurrent: 2, language_code: "en".to_string() },
    );

    let (tx, rx) = mpsc::channel(64);
    executor.run(units(3, 2), tx).await;
    let results = drain(rx).await;

    assert_eq!(results.len(), 6);
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].conversation_id, "unit-0");
    assert!(!failed[0].intent_matched && !failed[0].response_matched);
}

#[tokio::test]
async fn test_results_arrive_incrementally() {
    let client = Arc::new(MockAgentClient::new().with_delay(Duration::from_millis(30)));
    let executor = BatchExecutor::new(
        client,
        EvaluationConfig::default(),
        ExecutorConfig { max_concurrent: 1, language_code: "en".to_string() },
    );

    let (tx, mut rx) = mpsc::channel(64);
    let run = tokio::spawn(executor.run(units(2, 1), tx));

    // The first result must be observable before the whole batch is done.
    let first = tokio::time::timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("no result within deadline")
        .expect("channel closed early");
    assert_eq!(first.turn_number, 1);

    drain(rx).await;
    run.await.unwrap();
}
