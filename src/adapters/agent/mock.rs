//! Mock agent client for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::models::AgentReply;
use crate::domain::ports::{AgentClient, AgentClientError};

/// Scripted behavior for one utterance.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Reply(AgentReply),
    Unavailable(String),
    NotFound(String),
    Error(String),
}

impl ScriptedResponse {
    pub fn reply(reply: AgentReply) -> Self {
        Self::Reply(reply)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Reply(AgentReply::text(text))
    }
}

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub session_id: String,
    pub utterance: String,
}

/// Mock agent client with scripted replies, failure injection, and
/// concurrency instrumentation.
///
/// Unscripted utterances get an echo reply so tests only script what they
/// assert on.
pub struct MockAgentClient {
    scripts: RwLock<HashMap<String, ScriptedResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockAgentClient {
    pub fn new() -> Self {
        Self {
            scripts: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Hold each call open for `delay` so overlap becomes observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script the behavior for one exact utterance.
    pub async fn script(&self, utterance: impl Into<String>, response: ScriptedResponse) {
        let mut scripts = self.scripts.write().await;
        scripts.insert(utterance.into(), response);
    }

    /// Every call observed so far, in arrival order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Highest number of calls that were ever in flight simultaneously.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockAgentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentClient for MockAgentClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn detect_response(
        &self,
        session_id: &str,
        utterance: &str,
        _language_code: &str,
    ) -> Result<AgentReply, AgentClientError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        {
            let mut calls = self.calls.lock().await;
            calls.push(RecordedCall {
                session_id: session_id.to_string(),
                utterance: utterance.to_string(),
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = {
            let scripts = self.scripts.read().await;
            scripts.get(utterance).cloned()
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(ScriptedResponse::Reply(reply)) => Ok(reply),
            Some(ScriptedResponse::Unavailable(msg)) => Err(AgentClientError::Unavailable(msg)),
            Some(ScriptedResponse::NotFound(msg)) => Err(AgentClientError::NotFound(msg)),
            Some(ScriptedResponse::Error(msg)) => Err(AgentClientError::Call(msg)),
            None => Ok(AgentReply::text(format!("echo: {utterance}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_unscripted_echoes() {
        let client = MockAgentClient::new();
        let reply = assert_ok!(client.detect_response("s", "hello", "en").await);
        assert_eq!(reply.response_text, "echo: hello");
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let client = MockAgentClient::new();
        client
            .script("bad", ScriptedResponse::NotFound("no such agent".to_string()))
            .await;

        let err = client.detect_response("s", "bad", "en").await.unwrap_err();
        assert!(matches!(err, AgentClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let client = MockAgentClient::new();
        client.detect_response("s-1", "one", "en").await.unwrap();
        client.detect_response("s-1", "two", "en").await.unwrap();

        let calls = client.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].utterance, "one");
        assert_eq!(calls[1].utterance, "two");
    }
}
