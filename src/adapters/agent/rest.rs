//! REST agent client.
//!
//! Talks to a conversational agent endpoint that exposes a detect-intent
//! style API. The HTTP client and credentials are resolved once at
//! construction; the wire shapes below are the only place external JSON is
//! interpreted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::{AgentConfig, AgentReply};
use crate::domain::ports::{AgentClient, AgentClientError};

/// Configuration for the REST agent client.
#[derive(Debug, Clone)]
pub struct RestAgentConfig {
    pub base_url: String,
    pub agent_id: String,
    /// Bearer token; falls back to the `GAUNTLET_AGENT_TOKEN` environment
    /// variable when unset
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RestAgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8300".to_string(),
            agent_id: "default".to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

impl RestAgentConfig {
    pub fn from_agent_config(config: &AgentConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            agent_id: config.agent_id.clone(),
            api_token: config.api_token.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    fn resolve_token(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var("GAUNTLET_AGENT_TOKEN").ok())
    }
}

/// Request body for one detect call.
#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    text: &'a str,
    language_code: &'a str,
}

/// Wire shape of the agent's reply.
#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    response_text: String,
    intent: Option<WireIntent>,
    #[serde(default)]
    confidence: f64,
    parameters: Option<Value>,
    current_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireIntent {
    name: String,
}

impl From<DetectResponse> for AgentReply {
    fn from(wire: DetectResponse) -> Self {
        Self {
            response_text: wire.response_text,
            matched_intent: wire.intent.map(|i| i.name),
            confidence: wire.confidence,
            parameters: wire.parameters,
            current_page: wire.current_page,
        }
    }
}

pub struct RestAgentClient {
    client: Client,
    config: RestAgentConfig,
    token: Option<String>,
}

impl RestAgentClient {
    /// Build the client once, up front. No lazy construction at call time.
    pub fn new(config: RestAgentConfig) -> Result<Self, AgentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentClientError::Unavailable(format!("http client: {e}")))?;

        let token = config.resolve_token();
        Ok(Self { client, config, token })
    }

    fn detect_url(&self, session_id: &str) -> String {
        format!(
            "{}/v1/agents/{}/sessions/{}:detect",
            self.config.base_url.trim_end_matches('/'),
            self.config.agent_id,
            session_id
        )
    }
}

#[async_trait]
impl AgentClient for RestAgentClient {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn detect_response(
        &self,
        session_id: &str,
        utterance: &str,
        language_code: &str,
    ) -> Result<AgentReply, AgentClientError> {
        let mut request = self
            .client
            .post(self.detect_url(session_id))
            .json(&DetectRequest { text: utterance, language_code });

        if let Some(ref token) = self.token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentClientError::Call(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AgentClientError::Unavailable(format!(
                    "agent '{}' rejected credentials",
                    self.config.agent_id
                )))
            }
            StatusCode::NOT_FOUND => Err(AgentClientError::NotFound(format!(
                "agent '{}'",
                self.config.agent_id
            ))),
            status if !status.is_success() => {
                Err(AgentClientError::Call(format!("agent returned {status}")))
            }
            _ => {
                let wire: DetectResponse = response
                    .json()
                    .await
                    .map_err(|e| AgentClientError::Call(format!("malformed reply: {e}")))?;
                Ok(wire.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> RestAgentClient {
        RestAgentClient::new(RestAgentConfig {
            base_url: server.url(),
            agent_id: "travel-bot".to_string(),
            api_token: Some("token".to_string()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_detect_maps_wire_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/agents/travel-bot/sessions/s-1:detect")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"response_text":"Where from?","intent":{"name":"flight.book"},
                   "confidence":0.92,"parameters":{"destination":"Paris"},
                   "current_page":"CollectOrigin"}"#,
            )
            .create_async()
            .await;

        let reply = client_for(&server)
            .detect_response("s-1", "fly to Paris", "en")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.response_text, "Where from?");
        assert_eq!(reply.matched_intent.as_deref(), Some("flight.book"));
        assert_eq!(reply.current_page.as_deref(), Some("CollectOrigin"));
    }

    #[tokio::test]
    async fn test_status_codes_map_to_error_kinds() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let err = client_for(&server)
            .detect_response("s-1", "hi", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentClientError::Unavailable(_)));

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server)
            .detect_response("s-1", "hi", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentClientError::NotFound(_)));

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server)
            .detect_response("s-1", "hi", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentClientError::Call(_)));
    }
}
