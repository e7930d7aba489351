//! Agent client port: the narrow boundary to the external dialog agent.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::AgentReply;

/// Failures an adapter call can surface.
///
/// The three kinds stay distinguishable because callers treat them
/// differently: permission problems point at credentials, a missing agent
/// points at configuration, everything else is a per-call failure.
#[derive(Debug, Clone, Error)]
pub enum AgentClientError {
    /// Authentication or permission failure
    #[error("agent unavailable: {0}")]
    Unavailable(String),

    /// The referenced agent does not exist
    #[error("agent not found: {0}")]
    NotFound(String),

    /// Any other call failure (network, timeout, malformed reply)
    #[error("agent call failed: {0}")]
    Call(String),
}

/// Sends one utterance in the context of one session and returns the
/// agent's normalized reply.
///
/// The agent holds session-scoped dialog state, so turns sharing a
/// `session_id` must be sent in order. Implementations do not retry.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Adapter name for logging.
    fn name(&self) -> &'static str;

    async fn detect_response(
        &self,
        session_id: &str,
        utterance: &str,
        language_code: &str,
    ) -> Result<AgentReply, AgentClientError>;
}
