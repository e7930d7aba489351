//! Agent client adapters.

pub mod mock;
pub mod rest;

pub use mock::{MockAgentClient, RecordedCall, ScriptedResponse};
pub use rest::{RestAgentClient, RestAgentConfig};
