//! Adapters: concrete implementations of the domain ports.

pub mod agent;
pub mod sqlite;
