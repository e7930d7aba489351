//! Infrastructure: configuration and logging plumbing.

pub mod config;
pub mod logging;
