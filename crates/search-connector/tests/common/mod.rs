//! Test infrastructure for the search connector.
//!
//! Provides an in-memory [`SearchEngineClient`](helios_search_connector::SearchEngineClient),
//! schema fixtures and a log capture helper.

#![allow(dead_code)]

pub mod fixtures;
pub mod logs;
pub mod mock_client;

// Re-export commonly used items
pub use fixtures::*;
pub use logs::*;
pub use mock_client::*;
