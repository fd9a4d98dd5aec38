//! MCP tool implementations.
//!
//! This module contains all tools exposed by the emissions-mcp server.

pub mod cache;
pub mod health;
pub mod measure;

pub use measure::{MeasureParams, measure_impl};
