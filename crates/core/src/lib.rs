//! Core types and shared functionality for the emissions cache.
//!
//! This crate provides:
//! - The partial-cache measure engine
//! - In-memory emissions cache with TTL and priority entries
//! - The resolver contract implemented by provider clients
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod measure;
pub mod model;
pub mod resolver;

pub use cache::{CachedEntry, EmissionsCache, EmissionsStore, Expiry};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use measure::MeasureService;
pub use model::{BatchResponse, EmissionsRecord, RequestRow, ResolveRow, ResponseRow};
pub use resolver::EmissionsResolver;
