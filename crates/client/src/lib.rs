//! Client code for the emissions cache.
//!
//! This crate provides the Scope3 measurement API client, which implements
//! the core resolver contract used for cache misses.

pub mod scope3;

pub use scope3::{MeasureRequest, MeasureResponse, Scope3Client, Scope3Config, Scope3Error};
