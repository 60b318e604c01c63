//! DAK FAQ data model
//!
//! This crate defines the in-memory structures exchanged between the engine layers:
//! - Question definitions, parameter specs and vocabulary bindings
//! - Canonical resources, ValueSet expansions and cache statistics
//! - Execution requests, responses and batch summaries
//! - Parameter validation results
//!
//! Everything serializes to JSON in camelCase; serialization itself is left to the
//! transport layer.

pub mod canonical;
pub mod execution;
pub mod question;
pub mod validation;

pub use canonical::*;
pub use execution::*;
pub use question::*;
pub use validation::*;

/// JSON object used for parameters, structured results and metadata
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
