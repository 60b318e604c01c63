//! DAK FAQ diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by every layer of
//! the FAQ engine: the closed set of response error codes, the library error type,
//! and the diagnostics used for parameter validation and CLI reporting.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for FAQ engine operations
pub type Result<T> = std::result::Result<T, FaqError>;
