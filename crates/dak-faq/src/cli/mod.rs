//! CLI functionality for the `dak-faq` tool
//!
//! - Question commands (list, run, batch, schema, validate, openapi, audit)
//! - Canonical resource administration
//! - Parameter parsing, logging set-up and output formatting

pub mod canonical;
pub mod logging;
pub mod output;
pub mod params;
pub mod questions;
