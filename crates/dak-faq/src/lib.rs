//! DAK FAQ: answers to frequently asked questions about a Digital Adaptation Kit
//!
//! This crate ties the layers together:
//! - `config`: TOML configuration with environment overrides
//! - `service`: the inbound API transport adapters call
//! - `cli`: the `dak-faq` command-line tool (feature `cli`)
//!
//! # Example
//!
//! ```no_run
//! use dak_faq::{FaqConfig, FaqService, local_context};
//! use dak_faq::engine::CatalogFilter;
//!
//! # async fn run() -> Result<(), dak_faq::FaqError> {
//! let service = FaqService::from_config(&FaqConfig::default())?;
//! for question in service.list_questions(&CatalogFilter::new())? {
//!     println!("{}: {}", question.id, question.title);
//! }
//!
//! let context = local_context("./my-dak");
//! let response = service
//!     .execute_one("dak-summary", Default::default(), &context)
//!     .await;
//! println!("{}", response.is_success());
//! # Ok(())
//! # }
//! ```

pub use dak_faq_canonical as canonical;
pub use dak_faq_diagnostics as diagnostics;
pub use dak_faq_engine as engine;
pub use dak_faq_storage as storage;
pub use dak_faq_types as types;

pub mod config;
pub mod service;

pub use config::FaqConfig;
pub use dak_faq_diagnostics::{ErrorCode, FaqError};
pub use service::{FaqService, local_context};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
