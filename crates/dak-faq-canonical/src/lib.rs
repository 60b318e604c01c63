//! Canonical vocabulary layer
//!
//! This crate answers "what does this vocabulary say" for the rest of the engine:
//!
//! - **Vocabulary Cache**: memory + durable tiers keyed by normalized URL, with a
//!   freshness window and a stale-but-usable fallback
//! - **Fetching**: a single `GET(url, timeout)` capability behind the `Fetcher` trait
//! - **Canonical Schema Service**: fetch, expand and validate against published
//!   ValueSets and logical models
//!
//! # Degradation
//!
//! Network trouble never surfaces as an error. A stale cached copy is served when a
//! refresh fails, and code checks against a vocabulary that was never fetched pass
//! permissively. Every such degradation is logged and returned as a warning.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod known;
pub mod locator;
pub mod resource;
pub mod service;
pub mod structural;

pub use cache::{CacheLookup, CacheTier, DurableTier, MemoryTier, VocabularyCache};
pub use error::{CacheError, FetchError};
pub use fetch::{FetchResponse, Fetcher, HttpFetcher, OfflineFetcher};
pub use known::known_canonicals;
pub use locator::{CanonicalLocator, CanonicalRef, PublicationRule};
pub use resource::{detect_type, extract_codes};
pub use service::{CanonicalSchemaService, CodeCheck, Membership, Resolved};
pub use structural::validate_structure;
