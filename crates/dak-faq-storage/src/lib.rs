//! Storage capabilities required by the DAK FAQ engine
//!
//! This crate provides:
//! - The `Storage` trait question modules read repositories through
//! - The `BlobStore` trait backing the durable vocabulary cache tier
//! - Filesystem and in-memory implementations of both
//! - Glob-based path matching shared by the implementations

pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod pattern;
pub mod storage;

pub use blob::*;
pub use error::*;
pub use fs::FsStorage;
pub use memory::MemoryStorage;
pub use pattern::PathMatcher;
pub use storage::*;
