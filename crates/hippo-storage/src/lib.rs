//! Persistence layer for the hippocampal word-store engine.
//!
//! Defines the single self-describing document the engine saves to and loads from,
//! and the error type covering malformed or version-mismatched input.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;

pub use document::{EngineDocument, PersistedWord, SynapsePersistence, DOCUMENT_VERSION};
pub use error::{Result, StorageError};

/// Storage crate version for compatibility checking, distinct from the document
/// format version above.
pub const STORAGE_VERSION: u32 = 1;
