//! The hippocampal word-store engine: learning, STDP-driven association,
//! sleep consolidation, MemoryRank importance and cued recall, built on the
//! neuron kernels and STDP synapse in `hippo-core` and the persistence
//! document in `hippo-storage`.
//!
//! This crate has exactly one externally-visible fallible surface,
//! [`EngineError`], and one entry point, [`Engine`].

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod memory_rank;
pub mod sleep;
pub mod trial;
pub mod word;

pub use config::EngineConfig;
pub use engine::{Engine, EngineStats, PersistenceRecord, RecallMatch};
pub use error::{EngineError, Result};
pub use memory_rank::{CrossLink, MemoryRank};
pub use sleep::SleepReport;

/// Crate version, exposed for host embedders that log a build fingerprint.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");
