//! The persisted engine document: a single self-describing snapshot of engine state.
//!
//! `serde_json` is used rather than a fixed binary layout because the document is meant
//! to be inspectable and versioned by a plain string field, not because the data is large.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{Result, StorageError};

/// Current document version produced by this crate. Bump when the layout changes
/// in a way that `load` cannot translate.
pub const DOCUMENT_VERSION: &str = "1";

/// Per-synapse persistence fields, in synapse-creation order, matching the weight
/// array at the same index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynapsePersistence {
    /// Monotone consolidation level in [0, 1]
    pub consolidation: f64,
    /// Monotone peak weight ever reached
    pub peak_weight: f64,
    /// Number of times `consolidate` has been called on this synapse
    pub replay_count: u32,
}

/// One word's persisted state: identity plus the three synapse bundles' weights
/// and persistence fields, each in synapse-creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWord {
    /// Stable lowercase/trimmed word id
    pub id: String,
    /// Original (non-normalised) word text
    pub text: String,
    /// Optional context label associated at learn time
    pub context: Option<String>,
    /// Use-frequency counter
    pub frequency: u32,
    /// DG -> CA3 synapse weights (size 2*30 in insertion order)
    pub dg_ca3_weights: Vec<f64>,
    /// CA3 <-> CA3 recurrent synapse weights (insertion order)
    pub ca3_recurrent_weights: Vec<f64>,
    /// CA3 -> CA1 synapse weights (insertion order)
    pub ca3_ca1_weights: Vec<f64>,
    /// Persistence fields matching `dg_ca3_weights` index for index
    pub dg_ca3_persistence: Vec<SynapsePersistence>,
    /// Persistence fields matching `ca3_recurrent_weights` index for index
    pub ca3_recurrent_persistence: Vec<SynapsePersistence>,
    /// Persistence fields matching `ca3_ca1_weights` index for index
    pub ca3_ca1_persistence: Vec<SynapsePersistence>,
}

/// Full engine snapshot, as described in spec section 4.7 / 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineDocument {
    /// Document format version, checked on load
    pub version: String,
    /// Word capacity the engine was configured with
    pub capacity: usize,
    /// RNG seed the engine was constructed with, so a reloaded engine's
    /// re-derived recurrent wiring matches the original topology
    pub rng_seed: u64,
    /// Words in insertion order
    pub words: Vec<PersistedWord>,
}

impl EngineDocument {
    /// Construct a new document at the current format version
    pub fn new(capacity: usize, rng_seed: u64, words: Vec<PersistedWord>) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            capacity,
            rng_seed,
            words,
        }
    }

    /// Serialize to a writer as pretty-printed, deterministic JSON
    pub fn save<W: Write>(&self, mut sink: W) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        sink.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Deserialize from a reader, rejecting documents from an incompatible version
    pub fn load<R: Read>(mut source: R) -> Result<Self> {
        let mut text = String::new();
        source.read_to_string(&mut text)?;
        let doc: EngineDocument = serde_json::from_str(&text)
            .map_err(|e| StorageError::invalid_format(e.to_string()))?;
        if doc.version != DOCUMENT_VERSION {
            return Err(StorageError::version_mismatch(doc.version, DOCUMENT_VERSION));
        }
        Ok(doc)
    }
}
