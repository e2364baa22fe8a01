//! Error types for the hippocampal word-store engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors the engine can raise. Every variant leaves the engine's state
/// unchanged except [`EngineError::NumericFault`], which is fatal: an engine
/// that raises it should be discarded rather than called again.
#[derive(Error, Debug)]
pub enum EngineError {
    /// `learn` on a new word when the store is already at capacity.
    #[error("store is at capacity ({capacity} words); cannot learn a new word")]
    CapacityFull {
        /// The store's configured capacity
        capacity: usize,
    },

    /// A lookup targeted a word that was never learned.
    #[error("word {word:?} is not known to this engine")]
    UnknownWord {
        /// The word text that was looked up
        word: String,
    },

    /// `recall_one` requested the single best match from a store with no
    /// learned words. `recall` and `get_top_memories` never raise this: they
    /// return an empty result on an empty store instead, since a caller
    /// asking for a ranked list is never wrong to receive zero entries.
    #[error("store has no learned words")]
    EmptyStore,

    /// A caller-supplied argument is out of its valid domain. In practice
    /// this is `recall`'s `top_n == 0`; `cycles` is a `u32` so "negative
    /// cycles" cannot arise, and `dt` is never a caller-facing parameter.
    #[error("invalid input for {field}: {value}")]
    InvalidInput {
        /// The argument name
        field: String,
        /// A description of the offending value
        value: String,
    },

    /// Malformed or version-mismatched persisted state passed to `load`.
    #[error("serialization error: {source}")]
    Serialization {
        /// The underlying storage error
        #[from]
        source: hippo_storage::StorageError,
    },

    /// A kernel observed non-finite state after a step that should have
    /// clamped it. Fatal: the engine instance must be discarded.
    #[error("numeric fault: {source}")]
    NumericFault {
        /// The underlying core error
        #[from]
        source: hippo_core::CoreError,
    },
}

impl EngineError {
    /// Construct a capacity-full error
    pub fn capacity_full(capacity: usize) -> Self {
        Self::CapacityFull { capacity }
    }

    /// Construct an unknown-word error
    pub fn unknown_word(word: impl Into<String>) -> Self {
        Self::UnknownWord { word: word.into() }
    }

    /// Construct an invalid-input error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_full_display() {
        let err = EngineError::capacity_full(4);
        assert!(format!("{}", err).contains('4'));
    }

    #[test]
    fn test_unknown_word_display() {
        let err = EngineError::unknown_word("xyzzy");
        assert!(format!("{}", err).contains("xyzzy"));
    }
}
