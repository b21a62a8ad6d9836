//! Error type shared by the codecs, the allocator and the tree engine.

use thiserror::Error;

use crate::NodeOffset;

/// Errors produced by `wordtree`.
#[derive(Debug, Error)]
pub enum Error {
    /// A key record starts with the null-key or free-slot marker, or its word
    /// run is not valid UTF-16.
    #[error("invalid key record: {0}")]
    InvalidKey(&'static str),

    /// A word that cannot be represented by the key codec.
    #[error("word {word:?} cannot be stored: {reason}")]
    InvalidWord {
        word: String,
        reason: &'static str,
    },

    /// A key or node record slice of the wrong size.
    #[error("record is {actual} bytes, expected {expected}")]
    RecordLength { expected: usize, actual: usize },

    /// The slot at `offset` does not carry the active marker.
    #[error("no active node at offset {offset}")]
    InactiveSlot { offset: NodeOffset },

    /// An active record whose fields are inconsistent.
    #[error("corrupt node record at offset {offset}: {reason}")]
    CorruptNode {
        offset: NodeOffset,
        reason: &'static str,
    },

    /// The allocator scanned up to the configured maximum without finding a
    /// free slot.
    #[error("node buffer exhausted: no free slot below {max_capacity} bytes")]
    CapacityExhausted { max_capacity: usize },

    #[error("invalid tree configuration: {0}")]
    Config(String),

    /// A structural check failed (see [`crate::WordTree::check`]).
    #[error("tree invariant violated: {0}")]
    Invariant(String),

    #[error("invalid tree image: {0}")]
    InvalidImage(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for `wordtree` operations.
pub type Result<T> = std::result::Result<T, Error>;
