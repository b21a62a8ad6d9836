//! Error types for docsim.

use thiserror::Error;

/// Top-level error type for corpus operations.
#[derive(Debug, Error)]
pub enum DocSimError {
    /// Tree index errors.
    #[error("tree error: {0}")]
    Tree(#[from] wordtree::Error),

    /// I/O error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serde serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Corpus bookkeeping errors (duplicate names, missing files).
    #[error("corpus error: {0}")]
    Corpus(String),

    /// HTML extraction errors.
    #[error("html error: {0}")]
    Html(String),

    /// Configuration-related errors.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for docsim operations.
pub type Result<T> = std::result::Result<T, DocSimError>;
