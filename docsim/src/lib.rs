//! # docsim
//!
//! Document similarity over [`wordtree`] word-frequency trees.
//!
//! Each document is tokenized into a word/count tree; a shared
//! [`DocumentFrequency`] table records how many documents contain each word.
//! Two documents are compared with a TF-IDF weighted overlap
//! ([`similarity`]) and a corpus can be grouped with DBSCAN ([`dbscan`]).
//!
//! ```rust
//! use docsim::{Corpus, DocSimConfig};
//!
//! let mut corpus = Corpus::new(DocSimConfig::default())?;
//! corpus.add_text("rust", "borrow checker, lifetimes and traits")?;
//! corpus.add_text("go", "goroutines and channels")?;
//!
//! let (query, doc_freq) = corpus.probe("query", "traits and lifetimes")?;
//! let (best, _score) = corpus.most_similar(&query, &doc_freq)?.unwrap();
//! assert_eq!(corpus.documents()[best].name(), "rust");
//! # Ok::<(), docsim::DocSimError>(())
//! ```

#![warn(clippy::all)]

pub mod cluster;
pub mod config;
pub mod corpus;
pub mod doc_freq;
pub mod document;
pub mod error;
pub mod html;
pub mod similarity;
pub mod tokenize;

pub use cluster::{dbscan, Label};
pub use config::DocSimConfig;
pub use corpus::Corpus;
pub use doc_freq::{DocFreqSnapshot, DocumentFrequency};
pub use document::Document;
pub use error::{DocSimError, Result};
pub use html::paragraph_text;
pub use similarity::similarity;
pub use tokenize::{word_counts, StopWords};
