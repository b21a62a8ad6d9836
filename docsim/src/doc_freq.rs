//! The shared word to document-count table.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Serializable contents of a [`DocumentFrequency`] table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFreqSnapshot {
    /// Documents recorded so far.
    pub document_count: u64,
    /// Word to number of documents containing it.
    pub appearances: BTreeMap<String, u32>,
}

/// How many documents each word appears in, plus the number of documents.
///
/// Internally synchronized so one table can be shared between ingestion and
/// scoring.
#[derive(Debug, Default)]
pub struct DocumentFrequency {
    inner: RwLock<DocFreqSnapshot>,
}

impl DocumentFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DocFreqSnapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> DocFreqSnapshot {
        self.inner.read().clone()
    }

    /// Count one more document containing `words`. Each distinct word is
    /// counted once however often it is passed.
    pub fn record_document<'a>(&self, words: impl IntoIterator<Item = &'a str>) {
        let distinct: BTreeSet<&str> = words.into_iter().collect();
        let mut inner = self.inner.write();
        inner.document_count += 1;
        for word in distinct {
            match inner.appearances.get_mut(word) {
                Some(n) => *n = n.saturating_add(1),
                None => {
                    inner.appearances.insert(word.to_owned(), 1);
                }
            }
        }
    }

    /// Documents containing `word`, or `None` if no recorded document does.
    pub fn appearances(&self, word: &str) -> Option<u32> {
        self.inner.read().appearances.get(word).copied()
    }

    pub fn document_count(&self) -> u64 {
        self.inner.read().document_count
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.inner.read().appearances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().appearances.is_empty()
    }

    /// `ln(documents / appearances)`, or `None` for an unseen word.
    pub fn idf(&self, word: &str) -> Option<f64> {
        let inner = self.inner.read();
        let n = *inner.appearances.get(word)?;
        if n == 0 || inner.document_count == 0 {
            return None;
        }
        Some((inner.document_count as f64 / f64::from(n)).ln())
    }

    pub fn write_json(&self, mut out: impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut out, &*self.inner.read())?;
        out.flush()?;
        Ok(())
    }

    pub fn read_json(input: impl Read) -> Result<Self> {
        let snapshot: DocFreqSnapshot = serde_json::from_reader(input)?;
        Ok(Self::from_snapshot(snapshot))
    }
}

impl Clone for DocumentFrequency {
    fn clone(&self) -> Self {
        Self::from_snapshot(self.snapshot())
    }
}
