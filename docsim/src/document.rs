use wordtree::{Key, TreeConfig, WordTree};

use crate::doc_freq::DocumentFrequency;
use crate::error::Result;
use crate::tokenize::{word_counts, StopWords};

/// A named document and the word-frequency tree built from its text.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    tree: WordTree,
}

impl Document {
    /// Tokenize `text`, build its tree and record it in `doc_freq`.
    ///
    /// Every distinct stored word is inserted exactly once, in sorted order.
    pub fn ingest(
        name: impl Into<String>,
        text: &str,
        stop_words: &StopWords,
        tree_config: TreeConfig,
        doc_freq: &DocumentFrequency,
    ) -> Result<Self> {
        let name = name.into();
        let counts = word_counts(text, stop_words);

        let mut tree = WordTree::with_config(tree_config)?;
        for (word, &count) in &counts {
            tree.insert(Key::new(word, count)?)?;
        }
        doc_freq.record_document(counts.keys().map(String::as_str));

        tracing::debug!(
            document = %name,
            distinct = tree.total_key_count(),
            words = tree.total_word_count(),
            "ingested document"
        );
        Ok(Self { name, tree })
    }

    pub fn from_tree(name: impl Into<String>, tree: WordTree) -> Self {
        Self {
            name: name.into(),
            tree,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn tree(&self) -> &WordTree {
        &self.tree
    }

    pub fn into_tree(self) -> WordTree {
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_builds_tree_and_records() {
        let df = DocumentFrequency::new();
        let doc = Document::ingest(
            "pets",
            "The cat sat on the mat. The cat purred.",
            &StopWords::default(),
            TreeConfig::default(),
            &df,
        )
        .unwrap();

        let tree = doc.tree();
        tree.check().unwrap();
        assert_eq!(doc.name(), "pets");
        assert_eq!(tree.search("cat").unwrap(), Some(2));
        assert_eq!(tree.search("mat").unwrap(), Some(1));
        assert_eq!(tree.search("the").unwrap(), None);
        assert_eq!(tree.total_key_count(), 4);
        assert_eq!(tree.total_word_count(), 5);

        assert_eq!(df.document_count(), 1);
        assert_eq!(df.appearances("cat"), Some(1));
        assert_eq!(df.appearances("the"), None);
    }

    #[test]
    fn test_ingest_empty_text() {
        let df = DocumentFrequency::new();
        let doc = Document::ingest("blank", "", &StopWords::default(), TreeConfig::default(), &df).unwrap();
        assert!(doc.tree().is_empty());
        assert_eq!(df.document_count(), 1);
        assert!(df.is_empty());
    }

    #[test]
    fn test_ingest_many_words() {
        let df = DocumentFrequency::new();
        let text: String = (0..3000u32)
            .map(|i| {
                // Letters only: encode i in base 26.
                let mut n = i;
                let mut w = String::new();
                loop {
                    w.push((b'a' + (n % 26) as u8) as char);
                    n /= 26;
                    if n == 0 {
                        break;
                    }
                }
                w + " "
            })
            .collect();
        let doc = Document::ingest("big", &text, &StopWords::new(Vec::<&str>::new()), TreeConfig::default(), &df).unwrap();
        let stats = doc.tree().check().unwrap();
        assert_eq!(stats.key_count, 3000);
        assert!(stats.height > 2);
    }
}
