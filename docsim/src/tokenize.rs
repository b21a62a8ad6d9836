//! Text to per-document word counts.

use std::collections::{BTreeMap, HashSet};

use wordtree::key::truncate_word;

/// Words too common to say anything about a document.
pub const DEFAULT_STOP_WORDS: [&str; 40] = [
    "the", "to", "of", "and", "a", "in", "is", "it", "you", "that", "an", "was", "for", "on",
    "are", "with", "as", "his", "i", "they", "be", "at", "have", "this", "from", "or", "had",
    "by", "but", "some", "what", "there", "we", "can", "were", "all", "your", "when", "use",
    "how",
];

/// Set of words dropped during counting. Matching is on the lower-cased word.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}

/// Lower-cased runs of alphabetic characters.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Count the words of `text`, stop words excluded.
///
/// Counts are keyed by the word as the tree stores it, so long words sharing
/// a stored prefix are merged into one entry.
pub fn word_counts(text: &str, stop_words: &StopWords) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for token in tokens(text) {
        if stop_words.contains(&token) {
            continue;
        }
        let stored = truncate_word(&token);
        match counts.get_mut(stored) {
            Some(c) => *c = u32::saturating_add(*c, 1),
            None => {
                counts.insert(stored.to_owned(), 1);
            }
        }
    }
    counts
}
