//! TF-IDF weighted overlap of two word trees.

use wordtree::WordTree;

use crate::doc_freq::DocumentFrequency;
use crate::error::Result;

/// Score how related two documents are; larger means more related.
///
/// The tree with fewer keys is walked (`b` on a tie) and every one of its
/// words is looked up in the other tree. Each shared word adds
/// `tf_small * tf_large * idf`, where `tf` is the word's frequency over the
/// tree's total word count and `idf = ln(documents / appearances)`.
///
/// Empty trees score 0. Words the table has never seen contribute nothing.
pub fn similarity(a: &WordTree, b: &WordTree, doc_freq: &DocumentFrequency) -> Result<f64> {
    let (small, large) = if a.total_key_count() < b.total_key_count() {
        (a, b)
    } else {
        (b, a)
    };

    let small_words = small.total_word_count();
    let large_words = large.total_word_count();
    if small_words == 0 || large_words == 0 {
        return Ok(0.0);
    }

    let mut score = 0.0;
    for key in small.iter() {
        let key = key?;
        let freq_large = match large.search(key.word())? {
            Some(f) if f > 0 => f,
            _ => continue,
        };
        let idf = match doc_freq.idf(key.word()) {
            Some(idf) => idf,
            None => {
                tracing::warn!(word = key.word(), "word missing from the document-frequency table");
                continue;
            }
        };
        let tf_small = f64::from(key.freq()) / small_words as f64;
        let tf_large = f64::from(freq_large) / large_words as f64;
        score += tf_small * tf_large * idf;
    }
    Ok(score)
}
