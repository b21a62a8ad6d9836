//! A collection of ingested documents and its on-disk layout.
//!
//! ```text
//! <dir>/corpus.json      metadata: version, config, document names, labels
//! <dir>/doc_freq.json    the document-frequency table
//! <dir>/trees/<i>.wtree  one tree image per document
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use wordtree::WordTree;

use crate::cluster::{dbscan, Label};
use crate::config::DocSimConfig;
use crate::doc_freq::DocumentFrequency;
use crate::document::Document;
use crate::error::{DocSimError, Result};
use crate::html::paragraph_text;
use crate::similarity::similarity;
use crate::tokenize::StopWords;

const METADATA_FILE: &str = "corpus.json";
const DOC_FREQ_FILE: &str = "doc_freq.json";
const TREES_DIR: &str = "trees";

/// Metadata stored with the corpus.
#[derive(Debug, Serialize, Deserialize)]
pub struct CorpusMetadata {
    /// Version of the crate that wrote the corpus.
    pub version: String,
    pub config: DocSimConfig,
    pub documents: Vec<DocumentEntry>,
    /// Labels from the last clustering run, if still current.
    pub labels: Option<Vec<Label>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub name: String,
    /// Relative to the corpus directory.
    pub tree_file: String,
}

/// Documents sharing one document-frequency table.
#[derive(Debug)]
pub struct Corpus {
    config: DocSimConfig,
    stop_words: StopWords,
    documents: Vec<Document>,
    doc_freq: Arc<DocumentFrequency>,
    labels: Option<Vec<Label>>,
}

impl Corpus {
    pub fn new(config: DocSimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            stop_words: StopWords::new(&config.stop_words),
            config,
            documents: Vec::new(),
            doc_freq: Arc::new(DocumentFrequency::new()),
            labels: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &DocSimConfig {
        &self.config
    }

    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn doc_freq(&self) -> &Arc<DocumentFrequency> {
        &self.doc_freq
    }

    /// Labels from the last [`Corpus::cluster`] run, cleared when a document
    /// is added.
    pub fn labels(&self) -> Option<&[Label]> {
        self.labels.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name() == name)
    }

    /// Ingest a document into the corpus and its frequency table.
    pub fn add_text(&mut self, name: &str, text: &str) -> Result<usize> {
        if self.get(name).is_some() {
            return Err(DocSimError::Corpus(format!("document {name:?} already exists")));
        }
        let doc = Document::ingest(name, text, &self.stop_words, self.config.tree, &self.doc_freq)?;
        self.documents.push(doc);
        self.labels = None;
        Ok(self.documents.len() - 1)
    }

    /// Ingest the `<p>` text of an HTML page.
    pub fn add_html(&mut self, name: &str, html: &str) -> Result<usize> {
        let text = paragraph_text(html)?;
        self.add_text(name, &text)
    }

    /// Build a document for `text` without adding it to the corpus.
    ///
    /// The returned table is a copy of the corpus table that also counts the
    /// new document; score against it with [`Corpus::scores`].
    pub fn probe(&self, name: &str, text: &str) -> Result<(Document, DocumentFrequency)> {
        let doc_freq = (*self.doc_freq).clone();
        let doc = Document::ingest(name, text, &self.stop_words, self.config.tree, &doc_freq)?;
        Ok((doc, doc_freq))
    }

    /// Similarity of `query` to every stored document, in corpus order.
    pub fn scores(&self, query: &Document, doc_freq: &DocumentFrequency) -> Result<Vec<f64>> {
        self.documents
            .iter()
            .map(|doc| {
                let score = similarity(doc.tree(), query.tree(), doc_freq)?;
                tracing::info!(query = query.name(), document = doc.name(), score, "similarity");
                Ok(score)
            })
            .collect()
    }

    /// Index and score of the stored document most similar to `query`.
    /// Among equal scores the later document wins.
    pub fn most_similar(&self, query: &Document, doc_freq: &DocumentFrequency) -> Result<Option<(usize, f64)>> {
        let mut best: Option<(usize, f64)> = None;
        for (i, score) in self.scores(query, doc_freq)?.into_iter().enumerate() {
            if best.map_or(true, |(_, b)| score >= b) {
                best = Some((i, score));
            }
        }
        Ok(best)
    }

    /// Run DBSCAN over the stored documents and remember the labels.
    pub fn cluster(&mut self, eps: f64, min_points: usize) -> Result<Vec<Label>> {
        let docs = &self.documents;
        let doc_freq = &*self.doc_freq;
        let labels = dbscan(docs.len(), eps, min_points, |q, p| {
            similarity(docs[q].tree(), docs[p].tree(), doc_freq)
        })?;
        self.labels = Some(labels.clone());
        Ok(labels)
    }

    /// Write the corpus to `dir`, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir.join(TREES_DIR))?;

        let mut entries = Vec::with_capacity(self.documents.len());
        for (i, doc) in self.documents.iter().enumerate() {
            let tree_file = format!("{TREES_DIR}/{i}.wtree");
            let file = File::create(dir.join(&tree_file))?;
            doc.tree().write_image(BufWriter::new(file))?;
            entries.push(DocumentEntry {
                name: doc.name().to_owned(),
                tree_file,
            });
        }

        let file = File::create(dir.join(DOC_FREQ_FILE))?;
        self.doc_freq.write_json(BufWriter::new(file))?;

        let metadata = CorpusMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: self.config.clone(),
            documents: entries,
            labels: self.labels.clone(),
        };
        let mut out = BufWriter::new(File::create(dir.join(METADATA_FILE))?);
        serde_json::to_writer_pretty(&mut out, &metadata)?;
        out.flush()?;

        tracing::debug!(dir = %dir.display(), documents = self.documents.len(), "saved corpus");
        Ok(())
    }

    /// Load a corpus written by [`Corpus::save`].
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let file = File::open(dir.join(METADATA_FILE))?;
        let metadata: CorpusMetadata = serde_json::from_reader(BufReader::new(file))?;
        metadata.config.validate()?;

        let file = File::open(dir.join(DOC_FREQ_FILE))?;
        let doc_freq = DocumentFrequency::read_json(BufReader::new(file))?;

        let mut documents = Vec::with_capacity(metadata.documents.len());
        for entry in &metadata.documents {
            let tree = read_tree(&dir.join(&entry.tree_file), &metadata.config)
                .map_err(|e| DocSimError::Corpus(format!("{}: {e}", entry.tree_file)))?;
            documents.push(Document::from_tree(entry.name.clone(), tree));
        }

        if let Some(labels) = &metadata.labels {
            if labels.len() != documents.len() {
                return Err(DocSimError::Corpus(format!(
                    "{} labels for {} documents",
                    labels.len(),
                    documents.len()
                )));
            }
        }

        tracing::debug!(dir = %dir.display(), documents = documents.len(), "opened corpus");
        Ok(Self {
            stop_words: StopWords::new(&metadata.config.stop_words),
            config: metadata.config,
            documents,
            doc_freq: Arc::new(doc_freq),
            labels: metadata.labels,
        })
    }
}

fn read_tree(path: &Path, config: &DocSimConfig) -> Result<WordTree> {
    let file = File::open(path)?;
    // SAFETY: the image is copied out of the mapping before it is dropped,
    // and corpus files are not modified while a corpus is being opened.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(WordTree::from_image_bytes(&mmap, config.tree)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        let mut c = Corpus::new(DocSimConfig::default()).unwrap();
        c.add_text("cats", "cats purr and cats nap; kittens purr").unwrap();
        c.add_text("dogs", "dogs bark and dogs fetch; puppies bark").unwrap();
        c.add_text("mixed", "cats nap while dogs bark").unwrap();
        c
    }

    #[test]
    fn test_add_text_rejects_duplicates() {
        let mut c = corpus();
        assert!(matches!(c.add_text("cats", "again"), Err(DocSimError::Corpus(_))));
        assert_eq!(c.len(), 3);
        assert_eq!(c.doc_freq().document_count(), 3);
    }

    #[test]
    fn test_add_html_ingests_paragraphs_only() {
        let mut c = corpus();
        let page = "<html><head><title>Kennel Gazette</title></head><body>\
                    <nav>Subscribe</nav><p>Kittens purr.</p><div>Puppies bark</div>\
                    <p>Cats nap</p></body></html>";
        let i = c.add_html("page", page).unwrap();
        let tree = c.documents()[i].tree();
        assert_eq!(tree.search("kittens").unwrap(), Some(1));
        assert_eq!(tree.search("cats").unwrap(), Some(1));
        for outside in ["kennel", "gazette", "subscribe", "puppies", "html", "p"] {
            assert_eq!(tree.search(outside).unwrap(), None, "{outside}");
        }
        assert_eq!(c.doc_freq().appearances("puppies"), Some(1));
        assert_eq!(c.doc_freq().document_count(), 4);
    }

    #[test]
    fn test_probe_leaves_corpus_untouched() {
        let c = corpus();
        let (doc, df) = c.probe("query", "kittens purr").unwrap();
        assert_eq!(df.document_count(), 4);
        assert_eq!(c.doc_freq().document_count(), 3);
        assert_eq!(doc.tree().search("purr").unwrap(), Some(1));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_most_similar() {
        let c = corpus();
        let (doc, df) = c.probe("query", "kittens purr, cats purr").unwrap();
        let (best, score) = c.most_similar(&doc, &df).unwrap().unwrap();
        assert_eq!(c.documents()[best].name(), "cats");
        assert!(score > 0.0);
    }

    #[test]
    fn test_most_similar_tie_prefers_later() {
        let c = corpus();
        let (doc, df) = c.probe("query", "zebra").unwrap();
        let scores = c.scores(&doc, &df).unwrap();
        assert!(scores.iter().all(|&s| s == 0.0));
        assert_eq!(c.most_similar(&doc, &df).unwrap(), Some((2, 0.0)));
    }

    #[test]
    fn test_most_similar_empty_corpus() {
        let c = Corpus::new(DocSimConfig::default()).unwrap();
        let (doc, df) = c.probe("query", "anything").unwrap();
        assert_eq!(c.most_similar(&doc, &df).unwrap(), None);
    }

    #[test]
    fn test_labels_cleared_on_add() {
        let mut c = corpus();
        let labels = c.cluster(0.0, 1).unwrap();
        assert_eq!(labels.len(), 3);
        assert!(c.labels().is_some());
        c.add_text("birds", "birds sing").unwrap();
        assert!(c.labels().is_none());
    }

    #[test]
    fn test_save_open_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = corpus();
        c.cluster(0.0, 1).unwrap();
        c.save(dir.path()).unwrap();

        let back = Corpus::open(dir.path()).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back.labels(), c.labels());
        assert_eq!(back.doc_freq().snapshot(), c.doc_freq().snapshot());
        for (a, b) in back.documents().iter().zip(c.documents()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.tree().as_bytes(), b.tree().as_bytes());
            assert_eq!(a.tree().total_word_count(), b.tree().total_word_count());
            a.tree().check().unwrap();
        }
    }

    #[test]
    fn test_open_reports_damaged_tree() {
        let dir = tempfile::tempdir().unwrap();
        corpus().save(dir.path()).unwrap();
        std::fs::write(dir.path().join("trees/1.wtree"), b"not a tree image").unwrap();
        assert!(matches!(Corpus::open(dir.path()), Err(DocSimError::Corpus(_))));
    }
}
