use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use docsim::{cluster::group, paragraph_text, Corpus, DocSimConfig, Label};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docsim", about = "Word-tree document similarity and clustering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest text files into a corpus, creating it if needed.
    Index {
        /// Corpus directory
        #[arg(long)]
        corpus: PathBuf,
        /// Path to config file (JSON); only used for a new corpus
        #[arg(long)]
        config: Option<PathBuf>,
        /// Treat the files as HTML pages and ingest only their <p> text
        #[arg(long)]
        html: bool,
        /// Text files to ingest; each is named by its file name
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Find the stored document most similar to a text file.
    Compare {
        /// Corpus directory
        #[arg(long)]
        corpus: PathBuf,
        /// Treat the file as an HTML page and compare only its <p> text
        #[arg(long)]
        html: bool,
        /// Text file to compare
        file: PathBuf,
    },

    /// Cluster the stored documents with DBSCAN.
    Cluster {
        /// Corpus directory
        #[arg(long)]
        corpus: PathBuf,
        /// Minimum similarity between neighbours (defaults to the corpus config)
        #[arg(long)]
        eps: Option<f64>,
        /// Neighbours needed for a core document (defaults to the corpus config)
        #[arg(long)]
        min_points: Option<usize>,
    },

    /// Print the tree of one stored document.
    Dump {
        /// Corpus directory
        #[arg(long)]
        corpus: PathBuf,
        /// Document name
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            corpus,
            config,
            html,
            files,
        } => cmd_index(&corpus, config, html, &files),
        Commands::Compare { corpus, html, file } => cmd_compare(&corpus, html, &file),
        Commands::Cluster {
            corpus,
            eps,
            min_points,
        } => cmd_cluster(&corpus, eps, min_points),
        Commands::Dump { corpus, name } => cmd_dump(&corpus, &name),
    }
}

fn document_name(path: &Path) -> anyhow::Result<String> {
    match path.file_name() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => bail!("{} has no file name", path.display()),
    }
}

/// Text of a document file, reduced to its `<p>` text for HTML pages.
fn read_document(path: &Path, html: bool) -> anyhow::Result<String> {
    let contents = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if html {
        return paragraph_text(&contents).with_context(|| format!("failed to parse {}", path.display()));
    }
    Ok(contents)
}

fn cmd_index(dir: &Path, config_path: Option<PathBuf>, html: bool, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut corpus = if dir.join("corpus.json").exists() {
        if config_path.is_some() {
            tracing::warn!("corpus exists; ignoring --config");
        }
        Corpus::open(dir).with_context(|| format!("failed to open corpus {}", dir.display()))?
    } else {
        let config = match config_path {
            Some(path) => DocSimConfig::from_json_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => DocSimConfig::default(),
        };
        Corpus::new(config)?
    };

    for path in files {
        let name = document_name(path)?;
        let text = read_document(path, html)?;
        corpus
            .add_text(&name, &text)
            .with_context(|| format!("failed to ingest {}", path.display()))?;
        println!("indexed {name}");
    }

    corpus
        .save(dir)
        .with_context(|| format!("failed to save corpus {}", dir.display()))?;
    println!("{} documents in {}", corpus.len(), dir.display());
    Ok(())
}

fn cmd_compare(dir: &Path, html: bool, file: &Path) -> anyhow::Result<()> {
    let corpus = Corpus::open(dir).with_context(|| format!("failed to open corpus {}", dir.display()))?;
    let name = document_name(file)?;
    let text = read_document(file, html)?;

    let (query, doc_freq) = corpus.probe(&name, &text)?;
    match corpus.most_similar(&query, &doc_freq)? {
        Some((i, score)) => println!(
            "The most similar to {name} is {} ({score:.6})",
            corpus.documents()[i].name()
        ),
        None => println!("corpus is empty"),
    }
    Ok(())
}

fn cmd_cluster(dir: &Path, eps: Option<f64>, min_points: Option<usize>) -> anyhow::Result<()> {
    let mut corpus = Corpus::open(dir).with_context(|| format!("failed to open corpus {}", dir.display()))?;
    let eps = eps.unwrap_or(corpus.config().eps);
    let min_points = min_points.unwrap_or(corpus.config().min_points);
    if !eps.is_finite() || min_points == 0 {
        bail!("eps must be finite and min-points at least 1");
    }

    let labels = corpus.cluster(eps, min_points)?;
    for (label, members) in group(&labels) {
        match label {
            Label::Noise => println!("Noise:"),
            Label::Cluster(c) => println!("Cluster {c}:"),
        }
        for i in members {
            println!("  {}", corpus.documents()[i].name());
        }
    }

    corpus
        .save(dir)
        .with_context(|| format!("failed to save corpus {}", dir.display()))?;
    Ok(())
}

fn cmd_dump(dir: &Path, name: &str) -> anyhow::Result<()> {
    let corpus = Corpus::open(dir).with_context(|| format!("failed to open corpus {}", dir.display()))?;
    let Some(doc) = corpus.get(name) else {
        bail!("no document named {name:?}");
    };
    print!("{}", doc.tree().dump()?);
    let stats = doc.tree().check()?;
    println!(
        "{} keys, {} words, {} nodes, height {}",
        stats.key_count, stats.word_count, stats.nodes, stats.height
    );
    Ok(())
}
