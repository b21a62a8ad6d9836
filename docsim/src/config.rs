//! Corpus configuration, loadable from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wordtree::TreeConfig;

use crate::error::{DocSimError, Result};
use crate::tokenize::DEFAULT_STOP_WORDS;

/// Configuration for ingestion and clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocSimConfig {
    /// Buffer sizing for every per-document tree.
    pub tree: TreeConfig,
    /// Words dropped before counting.
    pub stop_words: Vec<String>,
    /// Minimum similarity for two documents to be neighbours.
    pub eps: f64,
    /// Neighbours (self included) needed for a core document.
    pub min_points: usize,
}

impl Default for DocSimConfig {
    fn default() -> Self {
        Self {
            tree: TreeConfig::default(),
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            eps: 0.00077,
            min_points: 4,
        }
    }
}

impl DocSimConfig {
    /// Read a config file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tree.validate()?;
        if !self.eps.is_finite() {
            return Err(DocSimError::Config(format!("eps must be finite, got {}", self.eps)));
        }
        if self.min_points == 0 {
            return Err(DocSimError::Config("min_points must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocSimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stop_words.len(), 40);
        assert_eq!(config.min_points, 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DocSimConfig = serde_json::from_str(r#"{"eps": 0.5, "tree": {"max_capacity": 99000}}"#).unwrap();
        assert_eq!(config.eps, 0.5);
        assert_eq!(config.min_points, 4);
        assert_eq!(config.tree.max_capacity, 99000);
        assert_eq!(config.tree.initial_capacity, TreeConfig::default().initial_capacity);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DocSimConfig {
            min_points: 0,
            ..DocSimConfig::default()
        };
        assert!(matches!(config.validate(), Err(DocSimError::Config(_))));

        let config = DocSimConfig {
            eps: f64::NAN,
            ..DocSimConfig::default()
        };
        assert!(matches!(config.validate(), Err(DocSimError::Config(_))));

        let mut config = DocSimConfig::default();
        config.tree.initial_capacity = 1;
        assert!(matches!(config.validate(), Err(DocSimError::Tree(_))));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"min_points": 2, "stop_words": ["foo"]}"#).unwrap();
        let config = DocSimConfig::from_json_file(&path).unwrap();
        assert_eq!(config.min_points, 2);
        assert_eq!(config.stop_words, vec!["foo".to_string()]);
    }
}
