//! # wordtree
//!
//! A word/frequency B-tree whose nodes live in one growable byte buffer.
//!
//! Every node is a fixed-size record ([`NODE_SIZE`] bytes) and every link
//! between nodes is a byte offset into the buffer ([`NodeOffset`]), so a whole
//! tree can be copied, persisted or memory-mapped as a single blob. Nodes are
//! decoded on access, modified, and encoded back; nothing holds a reference
//! into the buffer across an operation that may grow it.
//!
//! ## Example
//!
//! ```rust
//! use wordtree::{Key, WordTree};
//!
//! let mut tree = WordTree::new();
//! tree.insert(Key::new("apple", 3)?)?;
//! tree.insert(Key::new("banana", 1)?)?;
//!
//! assert_eq!(tree.search("apple")?, Some(3));
//! assert_eq!(tree.search("grape")?, None);
//! assert_eq!(tree.total_word_count(), 4);
//! # Ok::<(), wordtree::Error>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

mod arena;
mod error;
mod image;
mod iter;
pub mod key;
pub mod node;
mod tree;

pub use error::{Error, Result};
pub use image::IMAGE_HEADER_SIZE;
pub use iter::Iter;
pub use key::{Key, KEY_SIZE, MAX_WORD_UNITS};
pub use node::{Node, NODE_SIZE, T};
pub use tree::{TreeStats, WordTree};

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Node handles
// =============================================================================

/// Byte offset of a node record inside a tree's buffer.
///
/// Offsets are only meaningful for the tree that produced them and stay
/// valid across buffer growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeOffset(pub(crate) u32);

impl NodeOffset {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Sizing of a tree's node buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    /// Bytes allocated when the tree is created.
    pub initial_capacity: usize,
    /// Bytes added each time the allocator runs past the end of the buffer.
    pub growth_increment: usize,
    /// Hard cap on the buffer size; allocation fails beyond it.
    pub max_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 4000,
            growth_increment: 4000,
            max_capacity: NODE_SIZE * 10_000,
        }
    }
}

impl TreeConfig {
    /// Reject sizes the allocator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity < NODE_SIZE {
            return Err(Error::Config(format!(
                "initial_capacity {} is smaller than one node ({NODE_SIZE} bytes)",
                self.initial_capacity
            )));
        }
        if self.growth_increment < NODE_SIZE {
            return Err(Error::Config(format!(
                "growth_increment {} is smaller than one node ({NODE_SIZE} bytes)",
                self.growth_increment
            )));
        }
        if self.max_capacity < self.initial_capacity {
            return Err(Error::Config(format!(
                "max_capacity {} is below initial_capacity {}",
                self.max_capacity, self.initial_capacity
            )));
        }
        // u32::MAX is the absent-offset sentinel.
        if self.max_capacity >= node::ABSENT as usize {
            return Err(Error::Config(format!(
                "max_capacity {} does not fit 32-bit offsets",
                self.max_capacity
            )));
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests;
