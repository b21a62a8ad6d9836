//! Whole-tree images: a fixed header followed by the raw node buffer.
//!
//! ```text
//! [magic "WTRE"][version:2][reserved:2][root:4][key_count:8][word_count:8][buf_len:8][reserved:4][buffer...]
//! ```
//!
//! All integers are big endian, like the node records themselves.

use std::io::{Read, Write};

use crate::arena::NodeArena;
use crate::error::{Error, Result};
use crate::node::NODE_SIZE;
use crate::tree::WordTree;
use crate::{NodeOffset, TreeConfig};

const MAGIC: [u8; 4] = *b"WTRE";
const VERSION: u16 = 1;

/// Size of the image header in bytes.
pub const IMAGE_HEADER_SIZE: usize = 40;

impl WordTree {
    /// Serialize the tree, counters included.
    pub fn write_image(&self, mut out: impl Write) -> Result<()> {
        let buf = self.as_bytes();
        let mut header = [0u8; IMAGE_HEADER_SIZE];
        header[0..4].copy_from_slice(&MAGIC);
        header[4..6].copy_from_slice(&VERSION.to_be_bytes());
        header[8..12].copy_from_slice(&self.root_offset().get().to_be_bytes());
        header[12..20].copy_from_slice(&self.total_key_count().to_be_bytes());
        header[20..28].copy_from_slice(&self.total_word_count().to_be_bytes());
        header[28..36].copy_from_slice(&(buf.len() as u64).to_be_bytes());
        out.write_all(&header)?;
        out.write_all(buf)?;
        out.flush()?;
        Ok(())
    }

    /// Rebuild a tree from an image written by [`WordTree::write_image`].
    ///
    /// The header and root are validated; use [`WordTree::check`] for a full
    /// structural verification.
    pub fn read_image(mut input: impl Read, config: TreeConfig) -> Result<Self> {
        let mut header = [0u8; IMAGE_HEADER_SIZE];
        input.read_exact(&mut header)?;
        if header[0..4] != MAGIC {
            return Err(Error::InvalidImage("bad magic"));
        }
        if u16::from_be_bytes([header[4], header[5]]) != VERSION {
            return Err(Error::InvalidImage("unsupported version"));
        }
        let root = NodeOffset(u32::from_be_bytes([header[8], header[9], header[10], header[11]]));
        let key_count = be_u64(&header[12..20]);
        let word_count = be_u64(&header[20..28]);
        let buf_len = be_u64(&header[28..36]);

        if buf_len > config.max_capacity as u64 {
            return Err(Error::InvalidImage("node buffer exceeds the configured maximum"));
        }
        if root.get() as usize % NODE_SIZE != 0 {
            return Err(Error::InvalidImage("root offset is not node-aligned"));
        }
        let mut data = vec![0u8; buf_len as usize];
        input.read_exact(&mut data)?;

        let arena = NodeArena::from_bytes(data, config)?;
        if arena.read(root).is_err() {
            return Err(Error::InvalidImage("root offset does not hold an active node"));
        }
        Ok(WordTree::from_parts(arena, root, key_count, word_count))
    }

    /// Like [`WordTree::read_image`], from an in-memory (or mapped) image.
    pub fn from_image_bytes(bytes: &[u8], config: TreeConfig) -> Result<Self> {
        Self::read_image(bytes, config)
    }
}

#[inline]
fn be_u64(bytes: &[u8]) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(bytes);
    u64::from_be_bytes(b)
}
