//! The growable node buffer and its slot allocator.

use crate::error::{Error, Result};
use crate::node::{Node, NODE_SIZE};
use crate::{NodeOffset, TreeConfig};

/// Byte buffer holding every node record of one tree.
///
/// Slots are [`NODE_SIZE`] bytes at multiples of [`NODE_SIZE`]. A slot is in
/// use iff it carries the active marker; there is no separate free list.
#[derive(Clone)]
pub(crate) struct NodeArena {
    data: Vec<u8>,
    config: TreeConfig,
}

impl NodeArena {
    pub(crate) fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            data: vec![0; config.initial_capacity],
            config,
        })
    }

    /// Adopt an existing buffer, e.g. one read back from an image.
    pub(crate) fn from_bytes(data: Vec<u8>, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        if data.len() < NODE_SIZE {
            return Err(Error::InvalidImage("node buffer is smaller than one node"));
        }
        if data.len() > config.max_capacity {
            return Err(Error::InvalidImage("node buffer exceeds the configured maximum"));
        }
        Ok(Self { data, config })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn slot(&self, off: NodeOffset) -> Option<&[u8]> {
        let at = off.get() as usize;
        self.data.get(at..at + NODE_SIZE)
    }

    #[inline]
    pub(crate) fn is_active(&self, off: NodeOffset) -> bool {
        self.slot(off).is_some_and(Node::is_active)
    }

    /// Decode the node stored at `off`.
    pub(crate) fn read(&self, off: NodeOffset) -> Result<Node> {
        if off.get() as usize % NODE_SIZE != 0 {
            return Err(Error::CorruptNode {
                offset: off,
                reason: "offset is not on a slot boundary",
            });
        }
        let record = self.slot(off).ok_or(Error::InactiveSlot { offset: off })?;
        let node = Node::decode(record)?;
        if node.offset != off {
            return Err(Error::CorruptNode {
                offset: off,
                reason: "stored offset does not match slot",
            });
        }
        Ok(node)
    }

    /// Encode `node` into its own slot.
    pub(crate) fn write(&mut self, node: &Node) {
        let at = node.offset.get() as usize;
        debug_assert_eq!(at % NODE_SIZE, 0);
        debug_assert!(at + NODE_SIZE <= self.data.len(), "write past capacity");
        node.encode_into(&mut self.data[at..at + NODE_SIZE]);
    }

    /// Return a slot to the free pool by clearing its record.
    pub(crate) fn release(&mut self, off: NodeOffset) {
        let at = off.get() as usize;
        if let Some(slot) = self.data.get_mut(at..at + NODE_SIZE) {
            slot.fill(0);
        }
    }

    /// Find a free slot at or after `hint`.
    ///
    /// The buffer grows in `growth_increment` steps whenever the next
    /// candidate does not fit. The returned slot is not marked; it becomes
    /// active when the caller writes a node into it.
    pub(crate) fn allocate(&mut self, hint: NodeOffset) -> Result<NodeOffset> {
        let mut at = (hint.get() as usize).div_ceil(NODE_SIZE) * NODE_SIZE;
        loop {
            if at + NODE_SIZE > self.config.max_capacity {
                return Err(Error::CapacityExhausted {
                    max_capacity: self.config.max_capacity,
                });
            }
            while at + NODE_SIZE > self.data.len() {
                self.grow();
            }
            let off = NodeOffset(at as u32);
            if !self.is_active(off) {
                return Ok(off);
            }
            at += NODE_SIZE;
        }
    }

    fn grow(&mut self) {
        let old = self.data.len();
        let new = (old + self.config.growth_increment).min(self.config.max_capacity);
        debug_assert!(new > old);
        self.data.resize(new, 0);
        tracing::debug!(old, new, "grew node buffer");
    }
}
