//! Fixed-size node records.
//!
//! Layout (big endian, [`NODE_SIZE`] bytes):
//!
//! ```text
//! [active:2][key_count:2][leaf:2][parent:4][offset:4][keys: T x 32][children: (T+1) x 4]
//! ```
//!
//! Unused key slots hold the null-key placeholder; unused child slots, and
//! every child slot of a leaf, hold [`ABSENT`]. A root has parent [`ABSENT`].

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::key::{self, Key, KEY_SIZE};
use crate::NodeOffset;

/// Maximum number of keys in a node.
pub const T: usize = 5;

/// Encoded size of one node record.
pub const NODE_SIZE: usize = HEADER_SIZE + T * KEY_SIZE + (T + 1) * OFFSET_SIZE;

/// Marker in the first two bytes of every live node.
pub const ACTIVE_MARKER: u16 = b'@' as u16;

/// Stored in place of a missing parent or child offset.
pub const ABSENT: u32 = u32::MAX;

const HEADER_SIZE: usize = 14;
const OFFSET_SIZE: usize = 4;
const KEY_COUNT_AT: usize = 2;
const LEAF_AT: usize = 4;
const PARENT_AT: usize = 6;
const OFFSET_AT: usize = 10;
const KEYS_AT: usize = HEADER_SIZE;
const CHILDREN_AT: usize = KEYS_AT + T * KEY_SIZE;

pub(crate) type KeyVec = SmallVec<[Key; T]>;
pub(crate) type ChildVec = SmallVec<[NodeOffset; T + 1]>;

/// Decoded form of one node record.
///
/// A `Node` is a snapshot: changes only reach the tree when it is written
/// back through the arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub(crate) leaf: bool,
    pub(crate) parent: Option<NodeOffset>,
    pub(crate) offset: NodeOffset,
    /// Sorted by word. Never longer than [`T`].
    pub(crate) keys: KeyVec,
    /// Empty for leaves, `keys.len() + 1` entries otherwise.
    pub(crate) children: ChildVec,
}

impl Node {
    /// An empty leaf at `offset`.
    pub fn leaf(offset: NodeOffset, parent: Option<NodeOffset>) -> Self {
        Self {
            leaf: true,
            parent,
            offset,
            keys: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    /// An internal node with no keys and a single child.
    pub fn internal(offset: NodeOffset, parent: Option<NodeOffset>, child: NodeOffset) -> Self {
        let mut children = SmallVec::new();
        children.push(child);
        Self {
            leaf: false,
            parent,
            offset,
            keys: SmallVec::new(),
            children,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.keys.len() == T
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[inline]
    pub fn children(&self) -> &[NodeOffset] {
        &self.children
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeOffset> {
        self.parent
    }

    #[inline]
    pub fn offset(&self) -> NodeOffset {
        self.offset
    }

    /// Write this node into `out`, which must be exactly [`NODE_SIZE`] bytes.
    pub fn encode_into(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), NODE_SIZE);
        debug_assert!(self.keys.len() <= T);
        debug_assert!(self.leaf || self.children.len() == self.keys.len() + 1);

        out[0..2].copy_from_slice(&ACTIVE_MARKER.to_be_bytes());
        out[KEY_COUNT_AT..KEY_COUNT_AT + 2].copy_from_slice(&(self.keys.len() as u16).to_be_bytes());
        out[LEAF_AT..LEAF_AT + 2].copy_from_slice(&u16::from(self.leaf).to_be_bytes());
        write_offset(out, PARENT_AT, self.parent.map_or(ABSENT, NodeOffset::get));
        write_offset(out, OFFSET_AT, self.offset.get());

        for i in 0..T {
            let at = KEYS_AT + i * KEY_SIZE;
            let slot = &mut out[at..at + KEY_SIZE];
            match self.keys.get(i) {
                Some(k) => k.encode_into(slot),
                None => key::encode_null_into(slot),
            }
        }

        for i in 0..=T {
            let child = if self.leaf {
                ABSENT
            } else {
                self.children.get(i).map_or(ABSENT, |c| c.get())
            };
            write_offset(out, CHILDREN_AT + i * OFFSET_SIZE, child);
        }
    }

    pub fn to_bytes(&self) -> [u8; NODE_SIZE] {
        let mut out = [0u8; NODE_SIZE];
        self.encode_into(&mut out);
        out
    }

    /// Whether `record` starts with the active marker.
    #[inline]
    pub fn is_active(record: &[u8]) -> bool {
        record.len() >= 2 && read_u16(record, 0) == ACTIVE_MARKER
    }

    /// Decode a node record of exactly [`NODE_SIZE`] bytes.
    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() != NODE_SIZE {
            return Err(Error::RecordLength {
                expected: NODE_SIZE,
                actual: record.len(),
            });
        }
        let offset = NodeOffset(read_offset(record, OFFSET_AT));
        if !Self::is_active(record) {
            return Err(Error::InactiveSlot { offset });
        }

        let key_count = read_u16(record, KEY_COUNT_AT) as usize;
        if key_count > T {
            return Err(Error::CorruptNode {
                offset,
                reason: "key count exceeds fan-out",
            });
        }
        let leaf = match read_u16(record, LEAF_AT) {
            0 => false,
            1 => true,
            _ => {
                return Err(Error::CorruptNode {
                    offset,
                    reason: "leaf flag is neither 0 nor 1",
                })
            }
        };
        let parent = match read_offset(record, PARENT_AT) {
            ABSENT => None,
            p => Some(NodeOffset(p)),
        };

        let mut keys = KeyVec::new();
        for i in 0..key_count {
            let at = KEYS_AT + i * KEY_SIZE;
            keys.push(Key::decode(&record[at..at + KEY_SIZE])?);
        }

        let mut children = ChildVec::new();
        if !leaf {
            for i in 0..=key_count {
                match read_offset(record, CHILDREN_AT + i * OFFSET_SIZE) {
                    ABSENT => {
                        return Err(Error::CorruptNode {
                            offset,
                            reason: "internal node is missing a child",
                        })
                    }
                    c => children.push(NodeOffset(c)),
                }
            }
        }

        Ok(Self {
            leaf,
            parent,
            offset,
            keys,
            children,
        })
    }
}

#[inline]
fn read_u16(record: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([record[at], record[at + 1]])
}

#[inline]
fn read_offset(record: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
}

#[inline]
fn write_offset(out: &mut [u8], at: usize, v: u32) {
    out[at..at + OFFSET_SIZE].copy_from_slice(&v.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(words: &[(&str, u32)]) -> KeyVec {
        words.iter().map(|&(w, f)| Key::new(w, f).unwrap()).collect()
    }

    #[test]
    fn test_node_size_matches_legacy() {
        assert_eq!(NODE_SIZE, 198);
    }

    #[test]
    fn test_empty_leaf_layout() {
        let node = Node::leaf(NodeOffset(0), None);
        let bytes = node.to_bytes();
        assert_eq!(&bytes[0..6], &[0, b'@', 0, 0, 0, 1]);
        assert_eq!(&bytes[PARENT_AT..PARENT_AT + 4], &ABSENT.to_be_bytes());
        // Every key slot holds the null placeholder.
        for i in 0..T {
            let at = KEYS_AT + i * KEY_SIZE;
            assert_eq!(&bytes[at..at + 4], &[0, b'.', 0, b'!']);
        }
        for i in 0..=T {
            let at = CHILDREN_AT + i * OFFSET_SIZE;
            assert_eq!(&bytes[at..at + 4], &ABSENT.to_be_bytes());
        }
        assert_eq!(Node::decode(&bytes).unwrap(), node);
    }

    #[test]
    fn test_leaf_roundtrip_all_counts() {
        let all = [("a", 1), ("b", 2), ("c", 0), ("d", 4), ("e", u32::MAX)];
        for n in 0..=T {
            let mut node = Node::leaf(NodeOffset(396), Some(NodeOffset(198)));
            node.keys = keys(&all[..n]);
            assert_eq!(Node::decode(&node.to_bytes()).unwrap(), node);
        }
    }

    #[test]
    fn test_internal_roundtrip_all_counts() {
        let all = [("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)];
        for n in 0..=T {
            let mut node = Node::internal(NodeOffset(0), None, NodeOffset(198));
            node.keys = keys(&all[..n]);
            node.children = (0..=n as u32).map(|i| NodeOffset(198 * (i + 1))).collect();
            let bytes = node.to_bytes();
            // Unused child slots are absent.
            for i in n + 1..=T {
                let at = CHILDREN_AT + i * OFFSET_SIZE;
                assert_eq!(read_offset(&bytes, at), ABSENT);
            }
            assert_eq!(Node::decode(&bytes).unwrap(), node);
        }
    }

    #[test]
    fn test_decode_inactive() {
        assert!(matches!(
            Node::decode(&[0u8; NODE_SIZE]),
            Err(Error::InactiveSlot { .. })
        ));
        assert!(!Node::is_active(&[0u8; NODE_SIZE]));
    }

    #[test]
    fn test_decode_corrupt_fields() {
        let node = Node::leaf(NodeOffset(0), None);

        let mut bytes = node.to_bytes();
        bytes[KEY_COUNT_AT + 1] = (T + 1) as u8;
        assert!(matches!(Node::decode(&bytes), Err(Error::CorruptNode { .. })));

        let mut bytes = node.to_bytes();
        bytes[LEAF_AT + 1] = 7;
        assert!(matches!(Node::decode(&bytes), Err(Error::CorruptNode { .. })));

        // Flip a leaf to internal: its child slots are all absent.
        let mut bytes = node.to_bytes();
        bytes[LEAF_AT + 1] = 0;
        assert!(matches!(Node::decode(&bytes), Err(Error::CorruptNode { .. })));
    }

    #[test]
    fn test_decode_wrong_length() {
        let bytes = Node::leaf(NodeOffset(0), None).to_bytes();
        assert!(matches!(
            Node::decode(&bytes[..NODE_SIZE - 1]),
            Err(Error::RecordLength { expected: NODE_SIZE, actual }) if actual == NODE_SIZE - 1
        ));
        assert!(matches!(Node::decode(&[]), Err(Error::RecordLength { .. })));
        assert!(!Node::is_active(&[0]));
    }

    #[test]
    fn test_decode_key_count_covers_placeholder() {
        let mut node = Node::leaf(NodeOffset(0), None);
        node.keys = keys(&[("a", 1)]);
        let mut bytes = node.to_bytes();
        // Claim two keys while slot 1 still holds the placeholder.
        bytes[KEY_COUNT_AT + 1] = 2;
        assert!(matches!(Node::decode(&bytes), Err(Error::InvalidKey(_))));
    }
}
