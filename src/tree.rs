use std::fmt;

use crate::arena::NodeArena;
use crate::error::{Error, Result};
use crate::iter::Iter;
use crate::key::{self, Key};
use crate::node::{Node, T};
use crate::{NodeOffset, TreeConfig};

/// Shape summary returned by [`WordTree::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    /// Number of levels; a lone root leaf has height 1.
    pub height: usize,
    pub key_count: u64,
    pub word_count: u64,
}

/// A B-tree of word/frequency keys stored in a single byte buffer.
///
/// Each node holds up to [`T`] keys. Insertion splits full nodes on the way
/// down, so a single pass from the root suffices. There is no removal: a tree
/// is built once per document and then only read.
#[derive(Clone)]
pub struct WordTree {
    arena: NodeArena,
    root: NodeOffset,
    /// Keys inserted so far.
    key_count: u64,
    /// Sum of the frequencies of all inserted keys.
    word_count: u64,
}

impl WordTree {
    /// An empty tree with the default buffer sizing.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default()).expect("default tree configuration is valid")
    }

    /// An empty tree: a single empty leaf root at offset 0.
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        let mut arena = NodeArena::new(config)?;
        let root = arena.allocate(NodeOffset(0))?;
        debug_assert_eq!(root, NodeOffset(0));
        arena.write(&Node::leaf(root, None));
        Ok(Self {
            arena,
            root,
            key_count: 0,
            word_count: 0,
        })
    }

    pub(crate) fn from_parts(
        arena: NodeArena,
        root: NodeOffset,
        key_count: u64,
        word_count: u64,
    ) -> Self {
        Self {
            arena,
            root,
            key_count,
            word_count,
        }
    }

    pub(crate) fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Number of keys inserted.
    #[inline]
    pub fn total_key_count(&self) -> u64 {
        self.key_count
    }

    /// Sum of all inserted frequencies.
    #[inline]
    pub fn total_word_count(&self) -> u64 {
        self.word_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    #[inline]
    pub fn root_offset(&self) -> NodeOffset {
        self.root
    }

    /// Current size of the node buffer in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// The raw node buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.arena.as_bytes()
    }

    /// Decode the node at `offset`.
    pub fn node(&self, offset: NodeOffset) -> Result<Node> {
        self.arena.read(offset)
    }

    /// Number of levels from the root down to the leaves.
    pub fn height(&self) -> Result<usize> {
        let mut node = self.arena.read(self.root)?;
        let mut height = 1;
        while !node.leaf {
            node = self.arena.read(node.children[0])?;
            height += 1;
        }
        Ok(height)
    }

    /// Iterate over all keys in ascending word order.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Frequency stored for `word`, or `None` if it was never inserted.
    ///
    /// `word` is truncated the same way [`Key::new`] truncates, so a long word
    /// finds the key it was stored under.
    pub fn search(&self, word: &str) -> Result<Option<u32>> {
        let word = key::truncate_word(word);
        let mut at = self.root;
        loop {
            let node = self.arena.read(at)?;
            let idx = node
                .keys
                .iter()
                .position(|k| k.word() >= word)
                .unwrap_or(node.keys.len());
            if let Some(k) = node.keys.get(idx) {
                if k.word() == word {
                    return Ok(Some(k.freq()));
                }
            }
            if node.leaf {
                return Ok(None);
            }
            at = node.children[idx];
        }
    }

    pub fn contains(&self, word: &str) -> Result<bool> {
        Ok(self.search(word)?.is_some())
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Insert `key`.
    ///
    /// Words are not deduplicated: callers present each word once with its
    /// aggregated frequency. On [`Error::CapacityExhausted`] the tree is left
    /// unchanged apart from splits that completed before the failure.
    pub fn insert(&mut self, key: Key) -> Result<()> {
        let old_root = self.arena.read(self.root)?;
        if old_root.is_full() {
            let new_root = self.arena.allocate(NodeOffset(0))?;
            self.arena.write(&Node::internal(new_root, None, old_root.offset));
            if let Err(e) = self.split_child(new_root, 0, old_root.offset) {
                self.arena.release(new_root);
                return Err(e);
            }
            self.root = new_root;
            tracing::trace!(root = new_root.get(), "tree grew a level");
        }
        self.insert_nonfull(self.root, key)
    }

    /// Insert into the subtree at `at`, whose node is known not to be full.
    fn insert_nonfull(&mut self, mut at: NodeOffset, key: Key) -> Result<()> {
        loop {
            let mut node = self.arena.read(at)?;
            debug_assert!(!node.is_full());

            let mut idx = node.keys.len();
            while idx > 0 && node.keys[idx - 1].word() > key.word() {
                idx -= 1;
            }

            if node.leaf {
                self.key_count += 1;
                self.word_count += u64::from(key.freq());
                node.keys.insert(idx, key);
                self.arena.write(&node);
                return Ok(());
            }

            let child = node.children[idx];
            if self.arena.read(child)?.is_full() {
                let promoted = self.split_child(at, idx, child)?;
                if promoted.word() < key.word() {
                    idx += 1;
                }
                node = self.arena.read(at)?;
            }
            at = node.children[idx];
        }
    }

    /// Split the full node `child`, which sits at `parent.children[index]`.
    ///
    /// The median key moves up into `parent`; the upper keys (and, for an
    /// internal child, the upper children) move into a new sibling placed at
    /// `parent.children[index + 1]`. Returns the promoted key.
    fn split_child(
        &mut self,
        parent_off: NodeOffset,
        index: usize,
        child_off: NodeOffset,
    ) -> Result<Key> {
        // Allocate before touching anything so exhaustion leaves no partial split.
        let sibling_off = self.arena.allocate(child_off)?;

        let mut parent = self.arena.read(parent_off)?;
        let mut child = self.arena.read(child_off)?;
        if !child.is_full() || parent.is_full() || parent.children.get(index) != Some(&child_off) {
            return Err(Error::Invariant(format!(
                "cannot split node {child_off} into parent {parent_off} at index {index}"
            )));
        }

        let mut sibling = Node::leaf(sibling_off, Some(parent_off));
        sibling.leaf = child.leaf;
        sibling.keys = child.keys.drain(T / 2 + 1..).collect();
        let median = child.keys.remove(T / 2);
        if !child.leaf {
            sibling.children = child.children.drain(T / 2 + 1..).collect();
        }
        child.parent = Some(parent_off);

        parent.keys.insert(index, median.clone());
        parent.children.insert(index + 1, sibling_off);

        self.arena.write(&child);
        self.arena.write(&sibling);
        self.arena.write(&parent);

        for &grandchild in &sibling.children {
            let mut node = self.arena.read(grandchild)?;
            node.parent = Some(sibling_off);
            self.arena.write(&node);
        }

        tracing::trace!(
            parent = parent_off.get(),
            left = child_off.get(),
            right = sibling_off.get(),
            median = median.word(),
            "split node"
        );
        Ok(median)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Render every node, children before their parent, indented by depth.
    ///
    /// ```text
    /// ---Depth[1]: |"apple"|"banana"| {KEY COUNT = 2} {LEAF STATUS = 1}
    /// Depth[0]: |"cherry"| {KEY COUNT = 1} {LEAF STATUS = 0}
    /// ```
    pub fn dump(&self) -> Result<String> {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out)?;
        Ok(out)
    }

    fn dump_node(&self, at: NodeOffset, depth: usize, out: &mut String) -> Result<()> {
        let node = self.arena.read(at)?;
        for &child in &node.children {
            self.dump_node(child, depth + 1, out)?;
        }
        out.push_str(&"---".repeat(depth));
        out.push_str(&format!("Depth[{depth}]: |"));
        for k in &node.keys {
            out.push_str(&format!("\"{}\"|", k.word()));
        }
        out.push_str(&format!(
            " {{KEY COUNT = {}}} {{LEAF STATUS = {}}}\n",
            node.keys.len(),
            u8::from(node.leaf)
        ));
        Ok(())
    }

    /// Walk the whole tree and verify its structure.
    ///
    /// Checks key order inside nodes and across subtrees, uniform leaf depth,
    /// minimum occupancy of non-root nodes, parent links, and that the
    /// counters match what is reachable.
    pub fn check(&self) -> Result<TreeStats> {
        let mut stats = TreeStats {
            nodes: 0,
            leaves: 0,
            height: 0,
            key_count: 0,
            word_count: 0,
        };
        let mut leaf_depth = None;
        self.check_node(self.root, None, None, None, 1, &mut leaf_depth, &mut stats)?;
        stats.height = leaf_depth.unwrap_or(1);

        if stats.key_count != self.key_count {
            return Err(Error::Invariant(format!(
                "{} keys reachable, counter says {}",
                stats.key_count, self.key_count
            )));
        }
        if stats.word_count != self.word_count {
            return Err(Error::Invariant(format!(
                "reachable frequencies sum to {}, counter says {}",
                stats.word_count, self.word_count
            )));
        }
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn check_node(
        &self,
        at: NodeOffset,
        parent: Option<NodeOffset>,
        lower: Option<&str>,
        upper: Option<&str>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        stats: &mut TreeStats,
    ) -> Result<()> {
        let node = self.arena.read(at)?;
        let fail = |msg: String| Err(Error::Invariant(format!("node {at}: {msg}")));

        if node.parent != parent {
            return fail(format!("parent is {:?}, expected {:?}", node.parent, parent));
        }
        if parent.is_some() && node.keys.len() < T / 2 {
            return fail(format!("only {} keys in a non-root node", node.keys.len()));
        }
        for pair in node.keys.windows(2) {
            if pair[0].word() >= pair[1].word() {
                return fail(format!("{:?} is not below {:?}", pair[0].word(), pair[1].word()));
            }
        }
        for k in &node.keys {
            if lower.is_some_and(|l| k.word() <= l) || upper.is_some_and(|u| k.word() >= u) {
                return fail(format!("{:?} is outside its subtree bounds", k.word()));
            }
            stats.key_count += 1;
            stats.word_count += u64::from(k.freq());
        }
        stats.nodes += 1;

        if node.leaf {
            stats.leaves += 1;
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(d) if d != depth => {
                    return fail(format!("leaf at depth {depth}, others at {d}"));
                }
                Some(_) => {}
            }
            return Ok(());
        }

        for (i, &child) in node.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(node.keys[i - 1].word()) };
            let hi = node.keys.get(i).map(Key::word).or(upper);
            self.check_node(child, Some(at), lo, hi, depth + 1, leaf_depth, stats)?;
        }
        Ok(())
    }
}

impl Default for WordTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WordTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.iter() {
            match key {
                Ok(k) => map.entry(&k.word(), &k.freq()),
                Err(e) => map.entry(&"<unreadable>", &e.to_string()),
            };
        }
        map.finish()
    }
}
