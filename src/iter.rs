use crate::error::{Error, Result};
use crate::key::Key;
use crate::node::Node;
use crate::tree::WordTree;

struct Frame {
    node: Node,
    /// Position in the interleaving `child 0, key 0, child 1, key 1, ...`.
    /// For leaves this is simply the next key index.
    step: usize,
}

/// In-order iterator over the keys of a [`WordTree`].
///
/// Yields `Err` once if a node cannot be decoded, then stops.
pub struct Iter<'a> {
    tree: &'a WordTree,
    stack: Vec<Frame>,
    pending: Option<Error>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(tree: &'a WordTree) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
            pending: None,
        };
        match tree.arena().read(tree.root_offset()) {
            Ok(node) => iter.stack.push(Frame { node, step: 0 }),
            Err(e) => iter.pending = Some(e),
        }
        iter
    }
}

impl Iterator for Iter<'_> {
    type Item = Result<Key>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            return Some(Err(e));
        }
        loop {
            let frame = self.stack.last_mut()?;
            let step = frame.step;
            frame.step += 1;

            if frame.node.is_leaf() {
                match frame.node.keys.get(step) {
                    Some(k) => return Some(Ok(k.clone())),
                    None => {
                        self.stack.pop();
                        continue;
                    }
                }
            }

            if step > 2 * frame.node.keys.len() {
                self.stack.pop();
            } else if step % 2 == 1 {
                return Some(Ok(frame.node.keys[step / 2].clone()));
            } else {
                let child = frame.node.children[step / 2];
                match self.tree.arena().read(child) {
                    Ok(node) => self.stack.push(Frame { node, step: 0 }),
                    Err(e) => {
                        self.stack.clear();
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}
