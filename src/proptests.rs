use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, HashSet};

/// Every reachable node sits in its own slot, and `check` agrees.
fn validate_tree(t: &WordTree) {
    let stats = t.check().expect("structural check");

    let mut seen = HashSet::new();
    let mut stack = vec![t.root_offset()];
    while let Some(off) = stack.pop() {
        assert!(seen.insert(off), "slot {off} reachable twice");
        assert_eq!(off.get() as usize % NODE_SIZE, 0, "unaligned slot {off}");
        let node = t.node(off).expect("reachable node decodes");
        stack.extend_from_slice(node.children());
    }
    assert_eq!(seen.len(), stats.nodes);
}

fn word_strategy() -> impl Strategy<Value = String> + Clone {
    // Small alphabet so searches hit and inserts collide often.
    "[a-f]{1,6}"
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 3)]
    Insert(#[proptest(strategy = "word_strategy()")] String, u32),
    #[proptest(weight = 2)]
    Search(#[proptest(strategy = "word_strategy()")] String),
    Check,
}

fn tight_config() -> TreeConfig {
    // Grow one node at a time so most inserts cross a growth event.
    TreeConfig {
        initial_capacity: NODE_SIZE,
        growth_increment: NODE_SIZE,
        max_capacity: NODE_SIZE * 4096,
    }
}

fn sorted_keys(words: Vec<String>) -> Vec<Key> {
    let mut words = words;
    words.sort();
    words.dedup();
    words
        .into_iter()
        .enumerate()
        .map(|(i, w)| Key::new(&w, i as u32).unwrap())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_key_roundtrip(word in "\\PC{0,20}", freq in any::<u32>()) {
        let key = match Key::new(&word, freq) {
            Ok(k) => k,
            Err(_) => return Ok(()),
        };
        prop_assert!(key.word().encode_utf16().count() <= MAX_WORD_UNITS);
        prop_assert!(word.starts_with(key.word()));
        let back = Key::decode(&key.to_bytes()).unwrap();
        prop_assert_eq!(back, key);
    }

    #[test]
    fn prop_node_roundtrip(
        words in prop::collection::vec("[a-z]{1,13}", 0..=T),
        leaf in any::<bool>(),
        parent in prop::option::of(0u32..1000),
    ) {
        let keys = sorted_keys(words);
        let mut node = Node::leaf(NodeOffset(NODE_SIZE as u32 * 3), parent.map(|p| NodeOffset(p * NODE_SIZE as u32)));
        if !leaf {
            node = Node::internal(node.offset, node.parent, NodeOffset(0));
            node.children = (0..=keys.len() as u32).map(|i| NodeOffset(i * NODE_SIZE as u32)).collect();
        }
        node.keys = keys.into_iter().collect();
        let back = Node::decode(&node.to_bytes()).unwrap();
        prop_assert_eq!(back, node);
    }

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=600)) {
        let mut t = WordTree::with_config(tight_config()).unwrap();
        let mut m: BTreeMap<String, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(word, freq) => {
                    // Callers never present a word twice.
                    if m.contains_key(&word) {
                        continue;
                    }
                    t.insert(Key::new(&word, freq).unwrap()).unwrap();
                    m.insert(word, freq);
                }
                Op::Search(word) => {
                    prop_assert_eq!(t.search(&word).unwrap(), m.get(&word).copied());
                }
                Op::Check => validate_tree(&t),
            }
            prop_assert_eq!(t.total_key_count(), m.len() as u64);
        }

        validate_tree(&t);
        prop_assert_eq!(
            t.total_word_count(),
            m.values().map(|&f| u64::from(f)).sum::<u64>()
        );
        let got: Vec<(String, u32)> = t.iter().map(|k| k.unwrap().into_parts()).collect();
        let expected: Vec<(String, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_around_first_splits() {
    // Seven keys: every order crosses the root split and one leaf split.
    let words = ["a", "b", "c", "d", "e", "f", "g"];

    for_each_permutation(&words, |perm| {
        let mut t = WordTree::new();
        for (i, w) in perm.iter().enumerate() {
            t.insert(Key::new(w, i as u32 + 1).unwrap()).unwrap();
        }
        validate_tree(&t);
        for (i, w) in perm.iter().enumerate() {
            assert_eq!(t.search(w).unwrap(), Some(i as u32 + 1), "order {perm:?}");
        }
        assert_eq!(t.search("h").unwrap(), None);
        assert_eq!(t.height().unwrap(), 2);
    });
}
