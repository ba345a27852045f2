//! # Merkle Search Tree
//!
//! The repository index: an ordered map from `{collection}/{rkey}` keys to
//! record CIDs, stored as DAG-CBOR nodes
//!
//! ```text
//! node  = { l: link | null, e: [entry] }
//! entry = { p: uint, k: bytes, v: link, t: link | null }
//! ```
//!
//! `l` is the subtree holding keys below the node's first entry; each
//! entry's `t` holds keys between it and the next entry. Keys are prefix
//! compressed against the previous entry *in the same node*: the full key
//! is the first `p` bytes of the previous full key followed by `k`, and the
//! first entry of every node has nothing to share (`p = 0`).
//!
//! A key's layer is the number of leading zero bit-pairs in SHA-256 of the
//! key; entries sit in the node whose layer matches theirs, which makes the
//! shape of the tree a pure function of its key set.
//!
//! ## Security Invariant
//!
//! Traversal trusts nothing about the node graph. Keys must be strictly
//! ascending in traversal order, prefixes must stay within the previous
//! key, no node may be reached twice, and a walk may not visit more nodes
//! than the store holds. Any violation, and any pointer to a node that is
//! not in the store, ends the walk with an error.

use std::collections::{BTreeMap, HashSet};

use atrecord_core::{Cid, Value};
use atrecord_crypto::sha256;

use crate::blockstore::BlockStore;
use crate::error::MstError;

/// Layer of `key`: leading zero bit-pairs of its SHA-256 digest.
pub fn key_layer(key: &str) -> u32 {
    let mut layer = 0;
    for byte in sha256(key.as_bytes()) {
        if byte == 0 {
            layer += 4;
            continue;
        }
        layer += byte.leading_zeros() / 2;
        break;
    }
    layer
}

// ---------------------------------------------------------------------------
// Node encoding
// ---------------------------------------------------------------------------

/// An entry as stored: prefix compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub prefix_len: usize,
    pub key_suffix: Vec<u8>,
    pub value: Cid,
    pub right: Option<Cid>,
}

/// A node as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub left: Option<Cid>,
    pub entries: Vec<TreeEntry>,
}

/// An entry with its full key restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: Cid,
    pub right: Option<Cid>,
}

fn optional_link(value: Option<&Value>, field: &str) -> Result<Option<Cid>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Link(c)) => Ok(Some(c.clone())),
        Some(other) => Err(format!("{field} is a {}, expected link or null", other.kind())),
    }
}

impl NodeData {
    /// Check the shape of a decoded node block.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let map = value
            .as_map()
            .ok_or_else(|| format!("node is a {}, expected map", value.kind()))?;
        let left = optional_link(map.get("l"), "l")?;
        let raw_entries = map
            .get("e")
            .ok_or("node has no e field")?
            .as_list()
            .ok_or("e is not a list")?;

        let mut entries = Vec::with_capacity(raw_entries.len());
        for (i, raw) in raw_entries.iter().enumerate() {
            let entry = raw
                .as_map()
                .ok_or_else(|| format!("entry {i} is a {}, expected map", raw.kind()))?;
            let prefix_len = entry
                .get("p")
                .and_then(Value::as_integer)
                .and_then(|p| usize::try_from(p).ok())
                .ok_or_else(|| format!("entry {i} p is not a non-negative integer"))?;
            let key_suffix = entry
                .get("k")
                .and_then(Value::as_bytes)
                .ok_or_else(|| format!("entry {i} k is not bytes"))?
                .to_vec();
            let value = entry
                .get("v")
                .and_then(Value::as_link)
                .ok_or_else(|| format!("entry {i} v is not a link"))?
                .clone();
            let right = optional_link(entry.get("t"), "t")?;
            entries.push(TreeEntry {
                prefix_len,
                key_suffix,
                value,
                right,
            });
        }
        Ok(Self { left, entries })
    }

    /// Prefix-compress full entries into a storable node.
    pub fn compress(left: Option<Cid>, entries: &[Entry]) -> Self {
        let mut previous: &[u8] = &[];
        let entries = entries
            .iter()
            .map(|e| {
                let key = e.key.as_bytes();
                let prefix_len = previous
                    .iter()
                    .zip(key)
                    .take_while(|(a, b)| a == b)
                    .count();
                previous = key;
                TreeEntry {
                    prefix_len,
                    key_suffix: key[prefix_len..].to_vec(),
                    value: e.value.clone(),
                    right: e.right.clone(),
                }
            })
            .collect();
        Self { left, entries }
    }

    pub fn to_value(&self) -> Value {
        let link_or_null = |c: &Option<Cid>| c.clone().map_or(Value::Null, Value::Link);
        let entries = self
            .entries
            .iter()
            .map(|e| {
                Value::map([
                    ("p", Value::Integer(e.prefix_len as i64)),
                    ("k", Value::Bytes(e.key_suffix.clone())),
                    ("v", Value::Link(e.value.clone())),
                    ("t", link_or_null(&e.right)),
                ])
            })
            .collect();
        Value::map([("l", link_or_null(&self.left)), ("e", Value::List(entries))])
    }

    /// Restore full keys. `node` is used for error reporting.
    pub fn expand(&self, node: &Cid) -> Result<Vec<Entry>, MstError> {
        let mut previous: Vec<u8> = Vec::new();
        let mut out = Vec::with_capacity(self.entries.len());
        for (index, e) in self.entries.iter().enumerate() {
            if e.prefix_len > previous.len() {
                return Err(MstError::PrefixOutOfRange {
                    node: node.clone(),
                    index,
                    prefix_len: e.prefix_len,
                    previous_len: previous.len(),
                });
            }
            previous.truncate(e.prefix_len);
            previous.extend_from_slice(&e.key_suffix);
            let key = std::str::from_utf8(&previous)
                .map_err(|_| MstError::InvalidKey {
                    node: node.clone(),
                    index,
                })?
                .to_string();
            out.push(Entry {
                key,
                value: e.value.clone(),
                right: e.right.clone(),
            });
        }
        Ok(out)
    }
}

struct LoadedNode {
    left: Option<Cid>,
    entries: Vec<Entry>,
}

fn load_node(store: &BlockStore, cid: &Cid) -> Result<LoadedNode, MstError> {
    let data = store.read_block(cid, NodeData::from_value)?;
    let entries = data.expand(cid)?;
    if let Some(pair) = entries.windows(2).find(|w| w[0].key >= w[1].key) {
        return Err(MstError::KeyOrder {
            node: cid.clone(),
            key: pair[1].key.clone(),
        });
    }
    Ok(LoadedNode {
        left: data.left,
        entries,
    })
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

enum Step {
    Node(Cid),
    Leaf { key: String, value: Cid, node: Cid },
}

/// Lazy in-order traversal yielding `(full_key, value_cid)`.
///
/// Not restartable. After the first error it yields nothing further.
pub struct MstWalker<'a> {
    store: &'a BlockStore,
    stack: Vec<Step>,
    visited: HashSet<Cid>,
    last_key: Option<String>,
    budget: usize,
    done: bool,
}

impl<'a> MstWalker<'a> {
    pub fn new(store: &'a BlockStore, root: Cid) -> Self {
        Self {
            store,
            stack: vec![Step::Node(root)],
            visited: HashSet::new(),
            last_key: None,
            budget: store.len(),
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<(String, Cid)>, MstError> {
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Leaf { key, value, node } => {
                    if let Some(last) = &self.last_key {
                        if key.as_str() <= last.as_str() {
                            return Err(MstError::KeyOrder { node, key });
                        }
                    }
                    self.last_key = Some(key.clone());
                    return Ok(Some((key, value)));
                }
                Step::Node(cid) => {
                    if self.visited.contains(&cid) {
                        return Err(MstError::Cycle(cid));
                    }
                    if self.visited.len() >= self.budget {
                        return Err(MstError::BudgetExceeded(self.budget));
                    }
                    let node = load_node(self.store, &cid)?;
                    for entry in node.entries.into_iter().rev() {
                        if let Some(right) = entry.right {
                            self.stack.push(Step::Node(right));
                        }
                        self.stack.push(Step::Leaf {
                            key: entry.key,
                            value: entry.value,
                            node: cid.clone(),
                        });
                    }
                    self.visited.insert(cid);
                    if let Some(left) = node.left {
                        self.stack.push(Step::Node(left));
                    }
                }
            }
        }
        Ok(None)
    }
}

impl Iterator for MstWalker<'_> {
    type Item = Result<(String, Cid), MstError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for MstWalker<'_> {}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find the value stored under `key`.
///
/// Descends only into the one subtree whose key range can contain `key`,
/// so a store holding just the nodes on that path is sufficient. A node on
/// the path that is missing from the store is an error.
pub fn find(store: &BlockStore, root: &Cid, key: &str) -> Result<Option<Cid>, MstError> {
    find_with_path(store, root, key).map(|(value, _)| value)
}

/// [`find`], also returning the CIDs of the nodes visited, root first.
pub fn find_with_path(
    store: &BlockStore,
    root: &Cid,
    key: &str,
) -> Result<(Option<Cid>, Vec<Cid>), MstError> {
    let budget = store.len();
    let mut path: Vec<Cid> = Vec::new();
    let mut current = Some(root.clone());
    while let Some(cid) = current.take() {
        if path.contains(&cid) {
            return Err(MstError::Cycle(cid));
        }
        if path.len() >= budget {
            return Err(MstError::BudgetExceeded(budget));
        }
        let node = load_node(store, &cid)?;
        path.push(cid);
        let mut next = node.left;
        for entry in node.entries {
            match entry.key.as_str().cmp(key) {
                std::cmp::Ordering::Equal => return Ok((Some(entry.value), path)),
                std::cmp::Ordering::Less => next = entry.right,
                std::cmp::Ordering::Greater => break,
            }
        }
        current = next;
    }
    Ok((None, path))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds an MST from a key set.
#[derive(Debug, Clone, Default)]
pub struct MstBuilder {
    entries: BTreeMap<String, Cid>,
}

struct Item<'k> {
    key: &'k str,
    value: &'k Cid,
    layer: u32,
}

impl MstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Cid) -> Result<Option<Cid>, MstError> {
        let key = key.into();
        if key.is_empty() {
            return Err(MstError::EmptyKey);
        }
        Ok(self.entries.insert(key, value))
    }

    pub fn remove(&mut self, key: &str) -> Option<Cid> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every node into `store` and return the root CID.
    pub fn build(&self, store: &mut BlockStore) -> Result<Cid, MstError> {
        let items: Vec<Item<'_>> = self
            .entries
            .iter()
            .map(|(key, value)| Item {
                key,
                value,
                layer: key_layer(key),
            })
            .collect();
        let top = items.iter().map(|i| i.layer).max().unwrap_or(0);
        build_node(&items, top, store)
    }
}

fn build_node(items: &[Item<'_>], layer: u32, store: &mut BlockStore) -> Result<Cid, MstError> {
    let mut left = None;
    let mut entries: Vec<Entry> = Vec::new();
    let mut group_start = 0;

    let mut attach = |entries: &mut Vec<Entry>, subtree: Option<Cid>| match entries.last_mut() {
        Some(last) => last.right = subtree,
        None => left = subtree,
    };

    for (i, item) in items.iter().enumerate() {
        if item.layer >= layer {
            let subtree = build_subtree(&items[group_start..i], layer, store)?;
            attach(&mut entries, subtree);
            entries.push(Entry {
                key: item.key.to_string(),
                value: item.value.clone(),
                right: None,
            });
            group_start = i + 1;
        }
    }
    let subtree = build_subtree(&items[group_start..], layer, store)?;
    attach(&mut entries, subtree);

    let node = NodeData::compress(left, &entries);
    Ok(store.put(&node.to_value())?)
}

fn build_subtree(
    group: &[Item<'_>],
    layer: u32,
    store: &mut BlockStore,
) -> Result<Option<Cid>, MstError> {
    match layer.checked_sub(1) {
        Some(lower) if !group.is_empty() => build_node(group, lower, store).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlockError;
    use atrecord_core::{CanonicalBytes, DAG_CBOR};
    use proptest::prelude::*;

    const LEAF: &str = "bafyreie5cvv4h45feadgeuwhbcutmh6t2ceseocckahdoe6uat64zmz454";

    fn leaf() -> Cid {
        LEAF.parse().unwrap()
    }

    fn build(keys: &[&str]) -> (BlockStore, Cid) {
        let mut builder = MstBuilder::new();
        for k in keys {
            builder.insert(*k, leaf()).unwrap();
        }
        let mut store = BlockStore::new();
        let root = builder.build(&mut store).unwrap();
        (store, root)
    }

    fn walk(store: &BlockStore, root: &Cid) -> Result<Vec<String>, MstError> {
        MstWalker::new(store, root.clone())
            .map(|r| r.map(|(k, _)| k))
            .collect()
    }

    fn raw_node(store: &mut BlockStore, left: Option<Cid>, entries: &[(usize, &str, Option<Cid>)]) -> Cid {
        let node = NodeData {
            left,
            entries: entries
                .iter()
                .map(|(p, k, t)| TreeEntry {
                    prefix_len: *p,
                    key_suffix: k.as_bytes().to_vec(),
                    value: leaf(),
                    right: t.clone(),
                })
                .collect(),
        };
        store.put(&node.to_value()).unwrap()
    }

    #[test]
    fn test_key_layers() {
        assert_eq!(key_layer("2653ae71"), 0);
        assert_eq!(key_layer("blue"), 1);
        assert_eq!(key_layer("app.bsky.feed.post/454397e440ec"), 4);
        assert_eq!(key_layer("app.bsky.feed.post/9adeb165882c"), 8);
    }

    #[test]
    fn test_interop_root_cids() {
        let cases: [(&[&str], &str); 4] = [
            (&[], "bafyreie5737gdxlw5i64vzichcalba3z2v5n6icifvx5xytvske7mr3hpm"),
            (
                &["com.example.record/3jqfcqzm3fo2j"],
                "bafyreibj4lsc3aqnrvphp5xmrnfoorvru4wynt6lwidqbm2623a6tatzdu",
            ),
            (
                &["com.example.record/3jqfcqzm3fx2j"],
                "bafyreih7wfei65pxzhauoibu3ls7jgmkju4bspy4t2ha2qdjnzqvoy33ai",
            ),
            (
                &[
                    "com.example.record/3jqfcqzm3fp2j",
                    "com.example.record/3jqfcqzm3fr2j",
                    "com.example.record/3jqfcqzm3fs2j",
                    "com.example.record/3jqfcqzm3ft2j",
                    "com.example.record/3jqfcqzm4fc2j",
                ],
                "bafyreicmahysq4n6wfuxo522m6dpiy7z7qzym3dzs756t5n7nfdgccwq7m",
            ),
        ];
        for (keys, expected) in cases {
            let (_, root) = build(keys);
            assert_eq!(root.to_string(), expected, "keys {keys:?}");
        }
    }

    #[test]
    fn test_layer_two_key_has_empty_intermediate_nodes() {
        let (store, root) = build(&["com.example.record/3jqfcqzm3fx2j"]);
        // root (layer 2) holding the key, no subtrees needed
        assert_eq!(store.len(), 1);
        assert_eq!(walk(&store, &root).unwrap(), vec!["com.example.record/3jqfcqzm3fx2j"]);
    }

    #[test]
    fn test_walk_yields_sorted_keys() {
        let keys: Vec<String> = (0..200)
            .map(|i| format!("app.bsky.feed.post/{i:06}"))
            .collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let (store, root) = build(&refs);
        assert!(store.len() > 1);
        assert_eq!(walk(&store, &root).unwrap(), keys);
    }

    #[test]
    fn test_find_present_and_absent() {
        let keys: Vec<String> = (0..100).map(|i| format!("app.bsky.graph.follow/{i:04}")).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let (store, root) = build(&refs);
        for k in &keys {
            assert_eq!(find(&store, &root, k).unwrap(), Some(leaf()), "{k}");
        }
        assert_eq!(find(&store, &root, "app.bsky.graph.follow/9999").unwrap(), None);
        assert_eq!(find(&store, &root, "a").unwrap(), None);
        assert_eq!(find(&store, &root, "zzz").unwrap(), None);
    }

    #[test]
    fn test_empty_tree() {
        let (store, root) = build(&[]);
        assert!(walk(&store, &root).unwrap().is_empty());
        assert_eq!(find(&store, &root, "any/key").unwrap(), None);
    }

    #[test]
    fn test_key_reconstruction_from_prefixes() {
        let mut store = BlockStore::new();
        let right = raw_node(&mut store, None, &[(0, "app.bsky.feed.post/c1", None), (20, "2", None)]);
        let left = raw_node(&mut store, None, &[(0, "app.bsky.feed.like/a", None)]);
        let root = raw_node(
            &mut store,
            Some(left),
            &[
                (0, "app.bsky.feed.post/aaa", None),
                (21, "b", Some(right)),
            ],
        );
        assert_eq!(
            walk(&store, &root).unwrap(),
            vec![
                "app.bsky.feed.like/a",
                "app.bsky.feed.post/aaa",
                "app.bsky.feed.post/aab",
                "app.bsky.feed.post/c1",
                "app.bsky.feed.post/c2",
            ]
        );
    }

    #[test]
    fn test_prefix_relative_to_same_node_only() {
        // The first entry of the right subtree shares a prefix with its
        // parent's last key, but must still declare p = 0.
        let mut store = BlockStore::new();
        let right = raw_node(&mut store, None, &[(5, "z", None)]);
        let root = raw_node(&mut store, None, &[(0, "abcdef", Some(right))]);
        let err = walk(&store, &root).unwrap_err();
        assert!(matches!(
            err,
            MstError::PrefixOutOfRange {
                prefix_len: 5,
                previous_len: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_order_in_node() {
        let mut store = BlockStore::new();
        let root = raw_node(&mut store, None, &[(0, "b", None), (0, "a", None)]);
        assert!(matches!(walk(&store, &root), Err(MstError::KeyOrder { .. })));
        assert!(matches!(find(&store, &root, "a"), Err(MstError::KeyOrder { .. })));
    }

    #[test]
    fn test_out_of_order_across_nodes() {
        let mut store = BlockStore::new();
        let left = raw_node(&mut store, None, &[(0, "m", None)]);
        let root = raw_node(&mut store, Some(left), &[(0, "c", None)]);
        let mut walker = MstWalker::new(&store, root);
        assert_eq!(walker.next().unwrap().unwrap().0, "m");
        assert!(matches!(walker.next(), Some(Err(MstError::KeyOrder { .. }))));
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_missing_subtree_is_fatal_for_walk() {
        let mut store = BlockStore::new();
        let absent = Cid::compute(DAG_CBOR, b"absent node");
        let root = raw_node(&mut store, Some(absent.clone()), &[(0, "k", None)]);
        assert_eq!(
            walk(&store, &root).unwrap_err(),
            MstError::Node(BlockError::NotFound(absent))
        );
    }

    #[test]
    fn test_find_prunes_off_path_subtrees() {
        let keys: Vec<String> = (0..300).map(|i| format!("app.bsky.feed.post/{i:05}")).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let (full, root) = build(&refs);
        let target = &keys[137];

        let (value, path) = find_with_path(&full, &root, target).unwrap();
        assert_eq!(value, Some(leaf()));
        assert!(path.len() < full.len());

        let mut proof = BlockStore::new();
        for cid in &path {
            proof.insert(cid.clone(), full.get(cid).unwrap().to_vec());
        }
        assert_eq!(find(&proof, &root, target).unwrap(), Some(leaf()));
        assert!(walk(&proof, &root).is_err());
    }

    #[test]
    fn test_missing_node_on_path_is_fatal_for_find() {
        let keys: Vec<String> = (0..300).map(|i| format!("app.bsky.feed.post/{i:05}")).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let (full, root) = build(&refs);
        let (_, path) = find_with_path(&full, &root, &keys[10]).unwrap();
        let mut partial = BlockStore::new();
        partial.insert(root.clone(), full.get(&root).unwrap().to_vec());
        let result = find(&partial, &root, &keys[10]);
        if path.len() > 1 {
            assert!(matches!(result, Err(MstError::Node(BlockError::NotFound(_)))));
        }
    }

    #[test]
    fn test_cycle_detected() {
        let mut store = BlockStore::new();
        let fake = Cid::compute(DAG_CBOR, b"self reference");
        let node = NodeData {
            left: Some(fake.clone()),
            entries: vec![],
        };
        let bytes = CanonicalBytes::new(&node.to_value()).unwrap();
        store.insert(fake.clone(), bytes.into_vec());
        // a second unrelated block so the budget is not the first limit hit
        store.put(&Value::Null).unwrap();
        assert_eq!(walk(&store, &fake).unwrap_err(), MstError::Cycle(fake.clone()));
        assert_eq!(find(&store, &fake, "k").unwrap_err(), MstError::Cycle(fake));
    }

    #[test]
    fn test_node_shape_errors() {
        let mut store = BlockStore::new();
        let not_map = store.put(&Value::from("node")).unwrap();
        assert!(matches!(
            walk(&store, &not_map),
            Err(MstError::Node(BlockError::ShapeMismatch { .. }))
        ));
        let bad_entry = store
            .put(&Value::map([
                ("l", Value::Null),
                ("e", Value::List(vec![Value::map([("p", Value::Integer(-1))])])),
            ]))
            .unwrap();
        assert!(matches!(
            find(&store, &bad_entry, "k"),
            Err(MstError::Node(BlockError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_non_utf8_key() {
        let mut store = BlockStore::new();
        let node = NodeData {
            left: None,
            entries: vec![TreeEntry {
                prefix_len: 0,
                key_suffix: vec![0xff, 0xfe],
                value: leaf(),
                right: None,
            }],
        };
        let root = store.put(&node.to_value()).unwrap();
        assert!(matches!(walk(&store, &root), Err(MstError::InvalidKey { index: 0, .. })));
    }

    #[test]
    fn test_builder_rejects_empty_key() {
        assert_eq!(MstBuilder::new().insert("", leaf()), Err(MstError::EmptyKey));
    }

    #[test]
    fn test_node_value_roundtrip() {
        let entries = vec![
            Entry { key: "app.bsky.feed.post/a".into(), value: leaf(), right: None },
            Entry { key: "app.bsky.feed.post/b".into(), value: leaf(), right: Some(leaf()) },
        ];
        let node = NodeData::compress(None, &entries);
        assert_eq!(node.entries[1].prefix_len, 19);
        assert_eq!(node.entries[1].key_suffix, b"b");
        let back = NodeData::from_value(node.to_value()).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.expand(&leaf()).unwrap(), entries);
    }

    proptest! {
        #[test]
        fn prop_build_then_walk(keys in proptest::collection::btree_set("[a-z]{1,6}/[a-z0-9]{1,8}", 0..60)) {
            let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let (store, root) = build(&refs);
            let walked = walk(&store, &root).unwrap();
            prop_assert_eq!(walked, keys.iter().cloned().collect::<Vec<_>>());
            for k in &keys {
                prop_assert_eq!(find(&store, &root, k).unwrap(), Some(leaf()));
            }
        }

        #[test]
        fn prop_root_independent_of_insertion_order(
            keys in proptest::collection::vec("[a-z]{1,4}/[a-z0-9]{1,6}", 1..40)
        ) {
            let forward: Vec<&str> = keys.iter().map(String::as_str).collect();
            let backward: Vec<&str> = keys.iter().rev().map(String::as_str).collect();
            prop_assert_eq!(build(&forward).1, build(&backward).1);
        }
    }
}
