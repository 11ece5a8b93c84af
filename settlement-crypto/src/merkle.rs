//! A sparse Merkle tree over the LongsightL compressor
//!
//! The tree stores leaf hashes only; untouched subtrees collapse to
//! precomputed defaults. Internal nodes at level `l` are hashed with the
//! level-`(l-1)` IV, matching the in-circuit path recomputation step by step

use std::collections::BTreeMap;

use ark_ff::One;
use constants::ScalarField;

use crate::hash::{compress, MERKLE_TREE_IVS};

/// The IV used when hashing leaf preimages, as distinct from the per-level
/// internal-node IVs
pub fn leaf_iv() -> ScalarField {
    ScalarField::one()
}

/// Hash a trading-history leaf; the duplicated input fits the 2-ary
/// compressor
pub fn hash_filled_leaf(filled: ScalarField) -> ScalarField {
    compress(leaf_iv(), &[filled, filled])
}

/// Hash an account leaf over its four-element preimage
pub fn hash_account_leaf(
    pub_x: ScalarField,
    pub_y: ScalarField,
    token: ScalarField,
    balance: ScalarField,
) -> ScalarField {
    compress(leaf_iv(), &[pub_x, pub_y, token, balance])
}

/// A fixed-depth sparse Merkle tree keyed by leaf index
#[derive(Clone, Debug)]
pub struct SparseMerkleTree {
    /// The number of levels between a leaf and the root
    depth: usize,
    /// The hashes of occupied leaves
    leaves: BTreeMap<u64, ScalarField>,
    /// The default node hash per level; entry 0 is the empty-leaf hash
    defaults: Vec<ScalarField>,
}

impl SparseMerkleTree {
    /// Create an empty tree of the given depth whose untouched leaves all
    /// carry `empty_leaf`
    pub fn new(depth: usize, empty_leaf: ScalarField) -> Self {
        assert!(depth <= MERKLE_TREE_IVS.len(), "tree deeper than IV table");

        let mut defaults = Vec::with_capacity(depth + 1);
        defaults.push(empty_leaf);
        for level in 0..depth {
            let child = defaults[level];
            defaults.push(compress(MERKLE_TREE_IVS[level], &[child, child]));
        }

        Self {
            depth,
            leaves: BTreeMap::new(),
            defaults,
        }
    }

    /// The tree's depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Read the leaf hash at an index
    pub fn get(&self, index: u64) -> ScalarField {
        self.leaves.get(&index).copied().unwrap_or(self.defaults[0])
    }

    /// Write a leaf hash at an index
    pub fn insert(&mut self, index: u64, leaf: ScalarField) {
        assert!(index < 1u64 << self.depth, "leaf index out of range");
        self.leaves.insert(index, leaf);
    }

    /// The current root of the tree
    pub fn root(&self) -> ScalarField {
        self.node(self.depth, 0)
    }

    /// The sibling path from leaf `index` to the root, leaf-adjacent level
    /// first
    pub fn proof(&self, index: u64) -> Vec<ScalarField> {
        (0..self.depth)
            .map(|level| self.node(level, (index >> level) ^ 1))
            .collect()
    }

    /// The hash of the node at `(level, index)`, where level 0 is the leaf
    /// layer
    fn node(&self, level: usize, index: u64) -> ScalarField {
        if level == 0 {
            return self.get(index);
        }

        // Collapse untouched subtrees to their default
        let lo = index << level;
        let hi = (index + 1) << level;
        if self.leaves.range(lo..hi).next().is_none() {
            return self.defaults[level];
        }

        let left = self.node(level - 1, 2 * index);
        let right = self.node(level - 1, 2 * index + 1);

        compress(MERKLE_TREE_IVS[level - 1], &[left, right])
    }
}

/// Recompute a root from a leaf hash, its index and a sibling path; the
/// native mirror of the circuit's path walk
pub fn compute_root_from_path(leaf: ScalarField, index: u64, path: &[ScalarField]) -> ScalarField {
    let mut current = leaf;
    for (level, sibling) in path.iter().enumerate() {
        let (left, right) = if (index >> level) & 1 == 0 {
            (current, *sibling)
        } else {
            (*sibling, current)
        };

        current = compress(MERKLE_TREE_IVS[level], &[left, right]);
    }

    current
}
