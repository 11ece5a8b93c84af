//! Gadgets for proving Merkle openings and recomputing roots
//!
//! The path walk consumes address bits little-endian: bit `i` selects which
//! side of the level-`i` compression the running hash sits on, and level `i`
//! is compressed under the level-`i` IV

use ark_r1cs_std::{
    boolean::Boolean,
    eq::EqGadget,
    fields::fp::FpVar,
    select::CondSelectGadget,
};
use ark_relations::r1cs::SynthesisError;
use constants::ScalarField;
use settlement_crypto::hash::MERKLE_TREE_IVS;

use super::longsight::LongsightGadget;

/// Computes the root of a tree from a leaf hash, its address bits and a
/// sibling path
#[derive(Clone, Debug)]
pub struct MerklePathGadget;

impl MerklePathGadget {
    /// Walk the path from the leaf to the root, returning the root wire
    pub fn compute_root(
        leaf: &FpVar<ScalarField>,
        address_bits: &[Boolean<ScalarField>],
        path: &[FpVar<ScalarField>],
    ) -> Result<FpVar<ScalarField>, SynthesisError> {
        assert_eq!(
            address_bits.len(),
            path.len(),
            "address width must match path depth"
        );

        let mut current = leaf.clone();
        for (level, (bit, sibling)) in address_bits.iter().zip(path.iter()).enumerate() {
            // A set bit places the running hash on the right
            let left = FpVar::conditionally_select(bit, sibling, &current)?;
            let right = FpVar::conditionally_select(bit, &current, sibling)?;

            current = LongsightGadget::compress(MERKLE_TREE_IVS[level], &[left, right])?;
        }

        Ok(current)
    }

    /// Walk the path and constrain the result to an expected root; the
    /// inclusion-proof form
    pub fn compute_and_constrain_root(
        leaf: &FpVar<ScalarField>,
        address_bits: &[Boolean<ScalarField>],
        path: &[FpVar<ScalarField>],
        expected_root: &FpVar<ScalarField>,
    ) -> Result<(), SynthesisError> {
        let root = Self::compute_root(leaf, address_bits, path)?;
        root.enforce_equal(expected_root)
    }
}

#[cfg(test)]
mod merkle_tests {
    use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, fields::fp::FpVar, R1CSVar};
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
    use constants::ScalarField;
    use settlement_crypto::merkle::{hash_filled_leaf, SparseMerkleTree};

    use super::MerklePathGadget;

    /// Allocate a leaf, its address bits and path in a fresh system
    fn alloc_opening(
        leaf: ScalarField,
        index: u64,
        path: &[ScalarField],
    ) -> (
        ConstraintSystemRef<ScalarField>,
        FpVar<ScalarField>,
        Vec<Boolean<ScalarField>>,
        Vec<FpVar<ScalarField>>,
    ) {
        let cs = ConstraintSystem::<ScalarField>::new_ref();
        let leaf = FpVar::new_witness(cs.clone(), || Ok(leaf)).unwrap();
        let bits = (0..path.len())
            .map(|i| Boolean::new_witness(cs.clone(), || Ok((index >> i) & 1 == 1)).unwrap())
            .collect();
        let path = path
            .iter()
            .map(|sibling| FpVar::new_witness(cs.clone(), || Ok(*sibling)).unwrap())
            .collect();

        (cs, leaf, bits, path)
    }

    /// The gadget recomputes the native tree's root
    #[test]
    fn test_root_matches_native() {
        let mut tree = SparseMerkleTree::new(8, hash_filled_leaf(ScalarField::from(0u64)));
        let leaf = hash_filled_leaf(ScalarField::from(42u64));
        tree.insert(100, leaf);
        tree.insert(3, hash_filled_leaf(ScalarField::from(5u64)));

        let (cs, leaf_var, bits, path) = alloc_opening(leaf, 100, &tree.proof(100));
        let root = MerklePathGadget::compute_root(&leaf_var, &bits, &path).unwrap();

        assert_eq!(root.value().unwrap(), tree.root());
        assert!(cs.is_satisfied().unwrap());
    }

    /// The inclusion form rejects a tampered sibling
    #[test]
    fn test_tampered_sibling() {
        let mut tree = SparseMerkleTree::new(8, hash_filled_leaf(ScalarField::from(0u64)));
        let leaf = hash_filled_leaf(ScalarField::from(42u64));
        tree.insert(100, leaf);

        let mut proof = tree.proof(100);
        proof[2] += ScalarField::from(1u64);

        let (cs, leaf_var, bits, path) = alloc_opening(leaf, 100, &proof);
        let expected = FpVar::new_witness(cs.clone(), || Ok(tree.root())).unwrap();
        MerklePathGadget::compute_and_constrain_root(&leaf_var, &bits, &path, &expected).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }
}
