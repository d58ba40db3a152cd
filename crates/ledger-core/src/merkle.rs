//! Merkle root aggregation over ordered transaction batches.
//!
//! Level 0 holds the raw transaction strings. Every level above it holds hex
//! digests of the concatenated (left‖right) pair below. An odd level has its
//! last element duplicated before pairing.

use crate::hash::{hash, hash_concat};
use serde::{Deserialize, Serialize};

/// Compute the Merkle root of an ordered transaction batch.
///
/// Returns the empty string for an empty batch and `hash(t)` for a single
/// transaction `t`.
pub fn merkle_root<S: AsRef<str>>(transactions: &[S]) -> String {
    match transactions {
        [] => String::new(),
        [only] => hash(only.as_ref()),
        _ => {
            let mut level = hash_pairs(transactions);
            while level.len() > 1 {
                level = hash_pairs(&level);
            }
            level.pop().unwrap_or_default()
        }
    }
}

fn hash_pairs<S: AsRef<str>>(level: &[S]) -> Vec<String> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    for pair in level.chunks(2) {
        let left = pair[0].as_ref();
        let right = pair.get(1).map_or(left, |r| r.as_ref());
        next.push(hash_concat([left, right]));
    }
    next
}

/// Which side of the running hash a proof sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: String,
    pub side: Side,
}

/// Inclusion proof for a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf: String,
    pub index: usize,
    pub steps: Vec<ProofStep>,
}

/// A Merkle tree that keeps every level so inclusion proofs can be produced.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<String>>,
    root: String,
}

impl MerkleTree {
    pub fn new<S: AsRef<str>>(transactions: &[S]) -> Self {
        if transactions.is_empty() {
            return Self {
                levels: Vec::new(),
                root: String::new(),
            };
        }

        let mut levels = vec![transactions
            .iter()
            .map(|t| t.as_ref().to_owned())
            .collect::<Vec<_>>()];

        let root = if transactions.len() == 1 {
            hash(transactions[0].as_ref())
        } else {
            loop {
                let next = hash_pairs(&levels[levels.len() - 1]);
                if next.len() == 1 {
                    let root = next[0].clone();
                    levels.push(next);
                    break root;
                }
                levels.push(next);
            }
        };

        Self { levels, root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Number of hashing levels between the leaves and the root.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Build an inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf = self.levels.first()?.get(index)?.clone();
        let mut steps = Vec::with_capacity(self.depth());
        let mut idx = index;

        // The top level is the root itself and has no sibling.
        for level in &self.levels[..self.depth()] {
            let (sibling_idx, side) = if idx % 2 == 0 {
                (idx + 1, Side::Right)
            } else {
                (idx - 1, Side::Left)
            };
            let sibling = level.get(sibling_idx).unwrap_or(&level[idx]).clone();
            steps.push(ProofStep { sibling, side });
            idx /= 2;
        }

        Some(MerkleProof { leaf, index, steps })
    }

    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        verify_proof(&self.root, proof)
    }
}

/// Check an inclusion proof against a Merkle root.
pub fn verify_proof(root: &str, proof: &MerkleProof) -> bool {
    if proof.steps.is_empty() {
        return hash(&proof.leaf) == root;
    }
    let acc = proof
        .steps
        .iter()
        .fold(proof.leaf.clone(), |acc, step| match step.side {
            Side::Right => hash_concat([acc.as_str(), step.sibling.as_str()]),
            Side::Left => hash_concat([step.sibling.as_str(), acc.as_str()]),
        });
    acc == root
}
