// SPDX-License-Identifier: Apache-2.0

//! Structural hashing for and-inverter graphs.
//!
//! Every node gets a blake3 digest of its structure: leaves hash their id,
//! AND gates hash the (sorted) digests of their operands with the operand
//! polarity mixed in. Two AND gates over the same operands in either order
//! share a digest, which lets the builder hand back the existing node.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::gate::{AigNode, AigOperand, AigRef};
use crate::topo::postorder_for_aig_refs_node_only;

const TAG_AND: u8 = 0;
const TAG_LEAF: u8 = 1;
const TAG_LITERAL: u8 = 2;

static FALSE_DIGEST: Lazy<blake3::Hash> = Lazy::new(|| {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[TAG_LITERAL, 0]);
    hasher.finalize()
});

#[derive(Default)]
pub struct AigHasher {
    /// Digest per node seen so far.
    digests: HashMap<AigRef, blake3::Hash>,
    /// First AND gate registered under each digest.
    canonical: HashMap<blake3::Hash, AigRef>,
}

impl AigHasher {
    pub fn new() -> Self {
        Self::default()
    }

    fn operand_bytes(&self, operand: &AigOperand) -> [u8; 32] {
        let mut bytes = *self.digests[&operand.node].as_bytes();
        bytes[0] ^= operand.negated as u8;
        bytes
    }

    fn and_digest(&self, a: &AigOperand, b: &AigOperand) -> blake3::Hash {
        let (mut lhs, mut rhs) = (self.operand_bytes(a), self.operand_bytes(b));
        if rhs < lhs {
            std::mem::swap(&mut lhs, &mut rhs);
        }
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[TAG_AND]);
        hasher.update(&lhs);
        hasher.update(&rhs);
        hasher.finalize()
    }

    /// Makes sure every node in the fan-in of `refs` has a digest.
    fn digest_fanin(&mut self, refs: &[AigRef], nodes: &[AigNode]) {
        for current in postorder_for_aig_refs_node_only(refs, nodes, &self.digests) {
            let digest = match &nodes[current.id] {
                AigNode::Literal(false) => *FALSE_DIGEST,
                AigNode::Literal(true) => {
                    let mut hasher = blake3::Hasher::new();
                    hasher.update(&[TAG_LITERAL, 1]);
                    hasher.finalize()
                }
                AigNode::Leaf { id } => {
                    let mut hasher = blake3::Hasher::new();
                    hasher.update(&[TAG_LEAF]);
                    hasher.update(&id.to_le_bytes());
                    hasher.finalize()
                }
                AigNode::And2 { a, b } => self.and_digest(a, b),
            };
            self.digests.insert(current, digest);
        }
    }

    /// The digest of `AND(a, b)` without creating the node.
    pub fn key_for_and(&mut self, a: AigOperand, b: AigOperand, nodes: &[AigNode]) -> blake3::Hash {
        self.digest_fanin(&[a.node, b.node], nodes);
        self.and_digest(&a, &b)
    }

    /// The node registered under `key`, if any.
    pub fn lookup(&self, key: &blake3::Hash) -> Option<AigRef> {
        self.canonical.get(key).copied()
    }

    /// Registers `aig_ref` as the node for `key`.
    pub fn insert(&mut self, key: blake3::Hash, aig_ref: AigRef) {
        self.digests.insert(aig_ref, key);
        self.canonical.entry(key).or_insert(aig_ref);
    }

    /// Digest of an existing node, computing its fan-in as needed.
    pub fn digest(&mut self, aig_ref: AigRef, nodes: &[AigNode]) -> blake3::Hash {
        self.digest_fanin(&[aig_ref], nodes);
        self.digests[&aig_ref]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: usize) -> AigOperand {
        AigRef { id }.into()
    }

    fn nodes() -> Vec<AigNode> {
        vec![
            AigNode::Literal(false),
            AigNode::Leaf { id: 0 },
            AigNode::Leaf { id: 1 },
        ]
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let depth = 200_000;
        let mut nodes = vec![AigNode::Leaf { id: 0 }];
        for i in 1..=depth {
            nodes.push(AigNode::And2 {
                a: leaf(i - 1),
                b: leaf(0),
            });
        }
        let mut hasher = AigHasher::new();
        let top = hasher.digest(AigRef { id: depth }, &nodes);
        assert_ne!(top, hasher.digest(AigRef { id: depth - 1 }, &nodes));
    }

    #[test]
    fn test_commuted_operands_share_a_key() {
        let nodes = nodes();
        let mut hasher = AigHasher::new();
        let ab = hasher.key_for_and(leaf(1), leaf(2).negate(), &nodes);
        let ba = hasher.key_for_and(leaf(2).negate(), leaf(1), &nodes);
        assert_eq!(ab, ba);
        assert_eq!(hasher.lookup(&ab), None);
        hasher.insert(ab, AigRef { id: 3 });
        assert_eq!(hasher.lookup(&ba), Some(AigRef { id: 3 }));
    }

    #[test]
    fn test_polarity_changes_the_key() {
        let nodes = nodes();
        let mut hasher = AigHasher::new();
        let plain = hasher.key_for_and(leaf(1), leaf(2), &nodes);
        let negated = hasher.key_for_and(leaf(1), leaf(2).negate(), &nodes);
        let both = hasher.key_for_and(leaf(1).negate(), leaf(2).negate(), &nodes);
        assert_ne!(plain, negated);
        assert_ne!(negated, both);
        assert_ne!(plain, both);
    }
}
