// SPDX-License-Identifier: Apache-2.0

//! And-inverter graph nodes and the bit-vectors built from them.

use std::fmt;

/// Index of a node in a builder's gate list.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct AigRef {
    pub id: usize,
}

/// A node reference with an optional inverter on the edge.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct AigOperand {
    pub node: AigRef,
    pub negated: bool,
}

impl AigOperand {
    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            negated: !self.negated,
            ..*self
        }
    }

    pub fn non_negated(&self) -> Option<AigRef> {
        (!self.negated).then_some(self.node)
    }
}

impl From<AigRef> for AigOperand {
    fn from(node: AigRef) -> Self {
        AigOperand {
            node,
            negated: false,
        }
    }
}

impl fmt::Display for AigOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not(%{})", self.node.id)
        } else {
            write!(f, "%{}", self.node.id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AigNode {
    Literal(bool),
    /// A free boolean supplied from outside the graph. `id` indexes the
    /// caller's leaf table.
    Leaf { id: usize },
    And2 { a: AigOperand, b: AigOperand },
}

impl AigNode {
    pub fn get_operands(&self) -> Vec<AigOperand> {
        match self {
            AigNode::And2 { a, b } => vec![*a, *b],
            AigNode::Literal(_) | AigNode::Leaf { .. } => Vec::new(),
        }
    }
}

/// A vector of AIG bits; index 0 is the least significant bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AigBitVector {
    operands: Vec<AigOperand>,
}

impl From<AigOperand> for AigBitVector {
    fn from(operand: AigOperand) -> Self {
        AigBitVector {
            operands: vec![operand],
        }
    }
}

/// The two halves of a bit-vector cut at some bit position.
#[derive(Debug, Clone)]
pub struct Split {
    pub msbs: AigBitVector,
    pub lsbs: AigBitVector,
}

impl AigBitVector {
    fn constant(value: bool) -> AigOperand {
        AigOperand {
            node: AigRef { id: 0 },
            negated: value,
        }
    }

    pub fn zeros(bit_count: usize) -> Self {
        Self::from_u64(0, bit_count)
    }

    pub fn ones(bit_count: usize) -> Self {
        Self {
            operands: vec![Self::constant(true); bit_count],
        }
    }

    /// The low `bit_count` bits of `value`; bits past 64 are zero.
    pub fn from_u64(value: u64, bit_count: usize) -> Self {
        Self {
            operands: (0..bit_count)
                .map(|i| Self::constant(i < 64 && (value >> i) & 1 == 1))
                .collect(),
        }
    }

    /// `msbs` placed above `lsbs`.
    pub fn concat(msbs: Self, lsbs: Self) -> Self {
        Self {
            operands: lsbs.operands.into_iter().chain(msbs.operands).collect(),
        }
    }

    pub fn from_lsb_is_index_0(operands: &[AigOperand]) -> Self {
        Self {
            operands: operands.to_vec(),
        }
    }

    /// The top `bit_count` bits.
    pub fn get_msbs(&self, bit_count: usize) -> Self {
        let start = self.operands.len() - bit_count;
        self.get_lsb_slice(start, bit_count)
    }

    /// `bit_width` bits starting at bit `start`.
    pub fn get_lsb_slice(&self, start: usize, bit_width: usize) -> Self {
        Self::from_lsb_is_index_0(&self.operands[start..start + bit_width])
    }

    /// Cuts after the low `bit_width` bits.
    pub fn get_lsb_partition(&self, bit_width: usize) -> Split {
        let (lsbs, msbs) = self.operands.split_at(bit_width);
        Split {
            msbs: Self::from_lsb_is_index_0(msbs),
            lsbs: Self::from_lsb_is_index_0(lsbs),
        }
    }

    pub fn iter_lsb_to_msb(&self) -> impl DoubleEndedIterator<Item = &AigOperand> {
        self.operands.iter()
    }

    pub fn iter_msb_to_lsb(&self) -> impl DoubleEndedIterator<Item = &AigOperand> {
        self.operands.iter().rev()
    }

    pub fn get_lsb(&self, index: usize) -> &AigOperand {
        &self.operands[index]
    }

    pub fn get_msb(&self, index: usize) -> &AigOperand {
        &self.operands[self.operands.len() - 1 - index]
    }

    pub fn get_bit_count(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    pub fn to_vec(&self) -> Vec<AigOperand> {
        self.operands.clone()
    }
}

impl fmt::Display for AigBitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: Vec<String> = self.operands.iter().map(|bit| bit.to_string()).collect();
        write!(f, "bits[{}] = [{}]", self.operands.len(), bits.join(", "))
    }
}
