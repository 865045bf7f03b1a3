// SPDX-License-Identifier: Apache-2.0

//! Concrete evaluation of an and-inverter graph.

use bitvec::prelude::*;

use crate::gate::{AigBitVector, AigNode, AigOperand};

/// Evaluates every node of `gates` for the given leaf values (indexed by leaf
/// id) and returns the value of each requested output.
///
/// Nodes are evaluated in id order, which is topological because operands are
/// always created before the gates that use them.
pub fn eval(gates: &[AigNode], leaf_values: &BitSlice, outputs: &[AigOperand]) -> BitVec {
    let mut values: BitVec = BitVec::repeat(false, gates.len());
    for (id, node) in gates.iter().enumerate() {
        let value = match node {
            AigNode::Literal(value) => *value,
            AigNode::Leaf { id: leaf_id } => {
                assert!(
                    *leaf_id < leaf_values.len(),
                    "leaf {} has no value; {} provided",
                    leaf_id,
                    leaf_values.len()
                );
                leaf_values[*leaf_id]
            }
            AigNode::And2 { a, b } => {
                debug_assert!(a.node.id < id && b.node.id < id);
                operand_value(&values, a) && operand_value(&values, b)
            }
        };
        values.set(id, value);
    }
    outputs.iter().map(|op| operand_value(&values, op)).collect()
}

/// Evaluates a bit vector output and packs it into a `u64` (LSB first).
pub fn eval_u64(gates: &[AigNode], leaf_values: &BitSlice, output: &AigBitVector) -> u64 {
    assert!(output.get_bit_count() <= 64);
    let bits = eval(gates, leaf_values, &output.to_vec());
    bits.iter()
        .enumerate()
        .fold(0u64, |acc, (i, bit)| acc | ((*bit as u64) << i))
}

fn operand_value(values: &BitSlice, operand: &AigOperand) -> bool {
    values[operand.node.id] ^ operand.negated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_builder::{GateBuilder, GateBuilderOptions};

    #[test]
    fn test_eval_constants_and_leaves() {
        let mut builder = GateBuilder::new(GateBuilderOptions::no_opt());
        let a = builder.add_leaf(0);
        let b = builder.add_leaf(1);
        let and = builder.add_and_binary(a, b.negate());
        let outputs = [builder.get_true(), builder.get_false(), and];
        assert_eq!(
            eval(&builder.gates, bits![1, 0], &outputs),
            bitvec![1, 0, 1]
        );
        assert_eq!(
            eval(&builder.gates, bits![1, 1], &outputs),
            bitvec![1, 0, 0]
        );
    }

    #[test]
    fn test_eval_u64_packs_lsb_first() {
        let mut builder = GateBuilder::new(GateBuilderOptions::opt());
        let a = builder.add_leaf(0);
        let bv = AigBitVector::from_lsb_is_index_0(&[a, builder.get_false(), a.negate()]);
        assert_eq!(eval_u64(&builder.gates, bits![1], &bv), 0b001);
        assert_eq!(eval_u64(&builder.gates, bits![0], &bv), 0b100);
    }
}
