// SPDX-License-Identifier: Apache-2.0

use crate::gate::{AigNode, AigOperand, AigRef};
use crate::gate_builder::GateBuilder;

// Extracts the operands for an effective "or" pattern, i.e.
// a | b => ~((~a) & (~b))
fn extract_or_pattern(a: AigOperand, builder: &GateBuilder) -> Option<(AigOperand, AigOperand)> {
    if !a.negated {
        return None;
    }
    match &builder.gates[a.node.id] {
        AigNode::And2 { a, b } => Some((a.negate(), b.negate())),
        _ => None,
    }
}

/// Simplifies local patterns over a freshly created AND gate:
///
/// * `(a | b) & b => b`
/// * `a & a => a`
/// * `a & !a => false`
pub fn operand_simplify(aig_ref: AigRef, builder: &GateBuilder) -> Option<AigOperand> {
    let AigNode::And2 { a, b } = &builder.gates[aig_ref.id] else {
        return None;
    };
    if a == b {
        return Some(*a);
    }
    if a.node == b.node {
        return Some(builder.get_false());
    }
    if let Some((or_lhs, or_rhs)) = extract_or_pattern(*a, builder) {
        if or_lhs == *b || or_rhs == *b {
            return Some(*b);
        }
    }
    if let Some((or_lhs, or_rhs)) = extract_or_pattern(*b, builder) {
        if or_lhs == *a || or_rhs == *a {
            return Some(*a);
        }
    }
    None
}
