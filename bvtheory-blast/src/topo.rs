// SPDX-License-Identifier: Apache-2.0

//! Graph walks over and-inverter graphs. Both are iterative so deep carry
//! chains do not exhaust the stack.

use std::collections::{HashMap, HashSet};

use crate::gate::{AigNode, AigRef};

/// Nodes in the fan-in of `roots`, operands before users, each node once
/// regardless of edge polarity. Nodes already keyed in `done` are treated
/// as visited and left out.
pub fn postorder_for_aig_refs_node_only(
    roots: &[AigRef],
    nodes: &[AigNode],
    done: &HashMap<AigRef, impl Sized>,
) -> Vec<AigRef> {
    let mut emitted: HashSet<AigRef> = HashSet::new();
    let mut order = Vec::new();
    // (node, whether its operands have been pushed)
    let mut stack: Vec<(AigRef, bool)> = roots.iter().rev().map(|r| (*r, false)).collect();
    while let Some((current, expanded)) = stack.pop() {
        if done.contains_key(&current) || emitted.contains(&current) {
            continue;
        }
        if expanded {
            emitted.insert(current);
            order.push(current);
            continue;
        }
        stack.push((current, true));
        for operand in nodes[current.id].get_operands().iter().rev() {
            if !done.contains_key(&operand.node) && !emitted.contains(&operand.node) {
                stack.push((operand.node, false));
            }
        }
    }
    order
}

/// The transitive fan-in of `roots`: non-leaf nodes in ascending id order
/// (a topological order, since operands are created first) and the set of
/// leaves.
pub fn extract_cone(roots: &[AigRef], nodes: &[AigNode]) -> (Vec<AigRef>, HashSet<AigRef>) {
    let mut seen = vec![false; nodes.len()];
    let mut pending: Vec<AigRef> = roots.to_vec();
    let mut leaves = HashSet::new();
    while let Some(current) = pending.pop() {
        if std::mem::replace(&mut seen[current.id], true) {
            continue;
        }
        match &nodes[current.id] {
            AigNode::Leaf { .. } => {
                leaves.insert(current);
            }
            node => pending.extend(node.get_operands().iter().map(|op| op.node)),
        }
    }
    let interior = seen
        .iter()
        .enumerate()
        .filter(|(id, in_cone)| **in_cone && !leaves.contains(&AigRef { id: *id }))
        .map(|(id, _)| AigRef { id })
        .collect();
    (interior, leaves)
}
