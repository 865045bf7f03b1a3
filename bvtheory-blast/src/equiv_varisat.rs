// SPDX-License-Identifier: Apache-2.0

//! Equivalence checking of two bit-vectors over one and-inverter graph.
//!
//! The fan-in cones of both sides are Tseitin-encoded into a varisat
//! formula together with a miter clause requiring some output bit to
//! differ. Unsatisfiable means the two sides agree for every leaf
//! assignment; otherwise the model gives a counterexample.

use std::collections::{HashMap, HashSet};

use bitvec::vec::BitVec;
use varisat::{ExtendFormula, Lit};

use crate::gate::{AigBitVector, AigNode, AigOperand, AigRef};
use crate::topo::extract_cone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivResult {
    Proved,
    /// Leaf values (indexed by leaf id) under which the two sides differ.
    Disproved(BitVec),
}

#[derive(Debug)]
pub enum EquivError {
    Solver(varisat::solver::SolverError),
    WidthMismatch { lhs: usize, rhs: usize },
}

impl std::fmt::Display for EquivError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EquivError::Solver(e) => write!(f, "SAT solver error: {:?}", e),
            EquivError::WidthMismatch { lhs, rhs } => {
                write!(f, "cannot compare bits[{}] against bits[{}]", lhs, rhs)
            }
        }
    }
}

impl std::error::Error for EquivError {}

struct TseitinEncoding<'a> {
    solver: varisat::Solver<'a>,
    node_lits: HashMap<AigRef, Lit>,
}

impl TseitinEncoding<'_> {
    fn new(gates: &[AigNode], cone: &[AigRef], leaves: &HashSet<AigRef>) -> Self {
        let mut solver = varisat::Solver::new();
        let node_lits: HashMap<AigRef, Lit> = cone
            .iter()
            .chain(leaves)
            .map(|r| (*r, solver.new_lit()))
            .collect();
        let mut encoding = TseitinEncoding { solver, node_lits };
        for aig_ref in cone {
            let out = encoding.node_lits[aig_ref];
            match &gates[aig_ref.id] {
                AigNode::Literal(value) => {
                    encoding.solver.add_clause(&[if *value { out } else { !out }])
                }
                AigNode::And2 { a, b } => {
                    let (a, b) = (encoding.lit(a), encoding.lit(b));
                    // out <-> a & b
                    encoding.solver.add_clause(&[!a, !b, out]);
                    encoding.solver.add_clause(&[a, !out]);
                    encoding.solver.add_clause(&[b, !out]);
                }
                AigNode::Leaf { .. } => {}
            }
        }
        encoding
    }

    fn lit(&self, operand: &AigOperand) -> Lit {
        let lit = self.node_lits[&operand.node];
        if operand.negated { !lit } else { lit }
    }

    /// A fresh literal constrained to `a != b`.
    fn differs(&mut self, a: Lit, b: Lit) -> Lit {
        let d = self.solver.new_lit();
        self.solver.add_clause(&[!a, !b, !d]);
        self.solver.add_clause(&[a, b, !d]);
        self.solver.add_clause(&[a, !b, d]);
        self.solver.add_clause(&[!a, b, d]);
        d
    }
}

pub fn prove_equiv(
    gates: &[AigNode],
    lhs: &AigBitVector,
    rhs: &AigBitVector,
) -> Result<EquivResult, EquivError> {
    if lhs.get_bit_count() != rhs.get_bit_count() {
        return Err(EquivError::WidthMismatch {
            lhs: lhs.get_bit_count(),
            rhs: rhs.get_bit_count(),
        });
    }
    let roots: Vec<AigRef> = lhs
        .iter_lsb_to_msb()
        .chain(rhs.iter_lsb_to_msb())
        .map(|op| op.node)
        .collect();
    let (cone, leaves) = extract_cone(&roots, gates);
    log::debug!(
        "prove_equiv: {} bits, {} gates, {} leaves in the cone",
        lhs.get_bit_count(),
        cone.len(),
        leaves.len()
    );
    let mut encoding = TseitinEncoding::new(gates, &cone, &leaves);

    let miter: Vec<Lit> = lhs
        .iter_lsb_to_msb()
        .zip(rhs.iter_lsb_to_msb())
        .map(|(a, b)| {
            let (a, b) = (encoding.lit(a), encoding.lit(b));
            encoding.differs(a, b)
        })
        .collect();
    encoding.solver.add_clause(&miter);

    if !encoding.solver.solve().map_err(EquivError::Solver)? {
        return Ok(EquivResult::Proved);
    }
    let model: HashSet<Lit> = encoding.solver.model().unwrap_or_default().into_iter().collect();
    let leaf_id = |r: &AigRef| match gates[r.id] {
        AigNode::Leaf { id } => Some(id),
        _ => None,
    };
    let num_leaf_ids = gates
        .iter()
        .filter_map(|node| match node {
            AigNode::Leaf { id } => Some(id + 1),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    let mut cex = BitVec::repeat(false, num_leaf_ids);
    for leaf in &leaves {
        if let Some(id) = leaf_id(leaf) {
            cex.set(id, model.contains(&encoding.node_lits[leaf]));
        }
    }
    Ok(EquivResult::Disproved(cex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_builder::{GateBuilder, GateBuilderOptions};
    use crate::gate_sim;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_de_morgan_proved() {
        let mut gb = GateBuilder::new(GateBuilderOptions::no_opt());
        let a = gb.add_leaf(0);
        let b = gb.add_leaf(1);
        let or = gb.add_or_binary(a, b);
        let xor_or_and = {
            let x = gb.add_xor_binary(a, b);
            let y = gb.add_and_binary(a, b);
            gb.add_or_binary(x, y)
        };
        assert_eq!(
            prove_equiv(&gb.gates, &or.into(), &xor_or_and.into()).unwrap(),
            EquivResult::Proved
        );
    }

    #[test]
    fn test_constant_sides() {
        let mut gb = GateBuilder::new(GateBuilderOptions::no_opt());
        let a = gb.add_leaf(0);
        let contradiction = gb.add_and_binary(a, a.negate());
        assert_eq!(
            prove_equiv(&gb.gates, &contradiction.into(), &AigBitVector::zeros(1)).unwrap(),
            EquivResult::Proved
        );
    }

    #[test]
    fn test_and_vs_or_disproved_with_cex() {
        let mut gb = GateBuilder::new(GateBuilderOptions::no_opt());
        let a = gb.add_leaf(0);
        let b = gb.add_leaf(1);
        let and = gb.add_and_binary(a, b);
        let or = gb.add_or_binary(a, b);
        let EquivResult::Disproved(cex) =
            prove_equiv(&gb.gates, &and.into(), &or.into()).unwrap()
        else {
            panic!("and/or should differ");
        };
        let got = gate_sim::eval(&gb.gates, &cex, &[and, or]);
        assert_ne!(got[0], got[1]);
    }

    #[test]
    fn test_width_mismatch() {
        let gb = GateBuilder::new(GateBuilderOptions::no_opt());
        let err = prove_equiv(&gb.gates, &AigBitVector::zeros(1), &AigBitVector::zeros(2))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot compare bits[1] against bits[2]");
    }
}
