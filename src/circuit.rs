// SPDX-License-Identifier: Apache-2.0

//! Bridge between core literals and the and-inverter graph used to blast one
//! term.
//!
//! Core literals enter the graph as leaves (constants map to the graph's
//! constant node), the operator circuit is built with a [`GateBuilder`], and
//! the outputs are lowered back through [`SmtCore::mk_and`]. A leaf lowers
//! to exactly the literal it came from, so operators that only rewire their
//! arguments hand the argument literals straight through.

use std::collections::HashMap;

use ahash::AHashMap;
use bvtheory_blast::topo::postorder_for_aig_refs_node_only;
use bvtheory_blast::{AigBitVector, AigNode, AigOperand, AigRef, GateBuilder};

use crate::config::BvConfig;
use crate::core::SmtCore;
use crate::literal::{BoolVar, Literal};

pub struct Circuit {
    gb: GateBuilder,
    /// Leaf id to the positive literal of its core variable.
    leaves: Vec<Literal>,
    leaf_of: AHashMap<BoolVar, AigOperand>,
    lowered: HashMap<AigRef, Literal>,
}

impl Circuit {
    pub fn new(config: &BvConfig) -> Self {
        Circuit {
            gb: GateBuilder::new(config.gate_builder_options()),
            leaves: Vec::new(),
            leaf_of: AHashMap::new(),
            lowered: HashMap::new(),
        }
    }

    pub fn builder(&mut self) -> &mut GateBuilder {
        &mut self.gb
    }

    pub fn gate_count(&self) -> usize {
        self.gb.gates.len()
    }

    pub fn input_literal(&mut self, lit: Literal) -> AigOperand {
        if lit == Literal::TRUE {
            return self.gb.get_true();
        }
        if lit == Literal::FALSE {
            return self.gb.get_false();
        }
        let leaf = match self.leaf_of.get(&lit.var) {
            Some(leaf) => *leaf,
            None => {
                let leaf = self.gb.add_leaf(self.leaves.len());
                self.leaves.push(Literal::positive(lit.var));
                self.leaf_of.insert(lit.var, leaf);
                leaf
            }
        };
        if lit.negated { leaf.negate() } else { leaf }
    }

    pub fn input(&mut self, lits: &[Literal]) -> AigBitVector {
        let ops: Vec<AigOperand> = lits.iter().map(|l| self.input_literal(*l)).collect();
        AigBitVector::from_lsb_is_index_0(&ops)
    }

    /// Core literals for `outputs`, creating one core gate per reachable
    /// and-node that has not been lowered yet.
    pub fn lower<C: SmtCore>(&mut self, core: &mut C, outputs: &AigBitVector) -> Vec<Literal> {
        let refs: Vec<AigRef> = outputs.iter_lsb_to_msb().map(|op| op.node).collect();
        let order = postorder_for_aig_refs_node_only(&refs, &self.gb.gates, &self.lowered);
        for aig_ref in order {
            let lit = match &self.gb.gates[aig_ref.id] {
                AigNode::Literal(value) => Literal::from_bool(*value),
                AigNode::Leaf { id } => self.leaves[*id],
                AigNode::And2 { a, b } => {
                    let (a, b) = (self.operand_literal(a), self.operand_literal(b));
                    core.mk_and(a, b)
                }
            };
            self.lowered.insert(aig_ref, lit);
        }
        outputs
            .iter_lsb_to_msb()
            .map(|op| self.operand_literal(op))
            .collect()
    }

    fn operand_literal(&self, op: &AigOperand) -> Literal {
        let lit = self.lowered[&op.node];
        if op.negated { !lit } else { lit }
    }
}
