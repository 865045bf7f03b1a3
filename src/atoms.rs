// SPDX-License-Identifier: Apache-2.0

//! Maps core boolean variables to the theory's view of them.

use ahash::AHashMap;

use crate::literal::{BoolVar, Literal};
use crate::var_store::TheoryVar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarPos {
    pub var: TheoryVar,
    pub idx: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// Every `(variable, bit index)` that currently uses this boolean
    /// variable as its bit, in insertion order.
    Bit { occs: Vec<VarPos> },
    /// A comparison or overflow predicate bridged to its blasted definition.
    /// `axioms` is set once the two clauses linking `var` and `def` exist.
    Order {
        var: Literal,
        def: Literal,
        axioms: bool,
    },
}

#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: AHashMap<BoolVar, Atom>,
}

impl AtomTable {
    pub fn get(&self, var: BoolVar) -> Option<&Atom> {
        self.atoms.get(&var)
    }

    pub fn contains(&self, var: BoolVar) -> bool {
        self.atoms.contains_key(&var)
    }

    pub fn insert(&mut self, var: BoolVar, atom: Atom) {
        let prev = self.atoms.insert(var, atom);
        debug_assert!(prev.is_none(), "{} already has an atom", var);
    }

    pub fn remove(&mut self, var: BoolVar) {
        self.atoms.remove(&var);
    }

    pub fn occurrences(&self, var: BoolVar) -> &[VarPos] {
        match self.atoms.get(&var) {
            Some(Atom::Bit { occs }) => occs,
            _ => &[],
        }
    }

    /// Appends an occurrence to a bit atom and returns the previous length.
    pub fn push_occurrence(&mut self, var: BoolVar, pos: VarPos) -> usize {
        match self.atoms.get_mut(&var) {
            Some(Atom::Bit { occs }) => {
                occs.push(pos);
                occs.len() - 1
            }
            other => panic!("{} is not a bit atom: {:?}", var, other),
        }
    }

    /// Records that an order atom's definition clauses were asserted.
    /// Returns false when they already were.
    pub fn mark_order_axioms(&mut self, var: BoolVar) -> bool {
        match self.atoms.get_mut(&var) {
            Some(Atom::Order { axioms, .. }) if !*axioms => {
                *axioms = true;
                true
            }
            _ => false,
        }
    }

    pub fn clear_order_axioms(&mut self, var: BoolVar) {
        if let Some(Atom::Order { axioms, .. }) = self.atoms.get_mut(&var) {
            *axioms = false;
        }
    }

    pub fn truncate_occurrences(&mut self, var: BoolVar, len: usize) {
        if let Some(Atom::Bit { occs }) = self.atoms.get_mut(&var) {
            occs.truncate(len);
        }
    }

    /// Bit atoms ordered by variable, for stable display.
    pub fn bit_atoms(&self) -> Vec<(BoolVar, &[VarPos])> {
        let mut result: Vec<(BoolVar, &[VarPos])> = self
            .atoms
            .iter()
            .filter_map(|(var, atom)| match atom {
                Atom::Bit { occs } => Some((*var, occs.as_slice())),
                Atom::Order { .. } => None,
            })
            .collect();
        result.sort_by_key(|(var, _)| *var);
        result
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn clear(&mut self) {
        self.atoms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pos(var: u32, idx: usize) -> VarPos {
        VarPos {
            var: TheoryVar(var),
            idx,
        }
    }

    #[test]
    fn test_occurrences_grow_and_truncate() {
        let mut table = AtomTable::default();
        let b = BoolVar(5);
        table.insert(b, Atom::Bit { occs: vec![pos(0, 1)] });
        assert_eq!(table.push_occurrence(b, pos(2, 1)), 1);
        assert_eq!(table.occurrences(b), &[pos(0, 1), pos(2, 1)]);
        table.truncate_occurrences(b, 1);
        assert_eq!(table.occurrences(b), &[pos(0, 1)]);
    }

    #[test]
    fn test_order_atoms_have_no_occurrences() {
        let mut table = AtomTable::default();
        let b = BoolVar(9);
        table.insert(
            b,
            Atom::Order {
                var: Literal::positive(b),
                def: Literal::negative(BoolVar(4)),
                axioms: false,
            },
        );
        assert!(table.occurrences(b).is_empty());
        assert!(table.mark_order_axioms(b));
        assert!(!table.mark_order_axioms(b));
        table.clear_order_axioms(b);
        assert!(table.mark_order_axioms(b));
        assert!(table.bit_atoms().is_empty());
        table.remove(b);
        assert!(table.is_empty());
    }

    #[test]
    fn test_bit_atoms_sorted() {
        let mut table = AtomTable::default();
        table.insert(BoolVar(7), Atom::Bit { occs: vec![pos(1, 0)] });
        table.insert(BoolVar(3), Atom::Bit { occs: vec![pos(0, 0)] });
        let vars: Vec<BoolVar> = table.bit_atoms().iter().map(|(v, _)| *v).collect();
        assert_eq!(vars, vec![BoolVar(3), BoolVar(7)]);
    }
}
