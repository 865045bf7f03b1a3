// SPDX-License-Identifier: Apache-2.0

//! A deliberately small SAT core implementing [`SmtCore`].
//!
//! Clauses are permanent and propagated by rescanning the whole clause list,
//! which is plenty for formulas of a few hundred gates. Equality atoms are
//! plain boolean variables keyed by the (ordered) term pair; there is no
//! congruence closure.

use ahash::{AHashMap, AHashSet};
use bvtheory::{
    BoolVar, BvJustification, JustificationId, LBool, Literal, Op, SmtCore, TermId, TermManager,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Decision,
    Clause(usize),
    Theory(JustificationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Clause(usize),
    Theory(JustificationId),
    /// A literal that was already false got assigned.
    Assign(Literal, Reason),
}

pub struct MiniCore {
    terms: TermManager,
    values: Vec<LBool>,
    reasons: Vec<Option<Reason>>,
    trail: Vec<Literal>,
    scopes: Vec<usize>,
    clauses: Vec<Vec<Literal>>,
    justifications: Vec<BvJustification>,
    and_gates: AHashMap<(Literal, Literal), Literal>,
    eq_atoms: AHashMap<(TermId, TermId), Literal>,
    eq_of_var: AHashMap<BoolVar, (TermId, TermId)>,
    term_lits: AHashMap<TermId, Literal>,
    conflict: Option<Conflict>,
    relevancy: bool,
    relevant: AHashSet<BoolVar>,
    num_axioms: usize,
}

impl MiniCore {
    pub fn new(terms: TermManager, relevancy: bool) -> Self {
        let mut core = MiniCore {
            terms,
            values: Vec::new(),
            reasons: Vec::new(),
            trail: Vec::new(),
            scopes: Vec::new(),
            clauses: Vec::new(),
            justifications: Vec::new(),
            and_gates: AHashMap::new(),
            eq_atoms: AHashMap::new(),
            eq_of_var: AHashMap::new(),
            term_lits: AHashMap::new(),
            conflict: None,
            relevancy,
            relevant: AHashSet::new(),
            num_axioms: 0,
        };
        let t = core.mk_bool_var();
        debug_assert_eq!(t, BoolVar::TRUE_VAR);
        core.values[0] = LBool::True;
        core.reasons[0] = Some(Reason::Decision);
        core
    }

    pub fn terms_mut(&mut self) -> &mut TermManager {
        &mut self.terms
    }

    pub fn num_vars(&self) -> usize {
        self.values.len()
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn num_axioms(&self) -> usize {
        self.num_axioms
    }

    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    pub fn reason(&self, var: BoolVar) -> Option<Reason> {
        self.reasons[var.index()]
    }

    pub fn value(&self, var: BoolVar) -> LBool {
        self.values[var.index()]
    }

    pub fn conflict(&self) -> Option<Conflict> {
        self.conflict
    }

    pub fn explain(&self, js: JustificationId) -> &BvJustification {
        &self.justifications[js.0 as usize]
    }

    pub fn eq_atom(&self, var: BoolVar) -> Option<(TermId, TermId)> {
        self.eq_of_var.get(&var).copied()
    }

    /// The equality literal for `lhs == rhs` when one was already created.
    pub fn find_eq(&self, lhs: TermId, rhs: TermId) -> Option<Literal> {
        if lhs == rhs {
            return Some(Literal::TRUE);
        }
        self.eq_atoms.get(&ordered(lhs, rhs)).copied()
    }

    pub fn is_relevant(&self, var: BoolVar) -> bool {
        self.relevant.contains(&var)
    }

    pub fn term_literal(&self, term: TermId) -> Option<Literal> {
        self.term_lits.get(&term).copied()
    }

    /// Records the literal another component chose for a boolean term.
    pub fn register_literal(&mut self, term: TermId, lit: Literal) {
        self.term_lits.insert(term, lit);
    }

    pub fn unassigned_var(&self) -> Option<BoolVar> {
        self.values
            .iter()
            .position(|v| v.is_undef())
            .map(|i| BoolVar(i as u32))
    }

    pub fn decide(&mut self, lit: Literal) {
        debug_assert!(self.get_assignment(lit).is_undef());
        self.set(lit, Reason::Decision);
    }

    pub fn add_clause(&mut self, lits: &[Literal]) {
        if lits.contains(&Literal::TRUE) {
            return;
        }
        let mut clause: Vec<Literal> = Vec::with_capacity(lits.len());
        for lit in lits {
            if *lit == Literal::FALSE || clause.contains(lit) {
                continue;
            }
            if clause.contains(&!*lit) {
                return;
            }
            clause.push(*lit);
        }
        let idx = self.clauses.len();
        log::trace!("clause c{}: {:?}", idx, clause);
        self.clauses.push(clause);
        self.check_clause(idx);
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(self.trail.len());
    }

    pub fn num_scopes(&self) -> usize {
        self.scopes.len()
    }

    pub fn pop_scope(&mut self, num_scopes: usize) {
        if num_scopes == 0 {
            return;
        }
        let mark = self.scopes[self.scopes.len() - num_scopes];
        self.scopes.truncate(self.scopes.len() - num_scopes);
        for lit in self.trail.drain(mark..) {
            self.values[lit.var.index()] = LBool::Undef;
            self.reasons[lit.var.index()] = None;
        }
        self.conflict = None;
    }

    /// Unit propagation to a fixpoint. Returns false on conflict.
    pub fn propagate(&mut self) -> bool {
        loop {
            if self.conflict.is_some() {
                return false;
            }
            let before = self.trail.len();
            for idx in 0..self.clauses.len() {
                self.check_clause(idx);
                if self.conflict.is_some() {
                    return false;
                }
            }
            if self.trail.len() == before {
                return true;
            }
        }
    }

    fn check_clause(&mut self, idx: usize) {
        let mut unassigned = None;
        let mut num_unassigned = 0;
        for lit in &self.clauses[idx] {
            match self.get_assignment(*lit) {
                LBool::True => return,
                LBool::Undef => {
                    num_unassigned += 1;
                    unassigned = Some(*lit);
                }
                LBool::False => {}
            }
        }
        match (num_unassigned, unassigned) {
            (0, _) => {
                if self.conflict.is_none() {
                    self.conflict = Some(Conflict::Clause(idx));
                }
            }
            (1, Some(lit)) => self.set(lit, Reason::Clause(idx)),
            _ => {}
        }
    }

    fn set(&mut self, lit: Literal, reason: Reason) {
        match self.get_assignment(lit) {
            LBool::True => {}
            LBool::False => {
                if self.conflict.is_none() {
                    self.conflict = Some(Conflict::Assign(lit, reason));
                }
            }
            LBool::Undef => {
                self.values[lit.var.index()] = LBool::from_bool(!lit.negated);
                self.reasons[lit.var.index()] = Some(reason);
                self.trail.push(lit);
            }
        }
    }

    fn fresh_literal(&mut self, term: TermId) -> Literal {
        let lit = Literal::positive(self.mk_bool_var());
        log::trace!("{} := {}", self.terms.display(term), lit);
        lit
    }
}

fn ordered(lhs: TermId, rhs: TermId) -> (TermId, TermId) {
    if lhs <= rhs { (lhs, rhs) } else { (rhs, lhs) }
}

impl SmtCore for MiniCore {
    fn terms(&self) -> &TermManager {
        &self.terms
    }

    fn mk_bool_var(&mut self) -> BoolVar {
        let var = BoolVar(self.values.len() as u32);
        self.values.push(LBool::Undef);
        self.reasons.push(None);
        var
    }

    fn mk_and(&mut self, a: Literal, b: Literal) -> Literal {
        if a == Literal::FALSE || b == Literal::FALSE || a == !b {
            return Literal::FALSE;
        }
        if a == Literal::TRUE || a == b {
            return b;
        }
        if b == Literal::TRUE {
            return a;
        }
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(lit) = self.and_gates.get(&key) {
            return *lit;
        }
        let r = Literal::positive(self.mk_bool_var());
        self.and_gates.insert(key, r);
        self.add_clause(&[!r, a]);
        self.add_clause(&[!r, b]);
        self.add_clause(&[r, !a, !b]);
        r
    }

    fn mk_gate_clause(&mut self, lits: &[Literal]) {
        self.add_clause(lits);
    }

    fn internalize_bool(&mut self, term: TermId) -> Literal {
        if let Some(lit) = self.term_lits.get(&term) {
            return *lit;
        }
        let t = self.terms.get(term).clone();
        let lit = match t.op {
            Op::True => Literal::TRUE,
            Op::False => Literal::FALSE,
            Op::Not => !self.internalize_bool(t.args[0]),
            Op::And => {
                let mut acc = Literal::TRUE;
                for arg in &t.args {
                    let l = self.internalize_bool(*arg);
                    acc = self.mk_and(acc, l);
                }
                acc
            }
            Op::Or => {
                let mut acc = Literal::TRUE;
                for arg in &t.args {
                    let l = self.internalize_bool(*arg);
                    acc = self.mk_and(acc, !l);
                }
                !acc
            }
            Op::Eq => self.mk_eq(t.args[0], t.args[1]),
            _ => self.fresh_literal(term),
        };
        self.term_lits.insert(term, lit);
        lit
    }

    fn mk_eq(&mut self, lhs: TermId, rhs: TermId) -> Literal {
        if lhs == rhs {
            return Literal::TRUE;
        }
        let key = ordered(lhs, rhs);
        if let Some(lit) = self.eq_atoms.get(&key) {
            return *lit;
        }
        let lit = Literal::positive(self.mk_bool_var());
        self.eq_atoms.insert(key, lit);
        self.eq_of_var.insert(lit.var, key);
        log::trace!("eq atom {} for {} = {}", lit, key.0, key.1);
        lit
    }

    fn get_assignment(&self, lit: Literal) -> LBool {
        self.values[lit.var.index()].with_polarity(lit.negated)
    }

    fn mk_justification(&mut self, js: BvJustification) -> JustificationId {
        let id = JustificationId(self.justifications.len() as u32);
        self.justifications.push(js);
        id
    }

    fn assign(&mut self, lit: Literal, js: JustificationId) {
        self.set(lit, Reason::Theory(js));
    }

    fn set_conflict(&mut self, js: JustificationId) {
        if self.conflict.is_none() {
            self.conflict = Some(Conflict::Theory(js));
        }
    }

    fn assign_eq(&mut self, lhs: TermId, rhs: TermId, js: JustificationId) {
        let lit = self.mk_eq(lhs, rhs);
        self.assign(lit, js);
    }

    fn mk_th_axiom(&mut self, lits: &[Literal]) {
        self.num_axioms += 1;
        self.add_clause(lits);
    }

    fn inconsistent(&self) -> bool {
        self.conflict.is_some()
    }

    fn relevancy(&self) -> bool {
        self.relevancy
    }

    fn mark_as_relevant(&mut self, lit: Literal) {
        self.relevant.insert(lit.var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn core() -> MiniCore {
        MiniCore::new(TermManager::new(), false)
    }

    #[test]
    fn test_and_gate_folding_and_hash_consing() {
        let mut core = core();
        let a = Literal::positive(core.mk_bool_var());
        let b = Literal::positive(core.mk_bool_var());
        assert_eq!(core.mk_and(a, Literal::TRUE), a);
        assert_eq!(core.mk_and(a, !a), Literal::FALSE);
        assert_eq!(core.mk_and(Literal::FALSE, b), Literal::FALSE);
        let ab = core.mk_and(a, b);
        assert_eq!(core.mk_and(b, a), ab);
        assert_eq!(core.num_clauses(), 3);
    }

    #[test]
    fn test_unit_propagation_through_gate() {
        let mut core = core();
        let a = Literal::positive(core.mk_bool_var());
        let b = Literal::positive(core.mk_bool_var());
        let ab = core.mk_and(a, b);
        core.add_clause(&[ab]);
        assert!(core.propagate());
        assert_eq!(core.get_assignment(a), LBool::True);
        assert_eq!(core.get_assignment(b), LBool::True);
    }

    #[test]
    fn test_assigning_false_literal_conflicts_and_pop_clears() {
        let mut core = core();
        let a = Literal::positive(core.mk_bool_var());
        core.push_scope();
        core.decide(a);
        let js = core.mk_justification(BvJustification::FixedEq {
            lhs: TermId(0),
            rhs: TermId(1),
            bits: vec![],
        });
        core.assign(!a, js);
        assert!(core.inconsistent());
        core.pop_scope(1);
        assert!(!core.inconsistent());
        assert_eq!(core.get_assignment(a), LBool::Undef);
    }

    #[test]
    fn test_empty_axiom_is_a_conflict() {
        let mut core = core();
        core.mk_th_axiom(&[Literal::FALSE]);
        assert!(core.inconsistent());
    }

    #[test]
    fn test_eq_atoms_are_symmetric() {
        let mut core = core();
        let e = core.mk_eq(TermId(3), TermId(5));
        assert_eq!(core.mk_eq(TermId(5), TermId(3)), e);
        assert_eq!(core.mk_eq(TermId(4), TermId(4)), Literal::TRUE);
        assert_eq!(core.eq_atom(e.var), Some((TermId(3), TermId(5))));
    }
}
