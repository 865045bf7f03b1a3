// SPDX-License-Identifier: Apache-2.0

//! The bit-vector theory plugin.
//!
//! Every bit-vector term gets a theory variable whose bits are core
//! literals produced by blasting the term's operator over its arguments'
//! bits. Equalities reported by the core merge variables into classes, and
//! the plugin keeps the bits of every class member in agreement by
//! propagating each assignment across the class with a [`BitEq`]
//! justification. Disequalities are expanded into a clause requiring some
//! bit to differ. Variables that become fully assigned are matched against
//! others with the same value, and the core is told about the equality.
//!
//! All mutations that must be reversed on backtracking are recorded on a
//! [`Trail`] and replayed by [`TheoryBv::pop_scope_eh`].
//!
//! [`BitEq`]: BvJustification::BitEq

use std::fmt;

use ahash::AHashMap;
use bitvec::vec::BitVec;

use crate::atoms::{Atom, AtomTable, VarPos};
use crate::cancel::CancelToken;
use crate::circuit::Circuit;
use crate::config::BvConfig;
use crate::core::{FinalCheck, SmtCore};
use crate::fixed_values::FixedValueTable;
use crate::justification::BvJustification;
use crate::literal::{BoolVar, LBool, Literal};
use crate::operators;
use crate::stats::BvStats;
use crate::term::{Op, Term, TermId};
use crate::trail::{Trail, UndoAction};
use crate::union_find::UnionFind;
use crate::value::BvValue;
use crate::var_store::{TheoryVar, VarStore};
use crate::zero_one::{ZeroOneBit, ZeroOneBits};

pub struct TheoryBv {
    config: BvConfig,
    cancel: CancelToken,
    vars: VarStore,
    find: UnionFind,
    zero_one: ZeroOneBits,
    atoms: AtomTable,
    fixed: FixedValueTable,
    trail: Trail,
    term2var: AHashMap<TermId, TheoryVar>,
    /// Literal handed out for each internalized boolean-valued term.
    atom_terms: AHashMap<TermId, Literal>,
    prop_queue: Vec<VarPos>,
    /// Some term exceeded the blasting limit in the current branch.
    approximated: bool,
    stats: BvStats,
}

impl TheoryBv {
    pub fn new(config: BvConfig) -> Self {
        Self::with_cancel_token(config, CancelToken::new())
    }

    pub fn with_cancel_token(config: BvConfig, cancel: CancelToken) -> Self {
        log::debug!("bv theory config: {:?}", config);
        TheoryBv {
            config,
            cancel,
            vars: VarStore::default(),
            find: UnionFind::default(),
            zero_one: ZeroOneBits::default(),
            atoms: AtomTable::default(),
            fixed: FixedValueTable::default(),
            trail: Trail::default(),
            term2var: AHashMap::new(),
            atom_terms: AHashMap::new(),
            prop_queue: Vec::new(),
            approximated: false,
            stats: BvStats::default(),
        }
    }

    pub fn config(&self) -> &BvConfig {
        &self.config
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn stats(&self) -> &BvStats {
        &self.stats
    }

    pub fn approximated(&self) -> bool {
        self.approximated
    }

    pub fn num_vars(&self) -> usize {
        self.vars.num_vars()
    }

    pub fn num_scopes(&self) -> usize {
        self.trail.num_scopes()
    }

    pub fn term_var(&self, term: TermId) -> Option<TheoryVar> {
        self.term2var.get(&term).copied()
    }

    pub fn var_term(&self, v: TheoryVar) -> TermId {
        self.vars.term(v)
    }

    pub fn bits(&self, v: TheoryVar) -> &[Literal] {
        self.vars.bits(v)
    }

    pub fn find(&self, v: TheoryVar) -> TheoryVar {
        self.find.find(v)
    }

    pub fn class_members(&self, v: TheoryVar) -> Vec<TheoryVar> {
        self.find.class_members(v)
    }

    pub fn zero_one_bits(&self, v: TheoryVar) -> &[ZeroOneBit] {
        self.zero_one.get(v)
    }

    pub fn atom(&self, var: BoolVar) -> Option<&Atom> {
        self.atoms.get(var)
    }

    /// Whether the core must report assignments of `var` to [`Self::assign_eh`].
    pub fn is_attached(&self, var: BoolVar) -> bool {
        matches!(self.atoms.get(var), Some(Atom::Bit { .. }))
    }

    pub fn occurrences(&self, var: BoolVar) -> &[VarPos] {
        self.atoms.occurrences(var)
    }

    // -- Internalization

    /// Gives `term` a theory variable by blasting its operator. Returns
    /// false when the term is declined: its operator has no circuit, it is
    /// wider than the blasting limit, or the plugin was cancelled.
    pub fn internalize_term<C: SmtCore>(&mut self, core: &mut C, term: TermId) -> bool {
        if self.term2var.contains_key(&term) {
            return true;
        }
        if self.cancel.is_cancelled() {
            log::debug!("bv theory cancelled; declining {}", term);
            return false;
        }
        if self.approximate_term(core, term) {
            return false;
        }
        let t = core.terms().get(term).clone();
        let Some(width) = t.width() else {
            log::debug!("{} is not a bit-vector term", term);
            return false;
        };
        match &t.op {
            Op::Num(value) => {
                self.internalize_num(core, term, value);
                true
            }
            Op::Const { .. } => {
                self.mk_uninterpreted(core, term, width);
                true
            }
            _ => match self.blast_app(core, &t) {
                Some(lits) => {
                    debug_assert_eq!(lits.len(), width);
                    let v = self.mk_var(term, width);
                    for lit in lits {
                        self.add_bit(core, v, lit);
                    }
                    self.find_wpos(core, v);
                    true
                }
                None => {
                    log::debug!("declined {} ({})", term, t.op.name());
                    false
                }
            },
        }
    }

    /// The theory variable of a bit-vector term, internalizing it first.
    /// A declined term within the blasting limit is treated as
    /// uninterpreted and gets fresh bits. `None` when the term is over the
    /// limit or the plugin was cancelled.
    pub fn get_var<C: SmtCore>(&mut self, core: &mut C, term: TermId) -> Option<TheoryVar> {
        if self.internalize_term(core, term) {
            return self.term_var(term);
        }
        if self.cancel.is_cancelled() || self.exceeds_blast_limit(core, term) {
            return None;
        }
        let width = core.terms().width(term)?;
        Some(self.mk_uninterpreted(core, term, width))
    }

    /// Literal for a boolean-valued bit-vector term: a bit selection, a
    /// comparison or overflow predicate, or a three-input gate. `None` when
    /// the term is declined.
    pub fn internalize_atom<C: SmtCore>(&mut self, core: &mut C, term: TermId) -> Option<Literal> {
        if let Some(lit) = self.atom_terms.get(&term) {
            return Some(*lit);
        }
        if self.cancel.is_cancelled() {
            log::debug!("bv theory cancelled; declining atom {}", term);
            return None;
        }
        if self.approximate_term(core, term) {
            return None;
        }
        let t = core.terms().get(term).clone();
        let lit = match &t.op {
            Op::Bit2Bool(idx) => {
                let v = self.get_var(core, t.args[0])?;
                self.vars.bit(v, *idx)
            }
            Op::ULeq | Op::SLeq | Op::UMulNoOvfl | Op::SMulNoOvfl | Op::SMulNoUdfl => {
                self.internalize_order_atom(core, &t)?
            }
            Op::Xor3 | Op::Carry => self.internalize_gate_atom(core, &t),
            _ => {
                log::debug!("{} is not a bit-vector atom", term);
                return None;
            }
        };
        log::debug!("atom {} := {}", term, lit);
        self.atom_terms.insert(term, lit);
        self.trail.push(UndoAction::ForgetAtomTerm(term));
        Some(lit)
    }

    fn internalize_order_atom<C: SmtCore>(&mut self, core: &mut C, t: &Term) -> Option<Literal> {
        let def = self.blast_app(core, t)?[0];
        let var = Literal::positive(core.mk_bool_var());
        let eager = !core.relevancy() || !self.config.lazy_order_atoms;
        self.atoms.insert(
            var.var,
            Atom::Order {
                var,
                def,
                axioms: eager,
            },
        );
        self.trail.push(UndoAction::RemoveAtom(var.var));
        if eager {
            core.mk_th_axiom(&[var, !def]);
            core.mk_th_axiom(&[!var, def]);
        }
        Some(var)
    }

    fn internalize_gate_atom<C: SmtCore>(&mut self, core: &mut C, t: &Term) -> Literal {
        let l1 = self.bool_literal(core, t.args[0]);
        let l2 = self.bool_literal(core, t.args[1]);
        let l3 = self.bool_literal(core, t.args[2]);
        let r = Literal::positive(core.mk_bool_var());
        if t.op == Op::Xor3 {
            core.mk_gate_clause(&[!r, l1, l2, l3]);
            core.mk_gate_clause(&[!r, !l1, !l2, l3]);
            core.mk_gate_clause(&[!r, !l1, l2, !l3]);
            core.mk_gate_clause(&[!r, l1, !l2, !l3]);
            core.mk_gate_clause(&[r, !l1, l2, l3]);
            core.mk_gate_clause(&[r, l1, !l2, l3]);
            core.mk_gate_clause(&[r, l1, l2, !l3]);
            core.mk_gate_clause(&[r, !l1, !l2, !l3]);
        } else {
            core.mk_gate_clause(&[!r, l1, l2]);
            core.mk_gate_clause(&[!r, l1, l3]);
            core.mk_gate_clause(&[!r, l2, l3]);
            core.mk_gate_clause(&[r, !l1, !l2]);
            core.mk_gate_clause(&[r, !l1, !l3]);
            core.mk_gate_clause(&[r, !l2, !l3]);
        }
        r
    }

    /// Literal for a boolean argument. Bit-vector atoms are internalized
    /// here; everything else belongs to the core.
    fn bool_literal<C: SmtCore>(&mut self, core: &mut C, term: TermId) -> Literal {
        let t = core.terms().get(term);
        if t.op == Op::Not {
            let arg = t.args[0];
            return !self.bool_literal(core, arg);
        }
        if t.op.is_bv_predicate() {
            if let Some(lit) = self.internalize_atom(core, term) {
                return lit;
            }
        }
        core.internalize_bool(term)
    }

    /// Literal usable as a bit of some variable. An order atom's variable
    /// already carries its own atom, so it is bridged through a fresh
    /// equivalent variable.
    fn bit_literal<C: SmtCore>(&mut self, core: &mut C, term: TermId) -> Literal {
        let lit = self.bool_literal(core, term);
        if !matches!(self.atoms.get(lit.var), Some(Atom::Order { .. })) {
            return lit;
        }
        let bridge = Literal::positive(core.mk_bool_var());
        core.mk_gate_clause(&[!bridge, lit]);
        core.mk_gate_clause(&[bridge, !lit]);
        bridge
    }

    /// Blasts an application over its arguments' bits. `None` when the
    /// operator has no circuit or an argument could not be given bits.
    fn blast_app<C: SmtCore>(&mut self, core: &mut C, t: &Term) -> Option<Vec<Literal>> {
        let entry = operators::lookup(&t.op)?;
        let mut circuit = Circuit::new(&self.config);
        let mut inputs = Vec::with_capacity(t.args.len());
        for arg in &t.args {
            let bits = if t.op == Op::MkBv {
                vec![self.bit_literal(core, *arg)]
            } else {
                let v = self.get_var(core, *arg)?;
                self.vars.bits(v).to_vec()
            };
            inputs.push(circuit.input(&bits));
        }
        let outputs =
            operators::blast(&entry, circuit.builder(), self.config.adder_mapping, &inputs);
        log::trace!(
            "blasted {} into {} gates",
            t.op.name(),
            circuit.gate_count()
        );
        Some(circuit.lower(core, &outputs))
    }

    fn exceeds_blast_limit<C: SmtCore>(&self, core: &C, term: TermId) -> bool {
        let terms = core.terms();
        let t = terms.get(term);
        std::iter::once(term)
            .chain(t.args.iter().copied())
            .filter_map(|id| terms.width(id))
            .any(|width| !self.config.within_blast_limit(width))
    }

    /// Declines `term` and records the incompleteness when it is over the
    /// blasting limit.
    fn approximate_term<C: SmtCore>(&mut self, core: &C, term: TermId) -> bool {
        if !self.exceeds_blast_limit(core, term) {
            return false;
        }
        if !self.approximated {
            self.trail.push(UndoAction::ClearApproximated);
            self.approximated = true;
        }
        log::debug!(
            "{} exceeds the blasting limit {:?}; not blasted",
            term,
            self.config.blast_max_size
        );
        true
    }

    fn mk_var(&mut self, term: TermId, width: usize) -> TheoryVar {
        let v = self.vars.mk_var(term, width);
        let v_find = self.find.mk_var();
        debug_assert_eq!(v, v_find);
        self.zero_one.mk_var();
        self.term2var.insert(term, v);
        log::debug!("{} := {} ({} bits)", v, term, width);
        v
    }

    fn mk_uninterpreted<C: SmtCore>(&mut self, core: &mut C, term: TermId, width: usize) -> TheoryVar {
        let v = self.mk_var(term, width);
        for _ in 0..width {
            let b = Literal::positive(core.mk_bool_var());
            self.add_bit(core, v, b);
        }
        v
    }

    fn internalize_num<C: SmtCore>(&mut self, core: &mut C, term: TermId, value: &BvValue) {
        let v = self.mk_var(term, value.width());
        for idx in 0..value.width() {
            self.add_bit(core, v, Literal::from_bool(value.bit(idx)));
        }
        self.fixed_var_eh(core, v);
    }

    /// Appends `lit` as the next bit of `v` and records the occurrence.
    fn add_bit<C: SmtCore>(&mut self, core: &mut C, v: TheoryVar, lit: Literal) {
        let idx = self.vars.push_bit(v, lit);
        log::trace!("{}[{}] := {}", v, idx, lit);
        if lit.is_constant() {
            self.zero_one.register(v, idx, lit == Literal::TRUE);
            return;
        }
        let pos = VarPos { var: v, idx };
        if self.atoms.contains(lit.var) {
            self.find_new_diseq_axioms(core, v, idx);
            let len = self.atoms.push_occurrence(lit.var, pos);
            self.trail
                .push(UndoAction::TruncateOccurrences { atom: lit.var, len });
        } else {
            self.atoms.insert(lit.var, Atom::Bit { occs: vec![pos] });
            self.trail.push(UndoAction::RemoveAtom(lit.var));
        }
    }

    /// `v[idx]` was just added; any equally wide variable holding its
    /// complement at the same index can never equal `v`.
    fn find_new_diseq_axioms<C: SmtCore>(&mut self, core: &mut C, v: TheoryVar, idx: usize) {
        let complement = !self.vars.bit(v, idx);
        let occs = self.atoms.occurrences(complement.var).to_vec();
        for occ in occs {
            if occ.idx == idx
                && self.vars.bit(occ.var, idx) == complement
                && self.vars.size(occ.var) == self.vars.size(v)
            {
                self.mk_new_diseq_axiom(core, v, occ.var, idx);
            }
        }
    }

    fn mk_new_diseq_axiom<C: SmtCore>(&mut self, core: &mut C, v1: TheoryVar, v2: TheoryVar, idx: usize) {
        debug_assert_eq!(self.vars.bit(v1, idx), !self.vars.bit(v2, idx));
        self.stats.diseq_static += 1;
        let eq = core.mk_eq(self.vars.term(v1), self.vars.term(v2));
        log::debug!("{} != {}: complementary at bit {}", v1, v2, idx);
        core.mk_th_axiom(&[!eq]);
        if core.relevancy() {
            core.mark_as_relevant(!eq);
        }
    }

    // -- Fixed values

    /// Value of `v` when all of its bits are assigned.
    pub fn get_fixed_value<C: SmtCore>(&self, core: &C, v: TheoryVar) -> Option<BvValue> {
        let mut bits: BitVec = BitVec::with_capacity(self.vars.size(v));
        for lit in self.vars.bits(v) {
            match core.get_assignment(*lit) {
                LBool::True => bits.push(true),
                LBool::False => bits.push(false),
                LBool::Undef => return None,
            }
        }
        Some(BvValue::from_bits(bits))
    }

    /// Moves `v`'s watch to an unassigned bit, or reports `v` as fixed when
    /// there is none. The scan wraps around from the current watch.
    fn find_wpos<C: SmtCore>(&mut self, core: &mut C, v: TheoryVar) {
        let bits = self.vars.bits(v);
        let init = self.vars.wpos(v);
        let found = (init..bits.len())
            .chain(0..init)
            .find(|&pos| core.get_assignment(bits[pos]).is_undef());
        match found {
            Some(pos) => {
                log::trace!("{} watches bit {}", v, pos);
                self.vars.set_wpos(v, pos);
            }
            None => self.fixed_var_eh(core, v),
        }
    }

    fn fixed_var_eh<C: SmtCore>(&mut self, core: &mut C, v: TheoryVar) {
        let Some(value) = self.get_fixed_value(core, v) else {
            debug_assert!(false, "{} reported fixed with unassigned bits", v);
            return;
        };
        log::trace!("{} fixed to {}", v, value);
        let Some(v2) = self.fixed.find(&value) else {
            self.fixed.insert(value, v);
            return;
        };
        let valid = self.vars.contains(v2)
            && self.vars.size(v2) == value.width()
            && self.get_fixed_value(core, v2).as_ref() == Some(&value);
        if !valid {
            self.fixed.insert(value, v);
            return;
        }
        if self.find.find(v) == self.find.find(v2) {
            return;
        }
        let bits: Vec<Literal> = self
            .vars
            .bits(v)
            .iter()
            .chain(self.vars.bits(v2))
            .filter(|lit| !lit.is_constant())
            .map(|lit| match core.get_assignment(*lit) {
                LBool::False => !*lit,
                _ => *lit,
            })
            .collect();
        let (t1, t2) = (self.vars.term(v), self.vars.term(v2));
        log::debug!("{} and {} are both fixed to {}", t1, t2, value);
        self.stats.th2core_eq += 1;
        let js = core.mk_justification(BvJustification::FixedEq {
            lhs: t1,
            rhs: t2,
            bits,
        });
        core.assign_eq(t1, t2, js);
    }

    // -- Callbacks from the core

    /// A bit atom was assigned; copy the value across every class the
    /// variable is a bit of.
    pub fn assign_eh<C: SmtCore>(&mut self, core: &mut C, var: BoolVar, is_true: bool) {
        if !self.is_attached(var) {
            return;
        }
        log::trace!("assign_eh {} := {}", var, is_true);
        self.prop_queue.clear();
        self.prop_queue
            .extend_from_slice(self.atoms.occurrences(var));
        self.propagate_bits(core);
    }

    fn propagate_bits<C: SmtCore>(&mut self, core: &mut C) {
        let mut i = 0;
        while i < self.prop_queue.len() {
            let VarPos { var: v, idx } = self.prop_queue[i];
            i += 1;
            if self.vars.wpos(v) == idx {
                self.find_wpos(core, v);
            }
            let bit = self.vars.bit(v, idx);
            let val = core.get_assignment(bit);
            debug_assert!(!val.is_undef());
            let mut v2 = self.find.next(v);
            while v2 != v {
                let bit2 = self.vars.bit(v2, idx);
                debug_assert!(bit != !bit2);
                if core.get_assignment(bit2) != val {
                    let (antecedent, consequent) = if val == LBool::False {
                        (!bit, !bit2)
                    } else {
                        (bit, bit2)
                    };
                    self.assign_bit(core, consequent, v, v2, idx, antecedent, false);
                    if core.inconsistent() {
                        return;
                    }
                }
                v2 = self.find.next(v2);
            }
        }
        self.prop_queue.clear();
    }

    /// Assigns `consequent` (bit `idx` of `v2`) because `antecedent` (bit
    /// `idx` of `v1`) is true and the two variables are merged.
    #[allow(clippy::too_many_arguments)]
    fn assign_bit<C: SmtCore>(
        &mut self,
        core: &mut C,
        consequent: Literal,
        v1: TheoryVar,
        v2: TheoryVar,
        idx: usize,
        antecedent: Literal,
        propagate_eqc: bool,
    ) {
        self.stats.bit2core += 1;
        debug_assert_eq!(core.get_assignment(antecedent), LBool::True);
        log::trace!(
            "{}[{}] := {} from {}[{}] = {}",
            v2,
            idx,
            consequent,
            v1,
            idx,
            antecedent
        );
        let js = core.mk_justification(BvJustification::BitEq {
            lhs: self.vars.term(v1),
            rhs: self.vars.term(v2),
            consequent,
            antecedent,
        });
        if consequent == Literal::FALSE {
            self.stats.conflicts += 1;
            log::debug!("bit conflict between {} and {} at {}", v1, v2, idx);
            core.set_conflict(js);
            return;
        }
        core.assign(consequent, js);
        if self.vars.wpos(v2) == idx {
            self.find_wpos(core, v2);
        }
        let root2 = self.find.find(v2);
        for occ in self.atoms.occurrences(consequent.var) {
            if propagate_eqc || self.find.find(occ.var) != root2 || occ.idx != idx {
                self.prop_queue.push(*occ);
            }
        }
    }

    /// The core merged the classes of `v1` and `v2`.
    pub fn new_eq_eh<C: SmtCore>(&mut self, core: &mut C, v1: TheoryVar, v2: TheoryVar) {
        debug_assert_eq!(self.vars.size(v1), self.vars.size(v2));
        log::debug!("new_eq_eh {} = {}", v1, v2);
        let Some(plan) = self.find.plan_merge(v1, v2) else {
            return;
        };
        self.merge_eh(core, plan.root, plan.child, plan.v_root, plan.v_child);
        self.find.union(&plan);
        self.trail.push(UndoAction::Unmerge { child: plan.child });
    }

    fn merge_eh<C: SmtCore>(
        &mut self,
        core: &mut C,
        root: TheoryVar,
        child: TheoryVar,
        v1: TheoryVar,
        v2: TheoryVar,
    ) {
        log::trace!("merging {} into {} ({} = {})", child, root, v1, v2);
        if let Err(conflict) = self.zero_one.merge(root, child, self.vars.size(root)) {
            self.mk_new_diseq_axiom(core, conflict.v1, conflict.v2, conflict.idx);
            return;
        }
        self.prop_queue.clear();
        let width = self.vars.size(v1);
        // Assigning one bit can assign others through the core, so sweep
        // until a pass makes no assignment.
        loop {
            let mut changed = false;
            for idx in 0..width {
                let bit1 = self.vars.bit(v1, idx);
                let bit2 = self.vars.bit(v2, idx);
                debug_assert!(bit1 != !bit2);
                let val1 = core.get_assignment(bit1);
                let val2 = core.get_assignment(bit2);
                if val1 == val2 {
                    continue;
                }
                changed = true;
                if !val1.is_undef() {
                    let (antecedent, consequent) = if val1 == LBool::False {
                        (!bit1, !bit2)
                    } else {
                        (bit1, bit2)
                    };
                    self.assign_bit(core, consequent, v1, v2, idx, antecedent, true);
                } else {
                    let (antecedent, consequent) = if val2 == LBool::False {
                        (!bit2, !bit1)
                    } else {
                        (bit2, bit1)
                    };
                    self.assign_bit(core, consequent, v2, v1, idx, antecedent, true);
                }
                if core.inconsistent() {
                    return;
                }
            }
            if !changed {
                break;
            }
        }
        self.propagate_bits(core);
    }

    fn unmerge(&mut self, child: TheoryVar) {
        let root = self.find.unmerge(child);
        log::trace!("unmerged {} from {}", child, root);
        let find = &self.find;
        self.zero_one
            .unmerge(root, |owner| find.find(owner) == root);
    }

    /// The core asserted `v1 != v2`.
    pub fn new_diseq_eh<C: SmtCore>(&mut self, core: &mut C, v1: TheoryVar, v2: TheoryVar) {
        log::debug!("new_diseq_eh {} != {}", v1, v2);
        self.expand_diseq(core, v1, v2);
    }

    /// Asserts `v1 = v2 | v1[0] ^ v2[0] | ...` unless a pair of
    /// complementary bits already separates them.
    fn expand_diseq<C: SmtCore>(&mut self, core: &mut C, v1: TheoryVar, v2: TheoryVar) {
        debug_assert_eq!(self.vars.size(v1), self.vars.size(v2));
        let bits1 = self.vars.bits(v1).to_vec();
        let bits2 = self.vars.bits(v2).to_vec();
        if bits1.iter().zip(&bits2).any(|(b1, b2)| *b1 == !*b2) {
            return;
        }
        let mut circuit = Circuit::new(&self.config);
        let a = circuit.input(&bits1);
        let b = circuit.input(&bits2);
        let diff = circuit.builder().add_xor_vec(&a, &b);
        let mut lits = vec![core.mk_eq(self.vars.term(v1), self.vars.term(v2))];
        lits.extend(circuit.lower(core, &diff));
        self.stats.diseq_dynamic += 1;
        core.mk_th_axiom(&lits);
    }

    /// `term` became relevant. An order atom gets its definition marked
    /// (and, with lazy order atoms, its axioms asserted); a bit-vector term
    /// gets all of its bits marked.
    pub fn relevant_eh<C: SmtCore>(&mut self, core: &mut C, term: TermId) {
        if let Some(lit) = self.atom_terms.get(&term) {
            if let Some(Atom::Order { var, def, .. }) = self.atoms.get(lit.var) {
                let (var, def) = (*var, *def);
                core.mark_as_relevant(def);
                if self.atoms.mark_order_axioms(var.var) {
                    self.trail.push(UndoAction::ClearOrderAxioms(var.var));
                    core.mk_th_axiom(&[var, !def]);
                    core.mk_th_axiom(&[!var, def]);
                }
            }
            return;
        }
        if let Some(v) = self.term_var(term) {
            for bit in self.vars.bits(v).to_vec() {
                core.mark_as_relevant(bit);
            }
        }
    }

    // -- Scopes

    pub fn push_scope_eh(&mut self) {
        self.trail.push_scope(self.vars.num_vars());
        log::trace!("bv push to level {}", self.trail.num_scopes());
    }

    pub fn pop_scope_eh(&mut self, num_scopes: usize) {
        let (undo, num_vars) = self.trail.pop_scope(num_scopes);
        for action in undo {
            match action {
                UndoAction::RemoveAtom(var) => self.atoms.remove(var),
                UndoAction::TruncateOccurrences { atom, len } => {
                    self.atoms.truncate_occurrences(atom, len)
                }
                UndoAction::Unmerge { child } => self.unmerge(child),
                UndoAction::ClearApproximated => self.approximated = false,
                UndoAction::ForgetAtomTerm(term) => {
                    self.atom_terms.remove(&term);
                }
                UndoAction::ClearOrderAxioms(var) => self.atoms.clear_order_axioms(var),
            }
        }
        if let Some(num_vars) = num_vars {
            for v in self.vars.vars().skip(num_vars) {
                self.term2var.remove(&self.vars.term(v));
            }
            self.vars.shrink(num_vars);
            self.find.shrink(num_vars);
            self.zero_one.shrink(num_vars);
        }
        self.prop_queue.clear();
        log::trace!(
            "bv pop {} to level {}, {} vars",
            num_scopes,
            self.trail.num_scopes(),
            self.vars.num_vars()
        );
    }

    /// Drops all state except the statistics.
    pub fn reset_eh(&mut self) {
        self.pop_scope_eh(self.trail.num_scopes());
        self.vars.shrink(0);
        self.find.shrink(0);
        self.zero_one.shrink(0);
        self.term2var.clear();
        self.atom_terms.clear();
        self.atoms.clear();
        self.fixed.clear();
        self.trail = Trail::default();
        self.prop_queue.clear();
        self.approximated = false;
    }

    // -- Final check and model

    pub fn final_check_eh<C: SmtCore>(&mut self, core: &C) -> FinalCheck {
        debug_assert!(self.check_invariant(core));
        if self.approximated || self.cancel.is_cancelled() {
            log::debug!("bv final check gives up");
            FinalCheck::GiveUp
        } else {
            FinalCheck::Done
        }
    }

    pub fn mk_value<C: SmtCore>(&self, core: &C, v: TheoryVar) -> Option<BvValue> {
        self.get_fixed_value(core, v)
    }

    /// Values of every variable whose bits are all assigned.
    pub fn init_model<C: SmtCore>(&self, core: &C) -> Vec<(TermId, BvValue)> {
        self.vars
            .vars()
            .filter_map(|v| Some((self.vars.term(v), self.mk_value(core, v)?)))
            .collect()
    }

    /// Every class has members of one width whose assigned bits agree, and
    /// each root's zero-one summary matches the constants of its class.
    pub fn check_invariant<C: SmtCore>(&self, core: &C) -> bool {
        if core.inconsistent() {
            return true;
        }
        for root in self.vars.vars().filter(|v| self.find.is_root(*v)) {
            let members = self.find.class_members(root);
            let width = self.vars.size(root);
            for v in &members {
                if self.vars.size(*v) != width || self.vars.bits(*v).len() != width {
                    log::error!("{} has the wrong width in the class of {}", v, root);
                    return false;
                }
            }
            for idx in 0..width {
                let val = core.get_assignment(self.vars.bit(root, idx));
                for v in &members {
                    if core.get_assignment(self.vars.bit(*v, idx)) != val {
                        log::error!("{}[{}] disagrees with {}[{}]", v, idx, root, idx);
                        return false;
                    }
                }
            }
            if !self.check_zero_one(root, &members) {
                return false;
            }
        }
        true
    }

    fn check_zero_one(&self, root: TheoryVar, members: &[TheoryVar]) -> bool {
        let width = self.vars.size(root);
        let mut constants: Vec<Option<bool>> = vec![None; width];
        for v in members {
            for (idx, lit) in self.vars.bits(*v).iter().enumerate() {
                if !lit.is_constant() {
                    continue;
                }
                let value = *lit == Literal::TRUE;
                match constants[idx] {
                    // Complementary constants in one class; the core is
                    // about to see the conflict.
                    Some(prev) if prev != value => return true,
                    _ => constants[idx] = Some(value),
                }
            }
        }
        let mut summary: Vec<Option<bool>> = vec![None; width];
        for bit in self.zero_one.get(root) {
            if self.find.find(bit.owner) != root
                || self.vars.bit(bit.owner, bit.idx) != Literal::from_bool(bit.is_true)
                || summary[bit.idx].is_some()
            {
                log::error!("stale zero-one entry {:?} in {}", bit, root);
                return false;
            }
            summary[bit.idx] = Some(bit.is_true);
        }
        if summary != constants {
            log::error!("zero-one summary of {} is incomplete", root);
            return false;
        }
        true
    }
}

impl fmt::Display for TheoryBv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Theory bv:")?;
        for v in self.vars.vars() {
            let root_term = self.vars.term(self.find.find(v));
            write!(f, "{:<5} {:<5} -> {:<5}, bits:", v, self.vars.term(v), root_term)?;
            for lit in self.vars.bits(v) {
                write!(f, " {}", lit)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "atoms:")?;
        for (var, occs) in self.atoms.bit_atoms() {
            write!(f, "{} ->", var)?;
            for occ in occs {
                write!(f, " {}[{}]", self.vars.term(occ.var), occ.idx)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
