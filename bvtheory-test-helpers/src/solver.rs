// SPDX-License-Identifier: Apache-2.0

//! DPLL with chronological backtracking over [`MiniCore`], driving a
//! [`TheoryBv`] the way a DPLL(T) core would.
//!
//! Every decision opens a scope in both the core and the theory. On a
//! conflict the most recent decision that has not been flipped yet is
//! undone and its complement asserted in a fresh scope. There is no clause
//! learning, so this is only for small formulas.

use bvtheory::{
    BvConfig, CancelToken, FinalCheck, LBool, Literal, Sort, SmtCore, TermId, TermManager,
    TheoryBv, TheoryVar,
};

use crate::eval::{self, Model};
use crate::mini_core::MiniCore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverResult {
    Sat(Model),
    Unsat,
    /// The theory gave up or the search was cancelled.
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct Decision {
    lit: Literal,
    flipped: bool,
}

pub struct Solver {
    pub core: MiniCore,
    pub theory: TheoryBv,
    assertions: Vec<TermId>,
    decisions: Vec<Decision>,
    /// Core trail position up to which the theory has been notified.
    theory_head: usize,
    diseqs: Vec<(TheoryVar, TheoryVar)>,
    diseq_marks: Vec<usize>,
}

impl Solver {
    pub fn new(terms: TermManager, config: BvConfig) -> Self {
        Self::with_options(terms, config, false, CancelToken::new())
    }

    pub fn with_options(
        terms: TermManager,
        config: BvConfig,
        relevancy: bool,
        cancel: CancelToken,
    ) -> Self {
        Solver {
            core: MiniCore::new(terms, relevancy),
            theory: TheoryBv::with_cancel_token(config, cancel),
            assertions: Vec::new(),
            decisions: Vec::new(),
            theory_head: 0,
            diseqs: Vec::new(),
            diseq_marks: Vec::new(),
        }
    }

    pub fn terms(&self) -> &TermManager {
        self.core.terms()
    }

    pub fn terms_mut(&mut self) -> &mut TermManager {
        self.core.terms_mut()
    }

    /// Internalizes `term` and every subterm, children first. Returns the
    /// literal of a boolean term.
    pub fn internalize(&mut self, term: TermId) -> Option<Literal> {
        let mut order = Vec::new();
        let mut visited = ahash::AHashSet::new();
        let mut stack = vec![(term, false)];
        while let Some((t, expanded)) = stack.pop() {
            if expanded {
                order.push(t);
                continue;
            }
            if !visited.insert(t) {
                continue;
            }
            stack.push((t, true));
            for arg in self.core.terms().get(t).args.iter().rev() {
                stack.push((*arg, false));
            }
        }
        for t in &order {
            self.internalize_one(*t);
        }
        if self.core.relevancy() {
            for t in &order {
                self.theory.relevant_eh(&mut self.core, *t);
                if let Some(lit) = self.core.term_literal(*t) {
                    self.core.mark_as_relevant(lit);
                }
            }
        }
        self.core.term_literal(term)
    }

    fn internalize_one(&mut self, term: TermId) {
        let t = self.core.terms().get(term);
        let (sort, is_atom) = (t.sort, t.op.is_bv_predicate());
        match sort {
            Sort::BitVec(_) => {
                self.theory.get_var(&mut self.core, term);
            }
            Sort::Bool if is_atom => {
                let lit = match self.theory.internalize_atom(&mut self.core, term) {
                    Some(lit) => lit,
                    None => self.core.internalize_bool(term),
                };
                self.core.register_literal(term, lit);
            }
            Sort::Bool => {
                self.core.internalize_bool(term);
            }
        }
    }

    pub fn assert(&mut self, term: TermId) {
        debug_assert!(self.decisions.is_empty());
        let lit = self
            .internalize(term)
            .expect("assertions are boolean terms");
        log::debug!("assert {} as {}", self.core.terms().display(term), lit);
        self.assertions.push(term);
        self.core.add_clause(&[lit]);
    }

    pub fn check(&mut self) -> SolverResult {
        loop {
            if !self.propagate() {
                if !self.backtrack() {
                    log::debug!("unsat after {} decisions", self.decisions.len());
                    return SolverResult::Unsat;
                }
                continue;
            }
            if self.theory.cancel_token().is_cancelled() {
                return SolverResult::Unknown;
            }
            match self.core.unassigned_var() {
                Some(var) => {
                    let lit = Literal::negative(var);
                    self.push_scope();
                    self.decisions.push(Decision {
                        lit,
                        flipped: false,
                    });
                    log::trace!("decide {} at level {}", lit, self.decisions.len());
                    self.core.decide(lit);
                }
                None => {
                    return match self.theory.final_check_eh(&self.core) {
                        FinalCheck::GiveUp => SolverResult::Unknown,
                        FinalCheck::Done => SolverResult::Sat(self.model()),
                    };
                }
            }
        }
    }

    /// Core propagation interleaved with theory notifications. Returns
    /// false on conflict.
    fn propagate(&mut self) -> bool {
        loop {
            if !self.core.propagate() {
                return false;
            }
            let trail_len = self.core.trail().len();
            if self.theory_head == trail_len {
                return true;
            }
            while self.theory_head < trail_len {
                let lit = self.core.trail()[self.theory_head];
                self.theory_head += 1;
                if !self.notify(lit) {
                    return false;
                }
            }
        }
    }

    /// Reports one assigned literal to the theory. Returns false on
    /// conflict, before any later literal of the batch is reported.
    fn notify(&mut self, lit: Literal) -> bool {
        let is_true = !lit.negated;
        // Theory-propagated bits are reported too: blasting shares boolean
        // variables between terms, so the same bit may sit in another class.
        if self.theory.is_attached(lit.var) {
            self.theory.assign_eh(&mut self.core, lit.var, is_true);
        }
        if self.core.inconsistent() {
            return false;
        }
        let Some((t1, t2)) = self.core.eq_atom(lit.var) else {
            return true;
        };
        let (Some(v1), Some(v2)) = (self.theory.term_var(t1), self.theory.term_var(t2)) else {
            return true;
        };
        if is_true {
            self.theory.new_eq_eh(&mut self.core, v1, v2);
        } else {
            self.diseqs.push((v1, v2));
            self.theory.new_diseq_eh(&mut self.core, v1, v2);
        }
        // Stop at the first merge joining the two sides of a disequality,
        // before a later merge can ring complementary bits together.
        !self.core.inconsistent() && !self.diseq_conflict()
    }

    /// Stands in for congruence closure: an asserted disequality between
    /// members of one class is a conflict.
    fn diseq_conflict(&self) -> bool {
        self.diseqs
            .iter()
            .any(|(v1, v2)| self.theory.find(*v1) == self.theory.find(*v2))
    }

    fn push_scope(&mut self) {
        self.core.push_scope();
        self.theory.push_scope_eh();
        self.diseq_marks.push(self.diseqs.len());
    }

    fn pop_scopes(&mut self, num_scopes: usize) {
        self.core.pop_scope(num_scopes);
        self.theory.pop_scope_eh(num_scopes);
        let mark = self.diseq_marks[self.diseq_marks.len() - num_scopes];
        self.diseq_marks.truncate(self.diseq_marks.len() - num_scopes);
        self.diseqs.truncate(mark);
        self.theory_head = self.theory_head.min(self.core.trail().len());
    }

    fn backtrack(&mut self) -> bool {
        let Some(pos) = self.decisions.iter().rposition(|d| !d.flipped) else {
            return false;
        };
        let lit = self.decisions[pos].lit;
        self.pop_scopes(self.decisions.len() - pos);
        self.decisions.truncate(pos);
        self.push_scope();
        self.decisions.push(Decision {
            lit: !lit,
            flipped: true,
        });
        log::trace!("flip {} at level {}", !lit, self.decisions.len());
        self.core.decide(!lit);
        true
    }

    /// Values of the boolean and bit-vector constants under the current
    /// assignment.
    pub fn model(&self) -> Model {
        let mut model = Model::default();
        for (id, term) in self.core.terms().iter() {
            match &term.op {
                bvtheory::Op::BoolConst(_) => {
                    if let Some(lit) = self.core.term_literal(id) {
                        model
                            .bools
                            .insert(id, self.core.get_assignment(lit) == LBool::True);
                    }
                }
                bvtheory::Op::Const { .. } => {
                    let value = self
                        .theory
                        .term_var(id)
                        .and_then(|v| self.theory.mk_value(&self.core, v))
                        .and_then(|value| value.to_u64());
                    if let Some(value) = value {
                        model.bvs.insert(id, value);
                    }
                }
                _ => {}
            }
        }
        model
    }

    /// Whether `model` satisfies every assertion.
    pub fn satisfies(&self, model: &Model) -> bool {
        self.assertions
            .iter()
            .all(|a| eval::eval(self.core.terms(), *a, model).as_bool())
    }
}
