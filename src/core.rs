// SPDX-License-Identifier: Apache-2.0

//! The services the theory needs from the SAT core it plugs into.

use crate::justification::BvJustification;
use crate::literal::{BoolVar, LBool, Literal};
use crate::term::{TermId, TermManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JustificationId(pub u32);

/// Outcome of the theory's last-chance completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalCheck {
    Done,
    /// Some term was not blasted; a "sat" answer would be unsound.
    GiveUp,
}

pub trait SmtCore {
    fn terms(&self) -> &TermManager;

    fn mk_bool_var(&mut self) -> BoolVar;

    /// Literal equivalent to `a & b`, hash-consed by the core. The core may
    /// fold constants and complementary inputs.
    fn mk_and(&mut self, a: Literal, b: Literal) -> Literal;

    /// Definitional clause of a gate; never removed.
    fn mk_gate_clause(&mut self, lits: &[Literal]);

    /// Literal for a boolean-sorted term the core owns.
    fn internalize_bool(&mut self, term: TermId) -> Literal;

    /// Equality atom between two bit-vector terms.
    fn mk_eq(&mut self, lhs: TermId, rhs: TermId) -> Literal;

    fn get_assignment(&self, lit: Literal) -> LBool;

    fn mk_justification(&mut self, js: BvJustification) -> JustificationId;

    fn assign(&mut self, lit: Literal, js: JustificationId);

    fn set_conflict(&mut self, js: JustificationId);

    fn assign_eq(&mut self, lhs: TermId, rhs: TermId, js: JustificationId);

    fn mk_th_axiom(&mut self, lits: &[Literal]);

    fn inconsistent(&self) -> bool;

    fn relevancy(&self) -> bool;

    fn mark_as_relevant(&mut self, lit: Literal);
}
