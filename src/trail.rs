// SPDX-License-Identifier: Apache-2.0

//! Scoped undo log. Actions are recorded as they happen and replayed in
//! reverse when a scope is popped; the theory interprets each action.

use crate::literal::BoolVar;
use crate::term::TermId;
use crate::var_store::TheoryVar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    /// Delete the atom created for this boolean variable.
    RemoveAtom(BoolVar),
    /// Cut a bit atom's occurrence list back to `len` entries.
    TruncateOccurrences { atom: BoolVar, len: usize },
    /// Split `child` back out of the class it was merged into.
    Unmerge { child: TheoryVar },
    /// Clear the flag recording that some term was not blasted.
    ClearApproximated,
    /// Forget the literal cached for a predicate term.
    ForgetAtomTerm(TermId),
    /// The definition clauses of this order atom were dropped with the scope.
    ClearOrderAxioms(BoolVar),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeMark {
    trail_len: usize,
    num_vars: usize,
}

#[derive(Debug, Default)]
pub struct Trail {
    actions: Vec<UndoAction>,
    scopes: Vec<ScopeMark>,
}

impl Trail {
    pub fn push(&mut self, action: UndoAction) {
        self.actions.push(action);
    }

    /// Opens a scope; `num_vars` is the theory variable count to restore
    /// when it is popped.
    pub fn push_scope(&mut self, num_vars: usize) {
        self.scopes.push(ScopeMark {
            trail_len: self.actions.len(),
            num_vars,
        });
    }

    pub fn num_scopes(&self) -> usize {
        self.scopes.len()
    }

    /// Closes `num_scopes` scopes. Returns the actions to undo, most recent
    /// first, and the variable count at the outermost popped scope (`None`
    /// when nothing was popped).
    pub fn pop_scope(&mut self, num_scopes: usize) -> (Vec<UndoAction>, Option<usize>) {
        if num_scopes == 0 {
            return (Vec::new(), None);
        }
        assert!(
            num_scopes <= self.scopes.len(),
            "popping {} scopes with only {} open",
            num_scopes,
            self.scopes.len()
        );
        let target = self.scopes.len() - num_scopes;
        let mark = self.scopes[target];
        self.scopes.truncate(target);
        let mut undo = self.actions.split_off(mark.trail_len);
        undo.reverse();
        (undo, Some(mark.num_vars))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
