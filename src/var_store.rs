// SPDX-License-Identifier: Apache-2.0

//! Per-theory-variable bit arrays and watch positions.

use std::fmt;

use crate::literal::Literal;
use crate::term::TermId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TheoryVar(pub u32);

impl TheoryVar {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TheoryVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("v{}", self.0))
    }
}

#[derive(Debug, Default)]
pub struct VarStore {
    bits: Vec<Vec<Literal>>,
    wpos: Vec<usize>,
    terms: Vec<TermId>,
    /// Declared width; `bits` reaches it once internalization finishes.
    sizes: Vec<usize>,
}

impl VarStore {
    pub fn mk_var(&mut self, term: TermId, size: usize) -> TheoryVar {
        let v = TheoryVar(self.bits.len() as u32);
        self.bits.push(Vec::with_capacity(size));
        self.wpos.push(0);
        self.terms.push(term);
        self.sizes.push(size);
        v
    }

    pub fn num_vars(&self) -> usize {
        self.bits.len()
    }

    pub fn contains(&self, v: TheoryVar) -> bool {
        v.index() < self.bits.len()
    }

    pub fn bits(&self, v: TheoryVar) -> &[Literal] {
        &self.bits[v.index()]
    }

    pub fn bit(&self, v: TheoryVar, idx: usize) -> Literal {
        self.bits[v.index()][idx]
    }

    pub fn size(&self, v: TheoryVar) -> usize {
        self.sizes[v.index()]
    }

    /// Appends `lit` and returns its bit index.
    pub fn push_bit(&mut self, v: TheoryVar, lit: Literal) -> usize {
        let bits = &mut self.bits[v.index()];
        bits.push(lit);
        bits.len() - 1
    }

    pub fn wpos(&self, v: TheoryVar) -> usize {
        self.wpos[v.index()]
    }

    pub fn set_wpos(&mut self, v: TheoryVar, pos: usize) {
        self.wpos[v.index()] = pos;
    }

    pub fn term(&self, v: TheoryVar) -> TermId {
        self.terms[v.index()]
    }

    pub fn vars(&self) -> impl Iterator<Item = TheoryVar> + use<> {
        (0..self.bits.len() as u32).map(TheoryVar)
    }

    /// Drops every variable numbered `num_vars` or above.
    pub fn shrink(&mut self, num_vars: usize) {
        self.bits.truncate(num_vars);
        self.wpos.truncate(num_vars);
        self.terms.truncate(num_vars);
        self.sizes.truncate(num_vars);
    }
}
