// SPDX-License-Identifier: Apache-2.0

//! Representatives of fully assigned variables, keyed by value and width.
//!
//! Entries are not undone on backtracking; a lookup must check that the
//! stored variable still exists and still has the value before trusting it.

use ahash::AHashMap;

use crate::value::BvValue;
use crate::var_store::TheoryVar;

#[derive(Debug, Default)]
pub struct FixedValueTable {
    table: AHashMap<BvValue, TheoryVar>,
}

impl FixedValueTable {
    pub fn find(&self, value: &BvValue) -> Option<TheoryVar> {
        self.table.get(value).copied()
    }

    /// Records `v` as the representative of `value`, replacing any stale
    /// entry.
    pub fn insert(&mut self, value: BvValue, v: TheoryVar) {
        self.table.insert(value, v);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
