// SPDX-License-Identifier: Apache-2.0

//! Per-class summary of bit positions fixed to a constant by some member.

use crate::var_store::TheoryVar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroOneBit {
    pub owner: TheoryVar,
    pub idx: usize,
    pub is_true: bool,
}

/// Two members of a class hold complementary constants at `idx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroOneConflict {
    pub v1: TheoryVar,
    pub v2: TheoryVar,
    pub idx: usize,
}

#[derive(Debug, Default)]
pub struct ZeroOneBits {
    per_var: Vec<Vec<ZeroOneBit>>,
}

impl ZeroOneBits {
    pub fn mk_var(&mut self) {
        self.per_var.push(Vec::new());
    }

    pub fn get(&self, v: TheoryVar) -> &[ZeroOneBit] {
        &self.per_var[v.index()]
    }

    pub fn register(&mut self, v: TheoryVar, idx: usize, is_true: bool) {
        self.per_var[v.index()].push(ZeroOneBit {
            owner: v,
            idx,
            is_true,
        });
    }

    /// Folds `child`'s summary into `root`'s. On complementary entries
    /// nothing is copied and the two owners are returned.
    pub fn merge(
        &mut self,
        root: TheoryVar,
        child: TheoryVar,
        width: usize,
    ) -> Result<(), ZeroOneConflict> {
        if self.per_var[child.index()].is_empty() {
            return Ok(());
        }
        // seen[is_true][idx] = owner of the root entry at idx.
        let mut seen: [Vec<Option<TheoryVar>>; 2] = [vec![None; width], vec![None; width]];
        for bit in &self.per_var[root.index()] {
            seen[bit.is_true as usize][bit.idx] = Some(bit.owner);
        }
        let mut missing = Vec::new();
        for bit in &self.per_var[child.index()] {
            if let Some(v1) = seen[!bit.is_true as usize][bit.idx] {
                return Err(ZeroOneConflict {
                    v1,
                    v2: bit.owner,
                    idx: bit.idx,
                });
            }
            if seen[bit.is_true as usize][bit.idx].is_none() {
                missing.push(*bit);
            }
        }
        self.per_var[root.index()].extend(missing);
        Ok(())
    }

    /// After `child` was split back out of `root`, drops the entries copied
    /// from it: everything past the last entry still owned by `root`'s
    /// class.
    pub fn unmerge(&mut self, root: TheoryVar, still_in_root: impl Fn(TheoryVar) -> bool) {
        let bits = &mut self.per_var[root.index()];
        let keep = bits
            .iter()
            .rposition(|bit| still_in_root(bit.owner))
            .map_or(0, |j| j + 1);
        bits.truncate(keep);
    }

    pub fn shrink(&mut self, num_vars: usize) {
        self.per_var.truncate(num_vars);
    }
}
