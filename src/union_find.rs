// SPDX-License-Identifier: Apache-2.0

//! Union-find over theory variables with LIFO unmerge.
//!
//! Union is by size with no path compression, so the most recent union can
//! be reversed exactly. Each class also keeps its members on a circular
//! `next` ring so propagation can visit siblings.

use crate::var_store::TheoryVar;

/// How a pending union will be applied: `child` is the root that stops
/// being one, `root` survives. `v_root`/`v_child` are the originally
/// requested variables on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePlan {
    pub root: TheoryVar,
    pub child: TheoryVar,
    pub v_root: TheoryVar,
    pub v_child: TheoryVar,
}

#[derive(Debug, Default)]
pub struct UnionFind {
    find: Vec<TheoryVar>,
    size: Vec<u32>,
    next: Vec<TheoryVar>,
}

impl UnionFind {
    pub fn mk_var(&mut self) -> TheoryVar {
        let v = TheoryVar(self.find.len() as u32);
        self.find.push(v);
        self.size.push(1);
        self.next.push(v);
        v
    }

    pub fn num_vars(&self) -> usize {
        self.find.len()
    }

    pub fn find(&self, mut v: TheoryVar) -> TheoryVar {
        while self.find[v.index()] != v {
            v = self.find[v.index()];
        }
        v
    }

    pub fn is_root(&self, v: TheoryVar) -> bool {
        self.find[v.index()] == v
    }

    pub fn next(&self, v: TheoryVar) -> TheoryVar {
        self.next[v.index()]
    }

    pub fn class_size(&self, v: TheoryVar) -> u32 {
        self.size[self.find(v).index()]
    }

    /// Members of `v`'s class, starting with `v`.
    pub fn class_members(&self, v: TheoryVar) -> Vec<TheoryVar> {
        let mut members = vec![v];
        let mut curr = self.next(v);
        while curr != v {
            members.push(curr);
            curr = self.next(curr);
        }
        members
    }

    /// Decides which root survives a union of `v1` and `v2`; `None` when
    /// they are already in one class. The larger class keeps its root.
    pub fn plan_merge(&self, v1: TheoryVar, v2: TheoryVar) -> Option<MergePlan> {
        let (mut r1, mut r2) = (self.find(v1), self.find(v2));
        if r1 == r2 {
            return None;
        }
        let (mut v1, mut v2) = (v1, v2);
        if self.size[r1.index()] > self.size[r2.index()] {
            std::mem::swap(&mut r1, &mut r2);
            std::mem::swap(&mut v1, &mut v2);
        }
        Some(MergePlan {
            root: r2,
            child: r1,
            v_root: v2,
            v_child: v1,
        })
    }

    /// Applies a planned union. The caller records `plan.child` so the
    /// union can later be reversed with [`UnionFind::unmerge`].
    pub fn union(&mut self, plan: &MergePlan) {
        let (child, root) = (plan.child, plan.root);
        debug_assert!(self.is_root(child) && self.is_root(root));
        self.find[child.index()] = root;
        self.size[root.index()] += self.size[child.index()];
        self.next.swap(child.index(), root.index());
    }

    /// Reverses the union that made `child` a non-root; returns the root it
    /// was merged into. Must be called in LIFO order.
    pub fn unmerge(&mut self, child: TheoryVar) -> TheoryVar {
        let root = self.find[child.index()];
        debug_assert!(root != child, "{} was never merged", child);
        self.size[root.index()] -= self.size[child.index()];
        self.find[child.index()] = child;
        self.next.swap(child.index(), root.index());
        root
    }

    pub fn shrink(&mut self, num_vars: usize) {
        self.find.truncate(num_vars);
        self.size.truncate(num_vars);
        self.next.truncate(num_vars);
    }
}
