// SPDX-License-Identifier: Apache-2.0

//! Random bit-vector formulas over a few small constants, plus a brute-force
//! oracle that enumerates every interpretation of those constants.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use bvtheory::{Op, TermId, TermManager};

use crate::eval::{self, Model};

/// Operators with a fixed interpretation, all mapping two (or one)
/// `width`-bit arguments to `width` bits.
const SAME_WIDTH_BINARY: &[Op] = &[
    Op::Add,
    Op::Mul,
    Op::UDivI,
    Op::URemI,
    Op::SDivI,
    Op::SRemI,
    Op::SModI,
    Op::BvAnd,
    Op::BvOr,
    Op::BvXor,
    Op::BvNand,
    Op::BvNor,
    Op::BvXnor,
    Op::Shl,
    Op::LShr,
    Op::AShr,
    Op::ExtRotateLeft,
    Op::ExtRotateRight,
];

pub struct TermGen<'a> {
    pub rng: StdRng,
    pub terms: &'a mut TermManager,
    pub width: usize,
    pub consts: Vec<TermId>,
    pub bool_consts: Vec<TermId>,
}

impl<'a> TermGen<'a> {
    /// A generator over `num_consts` fresh `width`-bit constants and one
    /// boolean constant.
    pub fn new(rng: StdRng, terms: &'a mut TermManager, width: usize, num_consts: usize) -> Self {
        let consts = (0..num_consts)
            .map(|i| terms.mk_const(&format!("x{}", i), width).unwrap())
            .collect();
        let bool_consts = vec![terms.mk_bool_const("p").unwrap()];
        TermGen {
            rng,
            terms,
            width,
            consts,
            bool_consts,
        }
    }

    fn leaf(&mut self) -> TermId {
        if self.rng.gen_bool(0.75) {
            *self.consts.choose(&mut self.rng).unwrap()
        } else {
            let value = self.rng.gen_range(0..(1u64 << self.width));
            self.terms.mk_num(value, self.width).unwrap()
        }
    }

    pub fn bv(&mut self, depth: usize) -> TermId {
        if depth == 0 || self.rng.gen_bool(0.25) {
            return self.leaf();
        }
        let w = self.width;
        match self.rng.gen_range(0..8) {
            0..=2 => {
                let op = SAME_WIDTH_BINARY.choose(&mut self.rng).unwrap().clone();
                let a = self.bv(depth - 1);
                let b = self.bv(depth - 1);
                self.terms.mk_app(op, &[a, b]).unwrap()
            }
            3 => {
                let op = [Op::Add, Op::BvXor, Op::BvNand]
                    .choose(&mut self.rng)
                    .unwrap()
                    .clone();
                let args: Vec<TermId> = (0..3).map(|_| self.bv(depth - 1)).collect();
                self.terms.mk_app(op, &args).unwrap()
            }
            4 => {
                let a = self.bv(depth - 1);
                let op = match self.rng.gen_range(0..3) {
                    0 => Op::BvNot,
                    1 => Op::RotateLeft(self.rng.gen_range(0..2 * w)),
                    _ => Op::RotateRight(self.rng.gen_range(0..2 * w)),
                };
                self.terms.mk_app(op, &[a]).unwrap()
            }
            5 => {
                // Widen, then cut back to `w` bits at a random offset.
                let a = self.bv(depth - 1);
                let b = self.bv(depth - 1);
                let wide = match self.rng.gen_range(0..3) {
                    0 => self.terms.mk_app(Op::Concat, &[a, b]).unwrap(),
                    1 => self.terms.mk_app(Op::SignExt(w), &[a]).unwrap(),
                    _ => self.terms.mk_app(Op::ZeroExt(w), &[a]).unwrap(),
                };
                let low = self.rng.gen_range(0..=w);
                self.terms
                    .mk_app(
                        Op::Extract {
                            high: low + w - 1,
                            low,
                        },
                        &[wide],
                    )
                    .unwrap()
            }
            6 => {
                let one_bit = match self.rng.gen_range(0..3) {
                    0 => {
                        let a = self.bv(depth - 1);
                        self.terms.mk_app(Op::RedOr, &[a]).unwrap()
                    }
                    1 => {
                        let a = self.bv(depth - 1);
                        self.terms.mk_app(Op::RedAnd, &[a]).unwrap()
                    }
                    _ => {
                        let a = self.bv(depth - 1);
                        let b = self.bv(depth - 1);
                        self.terms.mk_app(Op::Comp, &[a, b]).unwrap()
                    }
                };
                if w == 1 {
                    one_bit
                } else {
                    self.terms.mk_app(Op::ZeroExt(w - 1), &[one_bit]).unwrap()
                }
            }
            _ => {
                let bits: Vec<TermId> = (0..w).map(|_| self.boolean(depth - 1)).collect();
                self.terms.mk_app(Op::MkBv, &bits).unwrap()
            }
        }
    }

    pub fn boolean(&mut self, depth: usize) -> TermId {
        if depth == 0 {
            return match self.rng.gen_range(0..3) {
                0 => *self.bool_consts.choose(&mut self.rng).unwrap(),
                _ => {
                    let a = self.leaf();
                    let idx = self.rng.gen_range(0..self.width);
                    self.terms.mk_app(Op::Bit2Bool(idx), &[a]).unwrap()
                }
            };
        }
        match self.rng.gen_range(0..10) {
            0 | 1 => {
                let a = self.bv(depth - 1);
                let b = self.bv(depth - 1);
                self.terms.mk_eq(a, b).unwrap()
            }
            2 | 3 => {
                let op = [
                    Op::ULeq,
                    Op::SLeq,
                    Op::UMulNoOvfl,
                    Op::SMulNoOvfl,
                    Op::SMulNoUdfl,
                ]
                .choose(&mut self.rng)
                .unwrap()
                .clone();
                let a = self.bv(depth - 1);
                let b = self.bv(depth - 1);
                self.terms.mk_app(op, &[a, b]).unwrap()
            }
            4 => {
                let a = self.bv(depth - 1);
                let idx = self.rng.gen_range(0..self.width);
                self.terms.mk_app(Op::Bit2Bool(idx), &[a]).unwrap()
            }
            5 => {
                let a = self.boolean(depth - 1);
                self.terms.mk_not(a).unwrap()
            }
            6 | 7 => {
                let op = if self.rng.gen_bool(0.5) { Op::And } else { Op::Or };
                let a = self.boolean(depth - 1);
                let b = self.boolean(depth - 1);
                self.terms.mk_app(op, &[a, b]).unwrap()
            }
            _ => {
                let op = if self.rng.gen_bool(0.5) { Op::Xor3 } else { Op::Carry };
                let args: Vec<TermId> = (0..3).map(|_| self.boolean(depth - 1)).collect();
                self.terms.mk_app(op, &args).unwrap()
            }
        }
    }
}

/// A model of all `formulas` over `bv_consts` and `bool_consts`, found by
/// enumeration.
pub fn brute_force(
    terms: &TermManager,
    formulas: &[TermId],
    bv_consts: &[TermId],
    bool_consts: &[TermId],
) -> Option<Model> {
    let widths: Vec<usize> = bv_consts
        .iter()
        .map(|c| terms.width(*c).expect("bit-vector constant"))
        .collect();
    let total_bits: usize = widths.iter().sum::<usize>() + bool_consts.len();
    assert!(total_bits <= 20, "too many bits to enumerate: {}", total_bits);
    for stimulus in 0u64..(1 << total_bits) {
        let mut model = Model::default();
        let mut rest = stimulus;
        for (c, width) in bv_consts.iter().zip(&widths) {
            model.bvs.insert(*c, rest & eval::mask(*width));
            rest >>= width;
        }
        for c in bool_consts {
            model.bools.insert(*c, rest & 1 == 1);
            rest >>= 1;
        }
        if formulas
            .iter()
            .all(|f| eval::eval(terms, *f, &model).as_bool())
        {
            return Some(model);
        }
    }
    None
}
