// SPDX-License-Identifier: Apache-2.0

//! Operator table: each blastable bit-vector operator maps to an arity class
//! and a circuit over its argument bits. [`blast`] is the single generic
//! routine that applies an entry.

use bvtheory_blast::blast::{self, ShiftKind};
use bvtheory_blast::{AdderMapping, AigBitVector, AigOperand, GateBuilder};

use crate::term::Op;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityClass {
    Unary,
    Binary,
    /// Associative n-ary operator, folded right to left over a binary
    /// circuit.
    Chain,
    /// Result bits are argument bits, rearranged or extended by constants.
    Wiring,
}

/// Circuit builder for one operator. The `[usize; 2]` holds the operator's
/// numeric parameters (extension width, rotation amount, extract bounds).
pub type BlastFn = fn(&mut GateBuilder, AdderMapping, [usize; 2], &[AigBitVector]) -> AigBitVector;

#[derive(Clone, Copy)]
pub struct OperatorEntry {
    pub arity: ArityClass,
    pub params: [usize; 2],
    pub blast: BlastFn,
}

impl std::fmt::Debug for OperatorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorEntry")
            .field("arity", &self.arity)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn entry(arity: ArityClass, blast: BlastFn) -> Option<OperatorEntry> {
    entry_with(arity, [0, 0], blast)
}

fn entry_with(arity: ArityClass, params: [usize; 2], blast: BlastFn) -> Option<OperatorEntry> {
    Some(OperatorEntry {
        arity,
        params,
        blast,
    })
}

fn bit(op: AigOperand) -> AigBitVector {
    op.into()
}

/// `None` for operators that are not blasted through the table: numerals,
/// constants, the division-by-zero family (left uninterpreted), the atoms
/// handled directly by the theory, and core-owned booleans.
pub fn lookup(op: &Op) -> Option<OperatorEntry> {
    use ArityClass::*;
    match op {
        Op::Add => entry(Chain, |gb, m, _, a| blast::gatify_add(gb, m, &a[0], &a[1])),
        Op::Mul => entry(Chain, |gb, m, _, a| blast::gatify_umul(gb, m, &a[0], &a[1])),
        Op::SDivI => entry(Binary, |gb, m, _, a| blast::gatify_sdiv(gb, m, &a[0], &a[1])),
        Op::UDivI => entry(Binary, |gb, _, _, a| blast::gatify_udiv_urem(gb, &a[0], &a[1]).0),
        Op::SRemI => entry(Binary, |gb, m, _, a| blast::gatify_srem(gb, m, &a[0], &a[1])),
        Op::URemI => entry(Binary, |gb, _, _, a| blast::gatify_udiv_urem(gb, &a[0], &a[1]).1),
        Op::SModI => entry(Binary, |gb, m, _, a| blast::gatify_smod(gb, m, &a[0], &a[1])),
        Op::BvAnd => entry(Chain, |gb, _, _, a| gb.add_and_vec(&a[0], &a[1])),
        Op::BvOr => entry(Chain, |gb, _, _, a| gb.add_or_vec(&a[0], &a[1])),
        Op::BvXor => entry(Chain, |gb, _, _, a| gb.add_xor_vec(&a[0], &a[1])),
        Op::BvNand => entry(Chain, |gb, _, _, a| blast::gatify_nand(gb, &a[0], &a[1])),
        Op::BvNor => entry(Chain, |gb, _, _, a| blast::gatify_nor(gb, &a[0], &a[1])),
        Op::BvXnor => entry(Chain, |gb, _, _, a| gb.add_xnor_vec(&a[0], &a[1])),
        Op::BvNot => entry(Unary, |gb, _, _, a| gb.add_not_vec(&a[0])),
        Op::RedOr => entry(Unary, |gb, _, _, a| blast::gatify_redor(gb, &a[0])),
        Op::RedAnd => entry(Unary, |gb, _, _, a| blast::gatify_redand(gb, &a[0])),
        Op::Comp => entry(Binary, |gb, _, _, a| blast::gatify_comp(gb, &a[0], &a[1])),
        Op::Shl => entry(Binary, |gb, _, _, a| {
            blast::gatify_shift(gb, ShiftKind::Shl, &a[0], &a[1])
        }),
        Op::LShr => entry(Binary, |gb, _, _, a| {
            blast::gatify_shift(gb, ShiftKind::LShr, &a[0], &a[1])
        }),
        Op::AShr => entry(Binary, |gb, _, _, a| {
            blast::gatify_shift(gb, ShiftKind::AShr, &a[0], &a[1])
        }),
        Op::ExtRotateLeft => entry(Binary, |gb, _, _, a| {
            blast::gatify_ext_rotate(gb, true, &a[0], &a[1])
        }),
        Op::ExtRotateRight => entry(Binary, |gb, _, _, a| {
            blast::gatify_ext_rotate(gb, false, &a[0], &a[1])
        }),
        Op::Concat => entry(Wiring, |_, _, _, a| blast::gatify_concat(a)),
        Op::SignExt(n) => entry_with(Wiring, [*n, 0], |gb, _, p, a| {
            blast::gatify_sign_ext(gb, p[0], &a[0])
        }),
        Op::ZeroExt(n) => entry_with(Wiring, [*n, 0], |_, _, p, a| {
            blast::gatify_zero_ext(p[0], &a[0])
        }),
        Op::Extract { high, low } => entry_with(Wiring, [*high, *low], |_, _, p, a| {
            blast::gatify_extract(&a[0], p[0], p[1])
        }),
        Op::RotateLeft(n) => entry_with(Wiring, [*n, 0], |_, _, p, a| {
            blast::gatify_rotate_left(&a[0], p[0])
        }),
        Op::RotateRight(n) => entry_with(Wiring, [*n, 0], |_, _, p, a| {
            blast::gatify_rotate_right(&a[0], p[0])
        }),
        Op::MkBv => entry(Wiring, |_, _, _, a| {
            let bits: Vec<AigOperand> = a.iter().map(|arg| *arg.get_lsb(0)).collect();
            AigBitVector::from_lsb_is_index_0(&bits)
        }),
        Op::ULeq => entry(Binary, |gb, _, _, a| bit(blast::gatify_ule(gb, &a[0], &a[1]))),
        Op::SLeq => entry(Binary, |gb, _, _, a| bit(blast::gatify_sle(gb, &a[0], &a[1]))),
        Op::UMulNoOvfl => entry(Binary, |gb, m, _, a| {
            bit(blast::gatify_umul_no_overflow(gb, m, &a[0], &a[1]))
        }),
        Op::SMulNoOvfl => entry(Binary, |gb, m, _, a| {
            bit(blast::gatify_smul_no_overflow(gb, m, &a[0], &a[1]))
        }),
        Op::SMulNoUdfl => entry(Binary, |gb, m, _, a| {
            bit(blast::gatify_smul_no_underflow(gb, m, &a[0], &a[1]))
        }),
        Op::Const { .. }
        | Op::Num(_)
        | Op::SDiv0
        | Op::UDiv0
        | Op::SRem0
        | Op::URem0
        | Op::SMod0
        | Op::Bit2Bool(_)
        | Op::Xor3
        | Op::Carry
        | Op::BoolConst(_)
        | Op::True
        | Op::False
        | Op::Eq
        | Op::Not
        | Op::Or
        | Op::And => None,
    }
}

/// Applies `entry` to the argument bit vectors.
pub fn blast(
    entry: &OperatorEntry,
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    args: &[AigBitVector],
) -> AigBitVector {
    let params = entry.params;
    match entry.arity {
        ArityClass::Unary => {
            debug_assert_eq!(args.len(), 1);
            (entry.blast)(gb, mapping, params, args)
        }
        ArityClass::Binary => {
            debug_assert_eq!(args.len(), 2);
            (entry.blast)(gb, mapping, params, args)
        }
        ArityClass::Wiring => (entry.blast)(gb, mapping, params, args),
        ArityClass::Chain => {
            let (last, rest) = args
                .split_last()
                .expect("chain operators take at least two arguments");
            let mut bits = last.clone();
            for arg in rest.iter().rev() {
                bits = (entry.blast)(gb, mapping, params, &[arg.clone(), bits]);
            }
            bits
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;
    use bvtheory_blast::{GateBuilderOptions, gate_sim};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn constant(gb: &GateBuilder, value: u64, width: usize) -> AigBitVector {
        let bits: BitVec = (0..width).map(|i| (value >> i) & 1 == 1).collect();
        gb.add_literal(&bits)
    }

    fn blast_constants(op: Op, args: &[(u64, usize)]) -> u64 {
        let mut gb = GateBuilder::new(GateBuilderOptions::opt());
        let args: Vec<AigBitVector> = args
            .iter()
            .map(|(value, width)| constant(&gb, *value, *width))
            .collect();
        let entry = lookup(&op).unwrap();
        let out = blast(&entry, &mut gb, AdderMapping::default(), &args);
        let no_leaves: BitVec = BitVec::new();
        gate_sim::eval_u64(&gb.gates, &no_leaves, &out)
    }

    #[test_case(Op::Add, &[(3, 4), (9, 4), (7, 4)], 3; "add chain wraps")]
    #[test_case(Op::Mul, &[(3, 4), (7, 4)], 5; "mul truncates")]
    #[test_case(Op::UDivI, &[(7, 4), (0, 4)], 15; "udiv by zero")]
    #[test_case(Op::URemI, &[(7, 4), (0, 4)], 7; "urem by zero")]
    #[test_case(Op::BvNand, &[(0b1100, 4), (0b1010, 4), (0b0110, 4)], 0b0011; "nand folds right")]
    #[test_case(Op::Concat, &[(0b10, 2), (0b011, 3)], 0b10011; "concat msb first")]
    #[test_case(Op::Extract { high: 3, low: 1 }, &[(0b1010, 4)], 0b101; "extract")]
    #[test_case(Op::SignExt(2), &[(0b10, 2)], 0b1110; "sign extend")]
    #[test_case(Op::RotateLeft(1), &[(0b1001, 4)], 0b0011; "rotate left")]
    #[test_case(Op::AShr, &[(0b1000, 4), (9, 4)], 0b1111; "ashr past width")]
    #[test_case(Op::ExtRotateRight, &[(0b0001, 4), (5, 4)], 0b1000; "ext rotate modulo width")]
    #[test_case(Op::Comp, &[(5, 4), (5, 4)], 1; "comp")]
    #[test_case(Op::SLeq, &[(0b1000, 4), (0, 4)], 1; "sle negative")]
    #[test_case(Op::UMulNoOvfl, &[(4, 4), (4, 4)], 0; "umul overflows")]
    fn test_blast_constants(op: Op, args: &[(u64, usize)], want: u64) {
        let _ = env_logger::builder().is_test(true).try_init();
        assert_eq!(blast_constants(op, args), want);
    }

    #[test]
    fn test_declined_ops() {
        for op in [Op::UDiv0, Op::SMod0, Op::Xor3, Op::Eq, Op::Num(crate::value::BvValue::zero(1))] {
            assert!(lookup(&op).is_none(), "{:?}", op);
        }
        assert_eq!(lookup(&Op::Add).unwrap().arity, ArityClass::Chain);
        assert_eq!(lookup(&Op::MkBv).unwrap().arity, ArityClass::Wiring);
        assert_eq!(lookup(&Op::Extract { high: 5, low: 2 }).unwrap().params, [5, 2]);
    }
}
