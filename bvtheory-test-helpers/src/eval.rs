// SPDX-License-Identifier: Apache-2.0

//! Reference evaluator over `u64`, used as the oracle for blasted circuits.
//! Widths are limited to 64 bits.

use ahash::AHashMap;
use bvtheory::{Op, TermId, TermManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Bv { value: u64, width: usize },
}

impl Value {
    pub fn as_bool(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Bv { .. } => panic!("expected a boolean, got {:?}", self),
        }
    }

    pub fn as_bv(self) -> u64 {
        match self {
            Value::Bv { value, .. } => value,
            Value::Bool(_) => panic!("expected a bit-vector, got {:?}", self),
        }
    }
}

/// Interpretation of the uninterpreted constants. Absent constants read as
/// false / zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    pub bools: AHashMap<TermId, bool>,
    pub bvs: AHashMap<TermId, u64>,
}

pub fn mask(width: usize) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

fn to_signed(value: u64, width: usize) -> i128 {
    let value = value as i128;
    if width > 0 && (value >> (width - 1)) & 1 == 1 {
        value - (1i128 << width)
    } else {
        value
    }
}

fn neg(value: u64, width: usize) -> u64 {
    value.wrapping_neg() & mask(width)
}

fn udiv(a: u64, b: u64, width: usize) -> u64 {
    if b == 0 { mask(width) } else { a / b }
}

fn urem(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { a % b }
}

fn msb(value: u64, width: usize) -> bool {
    (value >> (width - 1)) & 1 == 1
}

fn abs(value: u64, width: usize) -> u64 {
    if msb(value, width) { neg(value, width) } else { value }
}

fn sdiv(a: u64, b: u64, width: usize) -> u64 {
    let q = udiv(abs(a, width), abs(b, width), width);
    if msb(a, width) != msb(b, width) { neg(q, width) } else { q }
}

fn srem(a: u64, b: u64, width: usize) -> u64 {
    let r = urem(abs(a, width), abs(b, width));
    if msb(a, width) { neg(r, width) } else { r }
}

fn smod(a: u64, b: u64, width: usize) -> u64 {
    let u = urem(abs(a, width), abs(b, width));
    if u == 0 {
        return u;
    }
    let m = mask(width);
    match (msb(a, width), msb(b, width)) {
        (false, false) => u,
        (true, false) => neg(u, width).wrapping_add(b) & m,
        (false, true) => u.wrapping_add(b) & m,
        (true, true) => neg(u, width),
    }
}

fn shift(kind: &Op, a: u64, b: u64, width: usize) -> u64 {
    let m = mask(width);
    let sign = msb(a, width);
    if b >= width as u64 {
        return match kind {
            Op::AShr if sign => m,
            _ => 0,
        };
    }
    match kind {
        Op::Shl => (a << b) & m,
        Op::LShr => a >> b,
        Op::AShr => {
            let shifted = a >> b;
            if sign { (shifted | !(m >> b)) & m } else { shifted }
        }
        _ => unreachable!("not a shift: {:?}", kind),
    }
}

fn rotate_left(a: u64, amount: u64, width: usize) -> u64 {
    let amount = (amount % width as u64) as usize;
    if amount == 0 {
        return a;
    }
    ((a << amount) | (a >> (width - amount))) & mask(width)
}

fn binary(op: &Op, a: u64, b: u64, width: usize) -> u64 {
    let m = mask(width);
    match op {
        Op::Add => a.wrapping_add(b) & m,
        Op::Mul => a.wrapping_mul(b) & m,
        Op::BvAnd => a & b,
        Op::BvOr => a | b,
        Op::BvXor => a ^ b,
        Op::BvNand => !(a & b) & m,
        Op::BvNor => !(a | b) & m,
        Op::BvXnor => !(a ^ b) & m,
        _ => unreachable!("not a chain operator: {:?}", op),
    }
}

pub fn eval(terms: &TermManager, term: TermId, model: &Model) -> Value {
    let t = terms.get(term);
    let arg = |i: usize| eval(terms, t.args[i], model);
    let bv = |value: u64, width: usize| Value::Bv {
        value: value & mask(width),
        width,
    };
    let width = t.width().unwrap_or(0);
    match &t.op {
        Op::Const { .. } => bv(model.bvs.get(&term).copied().unwrap_or(0), width),
        Op::Num(value) => bv(value.to_u64().expect("numeral wider than 64 bits"), width),
        Op::Add | Op::Mul | Op::BvAnd | Op::BvOr | Op::BvXor | Op::BvNand | Op::BvNor | Op::BvXnor => {
            let n = t.args.len();
            let mut acc = arg(n - 1).as_bv();
            for i in (0..n - 1).rev() {
                acc = binary(&t.op, arg(i).as_bv(), acc, width);
            }
            bv(acc, width)
        }
        Op::UDivI => bv(udiv(arg(0).as_bv(), arg(1).as_bv(), width), width),
        Op::URemI => bv(urem(arg(0).as_bv(), arg(1).as_bv()), width),
        Op::SDivI => bv(sdiv(arg(0).as_bv(), arg(1).as_bv(), width), width),
        Op::SRemI => bv(srem(arg(0).as_bv(), arg(1).as_bv(), width), width),
        Op::SModI => bv(smod(arg(0).as_bv(), arg(1).as_bv(), width), width),
        Op::SDiv0 | Op::UDiv0 | Op::SRem0 | Op::URem0 | Op::SMod0 => {
            panic!("{} has no fixed interpretation", t.op.name())
        }
        Op::BvNot => bv(!arg(0).as_bv(), width),
        Op::Concat => {
            let mut acc = 0u64;
            for a in &t.args {
                let a_width = terms.width(*a).expect("concat of a bit-vector");
                acc = (acc << a_width) | eval(terms, *a, model).as_bv();
            }
            bv(acc, width)
        }
        Op::SignExt(_) => {
            let a_width = terms.width(t.args[0]).expect("bit-vector argument");
            let a = arg(0).as_bv();
            bv(to_signed(a, a_width) as u64, width)
        }
        Op::ZeroExt(_) => bv(arg(0).as_bv(), width),
        Op::Extract { low, .. } => bv(arg(0).as_bv() >> low, width),
        Op::RedOr => bv((arg(0).as_bv() != 0) as u64, 1),
        Op::RedAnd => {
            let a_width = terms.width(t.args[0]).expect("bit-vector argument");
            bv((arg(0).as_bv() == mask(a_width)) as u64, 1)
        }
        Op::Comp => bv((arg(0).as_bv() == arg(1).as_bv()) as u64, 1),
        Op::Shl | Op::LShr | Op::AShr => bv(shift(&t.op, arg(0).as_bv(), arg(1).as_bv(), width), width),
        Op::RotateLeft(n) => bv(rotate_left(arg(0).as_bv(), *n as u64, width), width),
        Op::RotateRight(n) => {
            let n = (*n % width) as u64;
            bv(rotate_left(arg(0).as_bv(), width as u64 - n, width), width)
        }
        Op::ExtRotateLeft => bv(rotate_left(arg(0).as_bv(), arg(1).as_bv(), width), width),
        Op::ExtRotateRight => {
            let n = arg(1).as_bv() % width as u64;
            bv(rotate_left(arg(0).as_bv(), width as u64 - n, width), width)
        }
        Op::MkBv => {
            let mut acc = 0u64;
            for (i, a) in t.args.iter().enumerate() {
                if eval(terms, *a, model).as_bool() {
                    acc |= 1 << i;
                }
            }
            bv(acc, width)
        }
        Op::Bit2Bool(idx) => Value::Bool((arg(0).as_bv() >> idx) & 1 == 1),
        Op::ULeq => Value::Bool(arg(0).as_bv() <= arg(1).as_bv()),
        Op::SLeq => {
            let a_width = terms.width(t.args[0]).expect("bit-vector argument");
            Value::Bool(to_signed(arg(0).as_bv(), a_width) <= to_signed(arg(1).as_bv(), a_width))
        }
        Op::Xor3 => Value::Bool(arg(0).as_bool() ^ arg(1).as_bool() ^ arg(2).as_bool()),
        Op::Carry => {
            let count = (0..3).filter(|i| arg(*i).as_bool()).count();
            Value::Bool(count >= 2)
        }
        Op::UMulNoOvfl => {
            let a_width = terms.width(t.args[0]).expect("bit-vector argument");
            let product = arg(0).as_bv() as u128 * arg(1).as_bv() as u128;
            Value::Bool(product <= mask(a_width) as u128)
        }
        Op::SMulNoOvfl | Op::SMulNoUdfl => {
            let a_width = terms.width(t.args[0]).expect("bit-vector argument");
            let product = to_signed(arg(0).as_bv(), a_width) * to_signed(arg(1).as_bv(), a_width);
            let max = (1i128 << (a_width - 1)) - 1;
            let min = -(1i128 << (a_width - 1));
            Value::Bool(if t.op == Op::SMulNoOvfl { product <= max } else { product >= min })
        }
        Op::BoolConst(_) => Value::Bool(model.bools.get(&term).copied().unwrap_or(false)),
        Op::True => Value::Bool(true),
        Op::False => Value::Bool(false),
        Op::Eq => Value::Bool(arg(0) == arg(1)),
        Op::Not => Value::Bool(!arg(0).as_bool()),
        Op::Or => Value::Bool((0..t.args.len()).any(|i| arg(i).as_bool())),
        Op::And => Value::Bool((0..t.args.len()).all(|i| arg(i).as_bool())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(Op::UDivI, 7, 0, 0b1111; "udiv by zero is all ones")]
    #[test_case(Op::URemI, 7, 0, 7; "urem by zero is the dividend")]
    #[test_case(Op::SDivI, 0b1001, 0, 1; "negative sdiv by zero is one")]
    #[test_case(Op::SDivI, 0b1001, 0b0010, 0b1101; "sdiv rounds toward zero")]
    #[test_case(Op::SRemI, 0b1001, 0b0010, 0b1111; "srem follows the dividend")]
    #[test_case(Op::SModI, 0b1001, 0b0010, 0b0001; "smod follows the divisor")]
    #[test_case(Op::SModI, 0b1001, 0, 0b1001; "smod by zero is the dividend")]
    #[test_case(Op::AShr, 0b1000, 9, 0b1111; "ashr past the width")]
    fn test_binary_semantics(op: Op, a: u64, b: u64, want: u64) {
        let mut terms = TermManager::new();
        let a = terms.mk_num(a, 4).unwrap();
        let b = terms.mk_num(b, 4).unwrap();
        let t = terms.mk_app(op, &[a, b]).unwrap();
        assert_eq!(eval(&terms, t, &Model::default()).as_bv(), want);
    }

    #[test]
    fn test_chain_folds_right() {
        let mut terms = TermManager::new();
        let a = terms.mk_num(0b1100, 4).unwrap();
        let b = terms.mk_num(0b1010, 4).unwrap();
        let c = terms.mk_num(0b0110, 4).unwrap();
        // nand(a, nand(b, c)) = nand(1100, 1101) = 0011
        let t = terms.mk_app(Op::BvNand, &[a, b, c]).unwrap();
        assert_eq!(eval(&terms, t, &Model::default()).as_bv(), 0b0011);
    }

    #[test]
    fn test_concat_first_argument_is_msb() {
        let mut terms = TermManager::new();
        let hi = terms.mk_num(0b10, 2).unwrap();
        let lo = terms.mk_num(0b011, 3).unwrap();
        let t = terms.mk_app(Op::Concat, &[hi, lo]).unwrap();
        assert_eq!(
            eval(&terms, t, &Model::default()),
            Value::Bv {
                value: 0b10011,
                width: 5
            }
        );
    }
}
