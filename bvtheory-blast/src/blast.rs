// SPDX-License-Identifier: Apache-2.0

//! Bit-vector operator circuits over `AigBitVector`s.
//!
//! Semantics follow SMT-LIB fixed-size bit-vectors: unsigned division by zero
//! yields all ones, unsigned remainder by zero yields the dividend, and the
//! signed family is derived from the unsigned one by sign-magnitude. Shift
//! amounts at or past the width produce zero (or the sign fill for `ashr`).

use crate::adders::{AdderMapping, add_ripple_carry, add_with_mapping};
use crate::gate::{self, AigBitVector, AigOperand};
use crate::gate_builder::{GateBuilder, ReductionKind};

/// Ceiling of log2 for `n >= 1`; the number of amount bits a shifter over `n`
/// bits needs.
pub fn clog2(n: usize) -> usize {
    assert!(n > 0, "clog2 of zero");
    if n == 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

pub fn gatify_concat(args_msb_first: &[AigBitVector]) -> AigBitVector {
    let mut bits = Vec::new();
    for arg in args_msb_first.iter().rev() {
        bits.extend(arg.iter_lsb_to_msb().cloned());
    }
    AigBitVector::from_lsb_is_index_0(&bits)
}

pub fn gatify_extract(arg: &AigBitVector, high: usize, low: usize) -> AigBitVector {
    assert!(low <= high && high < arg.get_bit_count());
    arg.get_lsb_slice(low, high - low + 1)
}

pub fn gatify_zero_ext(extra_bits: usize, arg_bits: &AigBitVector) -> AigBitVector {
    AigBitVector::concat(AigBitVector::zeros(extra_bits), arg_bits.clone())
}

pub fn gatify_sign_ext(
    gb: &GateBuilder,
    extra_bits: usize,
    arg_bits: &AigBitVector,
) -> AigBitVector {
    let msb = arg_bits.get_msb(0);
    let replicated_msb = gb.replicate(*msb, extra_bits);
    AigBitVector::concat(replicated_msb, arg_bits.clone())
}

/// Reduces `args` pairwise with `f`, right to left: `f(a0, f(a1, ... an))`.
pub fn fold_right<F>(gb: &mut GateBuilder, args: &[AigBitVector], f: F) -> AigBitVector
where
    F: Fn(&mut GateBuilder, &AigBitVector, &AigBitVector) -> AigBitVector,
{
    let (last, rest) = args
        .split_last()
        .expect("fold over an empty argument list");
    let mut bits = last.clone();
    for arg in rest.iter().rev() {
        bits = f(gb, arg, &bits);
    }
    bits
}

pub fn gatify_nand(gb: &mut GateBuilder, a: &AigBitVector, b: &AigBitVector) -> AigBitVector {
    let and = gb.add_and_vec(a, b);
    gb.add_not_vec(&and)
}

pub fn gatify_nor(gb: &mut GateBuilder, a: &AigBitVector, b: &AigBitVector) -> AigBitVector {
    let or = gb.add_or_vec(a, b);
    gb.add_not_vec(&or)
}

pub fn gatify_redor(gb: &mut GateBuilder, arg: &AigBitVector) -> AigBitVector {
    gb.add_nez(arg, ReductionKind::Tree).into()
}

pub fn gatify_redand(gb: &mut GateBuilder, arg: &AigBitVector) -> AigBitVector {
    gb.add_and_reduce(arg, ReductionKind::Tree).into()
}

/// One-bit result that is set when `a == b`.
pub fn gatify_comp(gb: &mut GateBuilder, a: &AigBitVector, b: &AigBitVector) -> AigBitVector {
    gb.add_eq_vec(a, b, ReductionKind::Tree).into()
}

pub fn gatify_add(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    a: &AigBitVector,
    b: &AigBitVector,
) -> AigBitVector {
    let c_in = gb.get_false();
    add_with_mapping(mapping, a, b, c_in, gb).1
}

pub fn gatify_sub(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    a: &AigBitVector,
    b: &AigBitVector,
) -> AigBitVector {
    let b_complement = gb.add_not_vec(b);
    let c_in = gb.get_true();
    add_with_mapping(mapping, a, &b_complement, c_in, gb).1
}

pub fn gatify_twos_complement(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    bits: &AigBitVector,
) -> AigBitVector {
    let zeros = AigBitVector::zeros(bits.get_bit_count());
    gatify_sub(gb, mapping, &zeros, bits)
}

fn gatify_abs(gb: &mut GateBuilder, mapping: AdderMapping, bits: &AigBitVector) -> AigBitVector {
    let sign = *bits.get_msb(0);
    let negated = gatify_twos_complement(gb, mapping, bits);
    gb.add_mux2_vec(&sign, &negated, bits)
}

/// Shift-add multiplier truncated to the operand width.
pub fn gatify_umul(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigBitVector {
    assert_eq!(lhs_bits.get_bit_count(), rhs_bits.get_bit_count());
    let bit_count = lhs_bits.get_bit_count();
    let mut result: Option<AigBitVector> = None;
    for (i, rhs_bit) in rhs_bits.iter_lsb_to_msb().enumerate() {
        // Partial product shifted left by i, truncated to the output width.
        let mut shifted = vec![gb.get_false(); i];
        for lhs_bit in lhs_bits.iter_lsb_to_msb().take(bit_count - i) {
            shifted.push(gb.add_and_binary(*lhs_bit, *rhs_bit));
        }
        let pp = AigBitVector::from_lsb_is_index_0(&shifted);
        result = Some(match result {
            None => pp,
            Some(acc) => gatify_add(gb, mapping, &acc, &pp),
        });
    }
    result.expect("multiplier over zero-width operands")
}

/// `lhs >= rhs` (unsigned) as a single bit; used by the divider.
fn gatify_uge_via_bit_tests(
    gb: &mut GateBuilder,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigOperand {
    gatify_ucmp_via_bit_tests(gb, lhs_bits, rhs_bits, true, &|gb, lhs_bit, rhs_bit| {
        let rhs_bit_unset = gb.add_not(rhs_bit);
        gb.add_and_binary(lhs_bit, rhs_bit_unset)
    })
}

/// Restoring division; returns `(quotient, remainder)`.
///
/// A zero divisor makes every trial subtraction succeed, which yields the
/// all-ones quotient and leaves the dividend as the remainder.
pub fn gatify_udiv_urem(
    gb: &mut GateBuilder,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> (AigBitVector, AigBitVector) {
    assert_eq!(lhs_bits.get_bit_count(), rhs_bits.get_bit_count());
    let bit_count = lhs_bits.get_bit_count();

    let mut remainder = AigBitVector::zeros(bit_count);
    let mut quotient_bits = Vec::with_capacity(bit_count);
    let rhs_comp = gb.add_not_vec(rhs_bits);

    for dividend_bit in lhs_bits.iter_msb_to_lsb() {
        // A set bit shifted out of the remainder means the trial value is
        // at least 2^n, which always exceeds the divisor.
        let overflow = *remainder.get_msb(0);
        let mut shifted_ops = Vec::with_capacity(bit_count);
        shifted_ops.push(*dividend_bit);
        for i in 0..bit_count - 1 {
            shifted_ops.push(*remainder.get_lsb(i));
        }
        let shifted = AigBitVector::from_lsb_is_index_0(&shifted_ops);

        let fits = gatify_uge_via_bit_tests(gb, &shifted, rhs_bits);
        let ge = gb.add_or_binary(overflow, fits);
        let c_in = gb.get_true();
        let (_c, diff) = add_ripple_carry(&shifted, &rhs_comp, c_in, gb);
        remainder = gb.add_mux2_vec(&ge, &diff, &shifted);
        quotient_bits.push(ge);
    }

    quotient_bits.reverse();
    (AigBitVector::from_lsb_is_index_0(&quotient_bits), remainder)
}

pub fn gatify_sdiv(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigBitVector {
    let lhs_abs = gatify_abs(gb, mapping, lhs_bits);
    let rhs_abs = gatify_abs(gb, mapping, rhs_bits);
    let (unsigned, _) = gatify_udiv_urem(gb, &lhs_abs, &rhs_abs);
    let result_neg = gb.add_xor_binary(*lhs_bits.get_msb(0), *rhs_bits.get_msb(0));
    let negated = gatify_twos_complement(gb, mapping, &unsigned);
    gb.add_mux2_vec(&result_neg, &negated, &unsigned)
}

/// Signed remainder; the sign follows the dividend.
pub fn gatify_srem(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigBitVector {
    let lhs_abs = gatify_abs(gb, mapping, lhs_bits);
    let rhs_abs = gatify_abs(gb, mapping, rhs_bits);
    let (_, unsigned) = gatify_udiv_urem(gb, &lhs_abs, &rhs_abs);
    let negated = gatify_twos_complement(gb, mapping, &unsigned);
    gb.add_mux2_vec(lhs_bits.get_msb(0), &negated, &unsigned)
}

/// Signed modulus; a non-zero result takes the sign of the divisor.
pub fn gatify_smod(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigBitVector {
    let sign_s = *lhs_bits.get_msb(0);
    let sign_t = *rhs_bits.get_msb(0);
    let lhs_abs = gatify_abs(gb, mapping, lhs_bits);
    let rhs_abs = gatify_abs(gb, mapping, rhs_bits);
    let (_, u) = gatify_udiv_urem(gb, &lhs_abs, &rhs_abs);
    let neg_u = gatify_twos_complement(gb, mapping, &u);
    let u_plus_t = gatify_add(gb, mapping, &u, rhs_bits);
    let neg_u_plus_t = gatify_add(gb, mapping, &neg_u, rhs_bits);
    let when_s_neg = gb.add_mux2_vec(&sign_t, &neg_u, &neg_u_plus_t);
    let when_s_pos = gb.add_mux2_vec(&sign_t, &u_plus_t, &u);
    let signed = gb.add_mux2_vec(&sign_s, &when_s_neg, &when_s_pos);
    let u_zero = gb.add_ez(&u, ReductionKind::Tree);
    gb.add_mux2_vec(&u_zero, &u, &signed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    Shl,
    LShr,
    AShr,
}

// Implements a stage-based barrel shifter (with logarithmic stages) using 2:1
// muxes. Vacated positions take `fill`.
fn gatify_barrel_shifter_internal(
    arg_gates: &AigBitVector,
    amount_gates: &AigBitVector,
    left: bool,
    fill: AigOperand,
    gb: &mut GateBuilder,
) -> AigBitVector {
    let bit_count = arg_gates.get_bit_count();
    let mut current: Vec<AigOperand> = arg_gates.to_vec();
    // Each bit in the shift amount (little-endian) represents a stage.
    for stage in 0..amount_gates.get_bit_count() {
        let shift = 1usize << stage;
        let control = *amount_gates.get_lsb(stage);
        let mut next_stage = Vec::with_capacity(bit_count);
        for j in 0..bit_count {
            let candidate = if left {
                if j >= shift { current[j - shift] } else { fill }
            } else if j + shift < bit_count {
                current[j + shift]
            } else {
                fill
            };
            next_stage.push(gb.add_mux2(control, candidate, current[j]));
        }
        current = next_stage;
    }
    AigBitVector::from_lsb_is_index_0(&current)
}

pub fn gatify_shift(
    gb: &mut GateBuilder,
    kind: ShiftKind,
    arg_gates: &AigBitVector,
    amount_gates: &AigBitVector,
) -> AigBitVector {
    let bit_count = arg_gates.get_bit_count();
    let fill = match kind {
        ShiftKind::AShr => *arg_gates.get_msb(0),
        ShiftKind::Shl | ShiftKind::LShr => gb.get_false(),
    };
    let left = kind == ShiftKind::Shl;
    let natural_amount_bits = clog2(bit_count);
    // The amount can only move bits within the width; if any higher amount
    // bit is set the result is all fill.
    if amount_gates.get_bit_count() > natural_amount_bits {
        let gate::Split { msbs, lsbs } = amount_gates.get_lsb_partition(natural_amount_bits);
        let overlarge = gb.add_nez(&msbs, ReductionKind::Tree);
        let normal = gatify_barrel_shifter_internal(arg_gates, &lsbs, left, fill, gb);
        let filled = gb.replicate(fill, bit_count);
        gb.add_mux2_vec(&overlarge, &filled, &normal)
    } else {
        gatify_barrel_shifter_internal(arg_gates, amount_gates, left, fill, gb)
    }
}

/// Rotation by a constant; pure wiring.
pub fn gatify_rotate_left(arg: &AigBitVector, amount: usize) -> AigBitVector {
    let n = arg.get_bit_count();
    let amount = amount % n;
    let bits: Vec<AigOperand> = (0..n).map(|i| *arg.get_lsb((i + n - amount) % n)).collect();
    AigBitVector::from_lsb_is_index_0(&bits)
}

pub fn gatify_rotate_right(arg: &AigBitVector, amount: usize) -> AigBitVector {
    let n = arg.get_bit_count();
    gatify_rotate_left(arg, n - amount % n)
}

/// Rotation by a variable amount, taken modulo the width.
pub fn gatify_ext_rotate(
    gb: &mut GateBuilder,
    left: bool,
    arg: &AigBitVector,
    amount: &AigBitVector,
) -> AigBitVector {
    let n = arg.get_bit_count();
    let width_const = AigBitVector::from_u64(n as u64, amount.get_bit_count());
    let (_, reduced) = gatify_udiv_urem(gb, amount, &width_const);
    let mut current = arg.clone();
    for stage in 0..clog2(n) {
        let control = *reduced.get_lsb(stage);
        let step = (1usize << stage) % n;
        let rotated = if left {
            gatify_rotate_left(&current, step)
        } else {
            gatify_rotate_right(&current, step)
        };
        current = gb.add_mux2_vec(&control, &rotated, &current);
    }
    current
}

/// The generalization of unsigned comparisons via bit tests: or together,
/// from the MSB down, "all higher bits equal and `handle_bit` holds here",
/// plus the whole-vector equality when `or_eq`.
pub fn gatify_ucmp_via_bit_tests<F>(
    gb: &mut GateBuilder,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
    or_eq: bool,
    handle_bit: &F,
) -> AigOperand
where
    F: Fn(&mut GateBuilder, AigOperand, AigOperand) -> AigOperand,
{
    assert_eq!(lhs_bits.get_bit_count(), rhs_bits.get_bit_count());
    let input_bit_count = lhs_bits.get_bit_count();
    let eq_bits = gb.add_xnor_vec(lhs_bits, rhs_bits);
    let mut bit_tests = Vec::new();
    for msb_i in 0..input_bit_count {
        let eq_bits_slice = eq_bits.get_msbs(msb_i);
        let prior_bits_equal = if eq_bits_slice.is_empty() {
            gb.get_true()
        } else {
            gb.add_and_reduce(&eq_bits_slice, ReductionKind::Tree)
        };
        let this_bit_test = handle_bit(gb, *lhs_bits.get_msb(msb_i), *rhs_bits.get_msb(msb_i));
        bit_tests.push(gb.add_and_binary(this_bit_test, prior_bits_equal));
    }
    let result = gb.add_or_nary(&bit_tests, ReductionKind::Tree);
    if or_eq {
        let all_eq = gb.add_and_reduce(&eq_bits, ReductionKind::Tree);
        gb.add_or_binary(result, all_eq)
    } else {
        result
    }
}

/// Unsigned `lhs <= rhs`.
pub fn gatify_ule(
    gb: &mut GateBuilder,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigOperand {
    gatify_ucmp_via_bit_tests(gb, lhs_bits, rhs_bits, true, &|gb, lhs_bit, rhs_bit| {
        let lhs_bit_unset = gb.add_not(lhs_bit);
        gb.add_and_binary(lhs_bit_unset, rhs_bit)
    })
}

/// Signed `lhs <= rhs`: flipping both sign bits maps two's complement order
/// onto unsigned order.
pub fn gatify_sle(
    gb: &mut GateBuilder,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigOperand {
    let flip = |bits: &AigBitVector| {
        let mut ops = bits.to_vec();
        if let Some(msb) = ops.last_mut() {
            *msb = msb.negate();
        }
        AigBitVector::from_lsb_is_index_0(&ops)
    };
    gatify_ule(gb, &flip(lhs_bits), &flip(rhs_bits))
}

/// Full double-width product of the (zero or sign) extended operands.
fn wide_product(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
    signed: bool,
) -> AigBitVector {
    let n = lhs_bits.get_bit_count();
    let (a, b) = if signed {
        (gatify_sign_ext(gb, n, lhs_bits), gatify_sign_ext(gb, n, rhs_bits))
    } else {
        (gatify_zero_ext(n, lhs_bits), gatify_zero_ext(n, rhs_bits))
    };
    gatify_umul(gb, mapping, &a, &b)
}

/// Set when the unsigned product fits in the operand width.
pub fn gatify_umul_no_overflow(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigOperand {
    let n = lhs_bits.get_bit_count();
    let product = wide_product(gb, mapping, lhs_bits, rhs_bits, false);
    let high = product.get_msbs(n);
    gb.add_ez(&high, ReductionKind::Tree)
}

/// Set when the signed product is not above the largest signed value.
pub fn gatify_smul_no_overflow(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigOperand {
    let n = lhs_bits.get_bit_count();
    let product = wide_product(gb, mapping, lhs_bits, rhs_bits, true);
    let p_msb = *product.get_msb(0);
    let high = product.get_msbs(n + 1);
    let high_zero = gb.add_ez(&high, ReductionKind::Tree);
    gb.add_or_binary(p_msb, high_zero)
}

/// Set when the signed product is not below the smallest signed value.
pub fn gatify_smul_no_underflow(
    gb: &mut GateBuilder,
    mapping: AdderMapping,
    lhs_bits: &AigBitVector,
    rhs_bits: &AigBitVector,
) -> AigOperand {
    let n = lhs_bits.get_bit_count();
    let product = wide_product(gb, mapping, lhs_bits, rhs_bits, true);
    let p_msb = *product.get_msb(0);
    let high = product.get_msbs(n + 1);
    let high_ones = gb.add_and_reduce(&high, ReductionKind::Tree);
    let non_negative = gb.add_not(p_msb);
    gb.add_or_binary(non_negative, high_ones)
}
