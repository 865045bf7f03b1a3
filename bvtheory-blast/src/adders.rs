// SPDX-License-Identifier: Apache-2.0

//! Adder circuits. All return `(carry_out, sum)` where `sum` has the width of
//! the operands.

use serde::{Deserialize, Serialize};

use crate::gate::{AigBitVector, AigOperand};
use crate::gate_builder::GateBuilder;

/// Which adder topology to emit for additions and subtractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdderMapping {
    #[default]
    RippleCarry,
    BrentKung,
    KoggeStone,
}

impl std::fmt::Display for AdderMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdderMapping::RippleCarry => write!(f, "ripple-carry"),
            AdderMapping::BrentKung => write!(f, "brent-kung"),
            AdderMapping::KoggeStone => write!(f, "kogge-stone"),
        }
    }
}

pub fn add_with_mapping(
    mapping: AdderMapping,
    lhs: &AigBitVector,
    rhs: &AigBitVector,
    c_in: AigOperand,
    gb: &mut GateBuilder,
) -> (AigOperand, AigBitVector) {
    match mapping {
        AdderMapping::RippleCarry => add_ripple_carry(lhs, rhs, c_in, gb),
        AdderMapping::BrentKung => add_brent_kung(lhs, rhs, c_in, gb),
        AdderMapping::KoggeStone => add_kogge_stone(lhs, rhs, c_in, gb),
    }
}

pub fn add_ripple_carry(
    lhs: &AigBitVector,
    rhs: &AigBitVector,
    mut c_in: AigOperand,
    gb: &mut GateBuilder,
) -> (AigOperand, AigBitVector) {
    assert_eq!(lhs.get_bit_count(), rhs.get_bit_count());
    let mut gates = Vec::with_capacity(lhs.get_bit_count());
    for i in 0..lhs.get_bit_count() {
        // sum = a ^ b ^ c_in
        // cout = (a & b) | (b & c_in) | (a & c_in)
        let out = gb.add_full_adder(*lhs.get_lsb(i), *rhs.get_lsb(i), c_in);
        gates.push(out.sum);
        c_in = out.carry;
    }
    (c_in, AigBitVector::from_lsb_is_index_0(&gates))
}

fn prefix_update(
    p_i: AigOperand,
    g_i: AigOperand,
    p_k: AigOperand,
    g_k: AigOperand,
    gb: &mut GateBuilder,
) -> (AigOperand, AigOperand) {
    let and = gb.add_and_binary(p_i, g_k);
    let g = gb.add_or_binary(g_i, and);
    let p = gb.add_and_binary(p_i, p_k);
    (p, g)
}

/// Propagate/generate seeds for the parallel-prefix adders.
fn seed_prefix(
    lhs: &AigBitVector,
    rhs: &AigBitVector,
    gb: &mut GateBuilder,
) -> (Vec<AigOperand>, Vec<AigOperand>) {
    let bits = lhs.get_bit_count();
    let xor_bits: Vec<AigOperand> = (0..bits)
        .map(|i| gb.add_xor_binary(*lhs.get_lsb(i), *rhs.get_lsb(i)))
        .collect();
    let g: Vec<AigOperand> = (0..bits)
        .map(|i| gb.add_and_binary(*lhs.get_lsb(i), *rhs.get_lsb(i)))
        .collect();
    (xor_bits, g)
}

fn finish_prefix(
    xor_bits: &[AigOperand],
    p: &[AigOperand],
    g: &[AigOperand],
    c_in: AigOperand,
    gb: &mut GateBuilder,
) -> (AigOperand, AigBitVector) {
    let bits = xor_bits.len();
    let mut carries = Vec::with_capacity(bits + 1);
    carries.push(c_in);
    for i in 0..bits {
        let and = gb.add_and_binary(p[i], c_in);
        carries.push(gb.add_or_binary(g[i], and));
    }
    let sum: Vec<AigOperand> = (0..bits)
        .map(|i| gb.add_xor_binary(xor_bits[i], carries[i]))
        .collect();
    (carries[bits], AigBitVector::from_lsb_is_index_0(&sum))
}

pub fn add_kogge_stone(
    lhs: &AigBitVector,
    rhs: &AigBitVector,
    c_in: AigOperand,
    gb: &mut GateBuilder,
) -> (AigOperand, AigBitVector) {
    assert_eq!(lhs.get_bit_count(), rhs.get_bit_count());
    let bits = lhs.get_bit_count();
    let (xor_bits, mut g) = seed_prefix(lhs, rhs, gb);
    let mut p = xor_bits.clone();
    let mut step = 1;
    while step < bits {
        // Every position reads the previous level, so walk high to low.
        for i in (step..bits).rev() {
            let (p_new, g_new) = prefix_update(p[i], g[i], p[i - step], g[i - step], gb);
            p[i] = p_new;
            g[i] = g_new;
        }
        step *= 2;
    }
    finish_prefix(&xor_bits, &p, &g, c_in, gb)
}

pub fn add_brent_kung(
    lhs: &AigBitVector,
    rhs: &AigBitVector,
    c_in: AigOperand,
    gb: &mut GateBuilder,
) -> (AigOperand, AigBitVector) {
    assert_eq!(lhs.get_bit_count(), rhs.get_bit_count());
    let bits = lhs.get_bit_count();
    let (xor_bits, mut g) = seed_prefix(lhs, rhs, gb);
    let mut p = xor_bits.clone();
    let mut step = 1;
    while step < bits {
        let stride = step * 2;
        for i in (stride - 1..bits).step_by(stride) {
            let (p_new, g_new) = prefix_update(p[i], g[i], p[i - step], g[i - step], gb);
            p[i] = p_new;
            g[i] = g_new;
        }
        step = stride;
    }
    step /= 2;
    while step > 0 {
        let stride = step * 2;
        for i in (stride + step - 1..bits).step_by(stride) {
            let (p_new, g_new) = prefix_update(p[i], g[i], p[i - step], g[i - step], gb);
            p[i] = p_new;
            g[i] = g_new;
        }
        step /= 2;
    }
    finish_prefix(&xor_bits, &p, &g, c_in, gb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate_builder::GateBuilderOptions;
    use crate::gate_sim;
    use bitvec::prelude::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn leaves(gb: &mut GateBuilder, first: usize, count: usize) -> AigBitVector {
        let ops: Vec<AigOperand> = (first..first + count).map(|i| gb.add_leaf(i)).collect();
        AigBitVector::from_lsb_is_index_0(&ops)
    }

    #[test_case(AdderMapping::RippleCarry, 1)]
    #[test_case(AdderMapping::RippleCarry, 4)]
    #[test_case(AdderMapping::KoggeStone, 3)]
    #[test_case(AdderMapping::KoggeStone, 4)]
    #[test_case(AdderMapping::BrentKung, 3)]
    #[test_case(AdderMapping::BrentKung, 5)]
    fn test_adder_exhaustive(mapping: AdderMapping, bits: usize) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut gb = GateBuilder::new(GateBuilderOptions::opt());
        let lhs = leaves(&mut gb, 0, bits);
        let rhs = leaves(&mut gb, bits, bits);
        let c_in = gb.add_leaf(2 * bits);
        let (c_out, sum) = add_with_mapping(mapping, &lhs, &rhs, c_in, &mut gb);
        let mask = (1u64 << bits) - 1;
        for stimulus in 0u64..(1 << (2 * bits + 1)) {
            let mut leaf_values: BitVec = BitVec::repeat(false, 2 * bits + 1);
            for i in 0..(2 * bits + 1) {
                leaf_values.set(i, (stimulus >> i) & 1 == 1);
            }
            let a = stimulus & mask;
            let b = (stimulus >> bits) & mask;
            let c = (stimulus >> (2 * bits)) & 1;
            let want = a + b + c;
            let got_sum = gate_sim::eval_u64(&gb.gates, &leaf_values, &sum);
            let got_carry = gate_sim::eval(&gb.gates, &leaf_values, &[c_out])[0];
            assert_eq!(
                (got_sum, got_carry),
                (want & mask, (want >> bits) & 1 == 1),
                "a={} b={} c={}",
                a,
                b,
                c
            );
        }
    }

    #[test]
    fn test_adder_mapping_serde_names() {
        assert_eq!(AdderMapping::KoggeStone.to_string(), "kogge-stone");
        assert_eq!(AdderMapping::default(), AdderMapping::RippleCarry);
    }
}
