// SPDX-License-Identifier: Apache-2.0

use bvtheory_blast::adders::{add_brent_kung, add_kogge_stone, add_ripple_carry};
use bvtheory_blast::equiv_varisat::{EquivResult, prove_equiv};
use bvtheory_blast::{
    AdderMapping, AigBitVector, AigOperand, GateBuilder, GateBuilderOptions, blast, gate_sim,
};
use test_case::test_case;

fn leaves(gb: &mut GateBuilder, first: usize, count: usize) -> AigBitVector {
    let ops: Vec<AigOperand> = (first..first + count).map(|i| gb.add_leaf(i)).collect();
    AigBitVector::from_lsb_is_index_0(&ops)
}

/// Appends the carry out as the MSB so the proof covers it too.
fn with_carry((c_out, sum): (AigOperand, AigBitVector)) -> AigBitVector {
    AigBitVector::concat(c_out.into(), sum)
}

#[test_case(1)]
#[test_case(2)]
#[test_case(3)]
#[test_case(5)]
#[test_case(8)]
#[test_case(13)]
#[test_case(16)]
fn test_prefix_adders_match_ripple_carry(bits: usize) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut gb = GateBuilder::new(GateBuilderOptions::no_opt());
    let lhs = leaves(&mut gb, 0, bits);
    let rhs = leaves(&mut gb, bits, bits);
    let c_in = gb.add_leaf(2 * bits);
    let ripple = with_carry(add_ripple_carry(&lhs, &rhs, c_in, &mut gb));
    let kogge_stone = with_carry(add_kogge_stone(&lhs, &rhs, c_in, &mut gb));
    let brent_kung = with_carry(add_brent_kung(&lhs, &rhs, c_in, &mut gb));
    assert_eq!(
        prove_equiv(&gb.gates, &ripple, &kogge_stone).unwrap(),
        EquivResult::Proved,
        "kogge stone and ripple carry should be equivalent"
    );
    assert_eq!(
        prove_equiv(&gb.gates, &ripple, &brent_kung).unwrap(),
        EquivResult::Proved,
        "brent kung and ripple carry should be equivalent"
    );
}

#[test_case(AdderMapping::BrentKung)]
#[test_case(AdderMapping::KoggeStone)]
fn test_multiplier_mapping_independent(mapping: AdderMapping) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut gb = GateBuilder::new(GateBuilderOptions::opt());
    let lhs = leaves(&mut gb, 0, 6);
    let rhs = leaves(&mut gb, 6, 6);
    let reference = blast::gatify_umul(&mut gb, AdderMapping::RippleCarry, &lhs, &rhs);
    let mapped = blast::gatify_umul(&mut gb, mapping, &lhs, &rhs);
    assert_eq!(
        prove_equiv(&gb.gates, &reference, &mapped).unwrap(),
        EquivResult::Proved
    );
}

#[test]
fn test_sub_is_not_add() {
    let mut gb = GateBuilder::new(GateBuilderOptions::opt());
    let lhs = leaves(&mut gb, 0, 4);
    let rhs = leaves(&mut gb, 4, 4);
    let sum = blast::gatify_add(&mut gb, AdderMapping::KoggeStone, &lhs, &rhs);
    let difference = blast::gatify_sub(&mut gb, AdderMapping::KoggeStone, &lhs, &rhs);
    let EquivResult::Disproved(cex) = prove_equiv(&gb.gates, &sum, &difference).unwrap() else {
        panic!("add and sub should differ");
    };
    assert_ne!(
        gate_sim::eval_u64(&gb.gates, &cex, &sum),
        gate_sim::eval_u64(&gb.gates, &cex, &difference)
    );
}
