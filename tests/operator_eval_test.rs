// SPDX-License-Identifier: Apache-2.0

//! Every blastable operator, applied to numerals, must fold to the value the
//! reference evaluator computes.

use bvtheory::{AdderMapping, BvConfig, LBool, Op, SmtCore, TermId, TermManager, TheoryBv};
use bvtheory_test_helpers::MiniCore;
use bvtheory_test_helpers::eval::{self, Model, Value};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

const SAMPLES_PER_OP: usize = 12;

#[derive(Debug, Clone, Copy)]
enum Shape {
    /// Same-width arguments, same-width result.
    Uniform(usize),
    /// Two arguments of independent widths.
    Concat,
    /// One argument; the operator gets parameters drawn from its width.
    Param,
    /// Boolean arguments.
    Bools(usize),
}

fn mk_op(rng: &mut StdRng, op: &Op, width: usize) -> Op {
    match op {
        Op::SignExt(_) => Op::SignExt(rng.gen_range(0..4)),
        Op::ZeroExt(_) => Op::ZeroExt(rng.gen_range(0..4)),
        Op::RotateLeft(_) => Op::RotateLeft(rng.gen_range(0..2 * width)),
        Op::RotateRight(_) => Op::RotateRight(rng.gen_range(0..2 * width)),
        Op::Extract { .. } => {
            let low = rng.gen_range(0..width);
            let high = rng.gen_range(low..width);
            Op::Extract { high, low }
        }
        Op::Bit2Bool(_) => Op::Bit2Bool(rng.gen_range(0..width)),
        other => other.clone(),
    }
}

fn num(rng: &mut StdRng, terms: &mut TermManager, width: usize) -> TermId {
    let value = rng.gen_range(0..(1u64 << width));
    terms.mk_num(value, width).unwrap()
}

fn check_op(op: Op, shape: Shape, mapping: AdderMapping, seed: u64) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut terms = TermManager::new();
    let mut cases = Vec::new();
    for _ in 0..SAMPLES_PER_OP {
        let width = rng.gen_range(1..=8);
        let op = mk_op(&mut rng, &op, width);
        let args: Vec<TermId> = match shape {
            Shape::Uniform(n) => (0..n).map(|_| num(&mut rng, &mut terms, width)).collect(),
            Shape::Concat => {
                let other = rng.gen_range(1..=8);
                vec![
                    num(&mut rng, &mut terms, width),
                    num(&mut rng, &mut terms, other),
                ]
            }
            Shape::Param => vec![num(&mut rng, &mut terms, width)],
            Shape::Bools(n) => (0..n)
                .map(|_| {
                    if rng.gen_bool(0.5) {
                        terms.mk_true()
                    } else {
                        terms.mk_false()
                    }
                })
                .collect(),
        };
        cases.push(terms.mk_app(op, &args).unwrap());
    }

    let mut core = MiniCore::new(terms, false);
    let config = BvConfig {
        adder_mapping: mapping,
        ..BvConfig::default()
    };
    let mut theory = TheoryBv::new(config);
    for term in cases {
        let want = eval::eval(core.terms(), term, &Model::default());
        let got = match want {
            Value::Bv { width, .. } => {
                let v = theory.get_var(&mut core, term).unwrap();
                let value = theory.get_fixed_value(&core, v).expect("numeral arguments fold");
                assert_eq!(value.width(), width);
                Value::Bv {
                    value: value.to_u64().unwrap(),
                    width,
                }
            }
            Value::Bool(_) => {
                let lit = theory.internalize_atom(&mut core, term).unwrap();
                assert!(core.propagate());
                match core.get_assignment(lit) {
                    LBool::True => Value::Bool(true),
                    LBool::False => Value::Bool(false),
                    LBool::Undef => panic!("{} did not fold", core.terms().display(term)),
                }
            }
        };
        assert_eq!(got, want, "{}", core.terms().display(term));
    }
    assert!(!theory.approximated());
}

#[test_case(Op::Add, Shape::Uniform(2))]
#[test_case(Op::Add, Shape::Uniform(3))]
#[test_case(Op::Mul, Shape::Uniform(2))]
#[test_case(Op::Mul, Shape::Uniform(3))]
#[test_case(Op::UDivI, Shape::Uniform(2))]
#[test_case(Op::URemI, Shape::Uniform(2))]
#[test_case(Op::SDivI, Shape::Uniform(2))]
#[test_case(Op::SRemI, Shape::Uniform(2))]
#[test_case(Op::SModI, Shape::Uniform(2))]
#[test_case(Op::BvAnd, Shape::Uniform(3))]
#[test_case(Op::BvOr, Shape::Uniform(3))]
#[test_case(Op::BvXor, Shape::Uniform(3))]
#[test_case(Op::BvNand, Shape::Uniform(3))]
#[test_case(Op::BvNor, Shape::Uniform(3))]
#[test_case(Op::BvXnor, Shape::Uniform(3))]
#[test_case(Op::BvNot, Shape::Uniform(1))]
#[test_case(Op::Concat, Shape::Concat)]
#[test_case(Op::SignExt(0), Shape::Param)]
#[test_case(Op::ZeroExt(0), Shape::Param)]
#[test_case(Op::Extract { high: 0, low: 0 }, Shape::Param)]
#[test_case(Op::RedOr, Shape::Uniform(1))]
#[test_case(Op::RedAnd, Shape::Uniform(1))]
#[test_case(Op::Comp, Shape::Uniform(2))]
#[test_case(Op::Shl, Shape::Uniform(2))]
#[test_case(Op::LShr, Shape::Uniform(2))]
#[test_case(Op::AShr, Shape::Uniform(2))]
#[test_case(Op::RotateLeft(0), Shape::Param)]
#[test_case(Op::RotateRight(0), Shape::Param)]
#[test_case(Op::ExtRotateLeft, Shape::Uniform(2))]
#[test_case(Op::ExtRotateRight, Shape::Uniform(2))]
#[test_case(Op::MkBv, Shape::Bools(5))]
#[test_case(Op::Bit2Bool(0), Shape::Param)]
#[test_case(Op::ULeq, Shape::Uniform(2))]
#[test_case(Op::SLeq, Shape::Uniform(2))]
#[test_case(Op::UMulNoOvfl, Shape::Uniform(2))]
#[test_case(Op::SMulNoOvfl, Shape::Uniform(2))]
#[test_case(Op::SMulNoUdfl, Shape::Uniform(2))]
#[test_case(Op::Xor3, Shape::Bools(3))]
#[test_case(Op::Carry, Shape::Bools(3))]
fn test_operator_matches_evaluator(op: Op, shape: Shape) {
    check_op(op, shape, AdderMapping::RippleCarry, 0xb17);
}

#[test_case(AdderMapping::BrentKung)]
#[test_case(AdderMapping::KoggeStone)]
fn test_arithmetic_under_prefix_adders(mapping: AdderMapping) {
    for (i, op) in [Op::Add, Op::Mul, Op::SDivI, Op::SModI].into_iter().enumerate() {
        check_op(op, Shape::Uniform(2), mapping, 100 + i as u64);
    }
}

#[test]
fn test_division_by_zero_family_is_uninterpreted() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut terms = TermManager::new();
    let x = terms.mk_num(6, 4).unwrap();
    let zero = terms.mk_num(0, 4).unwrap();
    let div0 = terms.mk_app(Op::UDiv0, &[x, zero]).unwrap();
    let mut core = MiniCore::new(terms, false);
    let mut theory = TheoryBv::new(BvConfig::default());
    assert!(!theory.internalize_term(&mut core, div0));
    let v = theory.get_var(&mut core, div0).unwrap();
    assert_eq!(theory.get_fixed_value(&core, v), None);
    assert!(theory.bits(v).iter().all(|lit| !lit.is_constant()));
}
