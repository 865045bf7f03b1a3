// SPDX-License-Identifier: Apache-2.0

use bvtheory::circuit::Circuit;
use bvtheory::{BvConfig, LBool, Literal, SmtCore, TermManager};
use bvtheory_test_helpers::MiniCore;
use pretty_assertions::assert_eq;

fn core_with_vars(n: usize) -> (MiniCore, Vec<Literal>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut core = MiniCore::new(TermManager::new(), false);
    let lits = (0..n).map(|_| Literal::positive(core.mk_bool_var())).collect();
    (core, lits)
}

#[test]
fn test_wiring_lowers_to_the_input_literals() {
    let (mut core, lits) = core_with_vars(3);
    let mut circuit = Circuit::new(&BvConfig::default());
    let input = circuit.input(&[lits[0], !lits[1], Literal::TRUE, lits[2]]);
    let vars_before = core.num_vars();
    let lowered = circuit.lower(&mut core, &input);
    assert_eq!(lowered, vec![lits[0], !lits[1], Literal::TRUE, lits[2]]);
    assert_eq!(core.num_vars(), vars_before);
}

#[test]
fn test_shared_leaf_keeps_polarity() {
    let (mut core, lits) = core_with_vars(1);
    let mut circuit = Circuit::new(&BvConfig::default());
    let pos = circuit.input_literal(lits[0]);
    let neg = circuit.input_literal(!lits[0]);
    assert_eq!(neg, pos.negate());
    let both = circuit.builder().add_and_binary(pos, neg);
    let lowered = circuit.lower(&mut core, &both.into());
    assert_eq!(lowered, vec![Literal::FALSE]);
}

#[test]
fn test_gates_lower_once_and_evaluate() {
    let (mut core, lits) = core_with_vars(2);
    let mut circuit = Circuit::new(&BvConfig::default());
    let a = circuit.input(&[lits[0]]);
    let b = circuit.input(&[lits[1]]);
    let xor = circuit.builder().add_xor_vec(&a, &b);
    let first = circuit.lower(&mut core, &xor);
    let vars_after_first = core.num_vars();
    let second = circuit.lower(&mut core, &xor);
    assert_eq!(first, second);
    assert_eq!(core.num_vars(), vars_after_first);

    for (va, vb) in [(false, false), (false, true), (true, false), (true, true)] {
        core.push_scope();
        core.decide(if va { lits[0] } else { !lits[0] });
        core.decide(if vb { lits[1] } else { !lits[1] });
        assert!(core.propagate());
        assert_eq!(core.get_assignment(first[0]), LBool::from_bool(va ^ vb));
        core.pop_scope(1);
    }
}
