// SPDX-License-Identifier: Apache-2.0

//! End-to-end checks through the DPLL driver.

use bvtheory::atoms::Atom;
use bvtheory::{BvConfig, CancelToken, FinalCheck, Op, TermId, TermManager, TheoryBv};
use bvtheory_test_helpers::{MiniCore, Solver, SolverResult, TermGen, brute_force};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

fn solve(
    config: BvConfig,
    build: impl FnOnce(&mut TermManager) -> Vec<TermId>,
) -> (Solver, SolverResult) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut terms = TermManager::new();
    let assertions = build(&mut terms);
    let mut solver = Solver::new(terms, config);
    for a in assertions {
        solver.assert(a);
    }
    let result = solver.check();
    (solver, result)
}

fn expect_sat(solver: &Solver, result: SolverResult) -> bvtheory_test_helpers::Model {
    match result {
        SolverResult::Sat(model) => {
            assert!(solver.satisfies(&model), "model {:?} is wrong", model);
            model
        }
        other => panic!("expected sat, got {:?}", other),
    }
}

#[test]
fn test_sum_determines_operand() {
    let mut ids = Vec::new();
    let (solver, result) = solve(BvConfig::default(), |t| {
        let x = t.mk_const("x", 4).unwrap();
        let y = t.mk_const("y", 4).unwrap();
        let five = t.mk_num(5, 4).unwrap();
        let two = t.mk_num(2, 4).unwrap();
        let sum = t.mk_app(Op::Add, &[x, y]).unwrap();
        ids = vec![x, y];
        vec![t.mk_eq(sum, five).unwrap(), t.mk_eq(x, two).unwrap()]
    });
    let model = expect_sat(&solver, result);
    assert_eq!(model.bvs[&ids[1]], 3);
}

#[test]
fn test_odd_multiplier_is_invertible() {
    let mut x_id = TermId(0);
    let (solver, result) = solve(BvConfig::default(), |t| {
        let x = t.mk_const("x", 4).unwrap();
        let three = t.mk_num(3, 4).unwrap();
        let seven = t.mk_num(7, 4).unwrap();
        let prod = t.mk_app(Op::Mul, &[x, three]).unwrap();
        x_id = x;
        vec![t.mk_eq(prod, seven).unwrap()]
    });
    let model = expect_sat(&solver, result);
    assert_eq!(model.bvs[&x_id], 13);
}

#[test]
fn test_strict_order_cycle_is_unsat() {
    let (_, result) = solve(BvConfig::default(), |t| {
        let x = t.mk_const("x", 3).unwrap();
        let y = t.mk_const("y", 3).unwrap();
        let y_le_x = t.mk_app(Op::ULeq, &[y, x]).unwrap();
        let x_le_y = t.mk_app(Op::ULeq, &[x, y]).unwrap();
        let x_lt_y = t.mk_not(y_le_x).unwrap();
        let y_lt_x = t.mk_not(x_le_y).unwrap();
        vec![x_lt_y, y_lt_x]
    });
    assert_eq!(result, SolverResult::Unsat);
}

#[test]
fn test_disequality_against_transitive_equality_is_unsat() {
    let (_, result) = solve(BvConfig::default(), |t| {
        let x = t.mk_const("x", 3).unwrap();
        let y = t.mk_const("y", 3).unwrap();
        let z = t.mk_const("z", 3).unwrap();
        let xy = t.mk_eq(x, y).unwrap();
        let yz = t.mk_eq(y, z).unwrap();
        let xz = t.mk_eq(x, z).unwrap();
        vec![xy, yz, t.mk_not(xz).unwrap()]
    });
    assert_eq!(result, SolverResult::Unsat);
}

#[test]
fn test_merge_into_complement_class_is_backtracked() {
    // With p false, y = ~x and x = y put x and ~x in one class before x is
    // given a value; the solver has to reject that branch and pick p.
    let mut p_id = TermId(0);
    let (solver, result) = solve(BvConfig::default(), |t| {
        let x = t.mk_const("x", 2).unwrap();
        let y = t.mk_const("y", 2).unwrap();
        let p = t.mk_bool_const("p").unwrap();
        let not_x = t.mk_app(Op::BvNot, &[x]).unwrap();
        let one = t.mk_num(1, 2).unwrap();
        let y_is_not_x = t.mk_eq(y, not_x).unwrap();
        let x_is_one = t.mk_eq(x, one).unwrap();
        p_id = p;
        vec![
            t.mk_app(Op::Or, &[p, y_is_not_x]).unwrap(),
            t.mk_app(Op::Or, &[p, x_is_one]).unwrap(),
            t.mk_eq(x, y).unwrap(),
        ]
    });
    let model = expect_sat(&solver, result);
    assert!(model.bools[&p_id]);
}

#[test]
fn test_pigeonhole_over_two_bit_values() {
    // Five pairwise distinct 2-bit values cannot exist.
    let (solver, result) = solve(BvConfig::default(), |t| {
        let xs: Vec<TermId> = (0..5)
            .map(|i| t.mk_const(&format!("x{}", i), 2).unwrap())
            .collect();
        let mut assertions = Vec::new();
        for i in 0..xs.len() {
            for j in i + 1..xs.len() {
                let eq = t.mk_eq(xs[i], xs[j]).unwrap();
                assertions.push(t.mk_not(eq).unwrap());
            }
        }
        assertions
    });
    assert_eq!(result, SolverResult::Unsat);
    assert!(solver.theory.stats().diseq_dynamic > 0);
}

#[test]
fn test_bit_selection_and_mkbv_agree() {
    let (solver, result) = solve(BvConfig::default(), |t| {
        let x = t.mk_const("x", 3).unwrap();
        let bits: Vec<TermId> = (0..3)
            .map(|i| t.mk_app(Op::Bit2Bool(i), &[x]).unwrap())
            .collect();
        let rebuilt = t.mk_app(Op::MkBv, &bits).unwrap();
        let le = t.mk_app(Op::ULeq, &[x, rebuilt]).unwrap();
        let six = t.mk_num(6, 3).unwrap();
        vec![le, t.mk_eq(rebuilt, six).unwrap()]
    });
    let model = expect_sat(&solver, result);
    assert_eq!(model.bvs.values().copied().collect::<Vec<u64>>(), vec![6]);
}

#[test]
fn test_order_atom_inside_mkbv() {
    let (solver, result) = solve(BvConfig::default(), |t| {
        let x = t.mk_const("x", 2).unwrap();
        let y = t.mk_const("y", 2).unwrap();
        let le = t.mk_app(Op::ULeq, &[x, y]).unwrap();
        let as_bv = t.mk_app(Op::MkBv, &[le]).unwrap();
        let zero = t.mk_num(0, 1).unwrap();
        let two = t.mk_num(2, 2).unwrap();
        vec![t.mk_eq(as_bv, zero).unwrap(), t.mk_eq(y, two).unwrap()]
    });
    let model = expect_sat(&solver, result);
    assert_eq!(model.bvs.values().copied().max(), Some(3));
}

#[test]
fn test_blast_limit_gives_up_and_scope_pop_clears_it() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut terms = TermManager::new();
    let x = terms.mk_const("x", 8).unwrap();
    let y = terms.mk_const("y", 8).unwrap();
    let prod = terms.mk_app(Op::Mul, &[x, y]).unwrap();
    let mut core = MiniCore::new(terms, false);
    let config = BvConfig::from_toml_str("blast_max_size = 4").unwrap();
    let mut theory = TheoryBv::new(config);

    assert_eq!(theory.final_check_eh(&core), FinalCheck::Done);
    theory.push_scope_eh();
    assert!(!theory.internalize_term(&mut core, prod));
    assert_eq!(theory.get_var(&mut core, prod), None);
    assert!(theory.approximated());
    assert_eq!(theory.final_check_eh(&core), FinalCheck::GiveUp);

    theory.pop_scope_eh(1);
    assert!(!theory.approximated());
    assert_eq!(theory.final_check_eh(&core), FinalCheck::Done);
}

#[test]
fn test_wide_formula_is_unknown() {
    let (_, result) = solve(
        BvConfig {
            blast_max_size: Some(4),
            ..BvConfig::default()
        },
        |t| {
            let x = t.mk_const("x", 6).unwrap();
            let one = t.mk_num(1, 6).unwrap();
            vec![t.mk_eq(x, one).unwrap()]
        },
    );
    assert_eq!(result, SolverResult::Unknown);
}

#[test]
fn test_cancelled_search_is_unknown() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut terms = TermManager::new();
    let x = terms.mk_const("x", 4).unwrap();
    let y = terms.mk_const("y", 4).unwrap();
    let eq = terms.mk_eq(x, y).unwrap();
    let cancel = CancelToken::new();
    let mut solver = Solver::with_options(terms, BvConfig::default(), false, cancel.clone());
    solver.assert(eq);
    cancel.cancel();
    assert_eq!(solver.check(), SolverResult::Unknown);

    let z = solver.terms_mut().mk_const("z", 4).unwrap();
    assert_eq!(solver.theory.get_var(&mut solver.core, z), None);
}

#[test_case(false, 2; "eager without relevancy")]
#[test_case(true, 0; "lazy with relevancy")]
fn test_order_atom_axioms(lazy_with_relevancy: bool, axioms_at_internalize: usize) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut terms = TermManager::new();
    let x = terms.mk_const("x", 4).unwrap();
    let y = terms.mk_const("y", 4).unwrap();
    let le = terms.mk_app(Op::SLeq, &[x, y]).unwrap();
    let mut core = MiniCore::new(terms, lazy_with_relevancy);
    let config = BvConfig {
        lazy_order_atoms: lazy_with_relevancy,
        ..BvConfig::default()
    };
    let mut theory = TheoryBv::new(config);
    let lit = theory.internalize_atom(&mut core, le).unwrap();
    assert_eq!(core.num_axioms(), axioms_at_internalize);
    let Some(Atom::Order { var, def, .. }) = theory.atom(lit.var).cloned() else {
        panic!("expected an order atom");
    };
    assert_eq!(var, lit);
    assert!(!core.is_relevant(def.var));

    theory.push_scope_eh();
    theory.relevant_eh(&mut core, le);
    assert!(core.is_relevant(def.var));
    assert_eq!(core.num_axioms(), 2);
    // Shared subterms make the core report relevance repeatedly.
    theory.relevant_eh(&mut core, le);
    assert_eq!(core.num_axioms(), 2);

    // Lazily added clauses belong to the popped scope and are asserted again.
    theory.pop_scope_eh(1);
    theory.relevant_eh(&mut core, le);
    let expected = if lazy_with_relevancy { 4 } else { 2 };
    assert_eq!(core.num_axioms(), expected);
    // Asking again reuses the atom.
    assert_eq!(theory.internalize_atom(&mut core, le), Some(lit));
}

#[test]
fn test_relevant_bv_term_marks_its_bits() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut terms = TermManager::new();
    let x = terms.mk_const("x", 3).unwrap();
    let mut core = MiniCore::new(terms, true);
    let mut theory = TheoryBv::new(BvConfig::default());
    let v = theory.get_var(&mut core, x).unwrap();
    theory.relevant_eh(&mut core, x);
    for bit in theory.bits(v) {
        assert!(core.is_relevant(bit.var));
    }
}

fn check_random_formulas(config: BvConfig, relevancy: bool, seed: u64, count: usize) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut seen = (0, 0);
    for _ in 0..count {
        let width = rng.gen_range(1..=3);
        let mut terms = TermManager::new();
        let mut generator = TermGen::new(StdRng::seed_from_u64(rng.r#gen()), &mut terms, width, 2);
        let formulas: Vec<TermId> = (0..2).map(|_| generator.boolean(2)).collect();
        let (consts, bool_consts) = (generator.consts.clone(), generator.bool_consts.clone());
        let expected = brute_force(&terms, &formulas, &consts, &bool_consts);
        let shown: Vec<String> = formulas.iter().map(|f| terms.display(*f)).collect();
        log::info!("formulas: {:?}", shown);

        let mut solver = Solver::with_options(terms, config.clone(), relevancy, CancelToken::new());
        for f in &formulas {
            solver.assert(*f);
        }
        match solver.check() {
            SolverResult::Sat(model) => {
                assert!(solver.satisfies(&model), "{:?}: bad model {:?}", shown, model);
                assert!(expected.is_some(), "{:?}", shown);
                seen.0 += 1;
            }
            SolverResult::Unsat => {
                assert_eq!(expected, None, "{:?} claimed unsat", shown);
                seen.1 += 1;
            }
            SolverResult::Unknown => panic!("{:?}: unknown without a blasting limit", shown),
        }
    }
    log::info!("sat: {}, unsat: {}", seen.0, seen.1);
}

#[test]
fn test_random_formulas_agree_with_enumeration() {
    check_random_formulas(BvConfig::default(), false, 7, 40);
}

#[test]
fn test_random_formulas_with_lazy_order_atoms() {
    let config = BvConfig::from_toml_str("lazy_order_atoms = true\n").unwrap();
    check_random_formulas(config, true, 11, 25);
}

#[test_case("adder_mapping = \"kogge-stone\"\n")]
#[test_case("adder_mapping = \"brent-kung\"\nhash = false\n")]
#[test_case("fold = false\n")]
fn test_random_formulas_under_config(text: &str) {
    let config = BvConfig::from_toml_str(text).unwrap();
    check_random_formulas(config, false, 23, 15);
}
