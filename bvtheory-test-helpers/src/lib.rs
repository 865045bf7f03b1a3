// SPDX-License-Identifier: Apache-2.0

pub mod eval;
pub mod mini_core;
pub mod solver;
pub mod term_gen;

pub use eval::{Model, Value};
pub use mini_core::MiniCore;
pub use solver::{Solver, SolverResult};
pub use term_gen::{TermGen, brute_force};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
