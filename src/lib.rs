// SPDX-License-Identifier: Apache-2.0

//! Bit-vector theory plugin for a DPLL(T) SMT core.
//!
//! Bit-vector terms are blasted into boolean gates owned by the core (see
//! [`SmtCore`]); [`TheoryBv`] keeps the bits of equal terms consistent,
//! expands disequalities, and reports terms that become equal by value.

pub mod atoms;
pub mod cancel;
pub mod circuit;
pub mod config;
pub mod core;
pub mod error;
pub mod fixed_values;
pub mod justification;
pub mod literal;
pub mod operators;
pub mod stats;
pub mod term;
pub mod theory_bv;
pub mod trail;
pub mod union_find;
pub mod value;
pub mod var_store;
pub mod zero_one;

pub use crate::cancel::CancelToken;
pub use crate::config::BvConfig;
pub use crate::core::{FinalCheck, JustificationId, SmtCore};
pub use crate::error::BvError;
pub use crate::justification::BvJustification;
pub use crate::literal::{BoolVar, LBool, Literal};
pub use crate::stats::BvStats;
pub use crate::term::{Op, Sort, Term, TermId, TermManager};
pub use crate::theory_bv::TheoryBv;
pub use crate::value::BvValue;
pub use crate::var_store::TheoryVar;
pub use bvtheory_blast::AdderMapping;
