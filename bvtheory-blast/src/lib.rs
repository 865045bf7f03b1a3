// SPDX-License-Identifier: Apache-2.0

//! Bit-blasting library: an and-inverter graph builder plus the bit-vector
//! operator circuits the theory plugin lowers terms through.

pub mod adders;
pub mod aig_hasher;
pub mod aig_simplify;
pub mod blast;
pub mod equiv_varisat;
pub mod gate;
pub mod gate_builder;
pub mod gate_sim;
pub mod topo;

pub use crate::adders::AdderMapping;
pub use crate::gate::{AigBitVector, AigNode, AigOperand, AigRef};
pub use crate::gate_builder::{GateBuilder, GateBuilderOptions, ReductionKind};
