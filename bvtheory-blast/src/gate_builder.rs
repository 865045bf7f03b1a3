// SPDX-License-Identifier: Apache-2.0

//! Incremental construction of an and-inverter graph.
//!
//! Node 0 is the constant false; true is its negation. Free booleans are
//! added as leaves whose ids mean whatever the caller wants. With `fold`
//! set the builder simplifies against constants and a few local patterns;
//! with `hash` set structurally equal AND gates are shared. Turning both off
//! is useful in tests that check the raw shape of a circuit.
//!
//! ```
//! use bvtheory_blast::gate_builder::{GateBuilder, GateBuilderOptions};
//!
//! let mut builder = GateBuilder::new(GateBuilderOptions::opt());
//! let a = builder.add_leaf(0);
//! let b = builder.add_leaf(1);
//! let ab = builder.add_and_binary(a, b);
//! assert_eq!(builder.add_and_binary(b, a), ab);
//! assert_eq!(builder.gates.len(), 4);
//! ```

use bitvec::slice::BitSlice;

use crate::aig_hasher::AigHasher;
use crate::aig_simplify;
use crate::gate::{AigBitVector, AigNode, AigOperand, AigRef};

/// Shape of the tree used to combine many operands with one binary gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionKind {
    Linear,
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullAdderOutput {
    pub sum: AigOperand,
    pub carry: AigOperand,
}

#[derive(Debug, Clone, Copy)]
pub struct GateBuilderOptions {
    pub fold: bool,
    pub hash: bool,
}

impl GateBuilderOptions {
    pub fn opt() -> Self {
        Self {
            fold: true,
            hash: true,
        }
    }

    pub fn no_opt() -> Self {
        Self {
            fold: false,
            hash: false,
        }
    }
}

type BinaryGate = fn(&mut GateBuilder, AigOperand, AigOperand) -> AigOperand;

pub struct GateBuilder {
    pub gates: Vec<AigNode>,
    pub options: GateBuilderOptions,
    hasher: Option<AigHasher>,
}

impl GateBuilder {
    pub fn new(options: GateBuilderOptions) -> Self {
        Self {
            gates: vec![AigNode::Literal(false)],
            options,
            hasher: options.hash.then(AigHasher::new),
        }
    }

    pub fn get_false(&self) -> AigOperand {
        AigRef { id: 0 }.into()
    }

    pub fn get_true(&self) -> AigOperand {
        self.get_false().negate()
    }

    /// The value of `operand` when it is one of the two constants.
    fn constant_value(operand: AigOperand) -> Option<bool> {
        (operand.node.id == 0).then_some(operand.negated)
    }

    pub fn is_known_false(&self, operand: AigOperand) -> bool {
        Self::constant_value(operand) == Some(false)
    }

    pub fn is_known_true(&self, operand: AigOperand) -> bool {
        Self::constant_value(operand) == Some(true)
    }

    /// Adds a free boolean. Callers add each `id` once and keep their own
    /// id-to-operand map.
    pub fn add_leaf(&mut self, id: usize) -> AigOperand {
        self.gates.push(AigNode::Leaf { id });
        AigRef {
            id: self.gates.len() - 1,
        }
        .into()
    }

    /// Constant bits of `value`, index 0 first.
    pub fn add_literal(&self, value: &BitSlice) -> AigBitVector {
        let bits: Vec<AigOperand> = value
            .iter()
            .map(|bit| if *bit { self.get_true() } else { self.get_false() })
            .collect();
        AigBitVector::from_lsb_is_index_0(&bits)
    }

    pub fn replicate(&self, arg: AigOperand, bit_count: usize) -> AigBitVector {
        AigBitVector::from_lsb_is_index_0(&vec![arg; bit_count])
    }

    pub fn add_and_binary(&mut self, lhs: AigOperand, rhs: AigOperand) -> AigOperand {
        if self.options.fold {
            match (Self::constant_value(lhs), Self::constant_value(rhs)) {
                (Some(false), _) | (_, Some(false)) => return self.get_false(),
                (Some(true), _) => return rhs,
                (_, Some(true)) => return lhs,
                _ => {}
            }
        }
        let gate_ref = AigRef {
            id: self.gates.len(),
        };
        self.gates.push(AigNode::And2 { a: lhs, b: rhs });
        if self.options.fold {
            if let Some(simplified) = aig_simplify::operand_simplify(gate_ref, self) {
                self.gates.pop();
                return simplified;
            }
        }
        if let Some(hasher) = self.hasher.as_mut() {
            let key = hasher.key_for_and(lhs, rhs, &self.gates);
            if let Some(existing) = hasher.lookup(&key) {
                self.gates.pop();
                return existing.into();
            }
            hasher.insert(key, gate_ref);
        }
        gate_ref.into()
    }

    pub fn add_not(&mut self, arg: AigOperand) -> AigOperand {
        arg.negate()
    }

    pub fn add_or_binary(&mut self, lhs: AigOperand, rhs: AigOperand) -> AigOperand {
        let nor = self.add_and_binary(lhs.negate(), rhs.negate());
        nor.negate()
    }

    /// `(a & !b) | (!a & b)`, built from two AND gates and one OR.
    pub fn add_xor_binary(&mut self, lhs: AigOperand, rhs: AigOperand) -> AigOperand {
        if self.options.fold {
            match (Self::constant_value(lhs), Self::constant_value(rhs)) {
                (Some(l), _) => return if l { rhs.negate() } else { rhs },
                (_, Some(r)) => return if r { lhs.negate() } else { lhs },
                _ if lhs == rhs => return self.get_false(),
                _ if lhs == rhs.negate() => return self.get_true(),
                _ => {}
            }
        }
        let only_rhs = self.add_and_binary(lhs.negate(), rhs);
        let only_lhs = self.add_and_binary(lhs, rhs.negate());
        self.add_or_binary(only_rhs, only_lhs)
    }

    pub fn add_xnor(&mut self, a: AigOperand, b: AigOperand) -> AigOperand {
        self.add_xor_binary(a, b).negate()
    }

    /// `selector ? on_true : on_false`
    pub fn add_mux2(
        &mut self,
        selector: AigOperand,
        on_true: AigOperand,
        on_false: AigOperand,
    ) -> AigOperand {
        if self.options.fold {
            if let Some(s) = Self::constant_value(selector) {
                return if s { on_true } else { on_false };
            }
            if on_true == on_false {
                return on_true;
            }
            match (Self::constant_value(on_true), Self::constant_value(on_false)) {
                (Some(true), Some(false)) => return selector,
                (Some(false), Some(true)) => return selector.negate(),
                _ => {}
            }
        }
        let when_false = self.add_and_binary(selector.negate(), on_false);
        let when_true = self.add_and_binary(selector, on_true);
        self.add_or_binary(when_false, when_true)
    }

    /// The 3-input majority function, i.e. the carry out of a full adder.
    pub fn add_maj3(&mut self, a: AigOperand, b: AigOperand, c: AigOperand) -> AigOperand {
        let pairs = [
            self.add_and_binary(a, b),
            self.add_and_binary(a, c),
            self.add_and_binary(b, c),
        ];
        self.add_or_nary(&pairs, ReductionKind::Linear)
    }

    pub fn add_full_adder(
        &mut self,
        a: AigOperand,
        b: AigOperand,
        c: AigOperand,
    ) -> FullAdderOutput {
        FullAdderOutput {
            sum: self.reduce(&[a, b, c], GateBuilder::add_xor_binary, ReductionKind::Linear),
            carry: self.add_maj3(a, b, c),
        }
    }

    /// Left fold of `args` through `gate`.
    pub fn linear_reduce(&mut self, args: &[AigOperand], gate: BinaryGate) -> AigOperand {
        let [first, rest @ ..] = args else {
            panic!("reduction over an empty operand list");
        };
        rest.iter().fold(*first, |acc, arg| gate(self, acc, *arg))
    }

    /// Balanced reduction: each half is reduced recursively and the two
    /// results are combined.
    pub fn tree_reduce(&mut self, args: &[AigOperand], gate: BinaryGate) -> AigOperand {
        match args {
            [] => panic!("reduction over an empty operand list"),
            [only] => *only,
            _ => {
                let (low, high) = args.split_at(args.len() / 2);
                log::trace!("tree_reduce: {} = {} + {}", args.len(), low.len(), high.len());
                let low = self.tree_reduce(low, gate);
                let high = self.tree_reduce(high, gate);
                gate(self, low, high)
            }
        }
    }

    pub fn reduce(
        &mut self,
        args: &[AigOperand],
        gate: BinaryGate,
        reduction_kind: ReductionKind,
    ) -> AigOperand {
        match reduction_kind {
            ReductionKind::Linear => self.linear_reduce(args, gate),
            ReductionKind::Tree => self.tree_reduce(args, gate),
        }
    }

    /// Folds constants out of an AND/OR operand list. `absorbing` is the
    /// constant that decides the result on its own.
    fn fold_operands(
        &self,
        args: &[AigOperand],
        absorbing: bool,
    ) -> Result<Vec<AigOperand>, AigOperand> {
        let absorbing_operand = if absorbing { self.get_true() } else { self.get_false() };
        if args.contains(&absorbing_operand) {
            return Err(absorbing_operand);
        }
        let kept: Vec<AigOperand> = args
            .iter()
            .copied()
            .filter(|arg| Self::constant_value(*arg).is_none())
            .collect();
        if kept.is_empty() {
            return Err(absorbing_operand.negate());
        }
        Ok(kept)
    }

    pub fn add_and_nary(
        &mut self,
        args: &[AigOperand],
        reduction_kind: ReductionKind,
    ) -> AigOperand {
        assert!(!args.is_empty(), "and over an empty operand list");
        let args = if self.options.fold {
            match self.fold_operands(args, false) {
                Ok(kept) => kept,
                Err(decided) => return decided,
            }
        } else {
            args.to_vec()
        };
        self.reduce(&args, GateBuilder::add_and_binary, reduction_kind)
    }

    pub fn add_or_nary(
        &mut self,
        args: &[AigOperand],
        reduction_kind: ReductionKind,
    ) -> AigOperand {
        assert!(!args.is_empty(), "or over an empty operand list");
        let args = if self.options.fold {
            match self.fold_operands(args, true) {
                Ok(kept) => kept,
                Err(decided) => return decided,
            }
        } else {
            args.to_vec()
        };
        self.reduce(&args, GateBuilder::add_or_binary, reduction_kind)
    }

    pub fn add_and_reduce(
        &mut self,
        bits: &AigBitVector,
        reduction_kind: ReductionKind,
    ) -> AigOperand {
        self.add_and_nary(&bits.to_vec(), reduction_kind)
    }

    pub fn add_or_reduce(
        &mut self,
        bits: &AigBitVector,
        reduction_kind: ReductionKind,
    ) -> AigOperand {
        self.add_or_nary(&bits.to_vec(), reduction_kind)
    }

    /// True when any bit of `bits` is set.
    pub fn add_nez(&mut self, bits: &AigBitVector, reduction_kind: ReductionKind) -> AigOperand {
        self.add_or_reduce(bits, reduction_kind)
    }

    /// True when every bit of `bits` is clear.
    pub fn add_ez(&mut self, bits: &AigBitVector, reduction_kind: ReductionKind) -> AigOperand {
        self.add_nez(bits, reduction_kind).negate()
    }

    /// Applies `gate` to each pair of same-index bits.
    fn zip_with(&mut self, a: &AigBitVector, b: &AigBitVector, gate: BinaryGate) -> AigBitVector {
        assert_eq!(a.get_bit_count(), b.get_bit_count(), "bit count mismatch");
        let bits: Vec<AigOperand> = a
            .iter_lsb_to_msb()
            .zip(b.iter_lsb_to_msb())
            .map(|(x, y)| gate(self, *x, *y))
            .collect();
        AigBitVector::from_lsb_is_index_0(&bits)
    }

    pub fn add_and_vec(&mut self, a: &AigBitVector, b: &AigBitVector) -> AigBitVector {
        self.zip_with(a, b, GateBuilder::add_and_binary)
    }

    pub fn add_or_vec(&mut self, a: &AigBitVector, b: &AigBitVector) -> AigBitVector {
        self.zip_with(a, b, GateBuilder::add_or_binary)
    }

    pub fn add_xor_vec(&mut self, a: &AigBitVector, b: &AigBitVector) -> AigBitVector {
        self.zip_with(a, b, GateBuilder::add_xor_binary)
    }

    pub fn add_xnor_vec(&mut self, a: &AigBitVector, b: &AigBitVector) -> AigBitVector {
        self.zip_with(a, b, GateBuilder::add_xnor)
    }

    pub fn add_not_vec(&mut self, bits: &AigBitVector) -> AigBitVector {
        let negated: Vec<AigOperand> = bits.iter_lsb_to_msb().map(|bit| bit.negate()).collect();
        AigBitVector::from_lsb_is_index_0(&negated)
    }

    pub fn add_mux2_vec(
        &mut self,
        selector: &AigOperand,
        on_true: &AigBitVector,
        on_false: &AigBitVector,
    ) -> AigBitVector {
        let selector = *selector;
        assert_eq!(on_true.get_bit_count(), on_false.get_bit_count());
        let bits: Vec<AigOperand> = on_true
            .iter_lsb_to_msb()
            .zip(on_false.iter_lsb_to_msb())
            .map(|(t, f)| self.add_mux2(selector, *t, *f))
            .collect();
        AigBitVector::from_lsb_is_index_0(&bits)
    }

    /// Single bit that is set when `a` and `b` are equal.
    pub fn add_eq_vec(
        &mut self,
        a: &AigBitVector,
        b: &AigBitVector,
        reduction_kind: ReductionKind,
    ) -> AigOperand {
        let same = self.add_xnor_vec(a, b);
        self.add_and_reduce(&same, reduction_kind)
    }
}
