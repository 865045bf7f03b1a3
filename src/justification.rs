// SPDX-License-Identifier: Apache-2.0

//! Explanations the theory hands to the core together with an assignment or
//! a conflict.

use std::fmt;

use crate::literal::Literal;
use crate::term::TermId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BvJustification {
    /// `consequent` holds because `lhs` and `rhs` are merged and the same
    /// bit of the other term is already `antecedent`.
    BitEq {
        lhs: TermId,
        rhs: TermId,
        consequent: Literal,
        antecedent: Literal,
    },
    /// `lhs == rhs` because both are fully assigned to the same value.
    /// `bits` holds every non-constant bit of both terms in the polarity
    /// that was true when the equality was found.
    FixedEq {
        lhs: TermId,
        rhs: TermId,
        bits: Vec<Literal>,
    },
}

impl BvJustification {
    /// Literals that must be marked during conflict resolution.
    pub fn antecedent_literals(&self) -> Vec<Literal> {
        match self {
            BvJustification::BitEq { antecedent, .. } => {
                if antecedent.is_constant() {
                    Vec::new()
                } else {
                    vec![*antecedent]
                }
            }
            BvJustification::FixedEq { bits, .. } => bits.clone(),
        }
    }

    /// Term equalities the explanation depends on.
    pub fn antecedent_equalities(&self) -> Vec<(TermId, TermId)> {
        match self {
            BvJustification::BitEq { lhs, rhs, .. } => vec![(*lhs, *rhs)],
            BvJustification::FixedEq { .. } => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BvJustification::BitEq { .. } => "bv-bit-eq",
            BvJustification::FixedEq { .. } => "bv-fixed-eq",
        }
    }
}

impl fmt::Display for BvJustification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BvJustification::BitEq {
                lhs,
                rhs,
                consequent,
                antecedent,
            } => write!(
                f,
                "{}: {} because {} and {} = {}",
                self.name(),
                consequent,
                antecedent,
                lhs,
                rhs
            ),
            BvJustification::FixedEq { lhs, rhs, bits } => {
                let bits: Vec<String> = bits.iter().map(|l| l.to_string()).collect();
                write!(f, "{}: {} = {} by [{}]", self.name(), lhs, rhs, bits.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::BoolVar;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bit_eq_skips_constant_antecedent() {
        let js = BvJustification::BitEq {
            lhs: TermId(1),
            rhs: TermId(2),
            consequent: Literal::positive(BoolVar(4)),
            antecedent: Literal::TRUE,
        };
        assert!(js.antecedent_literals().is_empty());
        assert_eq!(js.antecedent_equalities(), vec![(TermId(1), TermId(2))]);
        assert_eq!(js.to_string(), "bv-bit-eq: b4 because true and #1 = #2");
    }

    #[test]
    fn test_fixed_eq_marks_all_bits() {
        let bits = vec![
            Literal::positive(BoolVar(3)),
            Literal::negative(BoolVar(5)),
        ];
        let js = BvJustification::FixedEq {
            lhs: TermId(0),
            rhs: TermId(7),
            bits: bits.clone(),
        };
        assert_eq!(js.antecedent_literals(), bits);
        assert!(js.antecedent_equalities().is_empty());
    }
}
