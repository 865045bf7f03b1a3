// SPDX-License-Identifier: Apache-2.0

//! Propositional variables and literals shared with the SAT core.

use std::fmt;

use serde::Serialize;

/// A propositional variable owned by the core. Variable 0 is reserved as the
/// constant-true variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoolVar(pub u32);

impl BoolVar {
    pub const TRUE_VAR: BoolVar = BoolVar(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BoolVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Literal {
    pub var: BoolVar,
    pub negated: bool,
}

impl Literal {
    pub const TRUE: Literal = Literal {
        var: BoolVar::TRUE_VAR,
        negated: false,
    };
    pub const FALSE: Literal = Literal {
        var: BoolVar::TRUE_VAR,
        negated: true,
    };

    pub fn positive(var: BoolVar) -> Self {
        Literal {
            var,
            negated: false,
        }
    }

    pub fn negative(var: BoolVar) -> Self {
        Literal { var, negated: true }
    }

    pub fn from_bool(value: bool) -> Self {
        if value { Literal::TRUE } else { Literal::FALSE }
    }

    /// True for the two polarities of the reserved constant variable.
    pub fn is_constant(self) -> bool {
        self.var == BoolVar::TRUE_VAR
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (*self == Literal::TRUE, *self == Literal::FALSE) {
            (true, _) => write!(f, "true"),
            (_, true) => write!(f, "false"),
            _ if self.negated => write!(f, "-{}", self.var),
            _ => write!(f, "{}", self.var),
        }
    }
}

/// Three-valued assignment of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LBool {
    False,
    Undef,
    True,
}

impl LBool {
    pub fn from_bool(value: bool) -> Self {
        if value { LBool::True } else { LBool::False }
    }

    pub fn is_undef(self) -> bool {
        self == LBool::Undef
    }

    pub fn negate(self) -> LBool {
        match self {
            LBool::False => LBool::True,
            LBool::Undef => LBool::Undef,
            LBool::True => LBool::False,
        }
    }

    /// Applies the polarity of a literal to the value of its variable.
    pub fn with_polarity(self, negated: bool) -> LBool {
        if negated { self.negate() } else { self }
    }
}

impl fmt::Display for LBool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LBool::False => write!(f, "l_false"),
            LBool::Undef => write!(f, "l_undef"),
            LBool::True => write!(f, "l_true"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_literals() {
        assert_eq!(!Literal::TRUE, Literal::FALSE);
        assert!(Literal::FALSE.is_constant());
        assert!(!Literal::positive(BoolVar(3)).is_constant());
        assert_eq!(Literal::from_bool(false), Literal::FALSE);
    }

    #[test]
    fn test_display() {
        let l = Literal::negative(BoolVar(7));
        assert_eq!(l.to_string(), "-b7");
        assert_eq!((!l).to_string(), "b7");
        assert_eq!(Literal::TRUE.to_string(), "true");
    }

    #[test]
    fn test_lbool_polarity() {
        assert_eq!(LBool::True.with_polarity(true), LBool::False);
        assert_eq!(LBool::Undef.with_polarity(true), LBool::Undef);
        assert_eq!(LBool::from_bool(false).negate(), LBool::True);
    }
}
