// SPDX-License-Identifier: Apache-2.0

use crate::term::Sort;

/// Recoverable failures: malformed terms and configuration text. Theory
/// conflicts and approximation are reported through the core instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BvError {
    Config(String),
    ZeroWidth,
    Arity {
        op: String,
        expected: String,
        got: usize,
    },
    SortMismatch {
        op: String,
        expected: Sort,
        got: Sort,
    },
    ExtractBounds {
        high: usize,
        low: usize,
        width: usize,
    },
}

impl std::fmt::Display for BvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BvError::Config(msg) => write!(f, "bv config error: {}", msg),
            BvError::ZeroWidth => write!(f, "bit-vector sorts must be at least one bit wide"),
            BvError::Arity { op, expected, got } => {
                write!(f, "{} expects {} arguments; got {}", op, expected, got)
            }
            BvError::SortMismatch { op, expected, got } => {
                write!(f, "{} expects an argument of sort {}; got {}", op, expected, got)
            }
            BvError::ExtractBounds { high, low, width } => write!(
                f,
                "extract[{}:{}] is out of bounds for bits[{}]",
                high, low, width
            ),
        }
    }
}

impl std::error::Error for BvError {}
