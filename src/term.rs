// SPDX-License-Identifier: Apache-2.0

//! Hash-consed terms over booleans and fixed-width bit-vectors.
//!
//! Every construction goes through [`TermManager::mk_app`], which checks the
//! operator's arity and argument sorts and returns the existing id when an
//! identical term was built before.

use std::fmt;

use ahash::AHashMap;

use crate::error::BvError;
use crate::value::BvValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

impl TermId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("#{}", self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    Bool,
    BitVec(usize),
}

impl Sort {
    pub fn bv_width(self) -> Option<usize> {
        match self {
            Sort::Bool => None,
            Sort::BitVec(width) => Some(width),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::BitVec(width) => write!(f, "(_ BitVec {})", width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    // Bit-vector valued.
    Const { name: String, width: usize },
    Num(BvValue),
    Add,
    Mul,
    SDivI,
    UDivI,
    SRemI,
    URemI,
    SModI,
    SDiv0,
    UDiv0,
    SRem0,
    URem0,
    SMod0,
    BvAnd,
    BvOr,
    BvXor,
    BvNand,
    BvNor,
    BvXnor,
    BvNot,
    /// The first argument supplies the most significant bits.
    Concat,
    SignExt(usize),
    ZeroExt(usize),
    Extract { high: usize, low: usize },
    RedOr,
    RedAnd,
    Comp,
    Shl,
    LShr,
    AShr,
    RotateLeft(usize),
    RotateRight(usize),
    ExtRotateLeft,
    ExtRotateRight,
    /// Boolean arguments; argument 0 becomes bit 0.
    MkBv,

    // Bit-vector predicates.
    Bit2Bool(usize),
    ULeq,
    SLeq,
    Xor3,
    Carry,
    UMulNoOvfl,
    SMulNoOvfl,
    SMulNoUdfl,

    // Owned by the core.
    BoolConst(String),
    True,
    False,
    Eq,
    Not,
    Or,
    And,
}

impl Op {
    pub fn name(&self) -> String {
        match self {
            Op::Const { name, .. } => name.clone(),
            Op::Num(value) => value.to_string(),
            Op::Add => "bvadd".to_string(),
            Op::Mul => "bvmul".to_string(),
            Op::SDivI => "bvsdiv_i".to_string(),
            Op::UDivI => "bvudiv_i".to_string(),
            Op::SRemI => "bvsrem_i".to_string(),
            Op::URemI => "bvurem_i".to_string(),
            Op::SModI => "bvsmod_i".to_string(),
            Op::SDiv0 => "bvsdiv0".to_string(),
            Op::UDiv0 => "bvudiv0".to_string(),
            Op::SRem0 => "bvsrem0".to_string(),
            Op::URem0 => "bvurem0".to_string(),
            Op::SMod0 => "bvsmod0".to_string(),
            Op::BvAnd => "bvand".to_string(),
            Op::BvOr => "bvor".to_string(),
            Op::BvXor => "bvxor".to_string(),
            Op::BvNand => "bvnand".to_string(),
            Op::BvNor => "bvnor".to_string(),
            Op::BvXnor => "bvxnor".to_string(),
            Op::BvNot => "bvnot".to_string(),
            Op::Concat => "concat".to_string(),
            Op::SignExt(n) => format!("(_ sign_extend {})", n),
            Op::ZeroExt(n) => format!("(_ zero_extend {})", n),
            Op::Extract { high, low } => format!("(_ extract {} {})", high, low),
            Op::RedOr => "bvredor".to_string(),
            Op::RedAnd => "bvredand".to_string(),
            Op::Comp => "bvcomp".to_string(),
            Op::Shl => "bvshl".to_string(),
            Op::LShr => "bvlshr".to_string(),
            Op::AShr => "bvashr".to_string(),
            Op::RotateLeft(n) => format!("(_ rotate_left {})", n),
            Op::RotateRight(n) => format!("(_ rotate_right {})", n),
            Op::ExtRotateLeft => "ext_rotate_left".to_string(),
            Op::ExtRotateRight => "ext_rotate_right".to_string(),
            Op::MkBv => "mkbv".to_string(),
            Op::Bit2Bool(i) => format!("(_ bit2bool {})", i),
            Op::ULeq => "bvule".to_string(),
            Op::SLeq => "bvsle".to_string(),
            Op::Xor3 => "xor3".to_string(),
            Op::Carry => "carry".to_string(),
            Op::UMulNoOvfl => "bvumul_noovfl".to_string(),
            Op::SMulNoOvfl => "bvsmul_noovfl".to_string(),
            Op::SMulNoUdfl => "bvsmul_noudfl".to_string(),
            Op::BoolConst(name) => name.clone(),
            Op::True => "true".to_string(),
            Op::False => "false".to_string(),
            Op::Eq => "=".to_string(),
            Op::Not => "not".to_string(),
            Op::Or => "or".to_string(),
            Op::And => "and".to_string(),
        }
    }

    /// Boolean-sorted operators the bit-vector theory internalizes as atoms.
    pub fn is_bv_predicate(&self) -> bool {
        matches!(
            self,
            Op::Bit2Bool(_)
                | Op::ULeq
                | Op::SLeq
                | Op::Xor3
                | Op::Carry
                | Op::UMulNoOvfl
                | Op::SMulNoOvfl
                | Op::SMulNoUdfl
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub op: Op,
    pub args: Vec<TermId>,
    pub sort: Sort,
}

impl Term {
    pub fn width(&self) -> Option<usize> {
        self.sort.bv_width()
    }
}

#[derive(Debug, Default)]
pub struct TermManager {
    terms: Vec<Term>,
    table: AHashMap<Term, TermId>,
}

impl TermManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, id: TermId) -> &Term {
        &self.terms[id.index()]
    }

    pub fn sort(&self, id: TermId) -> Sort {
        self.get(id).sort
    }

    pub fn width(&self, id: TermId) -> Option<usize> {
        self.get(id).width()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &Term)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, t)| (TermId(i as u32), t))
    }

    pub fn mk_app(&mut self, op: Op, args: &[TermId]) -> Result<TermId, BvError> {
        let sort = self.infer_sort(&op, args)?;
        let term = Term {
            op,
            args: args.to_vec(),
            sort,
        };
        if let Some(id) = self.table.get(&term) {
            return Ok(*id);
        }
        let id = TermId(self.terms.len() as u32);
        log::trace!("mk_app {} = {}", id, term.op.name());
        self.terms.push(term.clone());
        self.table.insert(term, id);
        Ok(id)
    }

    pub fn mk_const(&mut self, name: &str, width: usize) -> Result<TermId, BvError> {
        self.mk_app(
            Op::Const {
                name: name.to_string(),
                width,
            },
            &[],
        )
    }

    pub fn mk_num(&mut self, value: u64, width: usize) -> Result<TermId, BvError> {
        self.mk_app(Op::Num(BvValue::from_u64(value, width)), &[])
    }

    pub fn mk_bool_const(&mut self, name: &str) -> Result<TermId, BvError> {
        self.mk_app(Op::BoolConst(name.to_string()), &[])
    }

    pub fn mk_true(&mut self) -> TermId {
        self.intern_nullary(Op::True, Sort::Bool)
    }

    pub fn mk_false(&mut self) -> TermId {
        self.intern_nullary(Op::False, Sort::Bool)
    }

    pub fn mk_eq(&mut self, lhs: TermId, rhs: TermId) -> Result<TermId, BvError> {
        self.mk_app(Op::Eq, &[lhs, rhs])
    }

    pub fn mk_not(&mut self, arg: TermId) -> Result<TermId, BvError> {
        self.mk_app(Op::Not, &[arg])
    }

    fn intern_nullary(&mut self, op: Op, sort: Sort) -> TermId {
        let term = Term {
            op,
            args: Vec::new(),
            sort,
        };
        if let Some(id) = self.table.get(&term) {
            return *id;
        }
        let id = TermId(self.terms.len() as u32);
        self.terms.push(term.clone());
        self.table.insert(term, id);
        id
    }

    fn expect_arity(op: &Op, args: &[TermId], min: usize, max: Option<usize>) -> Result<(), BvError> {
        let ok = args.len() >= min && max.is_none_or(|max| args.len() <= max);
        if ok {
            return Ok(());
        }
        let expected = match max {
            Some(max) if max == min => format!("{}", min),
            Some(max) => format!("{}..={}", min, max),
            None => format!("at least {}", min),
        };
        Err(BvError::Arity {
            op: op.name(),
            expected,
            got: args.len(),
        })
    }

    fn expect_sort(&self, op: &Op, arg: TermId, expected: Sort) -> Result<(), BvError> {
        let got = self.sort(arg);
        if got != expected {
            return Err(BvError::SortMismatch {
                op: op.name(),
                expected,
                got,
            });
        }
        Ok(())
    }

    /// Width of a bit-vector argument, or a sort error naming `op`.
    fn bv_arg_width(&self, op: &Op, arg: TermId) -> Result<usize, BvError> {
        match self.sort(arg) {
            Sort::BitVec(width) => Ok(width),
            got => Err(BvError::SortMismatch {
                op: op.name(),
                // Any width would do; report the one-bit sort as the shape.
                expected: Sort::BitVec(1),
                got,
            }),
        }
    }

    /// All arguments must be bit-vectors of one width; returns it.
    fn same_width_args(&self, op: &Op, args: &[TermId]) -> Result<usize, BvError> {
        let width = self.bv_arg_width(op, args[0])?;
        for arg in &args[1..] {
            self.expect_sort(op, *arg, Sort::BitVec(width))?;
        }
        Ok(width)
    }

    fn infer_sort(&self, op: &Op, args: &[TermId]) -> Result<Sort, BvError> {
        let bv = |width: usize| {
            if width == 0 {
                Err(BvError::ZeroWidth)
            } else {
                Ok(Sort::BitVec(width))
            }
        };
        match op {
            Op::Const { width, .. } => {
                Self::expect_arity(op, args, 0, Some(0))?;
                bv(*width)
            }
            Op::Num(value) => {
                Self::expect_arity(op, args, 0, Some(0))?;
                bv(value.width())
            }
            Op::Add
            | Op::Mul
            | Op::BvAnd
            | Op::BvOr
            | Op::BvXor
            | Op::BvNand
            | Op::BvNor
            | Op::BvXnor => {
                Self::expect_arity(op, args, 2, None)?;
                bv(self.same_width_args(op, args)?)
            }
            Op::SDivI
            | Op::UDivI
            | Op::SRemI
            | Op::URemI
            | Op::SModI
            | Op::SDiv0
            | Op::UDiv0
            | Op::SRem0
            | Op::URem0
            | Op::SMod0
            | Op::Shl
            | Op::LShr
            | Op::AShr
            | Op::ExtRotateLeft
            | Op::ExtRotateRight => {
                Self::expect_arity(op, args, 2, Some(2))?;
                bv(self.same_width_args(op, args)?)
            }
            Op::Comp => {
                Self::expect_arity(op, args, 2, Some(2))?;
                self.same_width_args(op, args)?;
                bv(1)
            }
            Op::BvNot | Op::RotateLeft(_) | Op::RotateRight(_) => {
                Self::expect_arity(op, args, 1, Some(1))?;
                bv(self.bv_arg_width(op, args[0])?)
            }
            Op::RedOr | Op::RedAnd => {
                Self::expect_arity(op, args, 1, Some(1))?;
                self.bv_arg_width(op, args[0])?;
                bv(1)
            }
            Op::Concat => {
                Self::expect_arity(op, args, 1, None)?;
                let mut width = 0;
                for arg in args {
                    width += self.bv_arg_width(op, *arg)?;
                }
                bv(width)
            }
            Op::SignExt(n) | Op::ZeroExt(n) => {
                Self::expect_arity(op, args, 1, Some(1))?;
                bv(self.bv_arg_width(op, args[0])? + n)
            }
            Op::Extract { high, low } => {
                Self::expect_arity(op, args, 1, Some(1))?;
                let width = self.bv_arg_width(op, args[0])?;
                if low > high || *high >= width {
                    return Err(BvError::ExtractBounds {
                        high: *high,
                        low: *low,
                        width,
                    });
                }
                bv(high - low + 1)
            }
            Op::MkBv => {
                Self::expect_arity(op, args, 1, None)?;
                for arg in args {
                    self.expect_sort(op, *arg, Sort::Bool)?;
                }
                bv(args.len())
            }
            Op::Bit2Bool(index) => {
                Self::expect_arity(op, args, 1, Some(1))?;
                let width = self.bv_arg_width(op, args[0])?;
                if *index >= width {
                    return Err(BvError::ExtractBounds {
                        high: *index,
                        low: *index,
                        width,
                    });
                }
                Ok(Sort::Bool)
            }
            Op::ULeq | Op::SLeq | Op::UMulNoOvfl | Op::SMulNoOvfl | Op::SMulNoUdfl => {
                Self::expect_arity(op, args, 2, Some(2))?;
                self.same_width_args(op, args)?;
                Ok(Sort::Bool)
            }
            Op::Xor3 | Op::Carry => {
                Self::expect_arity(op, args, 3, Some(3))?;
                for arg in args {
                    self.expect_sort(op, *arg, Sort::Bool)?;
                }
                Ok(Sort::Bool)
            }
            Op::BoolConst(_) | Op::True | Op::False => {
                Self::expect_arity(op, args, 0, Some(0))?;
                Ok(Sort::Bool)
            }
            Op::Eq => {
                Self::expect_arity(op, args, 2, Some(2))?;
                self.same_width_args(op, args)?;
                Ok(Sort::Bool)
            }
            Op::Not => {
                Self::expect_arity(op, args, 1, Some(1))?;
                self.expect_sort(op, args[0], Sort::Bool)?;
                Ok(Sort::Bool)
            }
            Op::Or | Op::And => {
                Self::expect_arity(op, args, 1, None)?;
                for arg in args {
                    self.expect_sort(op, *arg, Sort::Bool)?;
                }
                Ok(Sort::Bool)
            }
        }
    }

    /// Renders a term as an s-expression.
    pub fn display(&self, id: TermId) -> String {
        let term = self.get(id);
        if term.args.is_empty() {
            return term.op.name();
        }
        let args: Vec<String> = term.args.iter().map(|a| self.display(*a)).collect();
        format!("({} {})", term.op.name(), args.join(" "))
    }
}
