use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::error::EvalError;

pub mod parse;
mod value;

pub use value::{Sort, Symbol, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Op {
    Not,
    And,
    Or,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Neg,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Not => "not",
            Op::And => "and",
            Op::Or => "or",
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Add => "+",
            Op::Sub | Op::Neg => "-",
            Op::Mul => "*",
        }
    }

    /// Binary and n-ary operators by surface name. `-` is resolved to
    /// [`Op::Neg`] or [`Op::Sub`] by the reader depending on arity.
    pub fn from_name(name: &str) -> Option<Op> {
        let op = match name {
            "not" => Op::Not,
            "and" => Op::And,
            "or" => Op::Or,
            "=" => Op::Eq,
            "<" => Op::Lt,
            "<=" => Op::Le,
            ">" => Op::Gt,
            ">=" => Op::Ge,
            "+" => Op::Add,
            "-" => Op::Sub,
            "*" => Op::Mul,
            _ => return None,
        };
        Some(op)
    }

    /// Applies the operator to constant arguments. Integer arithmetic wraps so that
    /// evaluation is total on well-sorted inputs.
    pub fn apply(self, args: &[Value]) -> Result<Value, EvalError> {
        let ill_sorted = || EvalError::IllSorted {
            op: self,
            args: args.to_vec(),
        };
        match self {
            Op::Not => match args {
                [Value::Bool(b)] => Ok(Value::Bool(!b)),
                _ => Err(ill_sorted()),
            },
            Op::Neg => match args {
                [Value::Int(i)] => Ok(Value::Int(i.wrapping_neg())),
                _ => Err(ill_sorted()),
            },
            Op::And | Op::Or => {
                let bools = args
                    .iter()
                    .map(|v| v.as_bool().ok_or_else(ill_sorted))
                    .collect::<Result<Vec<_>, _>>()?;
                match self {
                    Op::And => Ok(Value::Bool(bools.iter().all(|b| *b))),
                    _ => Ok(Value::Bool(bools.iter().any(|b| *b))),
                }
            }
            Op::Eq => match args {
                [a, b] if a.sort() == b.sort() => Ok(Value::Bool(a == b)),
                _ => Err(ill_sorted()),
            },
            Op::Lt | Op::Le | Op::Gt | Op::Ge => match args {
                [Value::Int(a), Value::Int(b)] => Ok(Value::Bool(match self {
                    Op::Lt => a < b,
                    Op::Le => a <= b,
                    Op::Gt => a > b,
                    _ => a >= b,
                })),
                _ => Err(ill_sorted()),
            },
            Op::Add | Op::Sub | Op::Mul => {
                let ints = args
                    .iter()
                    .map(|v| v.as_int().ok_or_else(ill_sorted))
                    .collect::<Result<Vec<_>, _>>()?;
                match self {
                    Op::Add => Ok(Value::Int(ints.iter().fold(0i64, |a, b| a.wrapping_add(*b)))),
                    Op::Mul => Ok(Value::Int(ints.iter().fold(1i64, |a, b| a.wrapping_mul(*b)))),
                    _ => {
                        let (first, rest) = ints.split_first().ok_or_else(ill_sorted)?;
                        Ok(Value::Int(
                            rest.iter().fold(*first, |a, b| a.wrapping_sub(*b)),
                        ))
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermKind {
    Const(Value),
    /// The i-th formal argument of the function being synthesized.
    Var(usize),
    /// An integer constant left open by the enumerator; filled in by condition repair.
    Hole,
    Symbol(Symbol),
    Op(Op, Vec<Term>),
    Ite(Term, Term, Term),
    /// Application of an uninterpreted function: a candidate, or an evaluation head.
    Eval(Symbol, Vec<Term>),
}

/// Immutable, structurally shared term. Equality and hashing are structural.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term(Arc<TermKind>);

impl Term {
    pub fn new(kind: TermKind) -> Self {
        Self(Arc::new(kind))
    }

    pub fn constant<T: Into<Value>>(value: T) -> Self {
        Self::new(TermKind::Const(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Self::constant(value)
    }

    pub fn int(value: i64) -> Self {
        Self::constant(value)
    }

    pub fn var(index: usize) -> Self {
        Self::new(TermKind::Var(index))
    }

    pub fn hole() -> Self {
        Self::new(TermKind::Hole)
    }

    pub fn symbol<T: Into<Symbol>>(name: T) -> Self {
        Self::new(TermKind::Symbol(name.into()))
    }

    pub fn op(op: Op, children: Vec<Term>) -> Self {
        Self::new(TermKind::Op(op, children))
    }

    pub fn not(t: Term) -> Self {
        Self::op(Op::Not, vec![t])
    }

    /// Conjunction; a single conjunct is returned as is.
    pub fn and(mut conjuncts: Vec<Term>) -> Self {
        match conjuncts.len() {
            0 => Self::bool(true),
            1 => conjuncts.remove(0),
            _ => Self::op(Op::And, conjuncts),
        }
    }

    /// Disjunction; a single disjunct is returned as is.
    pub fn or(mut disjuncts: Vec<Term>) -> Self {
        match disjuncts.len() {
            0 => Self::bool(false),
            1 => disjuncts.remove(0),
            _ => Self::op(Op::Or, disjuncts),
        }
    }

    pub fn eq(a: Term, b: Term) -> Self {
        Self::op(Op::Eq, vec![a, b])
    }

    pub fn ite(cond: Term, then: Term, otherwise: Term) -> Self {
        Self::new(TermKind::Ite(cond, then, otherwise))
    }

    pub fn eval<T: Into<Symbol>>(head: T, args: Vec<Term>) -> Self {
        Self::new(TermKind::Eval(head.into(), args))
    }

    pub fn kind(&self) -> &TermKind {
        &self.0
    }

    pub fn as_const(&self) -> Option<Value> {
        match self.kind() {
            TermKind::Const(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        self.as_const().is_some()
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.kind() {
            TermKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<&Term> {
        match self.kind() {
            TermKind::Const(_) | TermKind::Var(_) | TermKind::Hole | TermKind::Symbol(_) => {
                vec![]
            }
            TermKind::Op(_, c) | TermKind::Eval(_, c) => c.iter().collect(),
            TermKind::Ite(c, t, e) => vec![c, t, e],
        }
    }

    /// Rebuilds this node with every child mapped through `f`. Returns a clone of
    /// `self` (sharing the allocation) when no child changed.
    pub fn try_rebuild<E>(&self, mut f: impl FnMut(&Term) -> Result<Term, E>) -> Result<Term, E> {
        let kind = match self.kind() {
            TermKind::Const(_) | TermKind::Var(_) | TermKind::Hole | TermKind::Symbol(_) => {
                return Ok(self.clone());
            }
            TermKind::Op(op, children) => {
                TermKind::Op(*op, children.iter().map(&mut f).collect::<Result<_, _>>()?)
            }
            TermKind::Eval(head, children) => TermKind::Eval(
                head.clone(),
                children.iter().map(&mut f).collect::<Result<_, _>>()?,
            ),
            TermKind::Ite(c, t, e) => TermKind::Ite(f(c)?, f(t)?, f(e)?),
        };
        if &kind == self.kind() {
            Ok(self.clone())
        } else {
            Ok(Term::new(kind))
        }
    }

    pub fn rebuild(&self, mut f: impl FnMut(&Term) -> Term) -> Term {
        let Ok(t) = self.try_rebuild::<std::convert::Infallible>(|c| Ok(f(c)));
        t
    }

    /// Replaces every occurrence of `from` by `to`.
    pub fn substitute(&self, from: &Term, to: &Term) -> Term {
        if self == from {
            return to.clone();
        }
        self.rebuild(|c| c.substitute(from, to))
    }

    pub fn contains_hole(&self) -> bool {
        matches!(self.kind(), TermKind::Hole) || self.children().iter().any(|c| c.contains_hole())
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let list = |f: &mut Formatter<'_>, head: &str, args: &[&Term]| {
            write!(f, "({head}")?;
            for a in args {
                write!(f, " {a}")?;
            }
            write!(f, ")")
        };
        match self.kind() {
            TermKind::Const(v) => write!(f, "{v}"),
            TermKind::Var(i) => write!(f, "x{i}"),
            TermKind::Hole => write!(f, "?"),
            TermKind::Symbol(s) => write!(f, "{s}"),
            TermKind::Op(op, _) => list(f, op.name(), &self.children()),
            TermKind::Ite(..) => list(f, "ite", &self.children()),
            TermKind::Eval(head, _) => list(f, head.as_str(), &self.children()),
        }
    }
}

impl std::fmt::Debug for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use crate::term::{Op, Term, Value};

    #[test]
    fn display_is_sexpr() {
        let t = Term::ite(
            Term::op(Op::Gt, vec![Term::var(0), Term::int(-3)]),
            Term::eval("f", vec![Term::int(1)]),
            Term::not(Term::symbol("b")),
        );
        assert_eq!(t.to_string(), "(ite (> x0 -3) (f 1) (not b))");
    }

    #[test]
    fn substitute_replaces_all_occurrences() {
        let arg = Term::symbol("z");
        let template = Term::op(Op::And, vec![arg.clone(), Term::not(arg.clone())]);
        let out = template.substitute(&arg, &Term::bool(true));
        assert_eq!(
            out,
            Term::op(Op::And, vec![Term::bool(true), Term::not(Term::bool(true))])
        );
    }

    #[test]
    fn rebuild_shares_unchanged_nodes() {
        let t = Term::eq(Term::var(0), Term::int(2));
        let same = t.rebuild(|c| c.clone());
        assert_eq!(t, same);
        assert!(!t.contains_hole());
        assert!(Term::eq(Term::var(0), Term::hole()).contains_hole());
    }

    #[test]
    fn op_apply() {
        assert_eq!(
            Op::Sub.apply(&[Value::Int(5), Value::Int(2), Value::Int(1)]).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            Op::Le.apply(&[Value::Int(5), Value::Int(5)]).unwrap(),
            Value::Bool(true)
        );
        assert!(Op::Eq.apply(&[Value::Int(1), Value::Bool(true)]).is_err());
        assert!(Op::Not.apply(&[Value::Int(1)]).is_err());
    }
}
