use thiserror::Error;

use crate::config::error::UnifConfigError;
use crate::synthesis::builder::UnifParamsBuilderError;
use crate::term::{Op, Symbol, Term, Value};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Argument x{index} is out of range for a tuple of {arity} value(s)")]
    UnboundArgument { index: usize, arity: usize },
    #[error("Operator '{}' cannot be applied to {args:?}", .op.name())]
    IllSorted { op: Op, args: Vec<Value> },
    #[error("Expected a boolean, found {0}")]
    ExpectedBool(Value),
    #[error("Cannot evaluate uninterpreted term {0}")]
    Uninterpreted(Term),
    #[error("Cannot evaluate a term with an unfilled constant")]
    UnfilledHole,
    #[cfg(feature = "z3")]
    #[error("Z3 could not reduce {0} to a constant")]
    NonConstantResult(Term),
    #[cfg(feature = "z3")]
    #[error("Term {0} is ill-sorted")]
    IllSortedTerm(Term),
}

#[derive(Debug, Error)]
pub enum UnifError {
    #[error("{0} is not a registered candidate")]
    UnknownCandidate(Symbol),
    #[error("{0} is not a strategy point with a decision tree")]
    UnknownStrategyPoint(Symbol),
    #[error("Evaluation head {0} has no recorded argument tuple")]
    MissingPoint(Symbol),
    #[error("Argument {arg} of an application of {candidate} is not a constant")]
    NonConstantArgument { candidate: Symbol, arg: Term },
    #[error("Expected {term} to reduce to a constant, got {value}")]
    NonConstantValue { term: Term, value: Term },
    #[error("The model has no value for {0}")]
    MissingModelValue(Term),
    #[error("Decision tree for {0} exhausted its conditions but has no guard")]
    MissingGuard(Symbol),
    #[error("Got {enumerators} condition enumerator(s) but {values} value(s)")]
    ConditionArity { enumerators: usize, values: usize },
    #[error("Head {head} is already entailed for {point}")]
    AlreadyEntailed { point: Symbol, head: Symbol },
    #[error("No condition is installed at trie level {0}")]
    MissingCondition(usize),
    #[error("Point {0} left the separation class it was being resolved against")]
    LostSeparationClass(Symbol),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),
    #[error("Config error: {0}")]
    Config(#[from] UnifConfigError),
    #[error("Invalid unification params")]
    UnifParams(#[from] UnifParamsBuilderError),
}
