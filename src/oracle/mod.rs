//! The services the unification engine consumes from its host: evaluation,
//! rewriting, model values and enumerator explanations.

use crate::error::EvalError;
use crate::term::{Symbol, Term, Value};

mod evaluator;
mod explain;
mod model;
mod rewriter;
#[cfg(feature = "z3")]
mod z3;

pub use evaluator::BuiltinEvaluator;
pub use explain::SyntacticExplainer;
pub use model::ModelMap;
pub use rewriter::Simplifier;
#[cfg(feature = "z3")]
pub use z3::Z3Evaluator;

/// Evaluates a program term on a concrete argument tuple. `Var(i)` denotes the
/// i-th value of `args`. Must be pure and total on well-sorted input.
pub trait TermEvaluator {
    fn evaluate(&self, term: &Term, args: &[Value]) -> Result<Value, EvalError>;
}

/// Normalizes terms. Expected to be idempotent.
pub trait TermRewriter {
    fn rewrite(&self, term: &Term) -> Term;
}

/// The outer loop's current model: candidate values for enumerators and
/// candidate outputs for evaluation heads and applications.
pub trait ModelOracle {
    fn model_value(&self, term: &Term) -> Option<Term>;
}

/// Explains why an enumerator currently holds a value, as a formula over the
/// enumerator that the outer loop can negate.
pub trait Explainer {
    fn explain_equality(&self, enumerator: &Symbol, value: &Term) -> Term;
}

/// The collaborators of one engine call, borrowed together.
#[derive(Clone, Copy)]
pub struct Oracles<'a> {
    pub evaluator: &'a dyn TermEvaluator,
    pub rewriter: &'a dyn TermRewriter,
    pub model: &'a dyn ModelOracle,
    pub explainer: &'a dyn Explainer,
}

impl<'a> Oracles<'a> {
    pub fn new(
        evaluator: &'a dyn TermEvaluator,
        rewriter: &'a dyn TermRewriter,
        model: &'a dyn ModelOracle,
        explainer: &'a dyn Explainer,
    ) -> Self {
        Self {
            evaluator,
            rewriter,
            model,
            explainer,
        }
    }
}
