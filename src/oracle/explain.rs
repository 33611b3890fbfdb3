use crate::oracle::Explainer;
use crate::term::{Symbol, Term};

/// Explains `e = v` by the equality itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntacticExplainer;

impl Explainer for SyntacticExplainer {
    fn explain_equality(&self, enumerator: &Symbol, value: &Term) -> Term {
        Term::eq(Term::symbol(enumerator.clone()), value.clone())
    }
}
