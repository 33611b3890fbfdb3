use std::collections::HashMap;

use crate::error::UnifError;
use crate::term::{Symbol, Term, Value};

/// A concrete input of a candidate, named by a fresh head symbol standing for the
/// candidate's unknown output on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationPoint {
    pub head: Symbol,
    pub candidate: Symbol,
    pub args: Vec<Value>,
}

impl EvaluationPoint {
    /// `(head args..)` as a term.
    pub fn application(&self) -> Term {
        Term::eval(
            self.head.clone(),
            self.args.iter().copied().map(Term::constant).collect(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PointTable {
    points: HashMap<Symbol, EvaluationPoint>,
}

impl PointTable {
    pub(crate) fn get(&self, head: &Symbol) -> Result<&EvaluationPoint, UnifError> {
        self.points
            .get(head)
            .ok_or_else(|| UnifError::MissingPoint(head.clone()))
    }

    pub(crate) fn insert(&mut self, point: EvaluationPoint) {
        self.points.insert(point.head.clone(), point);
    }

    pub(crate) fn retain_candidates(&mut self, keep: impl Fn(&Symbol) -> bool) {
        self.points.retain(|_, p| keep(&p.candidate));
    }
}
