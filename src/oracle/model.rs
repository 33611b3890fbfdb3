use std::collections::HashMap;

use crate::oracle::ModelOracle;
use crate::term::{Symbol, Term};

/// A model given as an explicit table of term values.
#[derive(Debug, Clone, Default)]
pub struct ModelMap {
    values: HashMap<Term, Term>,
}

impl ModelMap {
    pub fn insert(&mut self, term: Term, value: Term) -> Option<Term> {
        self.values.insert(term, value)
    }

    /// Assigns a value to the constant named `symbol`.
    pub fn assign<T: Into<Symbol>>(&mut self, symbol: T, value: Term) -> Option<Term> {
        self.insert(Term::symbol(symbol), value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ModelOracle for ModelMap {
    fn model_value(&self, term: &Term) -> Option<Term> {
        if term.is_const() {
            return Some(term.clone());
        }
        self.values.get(term).cloned()
    }
}
