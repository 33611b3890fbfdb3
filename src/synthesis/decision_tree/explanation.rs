use crate::synthesis::decision_tree::display::ExplanationDisplay;
use crate::term::{Symbol, Term, Value};

/// One reason recorded while building a decision tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Two heads landed in one class with equal outputs.
    HeadsEqual(Symbol, Symbol),
    /// Two heads landed in one class with different outputs.
    HeadsDistinct(Symbol, Symbol),
    /// `(left args) = (right args)`, with `args` the input of `left`.
    EvalAgree {
        left: Symbol,
        right: Symbol,
        args: Vec<Value>,
    },
    /// `(left args) != (right args)`, with `args` the input of `left`.
    EvalDiffer {
        left: Symbol,
        right: Symbol,
        args: Vec<Value>,
    },
    /// The condition enumerator held `value` when it was consulted.
    Condition {
        enumerator: Symbol,
        value: Term,
        explanation: Term,
    },
    /// The tree ran out of conditions.
    Guard(Term),
}

impl Literal {
    pub fn to_term(&self) -> Term {
        let eval_eq = |left: &Symbol, right: &Symbol, args: &[Value]| {
            let args: Vec<Term> = args.iter().copied().map(Term::constant).collect();
            Term::eq(
                Term::eval(left.clone(), args.clone()),
                Term::eval(right.clone(), args),
            )
        };
        match self {
            Literal::HeadsEqual(a, b) => Term::eq(Term::symbol(a.clone()), Term::symbol(b.clone())),
            Literal::HeadsDistinct(a, b) => Term::not(Term::eq(
                Term::symbol(a.clone()),
                Term::symbol(b.clone()),
            )),
            Literal::EvalAgree { left, right, args } => eval_eq(left, right, args),
            Literal::EvalDiffer { left, right, args } => Term::not(eval_eq(left, right, args)),
            Literal::Condition { explanation, .. } => explanation.clone(),
            Literal::Guard(g) => g.clone(),
        }
    }

    /// Literals that record why two points must be told apart.
    pub fn is_separation(&self) -> bool {
        matches!(self, Literal::HeadsDistinct(..) | Literal::EvalDiffer { .. })
    }
}

/// Ordered literals whose conjunction justifies the current state of a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Explanation {
    literals: Vec<Literal>,
}

impl Explanation {
    pub fn push(&mut self, literal: Literal) {
        self.literals.push(literal);
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.literals.truncate(len);
    }

    /// `not (and literals..)`
    pub fn refutation(&self) -> Term {
        Term::not(Term::and(self.literals.iter().map(Literal::to_term).collect()))
    }

    pub fn display(&self) -> ExplanationDisplay<'_> {
        ExplanationDisplay { explanation: self }
    }
}

#[cfg(test)]
mod tests {
    use crate::synthesis::decision_tree::explanation::{Explanation, Literal};
    use crate::term::{Symbol, Term, Value};

    #[test]
    fn refutation_negates_conjunction() {
        let mut exp = Explanation::default();
        exp.push(Literal::HeadsDistinct(Symbol::new("p2"), Symbol::new("p1")));
        exp.push(Literal::Guard(Term::symbol("G")));
        assert_eq!(exp.refutation().to_string(), "(not (and (not (= p2 p1)) G))");
        exp.truncate(1);
        assert_eq!(exp.refutation().to_string(), "(not (not (= p2 p1)))");
    }

    #[test]
    fn eval_literals_use_left_input() {
        let lit = Literal::EvalDiffer {
            left: Symbol::new("f_0"),
            right: Symbol::new("f_1"),
            args: vec![Value::Int(4)],
        };
        assert!(lit.is_separation());
        assert_eq!(lit.to_term().to_string(), "(not (= (f_0 4) (f_1 4)))");
    }
}
