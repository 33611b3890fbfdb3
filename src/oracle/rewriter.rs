use crate::oracle::TermRewriter;
use crate::term::{Op, Term, TermKind, Value};

/// Bottom-up constant folding plus a handful of boolean normalizations:
/// flattening and deduplication of `and`/`or`, double negation, reflexive
/// equality and `ite` with a constant condition or equal branches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplifier;

impl Simplifier {
    fn node(&self, term: Term) -> Term {
        match term.kind() {
            TermKind::Op(op, children) => self.op(*op, children).unwrap_or(term),
            TermKind::Ite(c, t, e) => match c.as_const() {
                Some(Value::Bool(true)) => t.clone(),
                Some(Value::Bool(false)) => e.clone(),
                _ if t == e => t.clone(),
                _ => term,
            },
            _ => term,
        }
    }

    fn op(&self, op: Op, children: &[Term]) -> Option<Term> {
        let consts: Option<Vec<Value>> = children.iter().map(Term::as_const).collect();
        if let Some(values) = consts {
            // ill-sorted applications are left for the evaluator to report
            return op.apply(&values).ok().map(Term::constant);
        }
        match op {
            Op::Not => match children.first()?.kind() {
                TermKind::Op(Op::Not, inner) => inner.first().cloned(),
                _ => None,
            },
            Op::And | Op::Or => Some(self.junction(op, children)),
            Op::Eq => match children {
                [a, b] if a == b => Some(Term::bool(true)),
                _ => None,
            },
            _ => None,
        }
    }

    fn junction(&self, op: Op, children: &[Term]) -> Term {
        let unit = Value::Bool(op == Op::And);
        let mut out: Vec<Term> = vec![];
        let flattened = children.iter().flat_map(|c| match c.kind() {
            TermKind::Op(inner, grand) if *inner == op => grand.iter().collect::<Vec<_>>(),
            _ => vec![c],
        });
        for c in flattened {
            match c.as_const() {
                Some(v) if v == unit => continue,
                Some(Value::Bool(b)) => return Term::bool(b),
                _ => {}
            }
            if !out.contains(c) {
                out.push(c.clone());
            }
        }
        match out.len() {
            0 => Term::constant(unit),
            1 => out.remove(0),
            _ => Term::op(op, out),
        }
    }
}

impl TermRewriter for Simplifier {
    fn rewrite(&self, term: &Term) -> Term {
        self.node(term.rebuild(|c| self.rewrite(c)))
    }
}
