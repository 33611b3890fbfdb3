use crate::error::EvalError;
use crate::oracle::TermEvaluator;
use crate::term::{Term, TermKind, Value};

/// Direct interpreter for the builtin operators.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEvaluator;

impl TermEvaluator for BuiltinEvaluator {
    fn evaluate(&self, term: &Term, args: &[Value]) -> Result<Value, EvalError> {
        match term.kind() {
            TermKind::Const(v) => Ok(*v),
            TermKind::Var(index) => args.get(*index).copied().ok_or(EvalError::UnboundArgument {
                index: *index,
                arity: args.len(),
            }),
            TermKind::Hole => Err(EvalError::UnfilledHole),
            TermKind::Symbol(_) | TermKind::Eval(..) => Err(EvalError::Uninterpreted(term.clone())),
            TermKind::Ite(c, t, e) => match self.evaluate(c, args)? {
                Value::Bool(true) => self.evaluate(t, args),
                Value::Bool(false) => self.evaluate(e, args),
                other => Err(EvalError::ExpectedBool(other)),
            },
            TermKind::Op(op, children) => {
                let values = children
                    .iter()
                    .map(|c| self.evaluate(c, args))
                    .collect::<Result<Vec<_>, _>>()?;
                op.apply(&values)
            }
        }
    }
}
