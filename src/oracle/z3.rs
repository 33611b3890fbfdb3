use z3::ast::{Ast, Bool, Dynamic, Int};
use z3::{Config, Context};

use crate::error::EvalError;
use crate::oracle::TermEvaluator;
use crate::term::{Op, Term, TermKind, Value};

/// Evaluates terms by lowering them to Z3 and simplifying. Integers are
/// unbounded here, so results only agree with [`crate::oracle::BuiltinEvaluator`]
/// when nothing overflows.
pub struct Z3Evaluator {
    z3: Context,
}

impl Default for Z3Evaluator {
    fn default() -> Self {
        Self {
            z3: Context::new(&Config::new()),
        }
    }
}

impl Z3Evaluator {
    fn constant(&self, value: &Value) -> Dynamic<'_> {
        match value {
            Value::Bool(b) => Dynamic::from_ast(&Bool::from_bool(&self.z3, *b)),
            Value::Int(i) => Dynamic::from_ast(&Int::from_i64(&self.z3, *i)),
        }
    }

    fn lower(&self, term: &Term, args: &[Value]) -> Result<Dynamic<'_>, EvalError> {
        let ill_sorted = || EvalError::IllSortedTerm(term.clone());
        match term.kind() {
            TermKind::Const(v) => Ok(self.constant(v)),
            TermKind::Var(index) => args
                .get(*index)
                .map(|v| self.constant(v))
                .ok_or(EvalError::UnboundArgument {
                    index: *index,
                    arity: args.len(),
                }),
            TermKind::Hole => Err(EvalError::UnfilledHole),
            TermKind::Symbol(_) | TermKind::Eval(..) => Err(EvalError::Uninterpreted(term.clone())),
            TermKind::Ite(c, t, e) => {
                let c = self.lower(c, args)?.as_bool().ok_or_else(ill_sorted)?;
                let (t, e) = (self.lower(t, args)?, self.lower(e, args)?);
                if t.get_sort() != e.get_sort() {
                    return Err(ill_sorted());
                }
                Ok(c.ite(&t, &e))
            }
            TermKind::Op(op, children) => {
                let lowered = children
                    .iter()
                    .map(|c| self.lower(c, args))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply(*op, &lowered).ok_or_else(ill_sorted)
            }
        }
    }

    fn apply<'ctx>(&'ctx self, op: Op, args: &[Dynamic<'ctx>]) -> Option<Dynamic<'ctx>> {
        let bools = || args.iter().map(Dynamic::as_bool).collect::<Option<Vec<_>>>();
        let ints = || args.iter().map(Dynamic::as_int).collect::<Option<Vec<_>>>();
        let result = match op {
            Op::Not => match bools()?.as_slice() {
                [b] => Dynamic::from_ast(&b.not()),
                _ => return None,
            },
            Op::And | Op::Or => {
                let bools = bools()?;
                let refs: Vec<&Bool> = bools.iter().collect();
                match op {
                    Op::And => Dynamic::from_ast(&Bool::and(&self.z3, &refs)),
                    _ => Dynamic::from_ast(&Bool::or(&self.z3, &refs)),
                }
            }
            Op::Eq => match args {
                [a, b] if a.get_sort() == b.get_sort() => Dynamic::from_ast(&a._eq(b)),
                _ => return None,
            },
            Op::Lt | Op::Le | Op::Gt | Op::Ge => match ints()?.as_slice() {
                [a, b] => Dynamic::from_ast(&match op {
                    Op::Lt => a.lt(b),
                    Op::Le => a.le(b),
                    Op::Gt => a.gt(b),
                    _ => a.ge(b),
                }),
                _ => return None,
            },
            Op::Neg => match ints()?.as_slice() {
                [i] => Dynamic::from_ast(&i.unary_minus()),
                _ => return None,
            },
            Op::Add | Op::Sub | Op::Mul => {
                let ints = ints()?;
                if ints.is_empty() && op == Op::Sub {
                    return None;
                }
                let refs: Vec<&Int> = ints.iter().collect();
                Dynamic::from_ast(&match op {
                    Op::Add => Int::add(&self.z3, &refs),
                    Op::Sub => Int::sub(&self.z3, &refs),
                    _ => Int::mul(&self.z3, &refs),
                })
            }
        };
        Some(result)
    }
}

impl TermEvaluator for Z3Evaluator {
    fn evaluate(&self, term: &Term, args: &[Value]) -> Result<Value, EvalError> {
        let result = self.lower(term, args)?.simplify();
        if let Some(b) = result.as_bool().and_then(|b| b.as_bool()) {
            return Ok(Value::Bool(b));
        }
        result
            .as_int()
            .and_then(|i| i.as_i64())
            .map(Value::Int)
            .ok_or_else(|| EvalError::NonConstantResult(term.clone()))
    }
}
