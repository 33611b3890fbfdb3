use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::UnifError;
use crate::oracle::TermEvaluator;
use crate::synthesis::point::EvaluationPoint;
use crate::term::{Symbol, Term, Value};

#[derive(Debug, Clone, Default)]
struct HeadBuckets {
    /// Prefix of the pooled values already bucketed for this head.
    seen: usize,
    by_result: HashMap<Value, BTreeSet<Term>>,
}

/// Output programs seen so far, bucketed per head by their result on the
/// head's own input.
#[derive(Debug, Clone, Default)]
pub(crate) struct ValuePool {
    values: Vec<Term>,
    known: HashSet<Term>,
    buckets: HashMap<Symbol, HeadBuckets>,
    current: HashMap<Symbol, Value>,
}

impl ValuePool {
    /// Records `value` as the output of `point` and as a pooled output program.
    pub(crate) fn add(
        &mut self,
        point: &EvaluationPoint,
        value: &Term,
        evaluator: &dyn TermEvaluator,
    ) -> Result<(), UnifError> {
        let result = evaluator.evaluate(value, &point.args)?;
        self.current.insert(point.head.clone(), result);
        if self.known.insert(value.clone()) {
            self.values.push(value.clone());
        }
        Ok(())
    }

    pub(crate) fn current(&self, head: &Symbol) -> Option<Value> {
        self.current.get(head).copied()
    }

    /// Pooled values whose result on the input of `point` equals its current output.
    pub(crate) fn compatible(
        &mut self,
        point: &EvaluationPoint,
        evaluator: &dyn TermEvaluator,
    ) -> Result<BTreeSet<Term>, UnifError> {
        let Some(current) = self.current.get(&point.head).copied() else {
            return Ok(BTreeSet::new());
        };
        let buckets = self.buckets.entry(point.head.clone()).or_default();
        for value in &self.values[buckets.seen..] {
            let result = evaluator.evaluate(value, &point.args)?;
            buckets.by_result.entry(result).or_default().insert(value.clone());
        }
        buckets.seen = self.values.len();
        Ok(buckets.by_result.get(&current).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::oracle::BuiltinEvaluator;
    use crate::synthesis::decision_tree::value_pool::ValuePool;
    use crate::synthesis::point::EvaluationPoint;
    use crate::term::{Symbol, Term, Value};

    fn point(head: &str, x: i64) -> EvaluationPoint {
        EvaluationPoint {
            head: Symbol::new(head),
            candidate: Symbol::new("f"),
            args: vec![Value::Int(x)],
        }
    }

    #[test]
    fn buckets_new_values_lazily() {
        let mut pool = ValuePool::default();
        let (p0, p1) = (point("f_0", 0), point("f_1", 5));
        let zero = Term::int(0);
        let ident = Term::var(0);
        pool.add(&p0, &zero, &BuiltinEvaluator).unwrap();
        assert_eq!(pool.compatible(&p0, &BuiltinEvaluator).unwrap().len(), 1);
        // x0 also yields 0 on p0, and 5 on p1
        pool.add(&p1, &ident, &BuiltinEvaluator).unwrap();
        let on_p0 = pool.compatible(&p0, &BuiltinEvaluator).unwrap();
        assert!(on_p0.contains(&zero) && on_p0.contains(&ident));
        let on_p1 = pool.compatible(&p1, &BuiltinEvaluator).unwrap();
        assert_eq!(on_p1.into_iter().collect::<Vec<_>>(), vec![ident]);
        assert_eq!(pool.current(&p1.head), Some(Value::Int(5)));
    }
}
