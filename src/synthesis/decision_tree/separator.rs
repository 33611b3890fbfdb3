use std::collections::HashMap;

use crate::error::{EvalError, UnifError};
use crate::oracle::Oracles;
use crate::strategy::ConditionTemplate;
use crate::synthesis::decision_tree::trie::{ClassTrie, Classifier};
use crate::synthesis::point::PointTable;
use crate::term::{Symbol, Term, Value};

/// What a separator needs to evaluate conditions on points.
#[derive(Clone, Copy)]
pub(crate) struct SeparatorContext<'a> {
    pub(crate) points: &'a PointTable,
    pub(crate) template: Option<&'a ConditionTemplate>,
    pub(crate) oracles: Oracles<'a>,
}

/// Classification trie of a decision tree together with the cache of condition
/// outcomes per (condition, head).
#[derive(Debug, Clone, Default)]
pub(crate) struct PointSeparator {
    pub(crate) trie: ClassTrie,
    cache: HashMap<(Term, Symbol), bool>,
}

struct Levels<'a, 'b> {
    cache: &'b mut HashMap<(Term, Symbol), bool>,
    levels: &'b [Term],
    ctx: &'b SeparatorContext<'a>,
}

impl Classifier for Levels<'_, '_> {
    fn classify(&mut self, point: &Symbol, level: usize) -> Result<Value, UnifError> {
        let condition = self
            .levels
            .get(level)
            .ok_or(UnifError::MissingCondition(level))?;
        compute(self.cache, self.ctx, condition, point).map(Value::Bool)
    }
}

fn compute(
    cache: &mut HashMap<(Term, Symbol), bool>,
    ctx: &SeparatorContext<'_>,
    condition: &Term,
    head: &Symbol,
) -> Result<bool, UnifError> {
    let key = (condition.clone(), head.clone());
    if let Some(b) = cache.get(&key) {
        return Ok(*b);
    }
    let point = ctx.points.get(head)?;
    let evaluator = ctx.oracles.evaluator;
    let mut value = evaluator.evaluate(condition, &point.args)?;
    if let Some(template) = ctx.template {
        let instantiated = ctx
            .oracles
            .rewriter
            .rewrite(&template.instantiate(&Term::constant(value)));
        value = evaluator.evaluate(&instantiated, &point.args)?;
    }
    let b = value.as_bool().ok_or(EvalError::ExpectedBool(value))?;
    cache.insert(key, b);
    Ok(b)
}

impl PointSeparator {
    /// Outcome of `condition` on the input of `head`.
    pub(crate) fn evaluate(
        &mut self,
        ctx: &SeparatorContext<'_>,
        condition: &Term,
        head: &Symbol,
    ) -> Result<bool, UnifError> {
        compute(&mut self.cache, ctx, condition, head)
    }

    pub(crate) fn separates(
        &mut self,
        ctx: &SeparatorContext<'_>,
        condition: &Term,
        a: &Symbol,
        b: &Symbol,
    ) -> Result<bool, UnifError> {
        Ok(self.evaluate(ctx, condition, a)? != self.evaluate(ctx, condition, b)?)
    }

    pub(crate) fn add(
        &mut self,
        ctx: &SeparatorContext<'_>,
        levels: &[Term],
        head: &Symbol,
        ntotal: usize,
    ) -> Result<Symbol, UnifError> {
        let mut classifier = Levels {
            cache: &mut self.cache,
            levels,
            ctx,
        };
        self.trie.add(head, &mut classifier, ntotal)
    }

    pub(crate) fn add_classifier(
        &mut self,
        ctx: &SeparatorContext<'_>,
        levels: &[Term],
        ntotal: usize,
    ) -> Result<(), UnifError> {
        let mut classifier = Levels {
            cache: &mut self.cache,
            levels,
            ctx,
        };
        self.trie.add_classifier(&mut classifier, ntotal)
    }

    pub(crate) fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
