use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{Level, event, instrument};

use crate::error::UnifError;
use crate::oracle::Oracles;
use crate::strategy::ConditionTemplate;
use crate::synthesis::builder::UnifParams;
use crate::synthesis::decision_tree::explanation::{Explanation, Literal};
use crate::synthesis::decision_tree::separator::{PointSeparator, SeparatorContext};
use crate::synthesis::decision_tree::value_pool::ValuePool;
use crate::synthesis::point::PointTable;
use crate::synthesis::pool::ConditionPool;
use crate::term::{Symbol, Term, Value};

mod display;
pub mod explanation;
mod heuristic;
mod repair;
mod separator;
pub(crate) mod trie;
mod value_pool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    /// Adding points to the trie.
    Collecting,
    /// Two points with different outputs share a class.
    ResolvingConflict,
    /// Gave up; a refinement lemma was produced.
    Conflict,
    /// Every point is consistent with the trie.
    Solved,
}

/// Where the explanation was cut back to when a pooled condition was first used.
#[derive(Debug, Clone, Copy)]
struct PoolBacktrack {
    len: usize,
    /// The pool was consulted because the enumerated conditions ran out.
    needs_guard: bool,
}

/// Session state a tree reads while building.
pub(crate) struct BuildContext<'a> {
    pub(crate) params: &'a UnifParams,
    pub(crate) points: &'a PointTable,
    pub(crate) pool: &'a ConditionPool,
    pub(crate) oracles: Oracles<'a>,
}

/// Decision tree unification for one strategy point `e := ite(c, e, e) | ..`.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    candidate: Symbol,
    point: Symbol,
    condition_enumerator: Symbol,
    strategy_index: usize,
    template: Option<ConditionTemplate>,
    guard: Option<Term>,
    enumerators: Vec<Symbol>,
    conditions: Vec<Term>,
    heads: Vec<Symbol>,
    entailed: BTreeSet<Symbol>,
    separator: PointSeparator,
    values: ValuePool,
    unfolding_lemmas: HashSet<Term>,
    /// Conditions installed as trie levels by the current build.
    levels: Vec<Term>,
    state: TreeState,
}

impl DecisionTree {
    pub(crate) fn new(
        candidate: Symbol,
        point: Symbol,
        condition_enumerator: Symbol,
        strategy_index: usize,
        template: Option<ConditionTemplate>,
    ) -> Self {
        Self {
            candidate,
            point,
            condition_enumerator,
            strategy_index,
            template,
            guard: None,
            enumerators: vec![],
            conditions: vec![],
            heads: vec![],
            entailed: BTreeSet::new(),
            separator: PointSeparator::default(),
            values: ValuePool::default(),
            unfolding_lemmas: HashSet::new(),
            levels: vec![],
            state: TreeState::Collecting,
        }
    }

    pub fn candidate(&self) -> &Symbol {
        &self.candidate
    }

    pub fn condition_enumerator(&self) -> &Symbol {
        &self.condition_enumerator
    }

    pub fn strategy_index(&self) -> usize {
        self.strategy_index
    }

    pub fn heads(&self) -> &[Symbol] {
        &self.heads
    }

    pub fn state(&self) -> TreeState {
        self.state
    }

    /// Conditions of the last built tree, by trie level.
    pub fn levels(&self) -> &[Term] {
        &self.levels
    }

    pub(crate) fn add_head(&mut self, head: Symbol) {
        self.heads.push(head);
    }

    pub(crate) fn set_conditions(&mut self, guard: Term, enumerators: Vec<Symbol>, conditions: Vec<Term>) {
        self.guard = Some(guard);
        self.enumerators = enumerators;
        self.conditions = conditions;
    }

    pub(crate) fn set_entailed(&mut self, head: Symbol) -> Result<(), UnifError> {
        if !self.entailed.insert(head.clone()) {
            return Err(UnifError::AlreadyEntailed {
                point: self.point.clone(),
                head,
            });
        }
        Ok(())
    }

    pub(crate) fn begin_round(&mut self) {
        self.separator.clear_cache();
        self.state = TreeState::Collecting;
    }

    fn guard(&self) -> Result<Literal, UnifError> {
        self.guard
            .clone()
            .map(Literal::Guard)
            .ok_or_else(|| UnifError::MissingGuard(self.point.clone()))
    }

    fn model_value(ctx: &BuildContext<'_>, symbol: &Symbol) -> Result<Term, UnifError> {
        let term = Term::symbol(symbol.clone());
        ctx.oracles
            .model
            .model_value(&term)
            .ok_or(UnifError::MissingModelValue(term))
    }

    /// Builds a solution over the current points and conditions, or pushes a
    /// refinement lemma onto `lemmas` and returns `None`.
    #[instrument(skip_all, fields(point = %self.point))]
    pub(crate) fn build_solution(
        &mut self,
        ctx: &BuildContext<'_>,
        lemmas: &mut Vec<Term>,
    ) -> Result<Option<Term>, UnifError> {
        event!(
            Level::DEBUG,
            "Building with {} heads and {} conditions",
            self.heads.len(),
            self.conditions.len()
        );
        let template = self.template.clone();
        let sep = SeparatorContext {
            points: ctx.points,
            template: template.as_ref(),
            oracles: ctx.oracles,
        };
        self.separator.trie.clear();
        self.levels.clear();
        if self.heads.is_empty() {
            self.state = TreeState::Solved;
            return Self::model_value(ctx, &self.point).map(Some);
        }
        if ctx.params.conditions_independent {
            return self.build_independent(ctx, &sep);
        }
        let mut outputs: HashMap<Symbol, Term> = HashMap::new();
        let mut exp = Explanation::default();
        let mut backtrack: Option<PoolBacktrack> = None;
        let mut next_head = 0;
        // the pair being resolved: a point and the representative of its class
        let (mut e, mut er) = (self.point.clone(), self.point.clone());
        self.state = TreeState::Collecting;
        loop {
            match self.state {
                TreeState::Collecting => {
                    let Some(head) = self.heads.get(next_head).cloned() else {
                        self.state = TreeState::Solved;
                        break;
                    };
                    next_head += 1;
                    let value = Self::model_value(ctx, &head)?;
                    if ctx.params.return_value_pool {
                        self.values
                            .add(ctx.points.get(&head)?, &value, ctx.oracles.evaluator)?;
                    }
                    outputs.insert(head.clone(), value);
                    let rep = self
                        .separator
                        .add(&sep, &self.levels, &head, self.levels.len())?;
                    if rep == head {
                        continue;
                    }
                    if outputs.get(&head) == outputs.get(&rep) {
                        let literal = if ctx.params.return_value_pool {
                            self.eval_literal(ctx, &rep, &head, true, lemmas)?
                        } else {
                            Literal::HeadsEqual(rep, head)
                        };
                        exp.push(literal);
                        continue;
                    }
                    event!(Level::TRACE, "{head} conflicts with {rep}");
                    e = head;
                    er = rep;
                    self.state = TreeState::ResolvingConflict;
                }
                TreeState::ResolvingConflict => {
                    if ctx.params.return_value_pool {
                        if let Some(common) = self.merge_value_pools(ctx, &e, &er, &mut exp, lemmas)? {
                            event!(Level::TRACE, "Merged {e} into the class of {er} with {common}");
                            for member in self.separator.trie.class(&er) {
                                outputs.insert(member.clone(), common.clone());
                            }
                            outputs.insert(e.clone(), common);
                            self.state = TreeState::Collecting;
                            continue;
                        }
                    } else {
                        exp.push(Literal::HeadsDistinct(e.clone(), er.clone()));
                    }
                    if !self.pick_condition(ctx, &sep, &er, &e, &mut exp, &mut backtrack)? {
                        exp.push(self.guard()?);
                        self.state = TreeState::Conflict;
                        break;
                    }
                    let previous_class = self.separator.trie.class(&er).to_vec();
                    self.separator
                        .add_classifier(&sep, &self.levels, self.levels.len() - 1)?;
                    if self.separator.trie.is_representative(&e) {
                        self.state = TreeState::Collecting;
                        continue;
                    }
                    if self.separator.trie.class(&er).contains(&e) {
                        event!(
                            Level::DEBUG,
                            "Condition {} did not separate {e} from {er}",
                            self.levels.len() - 1
                        );
                        self.state = TreeState::Conflict;
                        break;
                    }
                    // e now shares a class with some other earlier member
                    let trie = &self.separator.trie;
                    er = previous_class
                        .iter()
                        .find(|c| **c != er && **c != e && trie.class(c).contains(&e))
                        .cloned()
                        .ok_or_else(|| UnifError::LostSeparationClass(e.clone()))?;
                }
                TreeState::Conflict | TreeState::Solved => break,
            }
        }
        if self.state == TreeState::Conflict {
            if let Some(bt) = backtrack {
                exp.truncate(bt.len);
                if bt.needs_guard {
                    exp.push(self.guard()?);
                }
            }
            event!(Level::DEBUG, "Separation conflict: {}", exp.display());
            lemmas.push(ctx.oracles.rewriter.rewrite(&exp.refutation()));
            return Ok(None);
        }
        if ctx.params.heuristic_rebuild {
            self.rebuild(ctx, &sep, &outputs)?;
        }
        self.extract(&outputs).map(Some)
    }

    fn build_independent(
        &mut self,
        ctx: &BuildContext<'_>,
        sep: &SeparatorContext<'_>,
    ) -> Result<Option<Term>, UnifError> {
        self.levels = ctx.pool.conditions().to_vec();
        for level in 0..self.levels.len() {
            self.separator.add_classifier(sep, &self.levels, level)?;
        }
        let mut outputs: HashMap<Symbol, Term> = HashMap::new();
        for head in self.heads.clone() {
            let value = Self::model_value(ctx, &head)?;
            outputs.insert(head.clone(), value);
            let rep = self
                .separator
                .add(sep, &self.levels, &head, self.levels.len())?;
            if rep != head && outputs.get(&head) != outputs.get(&rep) {
                event!(Level::DEBUG, "Cannot separate {head} from {rep}");
                self.state = TreeState::Conflict;
                return Ok(None);
            }
        }
        self.state = TreeState::Solved;
        self.extract(&outputs).map(Some)
    }

    /// Chooses the condition for the next trie level to separate `first` from
    /// `second`. Returns `false` when there is none.
    fn pick_condition(
        &mut self,
        ctx: &BuildContext<'_>,
        sep: &SeparatorContext<'_>,
        first: &Symbol,
        second: &Symbol,
        exp: &mut Explanation,
        backtrack: &mut Option<PoolBacktrack>,
    ) -> Result<bool, UnifError> {
        let index = self.levels.len();
        let enumerated = self
            .enumerators
            .get(index)
            .cloned()
            .zip(self.conditions.get(index).cloned());
        let has_enumerated = enumerated.is_some();
        let mut separates = false;
        if let Some((enumerator, value)) = enumerated {
            let condition = repair::repair_to_separate(
                &value,
                ctx.points.get(first)?,
                ctx.points.get(second)?,
                ctx.oracles.evaluator,
                ctx.params.repair_conditions,
            );
            exp.push(Literal::Condition {
                explanation: ctx.oracles.explainer.explain_equality(&enumerator, &value),
                enumerator,
                value,
            });
            separates = self.separator.separates(sep, &condition, first, second)?;
            self.levels.push(condition);
        }
        if ctx.params.condition_pool && !separates {
            for condition in ctx.pool.conditions() {
                if !self.separator.separates(sep, condition, first, second)? {
                    continue;
                }
                event!(Level::TRACE, "Picked {condition} from pool to separate {first} and {second}");
                if backtrack.is_none() {
                    *backtrack = Some(PoolBacktrack {
                        len: exp.len(),
                        needs_guard: !has_enumerated,
                    });
                }
                if has_enumerated {
                    self.levels[index] = condition.clone();
                } else {
                    self.levels.push(condition.clone());
                }
                return Ok(true);
            }
        }
        Ok(has_enumerated)
    }

    /// Intersects the pooled values compatible with `head` and with every member of
    /// the class of `rep`. Returns the first common value, if any.
    fn merge_value_pools(
        &mut self,
        ctx: &BuildContext<'_>,
        head: &Symbol,
        rep: &Symbol,
        exp: &mut Explanation,
        lemmas: &mut Vec<Term>,
    ) -> Result<Option<Term>, UnifError> {
        let class = self.separator.trie.class(rep).to_vec();
        let evaluator = ctx.oracles.evaluator;
        let mut merged = self.values.compatible(ctx.points.get(head)?, evaluator)?;
        for member in &class {
            let other = self.values.compatible(ctx.points.get(member)?, evaluator)?;
            merged = merged.intersection(&other).cloned().collect();
            if merged.is_empty() {
                exp.push(self.eval_literal(ctx, member, head, false, lemmas)?);
                return Ok(None);
            }
        }
        exp.push(self.eval_literal(ctx, rep, head, true, lemmas)?);
        Ok(merged.into_iter().next())
    }

    /// `(left pt) = (right pt)` (or its negation) on the input of `left`. An
    /// agreement also records unfolding lemmas for the pooled values of `right`.
    fn eval_literal(
        &mut self,
        ctx: &BuildContext<'_>,
        left: &Symbol,
        right: &Symbol,
        equal: bool,
        lemmas: &mut Vec<Term>,
    ) -> Result<Literal, UnifError> {
        let args = ctx.points.get(left)?.args.clone();
        if !equal {
            return Ok(Literal::EvalDiffer {
                left: left.clone(),
                right: right.clone(),
                args,
            });
        }
        if let Some(required) = self.values.current(left) {
            let evaluator = ctx.oracles.evaluator;
            let at_left = Term::eval(
                right.clone(),
                args.iter().copied().map(Term::constant).collect(),
            );
            for value in self.values.compatible(ctx.points.get(right)?, evaluator)? {
                if evaluator.evaluate(&value, &args)? != required {
                    continue;
                }
                let lemma = Term::or(vec![
                    Term::not(ctx.oracles.explainer.explain_equality(right, &value)),
                    Term::eq(at_left.clone(), Term::constant(required)),
                ]);
                if self.unfolding_lemmas.insert(lemma.clone()) {
                    event!(Level::TRACE, "Unfolding lemma {lemma}");
                    lemmas.push(lemma);
                }
            }
        }
        Ok(Literal::EvalAgree {
            left: left.clone(),
            right: right.clone(),
            args,
        })
    }

    /// The `ite` condition contributed by the condition at trie level `level`.
    fn ite_condition(&self, condition: &Term) -> Term {
        match &self.template {
            Some(template) => template.instantiate(condition),
            None => condition.clone(),
        }
    }

    /// Folds the trie into a term: leaves are outputs, splits are `ite`s.
    fn extract(&self, outputs: &HashMap<Symbol, Term>) -> Result<Term, UnifError> {
        let solution = self.separator.trie.fold(
            |p| {
                outputs
                    .get(p)
                    .cloned()
                    .ok_or_else(|| UnifError::MissingModelValue(Term::symbol(p.clone())))
            },
            |depth, mut branches| {
                if branches.len() == 1 {
                    return Ok(branches.remove(0).1);
                }
                let branch = |b: bool| branches.iter().find(|(v, _)| *v == Value::Bool(b)).map(|(_, t)| t);
                match (branch(true), branch(false)) {
                    (Some(then), Some(otherwise)) if then == otherwise => Ok(then.clone()),
                    (Some(then), Some(otherwise)) => {
                        let condition = self
                            .levels
                            .get(depth)
                            .ok_or(UnifError::MissingCondition(depth))?;
                        Ok(Term::ite(self.ite_condition(condition), then.clone(), otherwise.clone()))
                    }
                    _ => Err(UnifError::MissingCondition(depth)),
                }
            },
        )?;
        let solution = solution.ok_or_else(|| UnifError::MissingModelValue(Term::symbol(self.point.clone())))?;
        event!(
            Level::DEBUG,
            "Solution for {} over {} classes: {solution}",
            self.point,
            self.separator.trie.class_count()
        );
        Ok(solution)
    }
}
