//! Purification: every application of a unification candidate in a refinement
//! lemma becomes an application of a fresh evaluation head on constant
//! arguments.

use std::collections::{BTreeMap, HashMap};

use tracing::{Level, event, instrument};

use crate::error::UnifError;
use crate::oracle::Oracles;
use crate::synthesis::{EvaluationPoint, PurifiedLemma, SygusUnif};
use crate::term::{Symbol, Term, TermKind};

type PurifyCache = HashMap<(bool, Term), Term>;

impl SygusUnif {
    /// Purifies `lemma`, records the evaluation points it mentions and registers
    /// them with the decision trees of their candidate.
    #[instrument(skip_all)]
    pub fn add_refinement_lemma(
        &mut self,
        lemma: &Term,
        oracles: &Oracles<'_>,
    ) -> Result<PurifiedLemma, UnifError> {
        let before: HashMap<Symbol, usize> = self
            .candidate_heads
            .iter()
            .map(|(c, heads)| (c.clone(), heads.len()))
            .collect();
        let mut guards = vec![];
        let mut cache = PurifyCache::new();
        let purified = self.purify(lemma, false, &mut guards, &mut cache, oracles)?;
        let purified = if guards.is_empty() {
            purified
        } else {
            guards.push(purified);
            Term::or(guards)
        };
        let purified = oracles.rewriter.rewrite(&purified);
        event!(Level::DEBUG, "Purified lemma: {purified}");

        let mut points: BTreeMap<Symbol, Vec<EvaluationPoint>> = BTreeMap::new();
        for (candidate, heads) in &self.candidate_heads {
            let seen = before.get(candidate).copied().unwrap_or(0);
            for head in &heads[seen..] {
                let point = self.points.get(head)?.clone();
                points.entry(candidate.clone()).or_default().push(point);
            }
        }
        for (candidate, new_points) in &points {
            let enumerators = self
                .condition_enumerators
                .get(candidate)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for enumerator in enumerators {
                for strategy_point in self.enumerator_points.get(enumerator).into_iter().flatten() {
                    if let Some(tree) = self.trees.get_mut(strategy_point) {
                        for p in new_points {
                            tree.add_head(p.head.clone());
                        }
                    }
                }
            }
        }
        Ok(PurifiedLemma {
            lemma: purified,
            points,
        })
    }

    pub(crate) fn purify(
        &mut self,
        term: &Term,
        ensure_const: bool,
        guards: &mut Vec<Term>,
        cache: &mut PurifyCache,
        oracles: &Oracles<'_>,
    ) -> Result<Term, UnifError> {
        let key = (ensure_const, term.clone());
        if let Some(done) = cache.get(&key) {
            return Ok(done.clone());
        }
        let purified = match term.kind() {
            TermKind::Eval(f, args) if self.is_candidate(f) => {
                self.purify_application(term, f, args, ensure_const, guards, cache, oracles)?
            }
            _ => {
                let rebuilt =
                    term.try_rebuild(|c| self.purify(c, ensure_const, guards, cache, oracles))?;
                oracles.rewriter.rewrite(&rebuilt)
            }
        };
        if ensure_const && !purified.is_const() {
            return Err(UnifError::NonConstantValue {
                term: term.clone(),
                value: purified,
            });
        }
        cache.insert(key, purified.clone());
        Ok(purified)
    }

    #[allow(clippy::too_many_arguments)]
    fn purify_application(
        &mut self,
        term: &Term,
        f: &Symbol,
        args: &[Term],
        ensure_const: bool,
        guards: &mut Vec<Term>,
        cache: &mut PurifyCache,
        oracles: &Oracles<'_>,
    ) -> Result<Term, UnifError> {
        let unif = self.uses_unification(f);
        // arguments of a unification application must be concrete
        let args = args
            .iter()
            .map(|a| self.purify(a, unif, guards, cache, oracles))
            .collect::<Result<Vec<_>, _>>()?;
        let mut app = Term::eval(f.clone(), args.clone());
        let mut point_args = None;
        if unif {
            let head = self.canonical_head(f, app, &args)?;
            let point = self.points.get(&head)?;
            app = point.application();
            point_args = Some(point.args.clone());
        }
        if ensure_const {
            let value = match (self.solutions.get(f), point_args) {
                (Some(solution), Some(values)) => {
                    Term::constant(oracles.evaluator.evaluate(solution, &values)?)
                }
                _ => oracles
                    .model
                    .model_value(term)
                    .ok_or_else(|| UnifError::MissingModelValue(term.clone()))?,
            };
            event!(Level::TRACE, "Purified {term} to {value}");
            guards.push(Term::not(Term::eq(value.clone(), app)));
            app = value;
        }
        Ok(oracles.rewriter.rewrite(&app))
    }

    /// The evaluation head standing for `app`, created on first use.
    fn canonical_head(&mut self, f: &Symbol, app: Term, args: &[Term]) -> Result<Symbol, UnifError> {
        if let Some(existing) = self.purified_apps.get(&app) {
            return Ok(existing.clone());
        }
        let values = args
            .iter()
            .map(|a| {
                a.as_const().ok_or_else(|| UnifError::NonConstantArgument {
                    candidate: f.clone(),
                    arg: a.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let count = self.head_counts.entry(f.clone()).or_default();
        let head = Symbol::new(format!("{f}_{count}"));
        *count += 1;
        event!(Level::DEBUG, "New evaluation point {head} for {app}");
        self.points.insert(EvaluationPoint {
            head: head.clone(),
            candidate: f.clone(),
            args: values,
        });
        self.candidate_heads
            .entry(f.clone())
            .or_default()
            .push(head.clone());
        self.purified_apps.insert(app, head.clone());
        Ok(head)
    }
}
