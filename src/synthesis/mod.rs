use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{Level, event, instrument};

use crate::error::UnifError;
use crate::oracle::Oracles;
use crate::strategy::{EligiblePoint, StrategyGraph, classify};
use crate::synthesis::builder::UnifParams;
use crate::synthesis::decision_tree::{BuildContext, DecisionTree};
use crate::synthesis::point::PointTable;
use crate::term::{Symbol, Term, TermKind};

pub mod builder;
pub mod decision_tree;
mod point;
mod pool;
mod purify;

pub use point::EvaluationPoint;
pub use pool::ConditionPool;

/// What registering a candidate found out about its strategy graph.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// Strategy points that got a decision tree.
    pub enumerators: Vec<Symbol>,
    /// Prune lemmas of the alternatives that will not be used.
    pub strategy_lemmas: BTreeMap<Symbol, Vec<Term>>,
    pub unused_strategies: BTreeMap<Symbol, BTreeSet<usize>>,
}

#[derive(Debug, Clone)]
pub struct PurifiedLemma {
    pub lemma: Term,
    /// Evaluation points created while purifying, per candidate.
    pub points: BTreeMap<Symbol, Vec<EvaluationPoint>>,
}

#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    pub solutions: BTreeMap<Symbol, Term>,
    pub lemmas: Vec<Term>,
    /// Every candidate got a solution.
    pub complete: bool,
}

/// Refinement-lemma-guided unification over a set of candidates.
#[derive(Debug)]
pub struct SygusUnif {
    params: UnifParams,
    candidates: Vec<Symbol>,
    strategies: HashMap<Symbol, StrategyGraph>,
    unif_candidates: HashSet<Symbol>,
    points: PointTable,
    candidate_heads: HashMap<Symbol, Vec<Symbol>>,
    head_counts: HashMap<Symbol, usize>,
    /// Purified unification applications to the evaluation head standing for them.
    purified_apps: HashMap<Term, Symbol>,
    solutions: HashMap<Symbol, Term>,
    /// Candidate to the condition enumerators of its decision trees.
    condition_enumerators: HashMap<Symbol, Vec<Symbol>>,
    /// Condition enumerator to the strategy points it decides.
    enumerator_points: HashMap<Symbol, Vec<Symbol>>,
    trees: BTreeMap<Symbol, DecisionTree>,
    pools: HashMap<Symbol, ConditionPool>,
}

impl SygusUnif {
    pub fn new(params: UnifParams) -> Self {
        Self {
            params,
            candidates: vec![],
            strategies: HashMap::new(),
            unif_candidates: HashSet::new(),
            points: PointTable::default(),
            candidate_heads: HashMap::new(),
            head_counts: HashMap::new(),
            purified_apps: HashMap::new(),
            solutions: HashMap::new(),
            condition_enumerators: HashMap::new(),
            enumerator_points: HashMap::new(),
            trees: BTreeMap::new(),
            pools: HashMap::new(),
        }
    }

    pub fn params(&self) -> &UnifParams {
        &self.params
    }

    pub fn uses_unification(&self, candidate: &Symbol) -> bool {
        self.unif_candidates.contains(candidate)
    }

    pub fn is_candidate(&self, symbol: &Symbol) -> bool {
        self.strategies.contains_key(symbol)
    }

    pub fn evaluation_heads(&self, candidate: &Symbol) -> &[Symbol] {
        self.candidate_heads
            .get(candidate)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn evaluation_point(&self, head: &Symbol) -> Option<&EvaluationPoint> {
        self.points.get(head).ok()
    }

    pub fn decision_tree(&self, point: &Symbol) -> Option<&DecisionTree> {
        self.trees.get(point)
    }

    pub fn condition_enumerator(&self, point: &Symbol) -> Option<&Symbol> {
        self.trees.get(point).map(DecisionTree::condition_enumerator)
    }

    pub fn condition_pool(&self, candidate: &Symbol) -> Option<&ConditionPool> {
        self.pools.get(candidate)
    }

    /// The last solution built for a unification candidate.
    pub fn solution(&self, candidate: &Symbol) -> Option<&Term> {
        self.solutions.get(candidate)
    }

    fn reset_candidate(&mut self, candidate: &Symbol) {
        event!(Level::DEBUG, "Resetting unification state of {candidate}");
        self.unif_candidates.remove(candidate);
        self.trees.retain(|_, t| t.candidate() != candidate);
        for enumerator in self.condition_enumerators.remove(candidate).unwrap_or_default() {
            self.enumerator_points.remove(&enumerator);
        }
        self.pools.remove(candidate);
        self.candidate_heads.remove(candidate);
        self.head_counts.remove(candidate);
        self.solutions.remove(candidate);
        self.points.retain_candidates(|c| c != candidate);
        self.purified_apps.retain(|app, _| {
            !matches!(app.kind(), TermKind::Eval(f, _) if f == candidate)
        });
    }

    /// Registers `candidate` with its strategy graph and binds a decision tree to
    /// every strategy point with a recursive `ite` alternative. Registering a
    /// candidate again starts its session over.
    #[instrument(skip_all, fields(candidate = %candidate))]
    pub fn register_candidate(&mut self, candidate: Symbol, graph: StrategyGraph) -> Registration {
        if self.strategies.contains_key(&candidate) {
            self.reset_candidate(&candidate);
        } else {
            self.candidates.push(candidate.clone());
        }
        let classification = classify(&graph);
        let mut registration = Registration {
            enumerators: vec![],
            strategy_lemmas: classification.lemmas,
            unused_strategies: classification.unused,
        };
        for eligible in classification.eligible {
            if self.register_tree(&candidate, &graph, eligible.clone()) {
                registration.enumerators.push(eligible.point);
            }
        }
        event!(
            Level::DEBUG,
            "Registered {} decision tree(s) for {candidate}",
            registration.enumerators.len()
        );
        self.strategies.insert(candidate, graph);
        registration
    }

    fn register_tree(&mut self, candidate: &Symbol, graph: &StrategyGraph, eligible: EligiblePoint) -> bool {
        if self.trees.contains_key(&eligible.point) {
            return false;
        }
        event!(
            Level::TRACE,
            "Strategy point {} decided by {}",
            eligible.point,
            eligible.condition
        );
        self.unif_candidates.insert(candidate.clone());
        let enumerators = self.condition_enumerators.entry(candidate.clone()).or_default();
        if !enumerators.contains(&eligible.condition) {
            enumerators.push(eligible.condition.clone());
        }
        self.enumerator_points
            .entry(eligible.condition.clone())
            .or_default()
            .push(eligible.point.clone());
        let tree = DecisionTree::new(
            candidate.clone(),
            eligible.point.clone(),
            eligible.condition.clone(),
            eligible.strategy_index,
            graph.template(&eligible.condition).cloned(),
        );
        self.trees.insert(eligible.point, tree);
        true
    }

    /// Hands the enumerated conditions for the strategy point `point` to its tree.
    /// `guard` is the literal asserted by the outer loop while this set of
    /// conditions is in use.
    pub fn set_conditions(
        &mut self,
        point: &Symbol,
        guard: Term,
        enumerators: Vec<Symbol>,
        conditions: Vec<Term>,
    ) -> Result<(), UnifError> {
        if enumerators.len() != conditions.len() {
            return Err(UnifError::ConditionArity {
                enumerators: enumerators.len(),
                values: conditions.len(),
            });
        }
        let tree = self
            .trees
            .get_mut(point)
            .ok_or_else(|| UnifError::UnknownStrategyPoint(point.clone()))?;
        if self.params.pools_conditions() {
            let pool = self.pools.entry(tree.candidate().clone()).or_default();
            for c in &conditions {
                if pool.insert(c.clone()) {
                    event!(Level::TRACE, "Pooled condition {c}");
                }
            }
        }
        tree.set_conditions(guard, enumerators, conditions);
        Ok(())
    }

    pub fn set_entailed(&mut self, point: &Symbol, head: Symbol) -> Result<(), UnifError> {
        self.trees
            .get_mut(point)
            .ok_or_else(|| UnifError::UnknownStrategyPoint(point.clone()))?
            .set_entailed(head)
    }

    /// Builds a solution for every candidate. Candidates whose tree is in
    /// separation conflict contribute refinement lemmas instead.
    #[instrument(skip_all)]
    pub fn construct_solutions(&mut self, oracles: &Oracles<'_>) -> Result<Synthesis, UnifError> {
        for tree in self.trees.values_mut() {
            tree.begin_round();
        }
        let mut synthesis = Synthesis {
            complete: true,
            ..Default::default()
        };
        for candidate in self.candidates.clone() {
            let solution = if self.uses_unification(&candidate) {
                self.construct_solution(&candidate, oracles, &mut synthesis.lemmas)?
            } else {
                Some(model_value(oracles, &candidate)?)
            };
            match solution {
                Some(solution) => {
                    event!(Level::INFO, "{candidate} := {solution}");
                    if self.uses_unification(&candidate) {
                        self.solutions.insert(candidate.clone(), solution.clone());
                    }
                    synthesis.solutions.insert(candidate, solution);
                }
                None => synthesis.complete = false,
            }
        }
        event!(
            Level::DEBUG,
            "Built {} solution(s), {} lemma(s)",
            synthesis.solutions.len(),
            synthesis.lemmas.len()
        );
        Ok(synthesis)
    }

    fn construct_solution(
        &mut self,
        candidate: &Symbol,
        oracles: &Oracles<'_>,
        lemmas: &mut Vec<Term>,
    ) -> Result<Option<Term>, UnifError> {
        let root = self
            .strategies
            .get(candidate)
            .ok_or_else(|| UnifError::UnknownCandidate(candidate.clone()))?
            .root()
            .clone();
        let Some(tree) = self.trees.get_mut(&root) else {
            return model_value(oracles, &root).map(Some);
        };
        let empty = ConditionPool::default();
        let ctx = BuildContext {
            params: &self.params,
            points: &self.points,
            pool: self.pools.get(candidate).unwrap_or(&empty),
            oracles: *oracles,
        };
        tree.build_solution(&ctx, lemmas)
    }
}

fn model_value(oracles: &Oracles<'_>, symbol: &Symbol) -> Result<Term, UnifError> {
    let term = Term::symbol(symbol.clone());
    oracles
        .model
        .model_value(&term)
        .ok_or(UnifError::MissingModelValue(term))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use crate::error::UnifError;
    use crate::oracle::{
        BuiltinEvaluator, ModelMap, Oracles, Simplifier, SyntacticExplainer, TermEvaluator,
        TermRewriter,
    };
    use crate::strategy::{ConditionTemplate, StrategyGraph};
    use crate::synthesis::builder::{UnifParams, UnifParamsBuilder};
    use crate::synthesis::decision_tree::TreeState;
    use crate::synthesis::{SygusUnif, Synthesis};
    use crate::term::{Symbol, Term, Value};

    struct Session {
        unif: SygusUnif,
        model: ModelMap,
    }

    impl Session {
        fn new(params: UnifParams) -> Self {
            Self::with_graph(params, StrategyGraph::recursive_ite("e", "c"))
        }

        fn with_graph(params: UnifParams, graph: StrategyGraph) -> Self {
            let mut unif = params.build();
            unif.register_candidate(Symbol::new("f"), graph);
            Self {
                unif,
                model: ModelMap::default(),
            }
        }

        fn point(&mut self, x: i64, output: Term) -> Symbol {
            let oracles = Oracles::new(&BuiltinEvaluator, &Simplifier, &self.model, &SyntacticExplainer);
            let lemma = Term::eq(Term::eval("f", vec![Term::int(x)]), Term::int(0));
            let purified = self.unif.add_refinement_lemma(&lemma, &oracles).unwrap();
            let head = purified.points[&Symbol::new("f")][0].head.clone();
            self.model.assign(head.clone(), output);
            head
        }

        fn conditions(&mut self, conditions: &[&str]) {
            let enumerators = (0..conditions.len())
                .map(|i| Symbol::new(format!("c_{i}")))
                .collect();
            let conditions = conditions.iter().map(|c| c.parse().unwrap()).collect();
            self.unif
                .set_conditions(&Symbol::new("e"), Term::symbol("G"), enumerators, conditions)
                .unwrap();
        }

        fn solve(&mut self) -> Synthesis {
            let oracles = Oracles::new(&BuiltinEvaluator, &Simplifier, &self.model, &SyntacticExplainer);
            self.unif.construct_solutions(&oracles).unwrap()
        }

        fn solution(&mut self) -> String {
            let synthesis = self.solve();
            assert!(synthesis.complete, "lemmas: {:?}", synthesis.lemmas);
            synthesis.solutions[&Symbol::new("f")].to_string()
        }

        fn state(&self) -> TreeState {
            self.unif.decision_tree(&Symbol::new("e")).unwrap().state()
        }
    }

    fn no_pool() -> UnifParams {
        UnifParamsBuilder::default().condition_pool(false).build().unwrap()
    }

    #[test]
    fn separates_two_points() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::bool(true));
        s.point(1, Term::bool(false));
        s.conditions(&["(> x0 0)"]);
        assert_eq!(s.solution(), "(ite (> x0 0) false true)");
        assert_eq!(s.state(), TreeState::Solved);
    }

    #[test]
    fn exhausted_conditions_emit_guarded_lemma() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::bool(true));
        s.point(1, Term::bool(false));
        s.conditions(&[]);
        let synthesis = s.solve();
        assert!(!synthesis.complete);
        assert!(synthesis.solutions.is_empty());
        assert_eq!(
            synthesis.lemmas,
            vec!["(not (and (not (= f_1 f_0)) G))".parse::<Term>().unwrap()]
        );
        assert_eq!(s.state(), TreeState::Conflict);
    }

    #[test]
    fn unhelpful_condition_emits_separation_lemma() {
        let mut s = Session::new(no_pool());
        s.point(0, Term::bool(true));
        s.point(1, Term::bool(false));
        s.conditions(&["(> x0 5)"]);
        let synthesis = s.solve();
        assert_eq!(
            synthesis.lemmas,
            vec!["(not (and (not (= f_1 f_0)) (= c_0 (> x0 5))))".parse::<Term>().unwrap()]
        );
    }

    #[test]
    fn lemma_is_false_in_current_model() {
        let mut s = Session::new(no_pool());
        s.point(0, Term::int(1));
        s.point(1, Term::int(2));
        s.conditions(&["(> x0 5)"]);
        let synthesis = s.solve();
        let [lemma] = synthesis.lemmas.as_slice() else {
            panic!("expected one lemma, got {:?}", synthesis.lemmas);
        };
        let current = lemma
            .substitute(&Term::symbol("f_0"), &Term::int(1))
            .substitute(&Term::symbol("f_1"), &Term::int(2))
            .substitute(&Term::symbol("c_0"), &"(> x0 5)".parse().unwrap());
        assert_eq!(Simplifier.rewrite(&current), Term::bool(false));
        // the same model reproduces the same conflict
        assert_eq!(s.solve().lemmas, synthesis.lemmas);
    }

    #[test]
    fn equal_outputs_merge_without_splitting() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::int(7));
        s.point(3, Term::int(7));
        s.conditions(&["(> x0 0)"]);
        assert_eq!(s.solution(), "7");
        assert!(s.unif.decision_tree(&Symbol::new("e")).unwrap().levels().is_empty());
    }

    #[test]
    fn pool_fills_in_for_enumerated_condition() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::bool(true));
        s.point(1, Term::bool(false));
        s.conditions(&["(> x0 0)"]);
        s.solution();
        s.conditions(&["(> x0 5)"]);
        assert_eq!(s.solution(), "(ite (> x0 0) false true)");
        let pool = s.unif.condition_pool(&Symbol::new("f")).unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&"(> x0 5)".parse().unwrap()));
    }

    #[test]
    fn pool_backtrack_drops_later_literals() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::int(1));
        s.point(1, Term::int(2));
        s.conditions(&["(> x0 0)"]);
        s.solution();
        s.point(2, Term::int(3));
        s.conditions(&["(> x0 5)"]);
        let synthesis = s.solve();
        assert_eq!(
            synthesis.lemmas,
            vec!["(not (and (not (= f_1 f_0)) (= c_0 (> x0 5))))".parse::<Term>().unwrap()]
        );
    }

    #[test]
    fn pool_without_enumerated_condition_keeps_guard() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::int(1));
        s.point(1, Term::int(2));
        s.conditions(&["(> x0 0)"]);
        s.solution();
        s.point(2, Term::int(3));
        s.conditions(&[]);
        let synthesis = s.solve();
        // f_1 and f_2 cannot be told apart by anything pooled
        assert_eq!(
            synthesis.lemmas,
            vec!["(not (and (not (= f_1 f_0)) G))".parse::<Term>().unwrap()]
        );
    }

    #[test]
    fn separation_recurses_through_class_members() {
        let mut s = Session::new(no_pool());
        s.point(0, Term::int(1));
        s.point(5, Term::int(1));
        s.point(3, Term::int(2));
        s.conditions(&["(< x0 1)"]);
        let synthesis = s.solve();
        assert!(!synthesis.complete);
        // f_2 joins the class of f_1, which shares its output with f_0
        assert_eq!(
            synthesis.lemmas,
            vec![
                "(not (and (= f_0 f_1) (not (= f_2 f_0)) (= c_0 (< x0 1)) (not (= f_2 f_1)) G))"
                    .parse::<Term>()
                    .unwrap()
            ]
        );
        s.conditions(&["(< x0 1)", "(> x0 4)"]);
        assert_eq!(s.solution(), "(ite (< x0 1) 1 (ite (> x0 4) 1 2))");
    }

    #[test]
    fn holes_are_repaired() {
        let mut s = Session::new(no_pool());
        s.point(2, Term::int(1));
        s.point(6, Term::int(2));
        s.conditions(&["(> x0 ?)"]);
        assert_eq!(s.solution(), "(ite (> x0 2) 2 1)");
    }

    #[test]
    fn repair_keeps_enumerated_value_in_lemma() {
        let mut s = Session::new(no_pool());
        s.point(2, Term::int(1));
        s.point(6, Term::int(2));
        s.point(4, Term::int(3));
        s.conditions(&["(> x0 ?)"]);
        let synthesis = s.solve();
        assert_eq!(
            synthesis.lemmas,
            vec!["(not (and (not (= f_1 f_0)) (= c_0 (> x0 ?)) (not (= f_2 f_1)) G))"
                .parse::<Term>()
                .unwrap()]
        );
        let tree = s.unif.decision_tree(&Symbol::new("e")).unwrap();
        assert_eq!(tree.levels(), &["(> x0 2)".parse::<Term>().unwrap()]);
    }

    #[test]
    fn return_values_merge_points() {
        let params = UnifParamsBuilder::default()
            .condition_pool(false)
            .return_value_pool(true)
            .build()
            .unwrap();
        let mut s = Session::new(params);
        s.point(0, Term::int(0));
        s.point(1, Term::var(0));
        s.conditions(&[]);
        let synthesis = s.solve();
        assert!(synthesis.complete);
        assert_eq!(synthesis.solutions[&Symbol::new("f")], Term::var(0));
        assert_eq!(
            synthesis.lemmas,
            vec!["(or (not (= f_1 x0)) (= (f_1 0) 0))".parse::<Term>().unwrap()]
        );
    }

    #[test]
    fn return_value_mismatch_is_explained() {
        let params = UnifParamsBuilder::default()
            .condition_pool(false)
            .return_value_pool(true)
            .build()
            .unwrap();
        let mut s = Session::new(params);
        s.point(0, Term::int(1));
        s.point(1, Term::int(2));
        s.conditions(&[]);
        let synthesis = s.solve();
        assert_eq!(
            synthesis.lemmas,
            vec!["(not (and (not (= (f_0 0) (f_1 0))) G))".parse::<Term>().unwrap()]
        );
    }

    #[test]
    fn return_value_merge_fails_on_later_member() {
        let params = UnifParamsBuilder::default()
            .condition_pool(false)
            .return_value_pool(true)
            .build()
            .unwrap();
        let mut s = Session::new(params);
        s.point(0, Term::int(0));
        s.point(1, Term::var(0));
        s.point(2, "(* 2 x0)".parse().unwrap());
        s.conditions(&[]);
        let synthesis = s.solve();
        assert!(!synthesis.complete);
        // x0 covers f_0 but not f_2, although f_0 joined the class first
        assert_eq!(
            synthesis.lemmas,
            vec![
                "(or (not (= f_1 x0)) (= (f_1 0) 0))".parse::<Term>().unwrap(),
                "(not (and (= (f_0 0) (f_1 0)) (not (= (f_1 1) (f_2 1))) G))"
                    .parse::<Term>()
                    .unwrap(),
            ]
        );
    }

    #[test]
    fn heuristic_rebuild_prefers_informative_condition() {
        let params = UnifParamsBuilder::default()
            .heuristic_rebuild(true)
            .build()
            .unwrap();
        let mut s = Session::new(params);
        for (x, out) in [(0, 1), (1, 1), (2, 2), (3, 2)] {
            s.point(x, Term::int(out));
        }
        s.conditions(&["(> x0 0)", "(> x0 1)"]);
        assert_eq!(s.solution(), "(ite (> x0 1) 2 1)");
        assert_eq!(s.unif.decision_tree(&Symbol::new("e")).unwrap().levels().len(), 1);
    }

    #[test]
    fn incremental_tree_without_rebuild() {
        let mut s = Session::new(UnifParams::default());
        for (x, out) in [(0, 1), (1, 1), (2, 2), (3, 2)] {
            s.point(x, Term::int(out));
        }
        s.conditions(&["(> x0 0)", "(> x0 1)"]);
        assert_eq!(s.solution(), "(ite (> x0 0) (ite (> x0 1) 2 1) 1)");
    }

    #[test]
    fn independent_conditions() {
        let params = UnifParamsBuilder::default()
            .conditions_independent(true)
            .build()
            .unwrap();
        let mut s = Session::new(params.clone());
        s.point(0, Term::int(1));
        s.point(1, Term::int(2));
        s.conditions(&["(> x0 0)"]);
        assert_eq!(s.solution(), "(ite (> x0 0) 2 1)");

        let mut s = Session::new(params);
        s.point(0, Term::int(1));
        s.point(1, Term::int(2));
        s.conditions(&["(> x0 5)"]);
        let synthesis = s.solve();
        assert!(!synthesis.complete);
        assert!(synthesis.lemmas.is_empty());
    }

    #[test]
    fn templated_conditions() {
        let template = ConditionTemplate {
            term: "(> x0 k)".parse().unwrap(),
            arg: Symbol::new("k"),
        };
        let graph = StrategyGraph::recursive_ite("e", "c").with_template("c", template);
        let mut s = Session::with_graph(UnifParams::default(), graph);
        s.point(0, Term::bool(true));
        s.point(1, Term::bool(false));
        s.conditions(&["0"]);
        assert_eq!(s.solution(), "(ite (> x0 0) false true)");
    }

    #[test]
    fn fallbacks_use_model_values() {
        let mut unif = UnifParams::default().build();
        unif.register_candidate(Symbol::new("f"), StrategyGraph::recursive_ite("e", "c"));
        unif.register_candidate(Symbol::new("g"), StrategyGraph::new("g_e"));
        assert!(unif.uses_unification(&Symbol::new("f")));
        assert!(!unif.uses_unification(&Symbol::new("g")));
        let mut model = ModelMap::default();
        model.assign("e", Term::int(5));
        model.assign("g", "(+ x0 1)".parse().unwrap());
        let oracles = Oracles::new(&BuiltinEvaluator, &Simplifier, &model, &SyntacticExplainer);
        let synthesis = unif.construct_solutions(&oracles).unwrap();
        assert!(synthesis.complete);
        assert_eq!(synthesis.solutions[&Symbol::new("f")], Term::int(5));
        assert_eq!(synthesis.solutions[&Symbol::new("g")].to_string(), "(+ x0 1)");
    }

    #[test]
    fn reregistration_resets_session() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::int(1));
        s.conditions(&["(> x0 0)"]);
        let f = Symbol::new("f");
        assert_eq!(s.unif.evaluation_heads(&f).len(), 1);
        let registration = s
            .unif
            .register_candidate(f.clone(), StrategyGraph::recursive_ite("e", "c"));
        assert_eq!(registration.enumerators, vec![Symbol::new("e")]);
        assert!(s.unif.evaluation_heads(&f).is_empty());
        assert!(s.unif.condition_pool(&f).is_none());
        assert!(s.unif.decision_tree(&Symbol::new("e")).unwrap().heads().is_empty());
        assert_eq!(s.point(4, Term::int(1)), Symbol::new("f_0"));
    }

    #[test]
    fn protocol_violations_are_errors() {
        let mut s = Session::new(UnifParams::default());
        let head = s.point(0, Term::int(1));
        let e = Symbol::new("e");
        assert!(matches!(
            s.unif.set_conditions(&e, Term::symbol("G"), vec![Symbol::new("c_0")], vec![]),
            Err(UnifError::ConditionArity { enumerators: 1, values: 0 })
        ));
        assert!(matches!(
            s.unif.set_conditions(&Symbol::new("nope"), Term::symbol("G"), vec![], vec![]),
            Err(UnifError::UnknownStrategyPoint(_))
        ));
        s.unif.set_entailed(&e, head.clone()).unwrap();
        assert!(matches!(
            s.unif.set_entailed(&e, head),
            Err(UnifError::AlreadyEntailed { .. })
        ));
        assert_eq!(s.unif.condition_enumerator(&e), Some(&Symbol::new("c")));
    }

    #[test]
    fn missing_guard_is_an_error() {
        let mut s = Session::new(UnifParams::default());
        s.point(0, Term::int(1));
        s.point(1, Term::int(2));
        let oracles = Oracles::new(&BuiltinEvaluator, &Simplifier, &s.model, &SyntacticExplainer);
        assert!(matches!(
            s.unif.construct_solutions(&oracles),
            Err(UnifError::MissingGuard(_))
        ));
    }

    #[test]
    fn solutions_agree_with_every_point() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let conditions: Vec<String> = (-1..30).map(|k| format!("(> x0 {k})")).collect();
        let conditions: Vec<&str> = conditions.iter().map(String::as_str).collect();
        for _ in 0..25 {
            let mut s = Session::new(UnifParams::default());
            let mut xs: Vec<i64> = (0..30).collect();
            xs.shuffle(&mut rng);
            xs.truncate(rng.gen_range(2..12));
            let mut expected = vec![];
            for x in xs {
                let out = rng.gen_range(0..3);
                s.point(x, Term::int(out));
                expected.push((x, out));
            }
            let mut enumerated = conditions.clone();
            enumerated.shuffle(&mut rng);
            enumerated.truncate(rng.gen_range(0..4));
            // every threshold is pooled up front, the enumerated ones come in random order
            s.conditions(&conditions);
            s.solve();
            s.conditions(&enumerated);
            let synthesis = s.solve();
            assert!(synthesis.complete);
            let solution = &synthesis.solutions[&Symbol::new("f")];
            for (x, out) in expected {
                assert_eq!(
                    BuiltinEvaluator.evaluate(solution, &[Value::Int(x)]).unwrap(),
                    Value::Int(out),
                    "{solution} on {x}"
                );
            }
        }
    }
}
