//! Strategy graphs describe how a candidate's grammar decomposes into
//! sub-problems. Classification finds the strategy points whose
//! `ite(cond, self, self)` alternative admits decision tree unification.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::term::{Symbol, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeRole {
    Equal,
    IteCondition,
    ConcatPrefix,
    ConcatSuffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Ite,
    Concat,
    Other,
}

#[derive(Debug, Clone)]
pub struct StrategyAlternative {
    pub kind: StrategyKind,
    pub children: Vec<(Symbol, NodeRole)>,
    /// Grammar-supplied lemma excluding this alternative when it goes unused.
    pub prune_lemma: Option<Term>,
}

impl StrategyAlternative {
    pub fn new(kind: StrategyKind, children: Vec<(Symbol, NodeRole)>) -> Self {
        Self {
            kind,
            children,
            prune_lemma: None,
        }
    }

    pub fn with_prune_lemma(mut self, lemma: Term) -> Self {
        self.prune_lemma = Some(lemma);
        self
    }

    /// The condition enumerator of an `ite(c, e, e)` alternative of `(e, Equal)`.
    fn recursive_condition(&self, enumerator: &Symbol, role: NodeRole) -> Option<&Symbol> {
        if role != NodeRole::Equal || self.kind != StrategyKind::Ite {
            return None;
        }
        match self.children.as_slice() {
            [(c, NodeRole::IteCondition), (t, NodeRole::Equal), (e, NodeRole::Equal)]
                if t == enumerator && e == enumerator =>
            {
                Some(c)
            }
            _ => None,
        }
    }
}

/// A condition enumerator whose values are plugged into `term` for `arg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionTemplate {
    pub term: Term,
    pub arg: Symbol,
}

impl ConditionTemplate {
    pub fn instantiate(&self, value: &Term) -> Term {
        self.term.substitute(&Term::symbol(self.arg.clone()), value)
    }
}

#[derive(Debug, Clone)]
pub struct StrategyGraph {
    root: Symbol,
    nodes: HashMap<(Symbol, NodeRole), Vec<StrategyAlternative>>,
    templates: HashMap<Symbol, ConditionTemplate>,
}

impl StrategyGraph {
    pub fn new<T: Into<Symbol>>(root: T) -> Self {
        Self {
            root: root.into(),
            nodes: HashMap::new(),
            templates: HashMap::new(),
        }
    }

    /// The common shape: `root := ite(cond, root, root) | <leaf>`.
    pub fn recursive_ite<T: Into<Symbol>, C: Into<Symbol>>(root: T, condition: C) -> Self {
        let root = root.into();
        let alt = StrategyAlternative::new(
            StrategyKind::Ite,
            vec![
                (condition.into(), NodeRole::IteCondition),
                (root.clone(), NodeRole::Equal),
                (root.clone(), NodeRole::Equal),
            ],
        );
        Self::new(root.clone()).with_alternative(root, NodeRole::Equal, alt)
    }

    pub fn with_alternative<T: Into<Symbol>>(
        mut self,
        enumerator: T,
        role: NodeRole,
        alternative: StrategyAlternative,
    ) -> Self {
        self.nodes
            .entry((enumerator.into(), role))
            .or_default()
            .push(alternative);
        self
    }

    pub fn with_template<T: Into<Symbol>>(mut self, enumerator: T, template: ConditionTemplate) -> Self {
        self.templates.insert(enumerator.into(), template);
        self
    }

    pub fn root(&self) -> &Symbol {
        &self.root
    }

    pub fn alternatives(&self, enumerator: &Symbol, role: NodeRole) -> &[StrategyAlternative] {
        self.nodes
            .get(&(enumerator.clone(), role))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn template(&self, enumerator: &Symbol) -> Option<&ConditionTemplate> {
        self.templates.get(enumerator)
    }
}

/// A strategy point that gets a decision tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligiblePoint {
    pub point: Symbol,
    pub condition: Symbol,
    pub strategy_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub eligible: Vec<EligiblePoint>,
    pub unused: BTreeMap<Symbol, BTreeSet<usize>>,
    pub lemmas: BTreeMap<Symbol, Vec<Term>>,
}

/// Walks the graph from `(root, Equal)` through `Equal` children, visiting
/// each `(enumerator, role)` node once.
pub fn classify(graph: &StrategyGraph) -> Classification {
    let mut visited: HashSet<(Symbol, NodeRole)> = HashSet::new();
    let mut out = Classification::default();
    let mut visit = vec![(graph.root().clone(), NodeRole::Equal)];
    while let Some((enumerator, role)) = visit.pop() {
        if !visited.insert((enumerator.clone(), role)) {
            continue;
        }
        for (index, alt) in graph.alternatives(&enumerator, role).iter().enumerate() {
            match alt.recursive_condition(&enumerator, role) {
                Some(condition) => out.eligible.push(EligiblePoint {
                    point: enumerator.clone(),
                    condition: condition.clone(),
                    strategy_index: index,
                }),
                None => {
                    out.unused.entry(enumerator.clone()).or_default().insert(index);
                    if let Some(lemma) = &alt.prune_lemma {
                        out.lemmas.entry(enumerator.clone()).or_default().push(lemma.clone());
                    }
                }
            }
            visit.extend(
                alt.children
                    .iter()
                    .filter(|(_, r)| *r == NodeRole::Equal)
                    .cloned(),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::strategy::{
        ConditionTemplate, EligiblePoint, NodeRole, StrategyAlternative, StrategyGraph,
        StrategyKind, classify,
    };
    use crate::term::{Symbol, Term};

    #[test]
    fn recursive_ite_is_eligible() {
        let graph = StrategyGraph::recursive_ite("e", "c");
        let class = classify(&graph);
        assert_eq!(
            class.eligible,
            vec![EligiblePoint {
                point: Symbol::new("e"),
                condition: Symbol::new("c"),
                strategy_index: 0,
            }]
        );
        assert!(class.unused.is_empty());
    }

    #[test]
    fn other_alternatives_are_unused() {
        let concat = StrategyAlternative::new(
            StrategyKind::Concat,
            vec![
                (Symbol::new("p"), NodeRole::ConcatPrefix),
                (Symbol::new("s"), NodeRole::ConcatSuffix),
            ],
        )
        .with_prune_lemma(Term::symbol("no_concat"));
        // an ite whose branches are not the node itself
        let shallow_ite = StrategyAlternative::new(
            StrategyKind::Ite,
            vec![
                (Symbol::new("c"), NodeRole::IteCondition),
                (Symbol::new("a"), NodeRole::Equal),
                (Symbol::new("b"), NodeRole::Equal),
            ],
        );
        let graph = StrategyGraph::new("e")
            .with_alternative("e", NodeRole::Equal, concat)
            .with_alternative("e", NodeRole::Equal, shallow_ite)
            .with_alternative("a", NodeRole::Equal, StrategyAlternative::new(StrategyKind::Other, vec![]));
        let class = classify(&graph);
        assert!(class.eligible.is_empty());
        let unused: Vec<usize> = class.unused[&Symbol::new("e")].iter().copied().collect();
        assert_eq!(unused, vec![0, 1]);
        assert_eq!(class.unused[&Symbol::new("a")].len(), 1);
        assert_eq!(class.lemmas[&Symbol::new("e")], vec![Term::symbol("no_concat")]);
    }

    #[test]
    fn cyclic_graphs_terminate() {
        let to = |target: &str| {
            StrategyAlternative::new(StrategyKind::Other, vec![(Symbol::new(target), NodeRole::Equal)])
        };
        let graph = StrategyGraph::new("a")
            .with_alternative("a", NodeRole::Equal, to("b"))
            .with_alternative("b", NodeRole::Equal, to("a"))
            .with_alternative(
                "b",
                NodeRole::Equal,
                StrategyAlternative::new(
                    StrategyKind::Ite,
                    vec![
                        (Symbol::new("c"), NodeRole::IteCondition),
                        (Symbol::new("b"), NodeRole::Equal),
                        (Symbol::new("b"), NodeRole::Equal),
                    ],
                ),
            );
        let class = classify(&graph);
        assert_eq!(class.eligible.len(), 1);
        assert_eq!(class.eligible[0].point, Symbol::new("b"));
        assert_eq!(class.eligible[0].strategy_index, 1);
    }

    #[test]
    fn template_instantiation() {
        let template = ConditionTemplate {
            term: "(> x0 k)".parse().unwrap(),
            arg: Symbol::new("k"),
        };
        assert_eq!(template.instantiate(&Term::int(3)).to_string(), "(> x0 3)");
    }
}
