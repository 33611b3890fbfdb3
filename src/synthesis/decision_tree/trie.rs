use std::collections::{BTreeMap, HashMap};

use crate::error::UnifError;
use crate::term::{Symbol, Value};

pub(crate) type NodeId = usize;

const ROOT: NodeId = 0;

/// Outcome of the `level`-th condition on a point.
pub(crate) trait Classifier {
    fn classify(&mut self, point: &Symbol, level: usize) -> Result<Value, UnifError>;
}

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Representative of the points that reached this node without being routed further.
    lazy: Option<Symbol>,
    children: BTreeMap<Value, NodeId>,
}

/// Multi-way trie of points keyed by the outcomes of an ordered list of
/// conditions. Points are only routed as deep as needed to tell them apart
/// from the representative already sitting at a node. Each leaf's points form
/// a separation class, stored under the representative with it listed first.
#[derive(Debug, Clone)]
pub(crate) struct ClassTrie {
    nodes: Vec<TrieNode>,
    classes: HashMap<Symbol, Vec<Symbol>>,
}

impl Default for ClassTrie {
    fn default() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            classes: HashMap::new(),
        }
    }
}

impl ClassTrie {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn class(&self, representative: &Symbol) -> &[Symbol] {
        self.classes
            .get(representative)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn is_representative(&self, point: &Symbol) -> bool {
        self.classes.contains_key(point)
    }

    pub(crate) fn class_count(&self) -> usize {
        self.classes.len()
    }

    fn push_node(&mut self, lazy: Option<Symbol>) -> NodeId {
        self.nodes.push(TrieNode {
            lazy,
            children: BTreeMap::new(),
        });
        self.nodes.len() - 1
    }

    /// Routes `point` through the first `ntotal` levels and returns the
    /// representative of the class it joins, `point` itself for a new class.
    pub(crate) fn add<C: Classifier>(
        &mut self,
        point: &Symbol,
        classifier: &mut C,
        ntotal: usize,
    ) -> Result<Symbol, UnifError> {
        let representative = self.route(point, classifier, ntotal)?;
        if &representative == point {
            self.classes.insert(point.clone(), vec![point.clone()]);
        } else {
            self.classes
                .entry(representative.clone())
                .or_default()
                .push(point.clone());
        }
        Ok(representative)
    }

    fn route<C: Classifier>(
        &mut self,
        point: &Symbol,
        classifier: &mut C,
        ntotal: usize,
    ) -> Result<Symbol, UnifError> {
        let mut node = ROOT;
        let mut depth = 0;
        loop {
            if depth == ntotal {
                let lazy = self.nodes[node].lazy.get_or_insert_with(|| point.clone());
                return Ok(lazy.clone());
            }
            if self.nodes[node].children.is_empty() {
                match self.nodes[node].lazy.clone() {
                    None => {
                        self.nodes[node].lazy = Some(point.clone());
                        return Ok(point.clone());
                    }
                    Some(lazy) => {
                        // the resident point moves one level down to make room
                        let outcome = classifier.classify(&lazy, depth)?;
                        self.nodes[node].lazy = None;
                        let child = self.push_node(Some(lazy));
                        self.nodes[node].children.insert(outcome, child);
                    }
                }
            }
            let outcome = classifier.classify(point, depth)?;
            node = match self.nodes[node].children.get(&outcome) {
                Some(child) => *child,
                None => {
                    let child = self.push_node(None);
                    self.nodes[node].children.insert(outcome, child);
                    child
                }
            };
            depth += 1;
        }
    }

    /// Splits every populated leaf at depth `ntotal` by condition `ntotal`.
    /// The first member of each resulting group becomes its representative.
    pub(crate) fn add_classifier<C: Classifier>(
        &mut self,
        classifier: &mut C,
        ntotal: usize,
    ) -> Result<(), UnifError> {
        let mut visit = vec![(0usize, ROOT)];
        while let Some((depth, node)) = visit.pop() {
            if depth < ntotal {
                visit.extend(self.nodes[node].children.values().map(|c| (depth + 1, *c)));
                continue;
            }
            let Some(representative) = self.nodes[node].lazy.take() else {
                continue;
            };
            let members = self.classes.remove(&representative).unwrap_or_default();
            for member in members {
                let outcome = classifier.classify(&member, depth)?;
                let existing = self.nodes[node]
                    .children
                    .get(&outcome)
                    .and_then(|c| self.nodes[*c].lazy.clone());
                match existing {
                    Some(rep) => self.classes.entry(rep).or_default().push(member),
                    None => {
                        let child = self.push_node(Some(member.clone()));
                        self.nodes[node].children.insert(outcome, child);
                        self.classes.insert(member.clone(), vec![member]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Post-order fold: `leaf` maps the representative of each leaf, `join`
    /// combines the folded children of a node at the given depth. `None` for an
    /// empty trie.
    pub(crate) fn fold<T, E>(
        &self,
        mut leaf: impl FnMut(&Symbol) -> Result<T, E>,
        mut join: impl FnMut(usize, Vec<(Value, T)>) -> Result<T, E>,
    ) -> Result<Option<T>, E> {
        let mut done: HashMap<NodeId, T> = HashMap::new();
        let mut visit = vec![(0usize, ROOT, false)];
        while let Some((depth, node, expanded)) = visit.pop() {
            let n = &self.nodes[node];
            if n.children.is_empty() {
                if let Some(p) = &n.lazy {
                    done.insert(node, leaf(p)?);
                }
                continue;
            }
            if !expanded {
                visit.push((depth, node, true));
                visit.extend(n.children.values().map(|c| (depth + 1, *c, false)));
                continue;
            }
            let branches: Vec<(Value, T)> = n
                .children
                .iter()
                .filter_map(|(v, c)| done.remove(c).map(|t| (*v, t)))
                .collect();
            if !branches.is_empty() {
                done.insert(node, join(depth, branches)?);
            }
        }
        Ok(done.remove(&ROOT))
    }
}
