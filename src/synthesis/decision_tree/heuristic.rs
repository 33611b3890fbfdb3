//! ID3-style rebuild of a solved tree over the whole condition pool.

use std::collections::HashMap;

use tracing::{Level, event, instrument};

use crate::error::UnifError;
use crate::synthesis::decision_tree::separator::SeparatorContext;
use crate::synthesis::decision_tree::{BuildContext, DecisionTree};
use crate::term::{Symbol, Term};

/// Shannon entropy (base 2) of the output distribution of `points`.
fn entropy(points: &[Symbol], outputs: &HashMap<Symbol, Term>) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<Option<&Term>, usize> = HashMap::new();
    for p in points {
        *counts.entry(outputs.get(p)).or_default() += 1;
    }
    let total = points.len() as f64;
    counts
        .values()
        .map(|c| {
            let p = *c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

struct Split {
    gain: f64,
    index: usize,
    positive: Vec<Symbol>,
    negative: Vec<Symbol>,
}

impl DecisionTree {
    /// Replaces the incremental trie by one whose levels are chosen greedily by
    /// information gain. Each chosen condition becomes a global trie level, so
    /// the result is a level-ordered product trie that splits every branch by
    /// every chosen condition. Keeps the incremental trie if some impure set of
    /// points cannot be split.
    #[instrument(skip_all)]
    pub(super) fn rebuild(
        &mut self,
        ctx: &BuildContext<'_>,
        sep: &SeparatorContext<'_>,
        outputs: &HashMap<Symbol, Term>,
    ) -> Result<(), UnifError> {
        let saved = (self.separator.trie.clone(), self.levels.clone());
        let mut candidates: Vec<Term> = ctx.pool.conditions().to_vec();
        for c in &self.levels {
            if !candidates.contains(c) {
                candidates.push(c.clone());
            }
        }
        let last = self.levels.last().cloned();
        self.separator.trie.clear();
        self.levels.clear();
        let heads = self.heads.clone();
        for head in &heads {
            self.separator.add(sep, &self.levels, head, 0)?;
        }
        if !self.split(sep, &heads, candidates, outputs)? {
            event!(Level::DEBUG, "Heuristic rebuild failed, keeping the incremental tree");
            (self.separator.trie, self.levels) = saved;
            return Ok(());
        }
        if self.levels.is_empty() {
            if let Some(last) = last {
                // stand-in single split so the tree keeps the shape of the incremental one
                self.levels.push(last);
                self.separator.add_classifier(sep, &self.levels, 0)?;
            }
        }
        event!(Level::DEBUG, "Heuristic rebuild used {} conditions", self.levels.len());
        Ok(())
    }

    fn split(
        &mut self,
        sep: &SeparatorContext<'_>,
        points: &[Symbol],
        mut candidates: Vec<Term>,
        outputs: &HashMap<Symbol, Term>,
    ) -> Result<bool, UnifError> {
        let first = points.first().and_then(|p| outputs.get(p));
        if points.len() < 2 || points.iter().all(|p| outputs.get(p) == first) {
            return Ok(true);
        }
        let entailed = points.iter().filter(|p| self.entailed.contains(*p)).count();
        event!(
            Level::TRACE,
            "Splitting {} points ({entailed} entailed) over {} conditions",
            points.len(),
            candidates.len()
        );
        let current = entropy(points, outputs);
        let mut best: Option<Split> = None;
        for (index, condition) in candidates.iter().enumerate() {
            let (mut positive, mut negative) = (vec![], vec![]);
            for p in points {
                if self.separator.evaluate(sep, condition, p)? {
                    positive.push(p.clone());
                } else {
                    negative.push(p.clone());
                }
            }
            if positive.is_empty() || negative.is_empty() {
                continue;
            }
            let weighted = (positive.len() as f64 * entropy(&positive, outputs)
                + negative.len() as f64 * entropy(&negative, outputs))
                / points.len() as f64;
            let gain = current - weighted;
            event!(Level::TRACE, "Gain of {condition}: {gain}");
            if best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(Split {
                    gain,
                    index,
                    positive,
                    negative,
                });
            }
        }
        let Some(best) = best else {
            return Ok(false);
        };
        let condition = candidates.remove(best.index);
        event!(Level::TRACE, "Picked {condition} with gain {}", best.gain);
        self.levels.push(condition);
        self.separator
            .add_classifier(sep, &self.levels, self.levels.len() - 1)?;
        Ok(self.split(sep, &best.positive, candidates.clone(), outputs)?
            && self.split(sep, &best.negative, candidates, outputs)?)
    }
}
