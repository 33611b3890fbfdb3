use std::collections::HashSet;

use crate::term::Term;

/// Conditions accepted so far for one candidate, in insertion order. Shared by
/// every decision tree of the candidate and never shrinks within a session.
#[derive(Debug, Clone, Default)]
pub struct ConditionPool {
    conditions: Vec<Term>,
    members: HashSet<Term>,
}

impl ConditionPool {
    pub fn insert(&mut self, condition: Term) -> bool {
        if self.members.insert(condition.clone()) {
            self.conditions.push(condition);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, condition: &Term) -> bool {
        self.members.contains(condition)
    }

    pub fn conditions(&self) -> &[Term] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Extend<Term> for ConditionPool {
    fn extend<T: IntoIterator<Item = Term>>(&mut self, iter: T) {
        for c in iter {
            self.insert(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::synthesis::pool::ConditionPool;
    use crate::term::Term;

    #[test]
    fn keeps_first_insertion_order() {
        let mut pool = ConditionPool::default();
        let a: Term = "(> x0 0)".parse().unwrap();
        let b: Term = "(< x0 5)".parse().unwrap();
        pool.extend([a.clone(), b.clone(), a.clone()]);
        assert_eq!(pool.conditions(), &[a.clone(), b]);
        assert!(!pool.insert(a));
        assert_eq!(pool.len(), 2);
    }
}
