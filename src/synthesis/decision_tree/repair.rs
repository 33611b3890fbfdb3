use std::collections::BTreeSet;

use tracing::{Level, event};

use crate::oracle::TermEvaluator;
use crate::synthesis::point::EvaluationPoint;
use crate::term::{Term, TermKind, Value};

/// Positions a repair may rewrite: the holes of the condition if it has any,
/// its integer constants otherwise.
fn is_slot(term: &Term, holes: bool) -> bool {
    match term.kind() {
        TermKind::Hole => true,
        TermKind::Const(Value::Int(_)) => !holes,
        _ => false,
    }
}

fn count_slots(term: &Term, holes: bool) -> usize {
    if is_slot(term, holes) {
        return 1;
    }
    term.children().iter().map(|c| count_slots(c, holes)).sum()
}

/// Rebuilds `term` with slot number `target` set to `value`. Holes that are not
/// the target become `0`.
fn fill(term: &Term, holes: bool, target: Option<(usize, i64)>, next: &mut usize) -> Term {
    if is_slot(term, holes) {
        let index = *next;
        *next += 1;
        return match target {
            Some((slot, value)) if slot == index => Term::int(value),
            _ if holes => Term::int(0),
            _ => term.clone(),
        };
    }
    term.rebuild(|c| fill(c, holes, target, next))
}

fn candidate_constants(a: &EvaluationPoint, b: &EvaluationPoint, term: &Term) -> BTreeSet<i64> {
    let mut out = BTreeSet::from([0]);
    let mut add = |i: i64| {
        out.insert(i);
        out.insert(i.wrapping_add(1));
        out.insert(i.wrapping_sub(1));
    };
    a.args.iter().chain(&b.args).filter_map(Value::as_int).for_each(&mut add);
    let mut stack = vec![term];
    while let Some(t) = stack.pop() {
        if let TermKind::Const(Value::Int(i)) = t.kind() {
            add(*i);
        }
        stack.extend(t.children());
    }
    out
}

/// Mutates the constants of `condition`, keeping its shape, until it tells `a`
/// and `b` apart. Conditions without holes are only touched when `force` is set.
/// Returns the first separating variant, or the condition with its holes zeroed
/// when none separates.
pub(crate) fn repair_to_separate(
    condition: &Term,
    a: &EvaluationPoint,
    b: &EvaluationPoint,
    evaluator: &dyn TermEvaluator,
    force: bool,
) -> Term {
    let holes = condition.contains_hole();
    if !holes && !force {
        return condition.clone();
    }
    let separates = |t: &Term| match (evaluator.evaluate(t, &a.args), evaluator.evaluate(t, &b.args)) {
        (Ok(x), Ok(y)) => x != y,
        _ => false,
    };
    let baseline = fill(condition, holes, None, &mut 0);
    if !holes && separates(&baseline) {
        return baseline;
    }
    let slots = count_slots(condition, holes);
    let constants = candidate_constants(a, b, condition);
    for slot in 0..slots {
        for value in &constants {
            let variant = fill(condition, holes, Some((slot, *value)), &mut 0);
            if separates(&variant) {
                event!(Level::TRACE, "Repaired {condition} to {variant}");
                return variant;
            }
        }
    }
    baseline
}

#[cfg(test)]
mod tests {
    use crate::oracle::BuiltinEvaluator;
    use crate::synthesis::decision_tree::repair::repair_to_separate;
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
    fn fills_holes_to_separate() {
        let cond: Term = "(> x0 ?)".parse().unwrap();
        let repaired = repair_to_separate(&cond, &point("a", 3), &point("b", 7), &BuiltinEvaluator, false);
        assert!(!repaired.contains_hole());
        assert_eq!(repaired.to_string(), "(> x0 3)");
    }

    #[test]
    fn leaves_closed_conditions_unless_forced() {
        let cond: Term = "(> x0 10)".parse().unwrap();
        let (a, b) = (point("a", 3), point("b", 7));
        assert_eq!(repair_to_separate(&cond, &a, &b, &BuiltinEvaluator, false), cond);
        let forced = repair_to_separate(&cond, &a, &b, &BuiltinEvaluator, true);
        assert_eq!(forced.to_string(), "(> x0 3)");
    }

    #[test]
    fn unseparable_holes_are_zeroed() {
        let cond: Term = "(> ? x0)".parse().unwrap();
        let repaired = repair_to_separate(&cond, &point("a", 3), &point("b", 3), &BuiltinEvaluator, false);
        assert_eq!(repaired.to_string(), "(> 0 x0)");
    }
}
