//! Compile-time simplification of filter trees.
//!
//! Supported transformations:
//! - Flattening nested combinators of the same kind (`a && (b && c)` -> `a && b && c`).
//! - Unwrapping single-child combinators.
//!
//! Both keep evaluation order, so the failure witness of a simplified filter
//! is the one the unsimplified tree would report. Double negation is kept as written
//! because its witness description differs from the inner predicate's.

use super::filter::Filter;

/// Run all simplification passes on a filter, returning the simplified form.
pub fn simplify(filter: Filter) -> Filter {
    match filter {
        Filter::And(children) => rebuild(children, true),
        Filter::Or(children) => rebuild(children, false),
        Filter::Not(child) => Filter::Not(Box::new(simplify(*child))),
        leaf @ Filter::Leaf(_) => leaf,
    }
}

fn rebuild(children: Vec<Filter>, conjunction: bool) -> Filter {
    let mut flat = Vec::with_capacity(children.len());
    for child in children.into_iter().map(simplify) {
        match child {
            Filter::And(inner) if conjunction => flat.extend(inner),
            Filter::Or(inner) if !conjunction => flat.extend(inner),
            other => flat.push(other),
        }
    }
    if flat.len() == 1 {
        if let Some(only) = flat.pop() {
            return only;
        }
    }
    if conjunction {
        Filter::And(flat)
    } else {
        Filter::Or(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::filter::Predicate;

    fn leaf(name: &str) -> Filter {
        Predicate::IsConst {
            capture: name.into(),
        }
        .into()
    }

    #[test]
    fn flattens_nested_conjunctions() {
        let filter = Filter::And(vec![leaf("a"), Filter::And(vec![leaf("b"), leaf("c")])]);
        assert_eq!(
            simplify(filter),
            Filter::And(vec![leaf("a"), leaf("b"), leaf("c")])
        );
    }

    #[test]
    fn flattens_nested_disjunctions_inside_negation() {
        let filter = Filter::Not(Box::new(Filter::Or(vec![
            Filter::Or(vec![leaf("a"), leaf("b")]),
            leaf("c"),
        ])));
        assert_eq!(
            simplify(filter),
            Filter::Not(Box::new(Filter::Or(vec![leaf("a"), leaf("b"), leaf("c")])))
        );
    }

    #[test]
    fn does_not_mix_kinds() {
        let filter = Filter::And(vec![leaf("a"), Filter::Or(vec![leaf("b"), leaf("c")])]);
        assert_eq!(simplify(filter.clone()), filter);
    }

    #[test]
    fn unwraps_single_child() {
        let filter = Filter::Or(vec![Filter::And(vec![leaf("a")])]);
        assert_eq!(simplify(filter), leaf("a"));
    }

    #[test]
    fn keeps_double_negation() {
        let filter = leaf("a").negate().negate();
        assert_eq!(simplify(filter.clone()), filter);
    }
}
