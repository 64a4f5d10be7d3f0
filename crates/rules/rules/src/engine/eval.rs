//! Filter evaluation with rejection witnesses.
//!
//! When a filter rejects a match, the witness names the sub-filter that is
//! responsible and the captures it looked at, so a debug trace can say
//! exactly why a candidate was dropped.

use super::binding::CaptureEnv;
use super::semantics::Semantics;
use crate::ir::filter::Filter;

/// The sub-filter that decided an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub description: String,
    /// Captures referenced by the witness, in first-reference order.
    pub captures: Vec<String>,
}

impl Witness {
    pub(crate) fn of(filter: &Filter) -> Self {
        Self {
            description: filter.describe(),
            captures: filter.captures().into_iter().map(str::to_owned).collect(),
        }
    }
}

/// Result of evaluating a filter. Only a rejection carries a witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub matched: bool,
    pub witness: Option<Witness>,
}

impl Evaluation {
    const PASSED: Self = Self {
        matched: true,
        witness: None,
    };

    fn decide(matched: bool, filter: &Filter) -> Self {
        if matched {
            Self::PASSED
        } else {
            Self::rejected(filter)
        }
    }

    fn rejected(filter: &Filter) -> Self {
        Self {
            matched: false,
            witness: Some(Witness::of(filter)),
        }
    }
}

/// Evaluate `filter` against a capture environment.
///
/// `&&` and `||` short-circuit left to right. A rejected conjunction is
/// witnessed by its first false operand; a rejected disjunction by its last
/// operand. A rejected negation is witnessed by the negated operand as a
/// whole, with every capture that operand references.
pub fn evaluate(filter: &Filter, env: &CaptureEnv<'_>, semantics: &dyn Semantics) -> Evaluation {
    match filter {
        Filter::Leaf(predicate) => Evaluation::decide(predicate.evaluate(env, semantics), filter),
        Filter::And(children) => {
            for child in children {
                let eval = evaluate(child, env, semantics);
                if !eval.matched {
                    return eval;
                }
            }
            Evaluation::PASSED
        }
        Filter::Or(children) => {
            let mut last = None;
            for child in children {
                let eval = evaluate(child, env, semantics);
                if eval.matched {
                    return Evaluation::PASSED;
                }
                last = Some(eval);
            }
            last.unwrap_or_else(|| Evaluation::rejected(filter))
        }
        Filter::Not(child) => Evaluation::decide(!evaluate(child, env, semantics).matched, filter),
    }
}

#[cfg(test)]
mod tests {
    use astguard_syntax::ConstValue;

    use super::*;
    use crate::engine::binding::Binding;
    use crate::engine::tests::{checked, find};
    use crate::ir::filter::{CompareOp, Predicate, ValueKind};

    fn is_const(name: &str) -> Filter {
        Predicate::IsConst {
            capture: name.into(),
        }
        .into()
    }

    fn at_least(name: &str, n: i64) -> Filter {
        Predicate::ValueCompare {
            capture: name.into(),
            kind: ValueKind::Int,
            op: CompareOp::Ge,
            literal: ConstValue::Int(n),
        }
        .into()
    }

    fn run(filter: &Filter) -> Evaluation {
        let file = checked("var v int = 1; sink = v + 4");
        let mut env = CaptureEnv::new();
        env.bind("x", Binding::one(find(&file, "v + 4").child(0).unwrap(), &file.info));
        env.bind("y", Binding::one(find(&file, "4"), &file.info));
        evaluate(filter, &env, &file.info)
    }

    fn witness(description: &str, captures: &[&str]) -> Option<Witness> {
        Some(Witness {
            description: description.into(),
            captures: captures.iter().map(|c| (*c).to_owned()).collect(),
        })
    }

    #[test]
    fn conjunction_reports_first_false_operand() {
        let eval = run(&Filter::And(vec![is_const("y"), at_least("y", 10), is_const("x")]));
        assert!(!eval.matched);
        assert_eq!(eval.witness, witness(r#"m["y"].Value.Int() >= 10"#, &["y"]));

        assert!(run(&Filter::And(vec![is_const("y"), at_least("y", 4)])).matched);
    }

    #[test]
    fn disjunction_reports_last_operand() {
        let eval = run(&Filter::Or(vec![is_const("x"), at_least("y", 10)]));
        assert!(!eval.matched);
        assert_eq!(eval.witness, witness(r#"m["y"].Value.Int() >= 10"#, &["y"]));

        assert!(run(&Filter::Or(vec![is_const("x"), is_const("y")])).matched);
    }

    #[test]
    fn negation_reports_the_whole_operand() {
        let eval = run(&Filter::And(vec![is_const("x"), is_const("y")]).negate());
        assert!(eval.matched);

        let eval = run(&Filter::And(vec![is_const("y"), at_least("y", 4)]).negate());
        assert!(!eval.matched);
        assert_eq!(
            eval.witness,
            witness(r#"!(m["y"].Const && m["y"].Value.Int() >= 4)"#, &["y"])
        );

        let eval = run(&Filter::Or(vec![is_const("x"), is_const("y")]).negate());
        assert_eq!(
            eval.witness,
            witness(r#"!(m["x"].Const || m["y"].Const)"#, &["x", "y"])
        );
    }

    #[test]
    fn passing_filters_carry_no_witness() {
        let passed = [
            is_const("y"),
            Filter::And(vec![is_const("y"), at_least("y", 4)]),
            Filter::Or(vec![is_const("x"), is_const("y")]),
            is_const("x").negate(),
        ];
        for filter in &passed {
            let eval = run(filter);
            assert!(eval.matched, "{filter}");
            assert_eq!(eval.witness, None, "{filter}");
        }
        assert!(run(&is_const("x")).witness.is_some());
    }
}
