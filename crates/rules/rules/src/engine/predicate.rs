//! Evaluation of leaf predicates against capture bindings.

use astguard_syntax::{ConstValue, Node, NodeKind};

use super::binding::{Binding, CaptureEnv};
use super::semantics::Semantics;
use crate::ir::filter::{CompareOp, Predicate, ValueKind};

impl Predicate {
    /// Evaluate the predicate. A capture that is not bound, or a fact the
    /// semantic layer cannot provide, makes the predicate false.
    pub fn evaluate(&self, env: &CaptureEnv<'_>, semantics: &dyn Semantics) -> bool {
        let Some(binding) = env.get(self.capture()) else {
            return false;
        };
        match self {
            Self::TypeIs { spec, .. } => match (binding.ty, semantics.resolve_type(spec.expr())) {
                (Some(actual), Some(expected)) => actual.identical(&expected),
                _ => false,
            },
            Self::IsConst { .. } => binding.is_const(),
            Self::ValueCompare {
                kind, op, literal, ..
            } => binding
                .value
                .is_some_and(|value| compare(value, *kind, *op, literal)),
            Self::NodeKindIs { kind, .. } => binding.kind == Some(*kind),
            Self::TextMatches { regex, .. } => regex.is_match(&binding.text()),
            Self::Pure { .. } => is_pure_binding(binding, semantics),
        }
    }
}

fn compare(value: &ConstValue, kind: ValueKind, op: CompareOp, literal: &ConstValue) -> bool {
    match kind {
        ValueKind::Int => match (as_int(value), as_int(literal)) {
            (Some(v), Some(l)) => op.holds(v.cmp(&l)),
            _ => false,
        },
        ValueKind::Float => match (value.as_f64(), literal.as_f64()) {
            (Some(v), Some(l)) => v.partial_cmp(&l).is_some_and(|ord| op.holds(ord)),
            _ => false,
        },
    }
}

/// The value as an exact integer: floats qualify only when integral.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn as_int(value: &ConstValue) -> Option<i64> {
    match value {
        ConstValue::Int(n) => Some(*n),
        ConstValue::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Some(*f as i64),
        _ => None,
    }
}

fn is_pure_binding(binding: &Binding<'_>, semantics: &dyn Semantics) -> bool {
    binding.nodes().iter().all(|n| is_pure(n, semantics))
}

/// Returns `true` when evaluating `node` cannot have side effects.
pub(crate) fn is_pure(node: &Node, semantics: &dyn Semantics) -> bool {
    match node.kind {
        NodeKind::Ident
        | NodeKind::BasicLit
        | NodeKind::ArrayType
        | NodeKind::InterfaceType
        | NodeKind::FuncType
        | NodeKind::Ellipsis => true,
        NodeKind::UnaryExpr if node.token() == "<-" => false,
        NodeKind::ParenExpr
        | NodeKind::SelectorExpr
        | NodeKind::StarExpr
        | NodeKind::UnaryExpr => node.child(0).is_some_and(|c| is_pure(c, semantics)),
        NodeKind::TypeAssertExpr | NodeKind::IndexExpr | NodeKind::BinaryExpr => {
            node.children.iter().all(|c| is_pure(c, semantics))
        }
        // Only conversions; any other call may have effects.
        NodeKind::CallExpr => match node.children.as_slice() {
            [fun, arg] => semantics.is_type_expr(fun) && is_pure(arg, semantics),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use astguard_syntax::parse_expr;

    use super::*;
    use crate::engine::tests::{NoFacts, checked, find};
    use crate::ir::filter::TypeSpec;

    fn env_of<'t>(
        name: &str,
        node: &'t Node,
        semantics: &'t dyn Semantics,
    ) -> CaptureEnv<'t> {
        let mut env = CaptureEnv::new();
        env.bind(name, Binding::one(node, semantics));
        env
    }

    fn value_compare(kind: ValueKind, op: &str, literal: ConstValue) -> Predicate {
        Predicate::ValueCompare {
            capture: "x".into(),
            kind,
            op: CompareOp::from_symbol(op).unwrap(),
            literal,
        }
    }

    #[test]
    fn type_predicates_use_checked_types() {
        let file = checked("var s string = \"a\"; sink = s + \"b\"");
        let node = find(&file, "s + \"b\"");
        let env = env_of("x", node, &file.info);

        assert!(Predicate::type_is("x", "string").unwrap().evaluate(&env, &file.info));
        assert!(!Predicate::type_is("x", "int").unwrap().evaluate(&env, &file.info));
        assert!(!Predicate::type_is("x", "Undefined").unwrap().evaluate(&env, &file.info));
        assert!(!Predicate::IsConst { capture: "x".into() }.evaluate(&env, &file.info));
    }

    #[test]
    fn constants_and_values() {
        let file = checked("sink = 4 + 1");
        let four = find(&file, "4");
        let env = env_of("x", four, &file.info);

        assert!(Predicate::IsConst { capture: "x".into() }.evaluate(&env, &file.info));
        assert!(value_compare(ValueKind::Int, ">=", ConstValue::Int(4)).evaluate(&env, &file.info));
        assert!(!value_compare(ValueKind::Int, ">=", ConstValue::Int(10)).evaluate(&env, &file.info));
        assert!(value_compare(ValueKind::Float, "<", ConstValue::Float(4.5)).evaluate(&env, &file.info));
    }

    #[test]
    fn value_compare_requires_representable_numbers() {
        assert!(compare(&ConstValue::Float(4.0), ValueKind::Int, CompareOp::Eq, &ConstValue::Int(4)));
        assert!(!compare(&ConstValue::Float(4.5), ValueKind::Int, CompareOp::Ne, &ConstValue::Int(4)));
        assert!(!compare(
            &ConstValue::String("4".into()),
            ValueKind::Float,
            CompareOp::Eq,
            &ConstValue::Int(4)
        ));
        assert!(!compare(&ConstValue::Float(f64::NAN), ValueKind::Float, CompareOp::Ne, &ConstValue::Int(4)));
    }

    #[test]
    fn missing_bindings_and_facts_fail() {
        let node = parse_expr("x + 1").unwrap();
        let env = env_of("x", &node, &NoFacts);
        let other = Predicate::IsConst { capture: "y".into() };
        assert!(!other.evaluate(&env, &NoFacts));
        let typed = Predicate::TypeIs {
            capture: "x".into(),
            spec: TypeSpec::new("int").unwrap(),
        };
        assert!(!typed.evaluate(&env, &NoFacts));
        assert!(!value_compare(ValueKind::Int, "==", ConstValue::Int(0)).evaluate(&env, &NoFacts));
    }

    #[test]
    fn syntactic_predicates() {
        let node = parse_expr("p.first").unwrap();
        let env = env_of("x", &node, &NoFacts);
        assert!(Predicate::node_kind_is("x", "SelectorExpr").unwrap().evaluate(&env, &NoFacts));
        assert!(!Predicate::node_kind_is("x", "Ident").unwrap().evaluate(&env, &NoFacts));
        assert!(Predicate::text_matches("x", r"^p\.").unwrap().evaluate(&env, &NoFacts));
        assert!(!Predicate::text_matches("x", "second").unwrap().evaluate(&env, &NoFacts));
    }

    #[test]
    fn purity() {
        for (src, pure) in [
            ("a.b[i] + *p", true),
            ("-x", true),
            ("v.(int)", true),
            ("f()", false),
            ("a[g()]", false),
        ] {
            let node = parse_expr(src).unwrap();
            assert_eq!(is_pure(&node, &NoFacts), pure, "{src}");
        }

        let file = checked("var v int = 1; sink = int(v); sink = f(v)");
        assert!(is_pure(find(&file, "int(v)"), &file.info));
        assert!(!is_pure(find(&file, "f(v)"), &file.info));
    }
}
