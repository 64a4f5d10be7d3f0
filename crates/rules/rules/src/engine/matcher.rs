//! Structural matching of compiled patterns against syntax trees.
//!
//! Matching is recursive descent, top-down and left to right, and stops at
//! the first mismatch. A child list holds at most one multi wildcard, so the
//! length of the run it binds is fixed by the number of fixed siblings and no
//! backtracking is needed.

use astguard_syntax::Node;

use super::binding::{Binding, CaptureEnv};
use super::semantics::Semantics;
use crate::ir::pattern::{Pattern, PatternNode, PatternShape};

/// A successful structural match.
#[derive(Debug, Clone)]
pub struct Match<'t> {
    pub env: CaptureEnv<'t>,
    /// The matched nodes: the candidate, or the statements of a sequence.
    pub nodes: &'t [Node],
}

/// Match `pattern` at `candidate`.
///
/// `siblings` starts at the candidate and runs to the end of the enclosing
/// block; it is `None` when the candidate is not a statement of a block, in
/// which case sequence patterns never match.
pub fn match_pattern<'t>(
    pattern: &Pattern,
    candidate: &'t Node,
    siblings: Option<&'t [Node]>,
    semantics: &'t dyn Semantics,
) -> Option<Match<'t>> {
    let mut env = CaptureEnv::new();
    match &pattern.shape {
        PatternShape::Single(root) => {
            match_node(root, candidate, &mut env, semantics).then(|| Match {
                env,
                nodes: std::slice::from_ref(candidate),
            })
        }
        PatternShape::Sequence(roots) => {
            let stmts = siblings?.get(..roots.len())?;
            roots
                .iter()
                .zip(stmts)
                .all(|(p, n)| match_node(p, n, &mut env, semantics))
                .then_some(Match { env, nodes: stmts })
        }
    }
}

/// Match one pattern node against one tree node, extending `env`.
pub fn match_node<'t>(
    pattern: &PatternNode,
    node: &'t Node,
    env: &mut CaptureEnv<'t>,
    semantics: &'t dyn Semantics,
) -> bool {
    match pattern {
        PatternNode::Capture(None) => true,
        PatternNode::Capture(Some(name)) => env.bind(name, Binding::one(node, semantics)),
        // Only meaningful inside a child list.
        PatternNode::Multi(_) => false,
        PatternNode::Node {
            kind,
            token,
            children,
        } => {
            *kind == node.kind
                && *token == node.token
                && match_list(children, &node.children, env, semantics)
        }
    }
}

fn match_list<'t>(
    patterns: &[PatternNode],
    nodes: &'t [Node],
    env: &mut CaptureEnv<'t>,
    semantics: &'t dyn Semantics,
) -> bool {
    let Some(multi) = patterns
        .iter()
        .position(|p| matches!(p, PatternNode::Multi(_)))
    else {
        return match_fixed(patterns, nodes, env, semantics);
    };
    if nodes.len() + 1 < patterns.len() {
        return false;
    }
    let run_end = nodes.len() - (patterns.len() - multi - 1);
    if !match_fixed(&patterns[..multi], &nodes[..multi], env, semantics) {
        return false;
    }
    if let PatternNode::Multi(Some(name)) = &patterns[multi]
        && !env.bind(name, Binding::many(&nodes[multi..run_end]))
    {
        return false;
    }
    match_fixed(&patterns[multi + 1..], &nodes[run_end..], env, semantics)
}

fn match_fixed<'t>(
    patterns: &[PatternNode],
    nodes: &'t [Node],
    env: &mut CaptureEnv<'t>,
    semantics: &'t dyn Semantics,
) -> bool {
    patterns.len() == nodes.len()
        && patterns
            .iter()
            .zip(nodes)
            .all(|(p, n)| match_node(p, n, env, semantics))
}

#[cfg(test)]
mod tests {
    use astguard_syntax::{parse_expr, parse_stmts};

    use super::*;
    use crate::engine::tests::NoFacts;

    fn texts(m: &Match<'_>) -> Vec<(String, String)> {
        m.env
            .iter()
            .map(|(name, b)| (name.to_owned(), b.text()))
            .collect()
    }

    fn try_match(pattern: &str, expr: &str) -> Option<Vec<(String, String)>> {
        let pattern = Pattern::compile(pattern).unwrap();
        let node = parse_expr(expr).unwrap();
        match_pattern(&pattern, &node, None, &NoFacts).map(|m| texts(&m))
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
            .collect()
    }

    #[test]
    fn binds_single_wildcards() {
        assert_eq!(
            try_match("$x + $y", "f().(int) + 2"),
            Some(pairs(&[("x", "f().(int)"), ("y", "2")]))
        );
        assert_eq!(try_match("$x + $_", "4 + 1"), Some(pairs(&[("x", "4")])));
        assert_eq!(try_match("$x + $y", "4 - 1"), None);
        assert_eq!(try_match("$x + 1", "a + 2"), None);
    }

    #[test]
    fn non_linear_patterns_require_equal_subtrees() {
        assert_eq!(
            try_match("$x == $x", "a.b == a.b"),
            Some(pairs(&[("x", "a.b")]))
        );
        assert_eq!(try_match("$x == $x", "a.b == a.c"), None);
    }

    #[test]
    fn multi_wildcards_bind_runs() {
        assert_eq!(
            try_match("f($*args, $last)", "f(1, 2, 3)"),
            Some(pairs(&[("args", "1, 2"), ("last", "3")]))
        );
        assert_eq!(
            try_match("f($*args, $last)", "f(3)"),
            Some(pairs(&[("args", ""), ("last", "3")]))
        );
        assert_eq!(try_match("f($*args, $last)", "f()"), None);
        assert_eq!(try_match("f($*_)", "f(1, 2)"), Some(vec![]));
        assert_eq!(try_match("f($*_)", "g(1, 2)"), None);
    }

    #[test]
    fn spread_calls_only_match_spread_patterns() {
        assert_eq!(try_match("f($x)", "f(xs...)"), None);
        assert_eq!(try_match("f($x...)", "f(xs...)"), Some(pairs(&[("x", "xs")])));
    }

    #[test]
    fn sequences_match_consecutive_statements() {
        let pattern = Pattern::compile("$tmp := $x; $x = $y; $y = $tmp").unwrap();
        let block = parse_stmts("t := a[0]\na[0] = a[1]\na[1] = t\nreturn").unwrap();
        let m = match_pattern(&pattern, &block[0], Some(&block), &NoFacts).unwrap();
        assert_eq!(m.nodes.len(), 3);
        assert_eq!(
            texts(&m),
            pairs(&[("tmp", "t"), ("x", "a[0]"), ("y", "a[1]")])
        );

        // Not a statement of a block.
        assert!(match_pattern(&pattern, &block[0], None, &NoFacts).is_none());
        // Too few statements left.
        assert!(match_pattern(&pattern, &block[1], Some(&block[1..]), &NoFacts).is_none());
    }

    #[test]
    fn statement_wildcards_inside_blocks() {
        let pattern = Pattern::compile("if $c { $*body }").unwrap();
        let stmts = parse_stmts("if ok { a(); b() }").unwrap();
        let m = match_pattern(&pattern, &stmts[0], Some(&stmts), &NoFacts).unwrap();
        assert_eq!(texts(&m), pairs(&[("c", "ok"), ("body", "a(), b()")]));
    }
}
