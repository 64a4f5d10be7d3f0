//! Compiled structural patterns.
//!
//! A pattern is written in the analyzed language itself, with `$name`
//! wildcards standing for one subtree and `$*name` wildcards standing for a
//! run of sibling subtrees (call arguments, expression lists, statements).
//! `$_` and `$*_` match without binding.

use astguard_syntax::{Node, NodeKind, parse_stmts};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// One node of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternNode {
    /// `$x` matches any one subtree; `None` for `$_`.
    Capture(Option<String>),
    /// `$*xs` matches a run of siblings; `None` for `$*_`.
    Multi(Option<String>),
    /// Literal structure: kind and token must match exactly.
    Node {
        kind: NodeKind,
        token: Option<String>,
        children: Vec<PatternNode>,
    },
}

/// The shape of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternShape {
    /// An expression or a single statement.
    Single(PatternNode),
    /// Two or more statements matched against consecutive statements of a block.
    Sequence(Vec<PatternNode>),
}

/// A compiled pattern along with its source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub source: String,
    pub shape: PatternShape,
}

impl Pattern {
    /// Compile pattern source text.
    pub fn compile(source: &str) -> Result<Self, RuleError> {
        let invalid = |message: String| RuleError::Pattern {
            pattern: source.to_owned(),
            message,
        };
        let stmts = parse_stmts(source).map_err(|e| invalid(e.to_string()))?;
        let shape = match stmts.as_slice() {
            [] => return Err(invalid("empty pattern".into())),
            [single] => {
                // A lone expression statement stands for the expression.
                let node = match single.kind {
                    NodeKind::ExprStmt => single.child(0).unwrap_or(single),
                    _ => single,
                };
                PatternShape::Single(PatternNode::from_node(node))
            }
            many => PatternShape::Sequence(many.iter().map(PatternNode::from_node).collect()),
        };
        let pattern = Self {
            source: source.to_owned(),
            shape,
        };
        if pattern.roots().iter().any(|n| matches!(n, PatternNode::Multi(_))) {
            return Err(invalid("a multi wildcard cannot stand at the top level".into()));
        }
        if pattern.nodes().any(PatternNode::has_ambiguous_list) {
            return Err(RuleError::AmbiguousPattern(source.to_owned()));
        }
        Ok(pattern)
    }

    /// Top-level pattern nodes: one for a single pattern, several for a sequence.
    pub fn roots(&self) -> &[PatternNode] {
        match &self.shape {
            PatternShape::Single(node) => std::slice::from_ref(node),
            PatternShape::Sequence(nodes) => nodes,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.shape, PatternShape::Sequence(_))
    }

    /// Every pattern node, pre-order.
    fn nodes(&self) -> impl Iterator<Item = &PatternNode> {
        let mut stack: Vec<&PatternNode> = self.roots().iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let PatternNode::Node { children, .. } = node {
                stack.extend(children.iter().rev());
            }
            Some(node)
        })
    }

    /// Names bound by this pattern, in order of first appearance.
    pub fn captures(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for node in self.nodes() {
            if let PatternNode::Capture(Some(name)) | PatternNode::Multi(Some(name)) = node {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Returns `true` if the pattern binds `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.captures().contains(&name)
    }
}

impl PatternNode {
    fn from_node(node: &Node) -> Self {
        if let Some(wildcard) = Self::wildcard(node) {
            return wildcard;
        }
        // A statement consisting of a wildcard matches any statement.
        if node.kind == NodeKind::ExprStmt {
            if let Some(wildcard) = node.child(0).and_then(Self::wildcard) {
                return wildcard;
            }
        }
        Self::Node {
            kind: node.kind,
            token: node.token.clone(),
            children: node.children.iter().map(Self::from_node).collect(),
        }
    }

    fn wildcard(node: &Node) -> Option<Self> {
        if node.kind != NodeKind::Ident {
            return None;
        }
        let named = |name: &str| (name != "_").then(|| name.to_owned());
        if let Some(name) = node.token().strip_prefix("$*") {
            return Some(Self::Multi(named(name)));
        }
        node.token()
            .strip_prefix('$')
            .map(|name| Self::Capture(named(name)))
    }

    fn has_ambiguous_list(&self) -> bool {
        match self {
            Self::Node { children, .. } => {
                children
                    .iter()
                    .filter(|c| matches!(c, Self::Multi(_)))
                    .count()
                    > 1
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(src: &str) -> PatternNode {
        match Pattern::compile(src).unwrap().shape {
            PatternShape::Single(node) => node,
            PatternShape::Sequence(_) => panic!("expected a single pattern"),
        }
    }

    #[test]
    fn expression_statement_is_unwrapped() {
        let node = single("$x + $_");
        let PatternNode::Node { kind, token, children } = node else {
            panic!("expected a node");
        };
        assert_eq!(kind, NodeKind::BinaryExpr);
        assert_eq!(token.as_deref(), Some("+"));
        assert_eq!(
            children,
            vec![
                PatternNode::Capture(Some("x".into())),
                PatternNode::Capture(None)
            ]
        );
    }

    #[test]
    fn statement_patterns_keep_their_kind() {
        let PatternNode::Node { kind, .. } = single("_ = $x") else {
            panic!("expected a node");
        };
        assert_eq!(kind, NodeKind::AssignStmt);
    }

    #[test]
    fn multi_wildcards_in_calls_and_blocks() {
        let pattern = Pattern::compile("f($*args, $last)").unwrap();
        assert_eq!(pattern.captures(), vec!["args", "last"]);

        let pattern = Pattern::compile("if $c { $*_ }").unwrap();
        let PatternShape::Single(PatternNode::Node { children, .. }) = &pattern.shape else {
            panic!("expected an if statement");
        };
        let PatternNode::Node { children: body, .. } = &children[1] else {
            panic!("expected a block");
        };
        assert_eq!(body, &vec![PatternNode::Multi(None)]);
    }

    #[test]
    fn sequences() {
        let pattern = Pattern::compile("$tmp := $x; $x = $y; $y = $tmp").unwrap();
        assert!(pattern.is_sequence());
        assert_eq!(pattern.roots().len(), 3);
        assert_eq!(pattern.captures(), vec!["tmp", "x", "y"]);
        assert!(pattern.binds("y"));
        assert!(!pattern.binds("z"));
    }

    #[test]
    fn rejects_bad_patterns() {
        assert!(matches!(
            Pattern::compile("$x +"),
            Err(RuleError::Pattern { .. })
        ));
        assert!(matches!(
            Pattern::compile(""),
            Err(RuleError::Pattern { .. })
        ));
        assert!(matches!(
            Pattern::compile("f($*a, $*b)"),
            Err(RuleError::AmbiguousPattern(_))
        ));
        assert!(matches!(
            Pattern::compile("$*_; return $x"),
            Err(RuleError::Pattern { .. })
        ));
        assert!(matches!(
            Pattern::compile("$*xs"),
            Err(RuleError::Pattern { .. })
        ));
    }
}
