use astguard_syntax::{ConstValue, Node, NodeKind, Type, render_list};

use super::semantics::Semantics;

/// The subtree(s) a capture is bound to.
#[derive(Debug, Clone, Copy)]
pub enum Bound<'t> {
    /// Bound by a `$x` wildcard.
    One(&'t Node),
    /// Bound by a `$*xs` wildcard; possibly empty.
    Many(&'t [Node]),
}

/// One capture binding together with the semantic facts of its node.
///
/// Multi bindings carry no facts of their own.
#[derive(Debug, Clone)]
pub struct Binding<'t> {
    pub bound: Bound<'t>,
    pub ty: Option<&'t Type>,
    pub value: Option<&'t ConstValue>,
    pub kind: Option<NodeKind>,
}

impl<'t> Binding<'t> {
    pub fn one(node: &'t Node, semantics: &'t dyn Semantics) -> Self {
        Self {
            bound: Bound::One(node),
            ty: semantics.type_of(node),
            value: semantics.const_value(node),
            kind: Some(node.kind),
        }
    }

    pub fn many(nodes: &'t [Node]) -> Self {
        Self {
            bound: Bound::Many(nodes),
            ty: None,
            value: None,
            kind: None,
        }
    }

    /// The bound nodes: one for a single binding.
    pub fn nodes(&self) -> &'t [Node] {
        match self.bound {
            Bound::One(node) => std::slice::from_ref(node),
            Bound::Many(nodes) => nodes,
        }
    }

    pub fn is_const(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.bound, Bound::Many(_))
    }

    /// Canonical text; multi bindings are joined with `, `.
    pub fn text(&self) -> String {
        let nodes: Vec<&Node> = self.nodes().iter().collect();
        render_list(&nodes, ", ")
    }

    /// Structural equality with another binding, ignoring positions.
    pub fn same_shape(&self, other: &Binding<'_>) -> bool {
        let (a, b) = (self.nodes(), other.nodes());
        self.is_multi() == other.is_multi()
            && a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
    }
}

/// Captures bound by one successful match, in binding order.
#[derive(Debug, Clone, Default)]
pub struct CaptureEnv<'t> {
    bindings: Vec<(String, Binding<'t>)>,
}

impl<'t> CaptureEnv<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Binding<'t>> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    /// Bind `name`. A name bound twice must bind structurally equal
    /// subtrees; returns `false` when it does not.
    pub fn bind(&mut self, name: &str, binding: Binding<'t>) -> bool {
        match self.get(name) {
            Some(existing) => existing.same_shape(&binding),
            None => {
                self.bindings.push((name.to_owned(), binding));
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding<'t>)> {
        self.bindings.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use astguard_syntax::parse_expr;

    use super::*;
    use crate::engine::tests::NoFacts;

    #[test]
    fn non_linear_bindings_compare_structure() {
        let a = parse_expr("f(x, 1)").unwrap();
        let b = parse_expr("f( x,1 )").unwrap();
        let c = parse_expr("f(y, 1)").unwrap();
        let facts = NoFacts;

        let mut env = CaptureEnv::new();
        assert!(env.bind("x", Binding::one(&a, &facts)));
        assert!(env.bind("x", Binding::one(&b, &facts)));
        assert!(!env.bind("x", Binding::one(&c, &facts)));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn multi_bindings() {
        let call = parse_expr("f(a, b + 1)").unwrap();
        let args = Binding::many(&call.children[1..]);
        assert_eq!(args.text(), "a, b + 1");
        assert!(args.is_multi());
        assert!(!args.is_const());
        assert_eq!(args.nodes().len(), 2);

        let single = Binding::one(&call.children[1], &NoFacts);
        assert!(!single.same_shape(&Binding::many(&call.children[1..2])));
    }
}
