use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::Span;

/// Identifier of a node, unique within one parsed tree.
///
/// Ids are assigned in pre-order, so comparing ids of two nodes of the same
/// tree tells which one a pre-order walk reaches first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Syntactic kind of a [`Node`].
///
/// Kind names follow the Go `ast` package so that rule authors can write
/// `m["x"].Node.Is("ParenExpr")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // Expressions
    /// An identifier; the token is its name.
    Ident,
    /// A literal; the token is its source text.
    BasicLit,
    /// `(x)`
    ParenExpr,
    /// `op x`; the token is the operator.
    UnaryExpr,
    /// `x op y`; the token is the operator.
    BinaryExpr,
    /// `fun(args...)`; the token is `...` when the last argument is spread.
    CallExpr,
    /// `x.sel`
    SelectorExpr,
    /// `x[index]`
    IndexExpr,
    /// `*x`, either a dereference or a pointer type.
    StarExpr,
    /// `x.(T)`
    TypeAssertExpr,

    // Types
    /// `[]T`
    ArrayType,
    /// `interface{}`
    InterfaceType,
    /// `...T` in a variadic parameter list.
    Ellipsis,
    /// `func(params) results`
    FuncType,

    // Statements
    /// An expression used as a statement.
    ExprStmt,
    /// `lhs op rhs` with op one of `=`, `:=`, `+=`, ...
    AssignStmt,
    /// `x++` or `x--`
    IncDecStmt,
    /// `return results...`
    ReturnStmt,
    /// `if cond { ... } else ...`
    IfStmt,
    /// `{ stmts... }`
    BlockStmt,
    /// A `var` or `type` declaration inside a block or at package level.
    DeclStmt,
    /// Comma-separated expressions on one side of an assignment.
    ExprList,

    // Declarations
    /// `import "path"`; the token is the quoted path.
    ImportSpec,
    /// `name [type] [= value]`
    ValueSpec,
    /// `name type` or `name = type`; the token is `=` for aliases.
    TypeSpec,
    /// `func name(params) results { body }`
    FuncDecl,
    /// Parameter or result list.
    FieldList,
    /// `names... type` inside a field list.
    Field,
    /// A whole source file; the token is the package name.
    File,
    /// Placeholder for an absent optional child.
    Empty,
}

const ALL_KINDS: &[NodeKind] = &[
    NodeKind::Ident,
    NodeKind::BasicLit,
    NodeKind::ParenExpr,
    NodeKind::UnaryExpr,
    NodeKind::BinaryExpr,
    NodeKind::CallExpr,
    NodeKind::SelectorExpr,
    NodeKind::IndexExpr,
    NodeKind::StarExpr,
    NodeKind::TypeAssertExpr,
    NodeKind::ArrayType,
    NodeKind::InterfaceType,
    NodeKind::Ellipsis,
    NodeKind::FuncType,
    NodeKind::ExprStmt,
    NodeKind::AssignStmt,
    NodeKind::IncDecStmt,
    NodeKind::ReturnStmt,
    NodeKind::IfStmt,
    NodeKind::BlockStmt,
    NodeKind::DeclStmt,
    NodeKind::ExprList,
    NodeKind::ImportSpec,
    NodeKind::ValueSpec,
    NodeKind::TypeSpec,
    NodeKind::FuncDecl,
    NodeKind::FieldList,
    NodeKind::Field,
    NodeKind::File,
    NodeKind::Empty,
];

impl NodeKind {
    /// The Go-style name of this kind (e.g. `"ParenExpr"`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Ident => "Ident",
            Self::BasicLit => "BasicLit",
            Self::ParenExpr => "ParenExpr",
            Self::UnaryExpr => "UnaryExpr",
            Self::BinaryExpr => "BinaryExpr",
            Self::CallExpr => "CallExpr",
            Self::SelectorExpr => "SelectorExpr",
            Self::IndexExpr => "IndexExpr",
            Self::StarExpr => "StarExpr",
            Self::TypeAssertExpr => "TypeAssertExpr",
            Self::ArrayType => "ArrayType",
            Self::InterfaceType => "InterfaceType",
            Self::Ellipsis => "Ellipsis",
            Self::FuncType => "FuncType",
            Self::ExprStmt => "ExprStmt",
            Self::AssignStmt => "AssignStmt",
            Self::IncDecStmt => "IncDecStmt",
            Self::ReturnStmt => "ReturnStmt",
            Self::IfStmt => "IfStmt",
            Self::BlockStmt => "BlockStmt",
            Self::DeclStmt => "DeclStmt",
            Self::ExprList => "ExprList",
            Self::ImportSpec => "ImportSpec",
            Self::ValueSpec => "ValueSpec",
            Self::TypeSpec => "TypeSpec",
            Self::FuncDecl => "FuncDecl",
            Self::FieldList => "FieldList",
            Self::Field => "Field",
            Self::File => "File",
            Self::Empty => "Empty",
        }
    }

    /// Look a kind up by its Go-style name.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.name() == name)
    }

    /// Returns `true` for statement kinds.
    pub fn is_stmt(self) -> bool {
        matches!(
            self,
            Self::ExprStmt
                | Self::AssignStmt
                | Self::IncDecStmt
                | Self::ReturnStmt
                | Self::IfStmt
                | Self::BlockStmt
                | Self::DeclStmt
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the syntax tree.
///
/// The tree is uniform: every node is a kind, an optional token (identifier
/// name, literal text or operator) and an ordered list of children. Which
/// child sits at which position is documented on [`NodeKind`].
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub token: Option<String>,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Node {
    /// Create a childless node without a token.
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            id: NodeId::default(),
            kind,
            token: None,
            children: Vec::new(),
            span,
        }
    }

    /// Set the token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// The token, or the empty string when there is none.
    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }

    /// The child at `idx`, if present.
    pub fn child(&self, idx: usize) -> Option<&Node> {
        self.children.get(idx)
    }

    /// Returns `true` for an identifier with the given name.
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == NodeKind::Ident && self.token() == name
    }

    /// Structural equality: same kind, token and children, ignoring ids and
    /// spans.
    pub fn same_shape(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.token == other.token
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_shape(b))
    }

    /// Iterate over this node and all of its descendants in pre-order.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        self.preorder().count()
    }

    /// Assign fresh pre-order ids to the whole subtree, starting at `next`.
    pub(crate) fn renumber(&mut self, next: &mut u32) {
        self.id = NodeId(*next);
        *next += 1;
        for child in &mut self.children {
            child.renumber(next);
        }
    }
}

/// Pre-order iterator returned by [`Node::preorder`].
pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Node {
        Node::new(NodeKind::Ident, Span::default()).with_token(name)
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in ALL_KINDS {
            assert_eq!(NodeKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(NodeKind::from_name("NoSuchExpr"), None);
    }

    #[test]
    fn same_shape_ignores_spans() {
        let a = Node::new(NodeKind::BinaryExpr, Span::new(0, 5))
            .with_token("+")
            .with_children(vec![ident("x"), ident("y")]);
        let b = Node::new(NodeKind::BinaryExpr, Span::new(10, 20))
            .with_token("+")
            .with_children(vec![ident("x"), ident("y")]);
        let c = Node::new(NodeKind::BinaryExpr, Span::new(10, 20))
            .with_token("-")
            .with_children(vec![ident("x"), ident("y")]);
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn preorder_and_renumber() {
        let mut root = Node::new(NodeKind::CallExpr, Span::default())
            .with_children(vec![ident("f"), ident("a"), ident("b")]);
        let mut next = 0;
        root.renumber(&mut next);
        let ids: Vec<u32> = root.preorder().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(root.size(), 4);
        let names: Vec<&str> = root.preorder().skip(1).map(Node::token).collect();
        assert_eq!(names, vec!["f", "a", "b"]);
    }
}
