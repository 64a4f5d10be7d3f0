use astguard_syntax::{ConstValue, Node, Type, TypeInfo};

/// Semantic facts about a checked tree, as the engine sees them.
///
/// Every query may come back empty: missing facts make predicates fail,
/// they never abort matching.
pub trait Semantics {
    /// The type of an expression, if known.
    fn type_of(&self, node: &Node) -> Option<&Type>;

    /// The constant value of an expression, if it is constant.
    fn const_value(&self, node: &Node) -> Option<&ConstValue>;

    /// Resolve a type expression written in a rule.
    fn resolve_type(&self, spec: &Node) -> Option<Type>;

    /// Returns `true` when the node denotes a type rather than a value.
    fn is_type_expr(&self, node: &Node) -> bool;
}

impl Semantics for TypeInfo {
    fn type_of(&self, node: &Node) -> Option<&Type> {
        TypeInfo::type_of(self, node)
    }

    fn const_value(&self, node: &Node) -> Option<&ConstValue> {
        self.value_of(node)
    }

    fn resolve_type(&self, spec: &Node) -> Option<Type> {
        TypeInfo::resolve_type(self, spec)
    }

    fn is_type_expr(&self, node: &Node) -> bool {
        TypeInfo::is_type_expr(self, node)
    }
}
