//! Type checker for parsed files.
//!
//! The checker follows Go's rules for untyped constants: literals start out
//! untyped, constant expressions are folded, and an untyped expression takes
//! its final type from the context it is used in (assignment target, call
//! parameter, other operand). Final types are propagated into untyped
//! operands the way `go/types` does it: through parentheses always, through
//! unary and binary operators only when the operator result is not constant
//! and not a comparison.

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::{debug, instrument};

use crate::ast::{Node, NodeId, NodeKind};
use crate::constant::{ConstValue, fold_binary, fold_unary};
use crate::error::SyntaxError;
use crate::parser::parse_file;
use crate::source::SourceFile;
use crate::types::{BasicKind, Signature, Type};

/// Semantic facts recorded for one expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndValue {
    pub ty: Type,
    /// Set for constant expressions.
    pub value: Option<ConstValue>,
    /// Set when the node denotes a type rather than a value.
    pub is_type: bool,
}

#[derive(Debug, Clone)]
enum Object {
    TypeName(Type),
    Var(Type),
    /// A variable initialized from an expression of unknown type.
    Unknown,
    Const(Type, ConstValue),
    Func(Type),
    Package,
    Builtin(Builtin),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Len,
}

static UNIVERSE: LazyLock<HashMap<&'static str, Object>> = LazyLock::new(|| {
    let basic = |k| Object::TypeName(Type::basic(k));
    HashMap::from([
        ("bool", basic(BasicKind::Bool)),
        ("int", basic(BasicKind::Int)),
        ("int32", basic(BasicKind::Int32)),
        ("int64", basic(BasicKind::Int64)),
        ("uint8", basic(BasicKind::Uint8)),
        ("float64", basic(BasicKind::Float64)),
        ("string", basic(BasicKind::String)),
        ("byte", basic(BasicKind::Uint8)),
        ("rune", basic(BasicKind::Int32)),
        ("any", Object::TypeName(Type::empty_interface())),
        ("error", Object::TypeName(Type::error())),
        (
            "true",
            Object::Const(Type::basic(BasicKind::UntypedBool), ConstValue::Bool(true)),
        ),
        (
            "false",
            Object::Const(Type::basic(BasicKind::UntypedBool), ConstValue::Bool(false)),
        ),
        ("nil", Object::Nil),
        ("len", Object::Builtin(Builtin::Len)),
    ])
});

/// Types and constant values of a checked file.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    types: HashMap<NodeId, TypeAndValue>,
    package: HashMap<String, Object>,
}

impl TypeInfo {
    /// Everything recorded for a node.
    pub fn get(&self, node: &Node) -> Option<&TypeAndValue> {
        self.types.get(&node.id)
    }

    /// Type of an expression or type node; `None` when it is unknown.
    pub fn type_of(&self, node: &Node) -> Option<&Type> {
        self.get(node).map(|tv| &tv.ty)
    }

    /// Constant value of an expression, if it is constant.
    pub fn value_of(&self, node: &Node) -> Option<&ConstValue> {
        self.get(node).and_then(|tv| tv.value.as_ref())
    }

    /// Returns `true` when the node denotes a type.
    pub fn is_type_expr(&self, node: &Node) -> bool {
        self.get(node).is_some_and(|tv| tv.is_type)
    }

    /// Resolve a type expression against the package scope.
    ///
    /// Names declared inside function bodies are not visible here.
    pub fn resolve_type(&self, spec: &Node) -> Option<Type> {
        let lookup = |name: &str| {
            self.package
                .get(name)
                .or_else(|| UNIVERSE.get(name))
                .cloned()
        };
        eval_type(spec, &lookup).ok()
    }

    /// Number of nodes with recorded facts.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A parsed and type-checked source file.
#[derive(Debug, Clone)]
pub struct CheckedFile {
    pub source: SourceFile,
    pub root: Node,
    pub info: TypeInfo,
}

impl CheckedFile {
    /// Parse and check `text` as a file called `name`.
    pub fn parse(name: impl Into<String>, text: impl Into<String>) -> Result<Self, SyntaxError> {
        let source = SourceFile::new(name, text);
        let root = parse_file(&source)?;
        let info = check(&source, &root)?;
        Ok(Self { source, root, info })
    }
}

/// Type-check a parsed file.
#[instrument(skip_all, fields(file = file.name()))]
pub fn check(file: &SourceFile, root: &Node) -> Result<TypeInfo, SyntaxError> {
    let mut checker = Checker {
        file,
        scopes: vec![HashMap::new()],
        types: HashMap::new(),
        results: Vec::new(),
    };
    checker.file(root)?;
    let package = checker.scopes.swap_remove(0);
    debug!(recorded = checker.types.len(), "type-checked file");
    Ok(TypeInfo {
        types: checker.types,
        package,
    })
}

// ---------------------------------------------------------------------------
// Type expressions
// ---------------------------------------------------------------------------

fn eval_type(node: &Node, lookup: &dyn Fn(&str) -> Option<Object>) -> Result<Type, String> {
    let elem = |idx: usize| -> Result<Type, String> {
        let child = node
            .child(idx)
            .ok_or_else(|| format!("malformed type {node}"))?;
        eval_type(child, lookup)
    };
    match node.kind {
        NodeKind::Ident => match lookup(node.token()) {
            Some(Object::TypeName(ty)) => Ok(ty),
            Some(_) => Err(format!("{} is not a type", node.token())),
            None => Err(format!("undefined: {}", node.token())),
        },
        NodeKind::ParenExpr => elem(0),
        NodeKind::StarExpr => Ok(Type::Pointer(Box::new(elem(0)?))),
        NodeKind::ArrayType | NodeKind::Ellipsis => Ok(Type::Slice(Box::new(elem(0)?))),
        NodeKind::InterfaceType => Ok(Type::empty_interface()),
        NodeKind::FuncType => Ok(Type::Func(eval_signature(node, lookup)?)),
        NodeKind::SelectorExpr => Err(format!("unsupported qualified type {node}")),
        _ => Err(format!("{node} is not a type")),
    }
}

fn eval_fields(list: Option<&Node>, lookup: &dyn Fn(&str) -> Option<Object>) -> Result<Vec<Type>, String> {
    let mut out = Vec::new();
    for field in list.map(|l| l.children.as_slice()).unwrap_or_default() {
        let Some((ty_node, names)) = field.children.split_last() else {
            continue;
        };
        let ty = eval_type(ty_node, lookup)?;
        for _ in 0..names.len().max(1) {
            out.push(ty.clone());
        }
    }
    Ok(out)
}

fn eval_signature(node: &Node, lookup: &dyn Fn(&str) -> Option<Object>) -> Result<Signature, String> {
    let params = node.child(0);
    let variadic = params
        .and_then(|p| p.children.last())
        .and_then(|f| f.children.last())
        .is_some_and(|ty| ty.kind == NodeKind::Ellipsis);
    Ok(Signature {
        params: eval_fields(params, lookup)?,
        variadic,
        results: eval_fields(node.child(1), lookup)?,
    })
}

// ---------------------------------------------------------------------------
// Operands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Mode {
    Value,
    Constant(ConstValue),
    Type,
    Package,
    Builtin(Builtin),
    NoValue,
}

#[derive(Debug, Clone)]
struct Operand {
    mode: Mode,
    /// `None` when the type cannot be known, e.g. members of imported packages.
    ty: Option<Type>,
}

impl Operand {
    fn value(ty: Type) -> Self {
        Self {
            mode: Mode::Value,
            ty: Some(ty),
        }
    }

    fn constant(ty: Type, value: ConstValue) -> Self {
        Self {
            mode: Mode::Constant(value),
            ty: Some(ty),
        }
    }

    fn unknown() -> Self {
        Self {
            mode: Mode::Value,
            ty: None,
        }
    }

    fn const_value(&self) -> Option<&ConstValue> {
        match &self.mode {
            Mode::Constant(v) => Some(v),
            _ => None,
        }
    }

    fn is_untyped(&self) -> bool {
        self.ty.as_ref().is_some_and(Type::is_untyped)
    }

    fn is_nil(&self) -> bool {
        self.ty == Some(Type::basic(BasicKind::UntypedNil))
    }
}

fn is_comparison(op: &str) -> bool {
    matches!(op, "==" | "!=" | "<" | "<=" | ">" | ">=")
}

fn is_shift(op: &str) -> bool {
    matches!(op, "<<" | ">>")
}

fn is_numeric(ty: &Type) -> bool {
    ty.is_integer() || ty.is_float()
}

fn is_const_type(ty: &Type) -> bool {
    ty.basic_kind().is_some_and(|k| k != BasicKind::UntypedNil)
}

fn is_byte_or_rune_slice(ty: &Type) -> bool {
    matches!(ty.underlying(), Type::Slice(elem)
        if matches!(elem.basic_kind(), Some(BasicKind::Uint8 | BasicKind::Int32)))
}

fn assignable(from: &Type, to: &Type) -> bool {
    if from == to {
        return true;
    }
    if *from == Type::basic(BasicKind::UntypedNil) {
        return matches!(
            to.underlying(),
            Type::Pointer(_) | Type::Slice(_) | Type::Func(_) | Type::Interface(_)
        );
    }
    if let Type::Interface(wanted) = to.underlying() {
        return match from.underlying() {
            Type::Interface(have) => wanted.iter().all(|m| have.contains(m)),
            _ => wanted.is_empty(),
        };
    }
    let named = |t: &Type| matches!(t, Type::Named { .. });
    (!named(from) || !named(to)) && from.underlying() == to.underlying()
}

fn convertible(from: &Type, to: &Type) -> bool {
    assignable(from, to)
        || from.underlying() == to.underlying()
        || (is_numeric(from) && is_numeric(to))
        || (to.is_string() && (from.is_integer() || is_byte_or_rune_slice(from)))
        || (from.is_string() && is_byte_or_rune_slice(to))
}

/// Decode a literal token into its untyped kind and value.
fn literal(token: &str) -> Option<(BasicKind, ConstValue)> {
    match token.chars().next()? {
        '"' => Some((BasicKind::UntypedString, ConstValue::String(unquote(token)?))),
        '`' => {
            let inner = token.get(1..token.len() - 1)?;
            Some((BasicKind::UntypedString, ConstValue::String(inner.replace('\r', ""))))
        }
        '\'' => {
            let text = unquote(token)?;
            let mut chars = text.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some((BasicKind::UntypedRune, ConstValue::Int(i64::from(u32::from(c)))))
        }
        _ => {
            let digits = token.replace('_', "");
            let lower = digits.to_ascii_lowercase();
            let radix_int = |prefix: &str, radix| {
                lower
                    .strip_prefix(prefix)
                    .and_then(|d| i64::from_str_radix(d, radix).ok())
            };
            if lower.starts_with("0x") {
                return radix_int("0x", 16).map(|n| (BasicKind::UntypedInt, ConstValue::Int(n)));
            }
            if lower.starts_with("0b") {
                return radix_int("0b", 2).map(|n| (BasicKind::UntypedInt, ConstValue::Int(n)));
            }
            if lower.starts_with("0o") {
                return radix_int("0o", 8).map(|n| (BasicKind::UntypedInt, ConstValue::Int(n)));
            }
            if lower.contains(['.', 'e']) {
                let f = lower.parse::<f64>().ok()?;
                return Some((BasicKind::UntypedFloat, ConstValue::Float(f)));
            }
            let n = if lower.len() > 1 && lower.starts_with('0') {
                i64::from_str_radix(&lower[1..], 8).ok()?
            } else {
                lower.parse::<i64>().ok()?
            };
            Some((BasicKind::UntypedInt, ConstValue::Int(n)))
        }
    }
}

/// Interpret the escapes of a double- or single-quoted literal.
fn unquote(token: &str) -> Option<String> {
    let inner = token.get(1..token.len().checked_sub(1)?)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            c @ ('\\' | '"' | '\'') => c,
            c @ ('x' | 'u' | 'U') => {
                let len = match c {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.by_ref().take(len).collect();
                char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?
            }
            d @ '0'..='7' => {
                let rest: String = chars.by_ref().take(2).collect();
                let code = u32::from_str_radix(&format!("{d}{rest}"), 8).ok()?;
                char::from_u32(code)?
            }
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

struct Checker<'f> {
    file: &'f SourceFile,
    scopes: Vec<HashMap<String, Object>>,
    types: HashMap<NodeId, TypeAndValue>,
    /// Result types of the function being checked.
    results: Vec<Type>,
}

type CheckResult<T> = Result<T, SyntaxError>;

impl Checker<'_> {
    fn error(&self, node: &Node, message: impl Into<String>) -> SyntaxError {
        SyntaxError::Check {
            location: self.file.location(node.span),
            message: message.into(),
        }
    }

    fn lookup(&self, name: &str) -> Option<Object> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| UNIVERSE.get(name))
            .cloned()
    }

    fn declare(&mut self, ident: &Node, obj: Object) -> CheckResult<()> {
        let name = ident.token();
        if name == "_" {
            return Ok(());
        }
        let redeclared = self
            .scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name));
        if redeclared {
            return Err(self.error(ident, format!("{name} redeclared in this block")));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), obj);
        }
        Ok(())
    }

    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> CheckResult<T>) -> CheckResult<T> {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn record(&mut self, node: &Node, x: &Operand) {
        let Some(ty) = x.ty.clone() else {
            return;
        };
        let (value, is_type) = match &x.mode {
            Mode::Value => (None, false),
            Mode::Constant(v) => (Some(v.clone()), false),
            Mode::Type => (None, true),
            Mode::Package | Mode::Builtin(_) | Mode::NoValue => return,
        };
        self.types.insert(node.id, TypeAndValue { ty, value, is_type });
    }

    /// Give an untyped expression its final type.
    fn update_expr_type(&mut self, node: &Node, target: &Type) {
        let Some(old) = self.types.get(&node.id) else {
            return;
        };
        if !old.ty.is_untyped() {
            return;
        }
        let is_const = old.value.is_some();
        match node.kind {
            NodeKind::ParenExpr => {
                if let Some(inner) = node.child(0) {
                    self.update_expr_type(inner, target);
                }
            }
            NodeKind::UnaryExpr if !is_const => {
                if let Some(operand) = node.child(0) {
                    self.update_expr_type(operand, target);
                }
            }
            NodeKind::BinaryExpr if !is_const && !is_comparison(node.token()) => {
                let operands = if is_shift(node.token()) { 1 } else { 2 };
                for operand in node.children.iter().take(operands) {
                    self.update_expr_type(operand, target);
                }
            }
            _ => {}
        }
        if let Some(tv) = self.types.get_mut(&node.id) {
            if let Some(value) = tv.value.as_ref().and_then(|v| v.convert(target)) {
                tv.value = Some(value);
            }
            tv.ty = target.clone();
        }
    }

    /// Convert an untyped operand to `target` (implicit conversion).
    fn convert_untyped(&mut self, node: &Node, x: &mut Operand, target: &Type) -> CheckResult<()> {
        let Some(ty) = x.ty.clone() else {
            return Ok(());
        };
        if !ty.is_untyped() {
            return Ok(());
        }
        let new_ty = if target.is_untyped() {
            if is_numeric(&ty) && is_numeric(target) {
                ty.larger_untyped(target)
            } else {
                return Ok(());
            }
        } else if target.is_interface() {
            if x.is_nil() {
                return Ok(());
            }
            ty.default_type()
        } else {
            let compatible = match ty.basic_kind() {
                Some(BasicKind::UntypedNil) => matches!(
                    target.underlying(),
                    Type::Pointer(_) | Type::Slice(_) | Type::Func(_)
                ),
                Some(BasicKind::UntypedBool) => target.is_boolean(),
                Some(BasicKind::UntypedString) => target.is_string(),
                _ => is_numeric(target),
            };
            if !compatible {
                return Err(self.error(
                    node,
                    format!("cannot use {node} ({ty} constant) as {target} value"),
                ));
            }
            target.clone()
        };
        if let Mode::Constant(value) = &x.mode {
            let Some(converted) = value.convert(&new_ty) else {
                return Err(self.error(
                    node,
                    format!("cannot use {node} ({ty} constant {value}) as {new_ty} value (overflows or truncated)"),
                ));
            };
            x.mode = Mode::Constant(converted);
        }
        self.update_expr_type(node, &new_ty);
        x.ty = Some(new_ty);
        Ok(())
    }

    /// Give an untyped operand its default type.
    fn default_convert(&mut self, node: &Node, x: &mut Operand) -> CheckResult<()> {
        if x.is_nil() {
            return Err(self.error(node, "use of untyped nil"));
        }
        if let Some(ty) = x.ty.clone().filter(Type::is_untyped) {
            self.convert_untyped(node, x, &ty.default_type())?;
        }
        Ok(())
    }

    /// Check that `x` can be assigned to a variable of type `target`.
    fn assign(&mut self, node: &Node, x: &mut Operand, target: &Type, context: &str) -> CheckResult<()> {
        self.convert_untyped(node, x, target)?;
        match &x.ty {
            Some(ty) if !assignable(ty, target) => Err(self.error(
                node,
                format!("cannot use {node} (value of type {ty}) as {target} value in {context}"),
            )),
            _ => Ok(()),
        }
    }

    fn type_expr(&mut self, node: &Node) -> CheckResult<Type> {
        let ty = eval_type(node, &|name| self.lookup(name)).map_err(|msg| self.error(node, msg))?;
        let x = Operand {
            mode: Mode::Type,
            ty: Some(ty.clone()),
        };
        self.record(node, &x);
        Ok(ty)
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn expr(&mut self, node: &Node) -> CheckResult<Operand> {
        let x = self.expr_inner(node)?;
        self.record(node, &x);
        Ok(x)
    }

    /// An expression that must produce a value.
    fn value_expr(&mut self, node: &Node) -> CheckResult<Operand> {
        let x = self.expr(node)?;
        match x.mode {
            Mode::Value | Mode::Constant(_) => Ok(x),
            Mode::Type => Err(self.error(node, format!("{node} (type) is not an expression"))),
            Mode::Package => Err(self.error(node, format!("use of package {node} without selector"))),
            Mode::Builtin(_) => Err(self.error(node, format!("{node} (built-in) must be called"))),
            Mode::NoValue => Err(self.error(node, format!("{node} (no value) used as value"))),
        }
    }

    fn child<'n>(&self, node: &'n Node, idx: usize) -> CheckResult<&'n Node> {
        node.child(idx)
            .ok_or_else(|| self.error(node, format!("malformed {}", node.kind)))
    }

    fn expr_inner(&mut self, node: &Node) -> CheckResult<Operand> {
        match node.kind {
            NodeKind::Ident => self.ident(node),
            NodeKind::BasicLit => match literal(node.token()) {
                Some((kind, value)) => Ok(Operand::constant(Type::basic(kind), value)),
                None => Err(self.error(node, format!("invalid literal {}", node.token()))),
            },
            NodeKind::ParenExpr => {
                let inner = self.child(node, 0)?;
                self.expr(inner)
            }
            NodeKind::UnaryExpr => self.unary(node),
            NodeKind::BinaryExpr => {
                let (lhs, rhs) = (self.child(node, 0)?, self.child(node, 1)?);
                let x = self.value_expr(lhs)?;
                let y = self.value_expr(rhs)?;
                self.binary(node, node.token(), lhs, x, rhs, y)
            }
            NodeKind::StarExpr => {
                let inner = self.child(node, 0)?;
                let x = self.expr(inner)?;
                match (&x.mode, &x.ty) {
                    (Mode::Type, Some(ty)) => Ok(Operand {
                        mode: Mode::Type,
                        ty: Some(Type::Pointer(Box::new(ty.clone()))),
                    }),
                    (_, None) => Ok(Operand::unknown()),
                    (_, Some(ty)) => match ty.underlying() {
                        Type::Pointer(elem) => Ok(Operand::value((**elem).clone())),
                        _ => Err(self.error(node, format!("invalid operation: cannot indirect {inner}"))),
                    },
                }
            }
            NodeKind::CallExpr => self.call(node),
            NodeKind::SelectorExpr => self.selector(node),
            NodeKind::IndexExpr => self.index(node),
            NodeKind::TypeAssertExpr => {
                let operand = self.child(node, 0)?;
                let x = self.value_expr(operand)?;
                if let Some(ty) = &x.ty {
                    if !ty.is_interface() {
                        return Err(self.error(
                            operand,
                            format!("invalid operation: {operand} (variable of type {ty}) is not an interface"),
                        ));
                    }
                }
                let target = self.type_expr(self.child(node, 1)?)?;
                Ok(Operand::value(target))
            }
            NodeKind::ArrayType | NodeKind::InterfaceType | NodeKind::FuncType | NodeKind::Ellipsis => {
                let ty = eval_type(node, &|name| self.lookup(name)).map_err(|msg| self.error(node, msg))?;
                Ok(Operand {
                    mode: Mode::Type,
                    ty: Some(ty),
                })
            }
            _ => Err(self.error(node, format!("unexpected {} in expression", node.kind))),
        }
    }

    fn ident(&mut self, node: &Node) -> CheckResult<Operand> {
        let name = node.token();
        let Some(obj) = self.lookup(name) else {
            if name == "_" {
                return Err(self.error(node, "cannot use _ as value"));
            }
            return Err(self.error(node, format!("undefined: {name}")));
        };
        Ok(match obj {
            Object::TypeName(ty) => Operand {
                mode: Mode::Type,
                ty: Some(ty),
            },
            Object::Var(ty) | Object::Func(ty) => Operand::value(ty),
            Object::Unknown => Operand::unknown(),
            Object::Const(ty, value) => Operand::constant(ty, value),
            Object::Package => Operand {
                mode: Mode::Package,
                ty: None,
            },
            Object::Builtin(b) => Operand {
                mode: Mode::Builtin(b),
                ty: None,
            },
            Object::Nil => Operand::value(Type::basic(BasicKind::UntypedNil)),
        })
    }

    fn unary(&mut self, node: &Node) -> CheckResult<Operand> {
        let operand = self.child(node, 0)?;
        let op = node.token();
        let x = self.value_expr(operand)?;
        let Some(ty) = x.ty.clone() else {
            return Ok(Operand::unknown());
        };
        if op == "&" {
            return Ok(Operand::value(Type::Pointer(Box::new(ty))));
        }
        let ok = match op {
            "+" | "-" => is_numeric(&ty),
            "!" => ty.is_boolean(),
            "^" => ty.is_integer(),
            _ => false,
        };
        if !ok {
            return Err(self.error(
                node,
                format!("invalid operation: operator {op} not defined on {operand} (value of type {ty})"),
            ));
        }
        match x.const_value() {
            Some(value) => match fold_unary(op, value) {
                Some(folded) => Ok(Operand::constant(ty, folded)),
                None => Err(self.error(node, format!("constant overflow in {node}"))),
            },
            None => Ok(Operand::value(ty)),
        }
    }

    fn binary(
        &mut self,
        node: &Node,
        op: &str,
        lhs: &Node,
        mut x: Operand,
        rhs: &Node,
        mut y: Operand,
    ) -> CheckResult<Operand> {
        if is_shift(op) {
            return self.shift(node, op, x, rhs, &y);
        }
        self.match_types(lhs, &mut x, rhs, &mut y)?;
        let (Some(xt), Some(yt)) = (x.ty.clone(), y.ty.clone()) else {
            return Ok(Operand::unknown());
        };

        if is_comparison(op) {
            if !assignable(&xt, &yt) && !assignable(&yt, &xt) {
                return Err(self.error(
                    node,
                    format!("invalid operation: {node} (mismatched types {xt} and {yt})"),
                ));
            }
            let bool_ty = Type::basic(BasicKind::UntypedBool);
            if let (Some(a), Some(b)) = (x.const_value(), y.const_value()) {
                if let Some(result) = fold_binary(op, a, b) {
                    return Ok(Operand::constant(bool_ty, result));
                }
            }
            self.update_expr_type(lhs, &xt.default_type());
            self.update_expr_type(rhs, &yt.default_type());
            return Ok(Operand::value(bool_ty));
        }

        if xt != yt {
            return Err(self.error(
                node,
                format!("invalid operation: {node} (mismatched types {xt} and {yt})"),
            ));
        }
        let defined = match op {
            "+" => is_numeric(&xt) || xt.is_string(),
            "-" | "*" | "/" => is_numeric(&xt),
            "%" | "&" | "|" | "^" | "&^" => xt.is_integer(),
            "&&" | "||" => xt.is_boolean(),
            _ => false,
        };
        if !defined {
            return Err(self.error(
                node,
                format!("invalid operation: operator {op} not defined on {lhs} (value of type {xt})"),
            ));
        }
        if matches!(op, "/" | "%") && y.const_value().is_some_and(ConstValue::is_zero) && xt.is_integer() {
            return Err(self.error(node, "invalid operation: division by zero"));
        }
        match (x.const_value(), y.const_value()) {
            (Some(a), Some(b)) => {
                if matches!(op, "/" | "%") && b.is_zero() {
                    return Err(self.error(node, "invalid operation: division by zero"));
                }
                let folded = fold_binary(op, a, b).and_then(|v| v.convert(&xt));
                match folded {
                    Some(value) => Ok(Operand::constant(xt, value)),
                    None => Err(self.error(node, format!("constant overflow in {node}"))),
                }
            }
            _ => Ok(Operand::value(xt)),
        }
    }

    /// Bring an untyped operand to the type of the other operand.
    fn match_types(&mut self, lhs: &Node, x: &mut Operand, rhs: &Node, y: &mut Operand) -> CheckResult<()> {
        let (Some(xt), Some(yt)) = (x.ty.clone(), y.ty.clone()) else {
            return Ok(());
        };
        match (xt.is_untyped(), yt.is_untyped()) {
            (true, false) => self.convert_untyped(lhs, x, &yt),
            (false, true) => self.convert_untyped(rhs, y, &xt),
            (true, true) if is_numeric(&xt) && is_numeric(&yt) => {
                let larger = xt.larger_untyped(&yt);
                self.convert_untyped(lhs, x, &larger)?;
                self.convert_untyped(rhs, y, &larger)
            }
            _ => Ok(()),
        }
    }

    fn shift(&mut self, node: &Node, op: &str, x: Operand, rhs: &Node, y: &Operand) -> CheckResult<Operand> {
        let (Some(xt), Some(yt)) = (x.ty.clone(), y.ty.clone()) else {
            return Ok(Operand::unknown());
        };
        if !yt.is_integer() {
            return Err(self.error(rhs, format!("invalid operation: shift count {rhs} must be integer")));
        }
        if !xt.is_integer() {
            return Err(self.error(node, format!("invalid operation: shifted operand of {node} must be integer")));
        }
        match (x.const_value(), y.const_value()) {
            (Some(a), Some(b)) => match fold_binary(op, a, b) {
                Some(value) => Ok(Operand::constant(xt, value)),
                None => Err(self.error(node, format!("constant overflow in {node}"))),
            },
            _ if xt.is_untyped() => Ok(Operand::value(xt.default_type())),
            _ => Ok(Operand::value(xt)),
        }
    }

    fn call(&mut self, node: &Node) -> CheckResult<Operand> {
        let fun_node = self.child(node, 0)?;
        let args = &node.children[1..];
        let spread = node.token() == "...";
        let fun = self.expr(fun_node)?;
        match (&fun.mode, &fun.ty) {
            (Mode::Type, Some(target)) => self.conversion(node, target, args),
            (Mode::Builtin(Builtin::Len), _) => self.builtin_len(node, args),
            (_, None) => {
                for arg in args {
                    let mut x = self.value_expr(arg)?;
                    self.default_convert(arg, &mut x)?;
                }
                Ok(Operand::unknown())
            }
            (_, Some(ty)) => {
                let Type::Func(sig) = ty.underlying().clone() else {
                    return Err(self.error(
                        node,
                        format!("invalid operation: cannot call non-function {fun_node} (value of type {ty})"),
                    ));
                };
                self.call_args(node, &sig, args, spread)?;
                Ok(match sig.results.as_slice() {
                    [] => Operand {
                        mode: Mode::NoValue,
                        ty: None,
                    },
                    [single] => Operand::value(single.clone()),
                    many => Operand::value(Type::Tuple(many.to_vec())),
                })
            }
        }
    }

    fn call_args(&mut self, node: &Node, sig: &Signature, args: &[Node], spread: bool) -> CheckResult<()> {
        let fixed = if sig.variadic {
            sig.params.len().saturating_sub(1)
        } else {
            sig.params.len()
        };
        let too_few = args.len() < fixed || (spread && args.len() != sig.params.len());
        let too_many = !sig.variadic && args.len() > fixed;
        if spread && !sig.variadic {
            return Err(self.error(node, format!("have (...) arguments in call to non-variadic {node}")));
        }
        if too_few {
            return Err(self.error(node, format!("not enough arguments in call to {}", node.children[0])));
        }
        if too_many {
            return Err(self.error(node, format!("too many arguments in call to {}", node.children[0])));
        }
        for (i, arg) in args.iter().enumerate() {
            let target = match sig.params.get(i.min(sig.params.len().saturating_sub(1))) {
                Some(Type::Slice(elem)) if sig.variadic && i >= fixed && !spread => (**elem).clone(),
                Some(param) => param.clone(),
                None => continue,
            };
            let mut x = self.value_expr(arg)?;
            self.assign(arg, &mut x, &target, "argument")?;
        }
        Ok(())
    }

    fn conversion(&mut self, node: &Node, target: &Type, args: &[Node]) -> CheckResult<Operand> {
        let [arg] = args else {
            return Err(self.error(node, format!("wrong argument count in conversion to {target}")));
        };
        let x = self.value_expr(arg)?;
        let Some(from) = x.ty.clone() else {
            return Ok(Operand::value(target.clone()));
        };
        let constant = x.const_value().cloned();
        let ok = match &constant {
            Some(_) if from.is_untyped() && target.basic_kind().is_some() => {
                (from.is_string() && target.is_string())
                    || (from.is_boolean() && target.is_boolean())
                    || (is_numeric(&from) && (is_numeric(target) || target.is_string()))
            }
            _ => (x.is_nil() && assignable(&from, target)) || convertible(&from, target),
        };
        if !ok {
            return Err(self.error(node, format!("cannot convert {arg} (value of type {from}) to type {target}")));
        }

        let result = match constant.filter(|_| is_const_type(target)) {
            Some(ConstValue::Int(n)) if target.is_string() => {
                let c = u32::try_from(n).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}');
                Operand::constant(target.clone(), ConstValue::String(c.to_string()))
            }
            Some(value) => match value.convert(target) {
                Some(converted) => Operand::constant(target.clone(), converted),
                None => {
                    return Err(self.error(
                        node,
                        format!("cannot convert {arg} (constant {value}) to type {target}"),
                    ));
                }
            },
            None => Operand::value(target.clone()),
        };

        if from.is_untyped() {
            let final_ty = if target.is_interface() || (x.const_value().is_some() && !is_const_type(target)) || x.is_nil() {
                from.default_type()
            } else if x.const_value().is_some() && from.is_integer() && target.is_string() {
                from.clone()
            } else {
                target.clone()
            };
            self.update_expr_type(arg, &final_ty);
        }
        Ok(result)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn builtin_len(&mut self, node: &Node, args: &[Node]) -> CheckResult<Operand> {
        let [arg] = args else {
            return Err(self.error(node, "wrong number of arguments to len"));
        };
        let x = self.value_expr(arg)?;
        let int = Type::basic(BasicKind::Int);
        match (&x.ty, x.const_value()) {
            (_, Some(ConstValue::String(s))) => Ok(Operand::constant(int, ConstValue::Int(s.len() as i64))),
            (None, _) => Ok(Operand::value(int)),
            (Some(ty), _) if ty.is_string() || matches!(ty.underlying(), Type::Slice(_)) => Ok(Operand::value(int)),
            (Some(ty), _) => Err(self.error(arg, format!("invalid argument: {arg} (value of type {ty}) for len"))),
        }
    }

    fn selector(&mut self, node: &Node) -> CheckResult<Operand> {
        let base = self.child(node, 0)?;
        let sel = self.child(node, 1)?;
        let x = self.expr(base)?;
        match (&x.mode, &x.ty) {
            (Mode::Package, _) | (_, None) => Ok(Operand::unknown()),
            (_, Some(ty)) => match ty.underlying() {
                Type::Interface(methods) if methods.iter().any(|m| m == sel.token()) => {
                    Ok(Operand::unknown())
                }
                _ => Err(self.error(
                    node,
                    format!("{node} undefined (type {ty} has no field or method {})", sel.token()),
                )),
            },
        }
    }

    fn index(&mut self, node: &Node) -> CheckResult<Operand> {
        let base = self.child(node, 0)?;
        let idx = self.child(node, 1)?;
        let x = self.value_expr(base)?;
        let mut i = self.value_expr(idx)?;
        self.convert_untyped(idx, &mut i, &Type::basic(BasicKind::Int))?;
        if let Some(ty) = i.ty.as_ref().filter(|t| !t.is_integer()) {
            return Err(self.error(idx, format!("invalid argument: index {idx} (value of type {ty}) must be integer")));
        }
        match &x.ty {
            None => Ok(Operand::unknown()),
            Some(ty) if ty.is_string() => Ok(Operand::value(Type::basic(BasicKind::Uint8))),
            Some(ty) => match ty.underlying() {
                Type::Slice(elem) => Ok(Operand::value((**elem).clone())),
                _ => Err(self.error(node, format!("invalid operation: cannot index {base} (value of type {ty})"))),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Declarations and statements
    // -----------------------------------------------------------------------

    fn file(&mut self, root: &Node) -> CheckResult<()> {
        if root.kind != NodeKind::File {
            return Err(self.error(root, format!("expected a file, found {}", root.kind)));
        }
        let specs = |kind: NodeKind| {
            root.children
                .iter()
                .filter(|d| d.kind == NodeKind::DeclStmt)
                .flat_map(|d| d.children.iter())
                .filter(move |s| s.kind == kind)
        };
        for import in root.children.iter().filter(|d| d.kind == NodeKind::ImportSpec) {
            let path = import.token().trim_matches(['"', '`']);
            let name = path.rsplit('/').next().unwrap_or(path);
            let ident = Node::new(NodeKind::Ident, import.span).with_token(name);
            self.declare(&ident, Object::Package)?;
        }
        for spec in specs(NodeKind::TypeSpec) {
            self.type_spec(spec)?;
        }
        let funcs: Vec<&Node> = root
            .children
            .iter()
            .filter(|d| d.kind == NodeKind::FuncDecl)
            .collect();
        for func in &funcs {
            let name = self.child(func, 0)?;
            let ty = self.type_expr(self.child(func, 1)?)?;
            self.record(name, &Operand::value(ty.clone()));
            self.declare(name, Object::Func(ty))?;
        }
        for spec in specs(NodeKind::ValueSpec) {
            self.value_spec(spec)?;
        }
        for func in funcs {
            self.func_body(func)?;
        }
        Ok(())
    }

    fn type_spec(&mut self, spec: &Node) -> CheckResult<()> {
        let name = self.child(spec, 0)?;
        let target = self.type_expr(self.child(spec, 1)?)?;
        let ty = if spec.token() == "=" {
            target
        } else {
            Type::Named {
                name: name.token().to_owned(),
                underlying: Box::new(target.underlying().clone()),
            }
        };
        self.record(
            name,
            &Operand {
                mode: Mode::Type,
                ty: Some(ty.clone()),
            },
        );
        self.declare(name, Object::TypeName(ty))
    }

    fn value_spec(&mut self, spec: &Node) -> CheckResult<()> {
        let name = self.child(spec, 0)?;
        let ty_node = self.child(spec, 1)?;
        let value = self.child(spec, 2)?;
        let declared = if ty_node.kind == NodeKind::Empty {
            None
        } else {
            Some(self.type_expr(ty_node)?)
        };
        let var_ty = if value.kind == NodeKind::Empty {
            declared
        } else {
            let mut x = self.value_expr(value)?;
            match declared {
                Some(ty) => {
                    self.assign(value, &mut x, &ty, "variable declaration")?;
                    Some(ty)
                }
                None => {
                    self.default_convert(value, &mut x)?;
                    x.ty
                }
            }
        };
        let obj = match var_ty {
            Some(ty) => {
                self.record(name, &Operand::value(ty.clone()));
                Object::Var(ty)
            }
            None => Object::Unknown,
        };
        self.declare(name, obj)
    }

    fn func_body(&mut self, func: &Node) -> CheckResult<()> {
        let sig_node = self.child(func, 1)?;
        let body = self.child(func, 2)?;
        let Some(Type::Func(sig)) = self.types.get(&sig_node.id).map(|tv| tv.ty.clone()) else {
            return Err(self.error(sig_node, "malformed function signature"));
        };
        self.results = sig.results.clone();
        self.with_scope(|this| {
            for list in sig_node.children.iter() {
                for field in &list.children {
                    let Some((ty_node, names)) = field.children.split_last() else {
                        continue;
                    };
                    let ty = eval_type(ty_node, &|name| this.lookup(name))
                        .map_err(|msg| this.error(ty_node, msg))?;
                    for name in names {
                        this.record(name, &Operand::value(ty.clone()));
                        this.declare(name, Object::Var(ty.clone()))?;
                    }
                }
            }
            for stmt in &body.children {
                this.stmt(stmt)?;
            }
            Ok(())
        })
    }

    fn block(&mut self, block: &Node) -> CheckResult<()> {
        self.with_scope(|this| {
            for stmt in &block.children {
                this.stmt(stmt)?;
            }
            Ok(())
        })
    }

    fn stmt(&mut self, node: &Node) -> CheckResult<()> {
        match node.kind {
            NodeKind::ExprStmt => {
                let expr = self.child(node, 0)?;
                let mut x = self.expr(expr)?;
                match x.mode {
                    Mode::NoValue => Ok(()),
                    Mode::Value | Mode::Constant(_) => self.default_convert(expr, &mut x),
                    _ => Err(self.error(expr, format!("{expr} is not used"))),
                }
            }
            NodeKind::AssignStmt => self.assign_stmt(node),
            NodeKind::IncDecStmt => {
                let target = self.child(node, 0)?;
                let x = self.value_expr(target)?;
                match &x.ty {
                    Some(ty) if !is_numeric(ty) => Err(self.error(
                        node,
                        format!("invalid operation: {node} (non-numeric type {ty})"),
                    )),
                    _ => Ok(()),
                }
            }
            NodeKind::ReturnStmt => self.return_stmt(node),
            NodeKind::IfStmt => self.with_scope(|this| {
                let cond = this.child(node, 0)?;
                let mut x = this.value_expr(cond)?;
                if let Some(ty) = x.ty.as_ref().filter(|t| !t.is_boolean()) {
                    return Err(this.error(
                        cond,
                        format!("non-boolean condition in if statement ({ty})"),
                    ));
                }
                this.default_convert(cond, &mut x)?;
                this.block(this.child(node, 1)?)?;
                match node.child(2) {
                    Some(els) if els.kind == NodeKind::IfStmt => this.stmt(els),
                    Some(els) => this.block(els),
                    None => Ok(()),
                }
            }),
            NodeKind::BlockStmt => self.block(node),
            NodeKind::DeclStmt => {
                for spec in &node.children {
                    match spec.kind {
                        NodeKind::TypeSpec => self.type_spec(spec)?,
                        _ => self.value_spec(spec)?,
                    }
                }
                Ok(())
            }
            _ => Err(self.error(node, format!("unexpected {} in statement list", node.kind))),
        }
    }

    /// Check the right-hand side of an assignment with `want` targets.
    ///
    /// A single call returning a tuple spreads over the targets; such
    /// values carry no node since they need no implicit conversion.
    fn rhs_values<'n>(&mut self, node: &Node, want: usize, rhs: &'n [Node]) -> CheckResult<Vec<(Option<&'n Node>, Operand)>> {
        if let [single] = rhs {
            if want > 1 {
                let x = self.value_expr(single)?;
                return match x.ty {
                    Some(Type::Tuple(items)) if items.len() == want => {
                        Ok(items.into_iter().map(|t| (None, Operand::value(t))).collect())
                    }
                    None => Ok((0..want).map(|_| (None, Operand::unknown())).collect()),
                    _ => Err(self.error(
                        node,
                        format!("assignment mismatch: {want} variables but 1 value"),
                    )),
                };
            }
        }
        if rhs.len() != want {
            return Err(self.error(
                node,
                format!("assignment mismatch: {want} variables but {} values", rhs.len()),
            ));
        }
        let mut out = Vec::with_capacity(rhs.len());
        for expr in rhs {
            let x = self.value_expr(expr)?;
            if matches!(x.ty, Some(Type::Tuple(_))) {
                return Err(self.error(expr, format!("multiple-value {expr} in single-value context")));
            }
            out.push((Some(expr), x));
        }
        Ok(out)
    }

    fn assign_stmt(&mut self, node: &Node) -> CheckResult<()> {
        let lhs = &self.child(node, 0)?.children;
        let rhs = &self.child(node, 1)?.children;
        let op = node.token();
        match op {
            ":=" => self.define(node, lhs, rhs),
            "=" => {
                let values = self.rhs_values(node, lhs.len(), rhs)?;
                for (target, (value_node, mut x)) in lhs.iter().zip(values) {
                    let value_node = value_node.unwrap_or(node);
                    if target.is_ident("_") {
                        self.default_convert(value_node, &mut x)?;
                        continue;
                    }
                    let target_ty = self.assignable_target(target)?;
                    match target_ty {
                        Some(ty) => self.assign(value_node, &mut x, &ty, "assignment")?,
                        None => self.default_convert(value_node, &mut x)?,
                    }
                }
                Ok(())
            }
            _ => {
                let ([target], [value]) = (lhs.as_slice(), rhs.as_slice()) else {
                    return Err(self.error(node, format!("assignment operation {op} requires single-valued expressions")));
                };
                let target_ty = self.assignable_target(target)?;
                let x = Operand {
                    mode: Mode::Value,
                    ty: target_ty.clone(),
                };
                let y = self.value_expr(value)?;
                let result = self.binary(node, op.trim_end_matches('='), target, x, value, y)?;
                match (target_ty, result.ty) {
                    (Some(want), Some(have)) if !assignable(&have, &want) => Err(self.error(
                        node,
                        format!("cannot use {node} (value of type {have}) as {want} value in assignment"),
                    )),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Check an assignment target and return its type.
    fn assignable_target(&mut self, target: &Node) -> CheckResult<Option<Type>> {
        if target.kind == NodeKind::Ident {
            match self.lookup(target.token()) {
                Some(Object::Var(_) | Object::Unknown) | None => {}
                Some(_) => {
                    return Err(self.error(target, format!("cannot assign to {target} (neither addressable nor a map index expression)")));
                }
            }
        }
        let x = self.value_expr(target)?;
        if matches!(x.mode, Mode::Constant(_)) {
            return Err(self.error(target, format!("cannot assign to {target} (constant)")));
        }
        Ok(x.ty)
    }

    fn define(&mut self, node: &Node, lhs: &[Node], rhs: &[Node]) -> CheckResult<()> {
        if let Some(bad) = lhs.iter().find(|n| n.kind != NodeKind::Ident) {
            return Err(self.error(bad, format!("non-name {bad} on left side of :=")));
        }
        let values = self.rhs_values(node, lhs.len(), rhs)?;
        let mut fresh = 0;
        for (name, (value_node, mut x)) in lhs.iter().zip(values) {
            let value_node = value_node.unwrap_or(node);
            let existing = self
                .scopes
                .last()
                .and_then(|scope| scope.get(name.token()))
                .cloned();
            match existing {
                Some(Object::Var(ty)) => {
                    self.record(name, &Operand::value(ty.clone()));
                    self.assign(value_node, &mut x, &ty, "assignment")?;
                    continue;
                }
                Some(Object::Unknown) => {
                    self.default_convert(value_node, &mut x)?;
                    continue;
                }
                _ => {}
            }
            self.default_convert(value_node, &mut x)?;
            if name.is_ident("_") {
                continue;
            }
            fresh += 1;
            let obj = match x.ty {
                Some(ty) => {
                    self.record(name, &Operand::value(ty.clone()));
                    Object::Var(ty)
                }
                None => Object::Unknown,
            };
            self.declare(name, obj)?;
        }
        if fresh == 0 {
            return Err(self.error(node, "no new variables on left side of :="));
        }
        Ok(())
    }

    fn return_stmt(&mut self, node: &Node) -> CheckResult<()> {
        let results = self.results.clone();
        if node.children.is_empty() {
            return if results.is_empty() {
                Ok(())
            } else {
                Err(self.error(node, "not enough return values"))
            };
        }
        if results.is_empty() {
            return Err(self.error(node, "too many return values"));
        }
        let values = self.rhs_values(node, results.len(), &node.children)?;
        for (want, (value_node, mut x)) in results.iter().zip(values) {
            self.assign(value_node.unwrap_or(node), &mut x, want, "return statement")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRELUDE: &str = "\nfunc f(...interface{}) interface{} { return 10 }\nvar sink interface{}\n";

    fn check_body(body: &str) -> CheckedFile {
        let src = format!("package testrule\nfunc testfunc() {{\n\t{body}\n}}{PRELUDE}");
        CheckedFile::parse("input.go", src).unwrap()
    }

    /// Find the first node rendering as `text` and return its type and value.
    fn fact(file: &CheckedFile, text: &str) -> (String, Option<ConstValue>) {
        let node = file
            .root
            .preorder()
            .find(|n| n.to_string() == text && file.info.get(n).is_some())
            .unwrap_or_else(|| panic!("no typed node {text}"));
        let tv = file.info.get(node).unwrap();
        (tv.ty.to_string(), tv.value.clone())
    }

    fn ty(file: &CheckedFile, text: &str) -> String {
        fact(file, text).0
    }

    #[test]
    fn untyped_operands_of_constant_expression_stay_untyped() {
        let file = check_body("sink = 4 + 1");
        assert_eq!(ty(&file, "4"), "untyped int");
        assert_eq!(fact(&file, "4 + 1"), ("int".to_owned(), Some(ConstValue::Int(5))));
    }

    #[test]
    fn blank_assignment_uses_default_type() {
        let file = check_body("_ = 10");
        assert_eq!(ty(&file, "10"), "int");
        let file = check_body("_ = \"hello\"");
        assert_eq!(ty(&file, "\"hello\""), "string");
    }

    #[test]
    fn parenthesized_argument_to_interface_param() {
        let file = check_body("_ = f((10))");
        assert_eq!(ty(&file, "f((10))"), "interface{}");
        assert_eq!(ty(&file, "(10)"), "int");
        assert_eq!(ty(&file, "10"), "int");
    }

    #[test]
    fn constant_folding_through_shift_and_parens() {
        let file = check_body("sink = (2 << 3) + 1");
        assert_eq!(
            fact(&file, "(2 << 3)"),
            ("untyped int".to_owned(), Some(ConstValue::Int(16)))
        );
    }

    #[test]
    fn string_concatenation_constant() {
        let file = check_body("sink = \"20\" + \"x\"");
        assert_eq!(
            fact(&file, "\"20\""),
            ("untyped string".to_owned(), Some(ConstValue::String("20".into())))
        );
    }

    #[test]
    fn typed_operand_converts_untyped_one() {
        let file = check_body("sink = f().(int) + 2");
        assert_eq!(fact(&file, "f().(int)"), ("int".to_owned(), None));
        assert_eq!(fact(&file, "2"), ("int".to_owned(), Some(ConstValue::Int(2))));
        assert_eq!(fact(&file, "f().(int) + 2"), ("int".to_owned(), None));
    }

    #[test]
    fn conversion_is_typed_constant() {
        let file = check_body("sink = int(10) + 20");
        assert_eq!(fact(&file, "int(10)"), ("int".to_owned(), Some(ConstValue::Int(10))));
        assert_eq!(ty(&file, "10"), "int");
        assert_eq!(ty(&file, "20"), "int");
    }

    #[test]
    fn variadic_interface_arguments_get_default_types() {
        let file = check_body("f(1.5, \"s\", true)");
        assert_eq!(ty(&file, "1.5"), "float64");
        assert_eq!(ty(&file, "\"s\""), "string");
        assert_eq!(ty(&file, "true"), "bool");
    }

    #[test]
    fn comparison_operands_get_default_types() {
        let file = check_body("x := 1\nsink = x == 2 && 3 < 4");
        assert_eq!(ty(&file, "x == 2"), "bool");
        assert_eq!(ty(&file, "2"), "int");
        assert_eq!(fact(&file, "3 < 4"), ("bool".to_owned(), Some(ConstValue::Bool(true))));
    }

    #[test]
    fn declarations_and_aliases() {
        let src = "package p\ntype MyInt int\ntype Bytes = []byte\nvar b Bytes\nfunc g(n MyInt) (MyInt, error) {\n\tvar m MyInt = 3\n\treturn n + m, nil\n}\nfunc h() {\n\tx, err := g(1)\n\t_ = x\n\t_ = err\n\t_ = b[0]\n}\n";
        let file = CheckedFile::parse("p.go", src).unwrap();
        assert_eq!(ty(&file, "n + m"), "MyInt");
        assert_eq!(ty(&file, "g(1)"), "(MyInt, error)");
        assert_eq!(ty(&file, "b[0]"), "uint8");

        let bytes = crate::parser::parse_type("[]uint8").unwrap();
        assert_eq!(file.info.resolve_type(&bytes), Some(Type::Slice(Box::new(Type::basic(BasicKind::Uint8)))));
        let alias = crate::parser::parse_type("Bytes").unwrap();
        assert_eq!(file.info.resolve_type(&alias), file.info.resolve_type(&bytes));
        let named = crate::parser::parse_type("MyInt").unwrap();
        assert_eq!(file.info.resolve_type(&named).unwrap().to_string(), "MyInt");
        let missing = crate::parser::parse_type("Nope").unwrap();
        assert_eq!(file.info.resolve_type(&missing), None);
    }

    #[test]
    fn imported_members_have_unknown_type() {
        let src = "package p\nimport \"fmt\"\nfunc h() {\n\tfmt.Println(1)\n}\n";
        let file = CheckedFile::parse("p.go", src).unwrap();
        let call = file
            .root
            .preorder()
            .find(|n| n.kind == NodeKind::CallExpr)
            .unwrap();
        assert_eq!(file.info.type_of(call), None);
        assert_eq!(ty(&file, "1"), "int");
    }

    #[test]
    fn type_expressions_are_marked() {
        let file = check_body("_ = []byte(\"abc\")");
        let conv = file
            .root
            .preorder()
            .find(|n| n.kind == NodeKind::ArrayType)
            .unwrap();
        assert!(file.info.is_type_expr(conv));
        assert_eq!(ty(&file, "[]byte(\"abc\")"), "[]uint8");
        assert_eq!(ty(&file, "\"abc\""), "string");
    }

    #[test]
    fn reports_check_errors() {
        let cases = [
            ("_ = y", "undefined: y"),
            ("var s string = 1", "cannot use 1"),
            ("x := 1\nx := 2", "no new variables"),
            ("_ = 1 / 0", "division by zero"),
            ("a, b := 1", "assignment mismatch"),
            ("x := 1\nx()", "cannot call non-function"),
            ("_ = \"a\" + 1", "mismatched types"),
            ("_ = (1 << 63) + 1", "constant overflow"),
            ("_ = (1 << 62) * 4", "constant overflow"),
        ];
        for (body, want) in cases {
            let src = format!("package p\nfunc t() {{\n\t{body}\n}}\n");
            let err = CheckedFile::parse("e.go", src).unwrap_err();
            assert!(err.to_string().contains(want), "{body}: {err}");
            assert!(err.location().line >= 3, "{body}: {err}");
        }
    }

    #[test]
    fn literal_decoding() {
        assert_eq!(literal("0x1F"), Some((BasicKind::UntypedInt, ConstValue::Int(31))));
        assert_eq!(literal("017"), Some((BasicKind::UntypedInt, ConstValue::Int(15))));
        assert_eq!(literal("1_000"), Some((BasicKind::UntypedInt, ConstValue::Int(1000))));
        assert_eq!(literal("2.5"), Some((BasicKind::UntypedFloat, ConstValue::Float(2.5))));
        assert_eq!(literal("'a'"), Some((BasicKind::UntypedRune, ConstValue::Int(97))));
        assert_eq!(
            literal("\"a\\tb\\x41\""),
            Some((BasicKind::UntypedString, ConstValue::String("a\tbA".into())))
        );
        assert_eq!(
            literal("`raw\\n`"),
            Some((BasicKind::UntypedString, ConstValue::String("raw\\n".into())))
        );
    }
}
