//! Filter expression IR: leaf predicates over captures and their boolean
//! combinations.

use std::fmt;

use astguard_syntax::{ConstValue, Node, NodeKind, parse_type};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Comparison operator of a [`Predicate::ValueCompare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            _ => return None,
        })
    }

    /// Apply the operator to an ordering of `lhs` relative to `rhs`.
    pub fn holds(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq => ord == Equal,
            Self::Ne => ord != Equal,
            Self::Lt => ord == Less,
            Self::Le => ord != Greater,
            Self::Gt => ord == Greater,
            Self::Ge => ord != Less,
        }
    }
}

/// How the constant is read in a value comparison: `Value.Int()` or
/// `Value.Float()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Int,
    Float,
}

/// A type expression as written in a rule, parsed once at compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeSpec {
    text: String,
    expr: Node,
}

impl TypeSpec {
    pub fn new(text: &str) -> Result<Self, RuleError> {
        let expr = parse_type(text).map_err(|e| RuleError::TypeSpec(format!("{text}: {e}")))?;
        Ok(Self {
            text: text.to_owned(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed type expression.
    pub fn expr(&self) -> &Node {
        &self.expr
    }
}

impl PartialEq for TypeSpec {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl TryFrom<String> for TypeSpec {
    type Error = RuleError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(&text)
    }
}

impl From<TypeSpec> for String {
    fn from(spec: TypeSpec) -> Self {
        spec.text
    }
}

/// A regular expression used by [`Predicate::TextMatches`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TextRegex(Regex);

impl TextRegex {
    pub fn new(pattern: &str) -> Result<Self, RuleError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|e| RuleError::InvalidRegex(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for TextRegex {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl TryFrom<String> for TextRegex {
    type Error = RuleError;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        Self::new(&pattern)
    }
}

impl From<TextRegex> for String {
    fn from(regex: TextRegex) -> Self {
        regex.as_str().to_owned()
    }
}

/// A semantic leaf predicate over one capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "predicate", rename_all = "snake_case")]
pub enum Predicate {
    /// The capture's type is identical to `spec`.
    TypeIs { capture: String, spec: TypeSpec },
    /// The capture is a constant expression.
    IsConst { capture: String },
    /// The capture is a numeric constant and `value op literal` holds.
    ValueCompare {
        capture: String,
        kind: ValueKind,
        op: CompareOp,
        literal: ConstValue,
    },
    /// The capture's syntactic kind is `kind`.
    NodeKindIs { capture: String, kind: NodeKind },
    /// The capture's canonical text matches `regex`.
    TextMatches { capture: String, regex: TextRegex },
    /// The capture has no side effects.
    Pure { capture: String },
}

impl Predicate {
    /// `Node.Is` predicate from a kind name.
    pub fn node_kind_is(capture: impl Into<String>, kind: &str) -> Result<Self, RuleError> {
        let kind = NodeKind::from_name(kind).ok_or_else(|| RuleError::UnknownNodeKind(kind.to_owned()))?;
        Ok(Self::NodeKindIs {
            capture: capture.into(),
            kind,
        })
    }

    /// `Type.Is` predicate from a type expression.
    pub fn type_is(capture: impl Into<String>, spec: &str) -> Result<Self, RuleError> {
        Ok(Self::TypeIs {
            capture: capture.into(),
            spec: TypeSpec::new(spec)?,
        })
    }

    /// `Text.Matches` predicate from a regular expression.
    pub fn text_matches(capture: impl Into<String>, pattern: &str) -> Result<Self, RuleError> {
        Ok(Self::TextMatches {
            capture: capture.into(),
            regex: TextRegex::new(pattern)?,
        })
    }

    /// The capture this predicate inspects.
    pub fn capture(&self) -> &str {
        match self {
            Self::TypeIs { capture, .. }
            | Self::IsConst { capture }
            | Self::ValueCompare { capture, .. }
            | Self::NodeKindIs { capture, .. }
            | Self::TextMatches { capture, .. }
            | Self::Pure { capture } => capture,
        }
    }

    /// One-line description, in rule DSL form.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m[{:?}]", self.capture())?;
        match self {
            Self::TypeIs { spec, .. } => write!(f, ".Type.Is({:?})", spec.as_str()),
            Self::IsConst { .. } => f.write_str(".Const"),
            Self::ValueCompare { kind, op, literal, .. } => {
                let method = match kind {
                    ValueKind::Int => "Int",
                    ValueKind::Float => "Float",
                };
                write!(f, ".Value.{method}() {} ", op.symbol())?;
                match literal {
                    ConstValue::Float(x) => write!(f, "{x:?}"),
                    other => write!(f, "{other}"),
                }
            }
            Self::NodeKindIs { kind, .. } => write!(f, ".Node.Is({:?})", kind.name()),
            Self::TextMatches { regex, .. } => write!(f, ".Text.Matches({:?})", regex.as_str()),
            Self::Pure { .. } => f.write_str(".Pure"),
        }
    }
}

/// A boolean filter over captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Leaf(Predicate),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// One-line description; compound filters are parenthesized.
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Captures referenced anywhere in the filter, in first-reference order.
    pub fn captures(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_captures(&mut out);
        out
    }

    fn collect_captures<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Leaf(p) => {
                if !out.contains(&p.capture()) {
                    out.push(p.capture());
                }
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_captures(out);
                }
            }
            Self::Not(child) => child.collect_captures(out),
        }
    }
}

impl From<Predicate> for Filter {
    fn from(p: Predicate) -> Self {
        Self::Leaf(p)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = |f: &mut fmt::Formatter<'_>, children: &[Filter], sep: &str| {
            f.write_str("(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        };
        match self {
            Self::Leaf(p) => write!(f, "{p}"),
            Self::And(children) => joined(f, children, " && "),
            Self::Or(children) => joined(f, children, " || "),
            Self::Not(child) => write!(f, "!{child}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_const(name: &str) -> Filter {
        Predicate::IsConst {
            capture: name.into(),
        }
        .into()
    }

    #[test]
    fn predicate_descriptions() {
        let cases = [
            (Predicate::type_is("x", "string").unwrap(), r#"m["x"].Type.Is("string")"#),
            (
                Predicate::IsConst {
                    capture: "x".into(),
                },
                r#"m["x"].Const"#,
            ),
            (
                Predicate::ValueCompare {
                    capture: "x".into(),
                    kind: ValueKind::Int,
                    op: CompareOp::Ge,
                    literal: ConstValue::Int(10),
                },
                r#"m["x"].Value.Int() >= 10"#,
            ),
            (
                Predicate::ValueCompare {
                    capture: "x".into(),
                    kind: ValueKind::Float,
                    op: CompareOp::Ge,
                    literal: ConstValue::Float(10.0),
                },
                r#"m["x"].Value.Float() >= 10.0"#,
            ),
            (
                Predicate::ValueCompare {
                    capture: "x".into(),
                    kind: ValueKind::Float,
                    op: CompareOp::Lt,
                    literal: ConstValue::Float(2.5),
                },
                r#"m["x"].Value.Float() < 2.5"#,
            ),
            (
                Predicate::node_kind_is("x", "ParenExpr").unwrap(),
                r#"m["x"].Node.Is("ParenExpr")"#,
            ),
            (
                Predicate::text_matches("s", "^fmt\\.").unwrap(),
                r#"m["s"].Text.Matches("^fmt\\.")"#,
            ),
            (Predicate::Pure { capture: "x".into() }, r#"m["x"].Pure"#),
        ];
        for (predicate, want) in cases {
            assert_eq!(predicate.describe(), want);
        }
    }

    #[test]
    fn compound_descriptions_and_captures() {
        let filter = Filter::Or(vec![
            Filter::And(vec![is_const("x"), is_const("y")]),
            is_const("x").negate(),
        ]);
        assert_eq!(
            filter.describe(),
            r#"((m["x"].Const && m["y"].Const) || !m["x"].Const)"#
        );
        assert_eq!(filter.captures(), vec!["x", "y"]);
    }

    #[test]
    fn constructors_validate_arguments() {
        assert!(matches!(
            Predicate::node_kind_is("x", "Paren"),
            Err(RuleError::UnknownNodeKind(_))
        ));
        assert!(matches!(
            Predicate::type_is("x", "1 +"),
            Err(RuleError::TypeSpec(_))
        ));
        assert!(matches!(
            Predicate::text_matches("x", "("),
            Err(RuleError::InvalidRegex(_))
        ));
    }

    #[test]
    fn compare_ops() {
        use std::cmp::Ordering;
        assert!(CompareOp::Ge.holds(Ordering::Equal));
        assert!(!CompareOp::Lt.holds(Ordering::Greater));
        assert_eq!(CompareOp::from_symbol("!="), Some(CompareOp::Ne));
        assert_eq!(CompareOp::from_symbol("=>"), None);
    }

    #[test]
    fn filters_serialize_with_specs_as_strings() {
        let filter = Filter::And(vec![
            Predicate::type_is("x", "[]byte").unwrap().into(),
            Predicate::text_matches("x", "a+").unwrap().into(),
        ]);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["and"][0]["leaf"]["predicate"], "type_is");
        assert_eq!(json["and"][0]["leaf"]["spec"], "[]byte");
        assert_eq!(json["and"][1]["leaf"]["regex"], "a+");
        let back: Filter = serde_json::from_value(json).unwrap();
        assert_eq!(back, filter);
    }
}
