use std::fmt;

use serde::{Deserialize, Serialize};

/// Predeclared basic types, including the untyped constant kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicKind {
    Bool,
    Int,
    Int32,
    Int64,
    Uint8,
    Float64,
    String,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    /// The Go spelling of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::UntypedBool => "untyped bool",
            Self::UntypedInt => "untyped int",
            Self::UntypedRune => "untyped rune",
            Self::UntypedFloat => "untyped float",
            Self::UntypedString => "untyped string",
            Self::UntypedNil => "untyped nil",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::UntypedInt => 1,
            Self::UntypedRune => 2,
            Self::UntypedFloat => 3,
            _ => 0,
        }
    }
}

/// A function signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Type>,
    /// When set, the last parameter is `...T` and its type is `[]T`.
    pub variadic: bool,
    pub results: Vec<Type>,
}

/// A semantic type.
///
/// Two types are identical iff they compare equal: named types carry their
/// name, so distinct declarations never collide, and aliases are resolved to
/// their target when declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Basic(BasicKind),
    Named {
        name: String,
        underlying: Box<Type>,
    },
    Pointer(Box<Type>),
    Slice(Box<Type>),
    /// An interface with the given method names; empty is `interface{}`.
    Interface(Vec<String>),
    Func(Signature),
    /// Result list of a multi-value call.
    Tuple(Vec<Type>),
}

impl Type {
    pub fn basic(kind: BasicKind) -> Self {
        Self::Basic(kind)
    }

    /// `interface{}`
    pub fn empty_interface() -> Self {
        Self::Interface(Vec::new())
    }

    /// The predeclared `error` type.
    pub fn error() -> Self {
        Self::Named {
            name: "error".to_owned(),
            underlying: Box::new(Self::Interface(vec!["Error".to_owned()])),
        }
    }

    /// Type identity.
    pub fn identical(&self, other: &Type) -> bool {
        self == other
    }

    /// The underlying type: the type itself unless it is named.
    pub fn underlying(&self) -> &Type {
        match self {
            Self::Named { underlying, .. } => underlying.underlying(),
            other => other,
        }
    }

    /// The basic kind of the underlying type, if it is basic.
    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self.underlying() {
            Self::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        matches!(
            self,
            Self::Basic(
                BasicKind::UntypedBool
                    | BasicKind::UntypedInt
                    | BasicKind::UntypedRune
                    | BasicKind::UntypedFloat
                    | BasicKind::UntypedString
                    | BasicKind::UntypedNil
            )
        )
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.underlying(), Self::Interface(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.basic_kind(),
            Some(
                BasicKind::Int
                    | BasicKind::Int32
                    | BasicKind::Int64
                    | BasicKind::Uint8
                    | BasicKind::UntypedInt
                    | BasicKind::UntypedRune
            )
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self.basic_kind(),
            Some(BasicKind::Float64 | BasicKind::UntypedFloat)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self.basic_kind(),
            Some(BasicKind::String | BasicKind::UntypedString)
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(
            self.basic_kind(),
            Some(BasicKind::Bool | BasicKind::UntypedBool)
        )
    }

    /// The type an untyped value takes when nothing else determines it.
    #[must_use]
    pub fn default_type(&self) -> Type {
        match self {
            Self::Basic(BasicKind::UntypedBool) => Self::Basic(BasicKind::Bool),
            Self::Basic(BasicKind::UntypedInt) => Self::Basic(BasicKind::Int),
            Self::Basic(BasicKind::UntypedRune) => Self::Basic(BasicKind::Int32),
            Self::Basic(BasicKind::UntypedFloat) => Self::Basic(BasicKind::Float64),
            Self::Basic(BasicKind::UntypedString) => Self::Basic(BasicKind::String),
            other => other.clone(),
        }
    }

    /// The untyped kind that results from combining two untyped numeric
    /// operands (`1 + 2.0` is an untyped float).
    #[must_use]
    pub fn larger_untyped(&self, other: &Type) -> Type {
        match (self, other) {
            (Self::Basic(a), Self::Basic(b)) if b.rank() > a.rank() => other.clone(),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(kind) => f.write_str(kind.name()),
            Self::Named { name, .. } => f.write_str(name),
            Self::Pointer(elem) => write!(f, "*{elem}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Interface(methods) if methods.is_empty() => f.write_str("interface{}"),
            Self::Interface(methods) => {
                let inner = methods
                    .iter()
                    .map(|m| format!("{m}()"))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "interface{{{inner}}}")
            }
            Self::Func(sig) => {
                f.write_str("func(")?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match param {
                        Self::Slice(elem) if sig.variadic && i + 1 == sig.params.len() => {
                            write!(f, "...{elem}")?;
                        }
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str(")")?;
                match sig.results.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, " {single}"),
                    many => write!(f, " {}", Self::Tuple(many.to_vec())),
                }
            }
            Self::Tuple(items) => {
                let inner = items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({inner})")
            }
        }
    }
}
