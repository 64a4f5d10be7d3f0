use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{BasicKind, Type};

/// A compile-time constant value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ConstValue {
    /// Numeric view of the value, if it is a number.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(n) => *n == 0,
            Self::Float(f) => *f == 0.0,
            _ => false,
        }
    }

    /// Convert the value to be representable as `target`.
    ///
    /// Returns `None` when the value does not fit (e.g. `1.5` as `int`, or
    /// `300` as `uint8`).
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn convert(&self, target: &Type) -> Option<ConstValue> {
        let Some(kind) = target.basic_kind() else {
            // Interfaces and other composite targets keep the value as is.
            return Some(self.clone());
        };
        match (kind, self) {
            (BasicKind::Bool | BasicKind::UntypedBool, Self::Bool(_))
            | (BasicKind::String | BasicKind::UntypedString, Self::String(_)) => {
                Some(self.clone())
            }
            (
                BasicKind::Int
                | BasicKind::Int64
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune,
                Self::Int(_),
            ) => Some(self.clone()),
            (BasicKind::Int32, Self::Int(n)) => i32::try_from(*n).ok().map(|_| self.clone()),
            (BasicKind::Uint8, Self::Int(n)) => u8::try_from(*n).ok().map(|_| self.clone()),
            (
                BasicKind::Int
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint8
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune,
                Self::Float(f),
            ) => {
                if f.fract() == 0.0 && f.abs() < 9.2e18 {
                    Self::Int(*f as i64).convert(target)
                } else {
                    None
                }
            }
            (BasicKind::Float64 | BasicKind::UntypedFloat, Self::Int(n)) => {
                Some(Self::Float(*n as f64))
            }
            (BasicKind::Float64 | BasicKind::UntypedFloat, Self::Float(_)) => Some(self.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Fold a unary operator over a constant operand.
pub fn fold_unary(op: &str, x: &ConstValue) -> Option<ConstValue> {
    match (op, x) {
        ("+", ConstValue::Int(_) | ConstValue::Float(_)) => Some(x.clone()),
        ("-", ConstValue::Int(n)) => n.checked_neg().map(ConstValue::Int),
        ("-", ConstValue::Float(f)) => Some(ConstValue::Float(-f)),
        ("!", ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
        ("^", ConstValue::Int(n)) => Some(ConstValue::Int(!n)),
        _ => None,
    }
}

/// Fold a binary operator over two constant operands.
///
/// Returns `None` for operand combinations that are not constant-foldable,
/// for integer overflow and for division by zero.
pub fn fold_binary(op: &str, x: &ConstValue, y: &ConstValue) -> Option<ConstValue> {
    use ConstValue::{Bool, Float, Int, String};

    match (x, y) {
        (Int(a), Int(b)) => fold_int(op, *a, *b),
        (Int(_) | Float(_), Int(_) | Float(_)) => fold_float(op, x.as_f64()?, y.as_f64()?),
        (String(a), String(b)) => match op {
            "+" => Some(String(format!("{a}{b}"))),
            _ => compare(op, a.as_str().cmp(b.as_str())),
        },
        (Bool(a), Bool(b)) => match op {
            "&&" => Some(Bool(*a && *b)),
            "||" => Some(Bool(*a || *b)),
            "==" => Some(Bool(a == b)),
            "!=" => Some(Bool(a != b)),
            _ => None,
        },
        _ => None,
    }
}

fn fold_int(op: &str, a: i64, b: i64) -> Option<ConstValue> {
    let value = match op {
        "+" => a.checked_add(b)?,
        "-" => a.checked_sub(b)?,
        "*" => a.checked_mul(b)?,
        "/" => a.checked_div(b)?,
        "%" => a.checked_rem(b)?,
        "&" => a & b,
        "|" => a | b,
        "^" => a ^ b,
        "&^" => a & !b,
        "<<" => shift_left(a, b)?,
        ">>" => a.checked_shr(u32::try_from(b).ok()?)?,
        _ => return compare(op, a.cmp(&b)),
    };
    Some(ConstValue::Int(value))
}

/// `a << b`, or `None` when bits would be shifted out of the value.
fn shift_left(a: i64, b: i64) -> Option<i64> {
    let b = u32::try_from(b).ok().filter(|&b| b < 64)?;
    let shifted = a << b;
    (shifted >> b == a).then_some(shifted)
}

fn fold_float(op: &str, a: f64, b: f64) -> Option<ConstValue> {
    let value = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" if b != 0.0 => a / b,
        _ => return compare(op, a.partial_cmp(&b)?),
    };
    Some(ConstValue::Float(value))
}

fn compare(op: &str, ord: std::cmp::Ordering) -> Option<ConstValue> {
    use std::cmp::Ordering::{Equal, Greater, Less};

    let result = match op {
        "==" => ord == Equal,
        "!=" => ord != Equal,
        "<" => ord == Less,
        "<=" => ord != Greater,
        ">" => ord == Greater,
        ">=" => ord != Less,
        _ => return None,
    };
    Some(ConstValue::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_integer_arithmetic() {
        let two = ConstValue::Int(2);
        let three = ConstValue::Int(3);
        assert_eq!(fold_binary("<<", &two, &three), Some(ConstValue::Int(16)));
        assert_eq!(fold_binary("/", &three, &two), Some(ConstValue::Int(1)));
        assert_eq!(fold_binary("&^", &three, &two), Some(ConstValue::Int(1)));
        assert_eq!(fold_binary("/", &three, &ConstValue::Int(0)), None);
        assert_eq!(
            fold_binary("*", &ConstValue::Int(i64::MAX), &two),
            None,
            "overflow is not folded"
        );
        let one = ConstValue::Int(1);
        assert_eq!(
            fold_binary("<<", &one, &ConstValue::Int(62)),
            Some(ConstValue::Int(1 << 62))
        );
        assert_eq!(fold_binary("<<", &one, &ConstValue::Int(63)), None);
        assert_eq!(fold_binary("<<", &ConstValue::Int(3), &ConstValue::Int(62)), None);
        assert_eq!(fold_binary("<<", &one, &ConstValue::Int(64)), None);
        assert_eq!(
            fold_binary("<<", &ConstValue::Int(-1), &ConstValue::Int(63)),
            Some(ConstValue::Int(i64::MIN))
        );
    }

    #[test]
    fn mixes_int_and_float() {
        let got = fold_binary("+", &ConstValue::Int(1), &ConstValue::Float(0.5));
        assert_eq!(got, Some(ConstValue::Float(1.5)));
    }

    #[test]
    fn folds_comparisons_and_strings() {
        assert_eq!(
            fold_binary(">=", &ConstValue::Int(20), &ConstValue::Int(10)),
            Some(ConstValue::Bool(true))
        );
        assert_eq!(
            fold_binary(
                "+",
                &ConstValue::String("a".into()),
                &ConstValue::String("b".into())
            ),
            Some(ConstValue::String("ab".into()))
        );
        assert_eq!(
            fold_binary("+", &ConstValue::Int(1), &ConstValue::String("b".into())),
            None
        );
    }

    #[test]
    fn unary_folding() {
        assert_eq!(fold_unary("-", &ConstValue::Int(4)), Some(ConstValue::Int(-4)));
        assert_eq!(
            fold_unary("!", &ConstValue::Bool(false)),
            Some(ConstValue::Bool(true))
        );
        assert_eq!(fold_unary("!", &ConstValue::Int(1)), None);
    }

    #[test]
    fn conversion_checks_representability() {
        let uint8 = Type::basic(BasicKind::Uint8);
        let int = Type::basic(BasicKind::Int);
        let float = Type::basic(BasicKind::Float64);
        assert_eq!(ConstValue::Int(300).convert(&uint8), None);
        assert_eq!(ConstValue::Float(2.0).convert(&int), Some(ConstValue::Int(2)));
        assert_eq!(ConstValue::Float(2.5).convert(&int), None);
        assert_eq!(ConstValue::Int(2).convert(&float), Some(ConstValue::Float(2.0)));
        assert_eq!(
            ConstValue::Int(2).convert(&Type::empty_interface()),
            Some(ConstValue::Int(2))
        );
    }

    #[test]
    fn display_uses_go_literals() {
        assert_eq!(ConstValue::String("20".into()).to_string(), "\"20\"");
        assert_eq!(ConstValue::Int(4).to_string(), "4");
        assert_eq!(ConstValue::Float(1.5).to_string(), "1.5");
    }
}
