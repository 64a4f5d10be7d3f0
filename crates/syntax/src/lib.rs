//! Go-like source front-end for astguard.
//!
//! Source text is parsed into a [`Node`] tree, type-checked into a
//! [`TypeInfo`] table and rendered back to canonical text by the printer.

pub mod ast;
pub mod check;
pub mod constant;
pub mod error;
pub mod parser;
pub mod printer;
pub mod source;
pub mod types;

pub use ast::{Node, NodeId, NodeKind};
pub use check::{CheckedFile, TypeAndValue, TypeInfo, check};
pub use constant::ConstValue;
pub use error::SyntaxError;
pub use parser::{parse_expr, parse_file, parse_stmts, parse_type};
pub use printer::{render, render_list};
pub use source::{Location, SourceFile, Span};
pub use types::{BasicKind, Signature, Type};
