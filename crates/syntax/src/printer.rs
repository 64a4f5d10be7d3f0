//! Canonical single-line rendering of syntax trees.
//!
//! The output is what diagnostics show for a bound subtree: `f().(int)`,
//! `p.first`, `x, y = y, x`. Blocks render inline as `{ a; b }`.

use std::fmt::{self, Write as _};

use crate::ast::{Node, NodeKind};

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_node(&mut out, self);
        f.write_str(&out)
    }
}

/// Render a node to its canonical text.
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

/// Render a sequence of nodes joined by `sep`.
pub fn render_list(nodes: &[&Node], sep: &str) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        write_node(&mut out, node);
    }
    out
}

fn write_joined(out: &mut String, nodes: &[Node], sep: &str) {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        write_node(out, node);
    }
}

fn write_block(out: &mut String, block: &Node) {
    if block.children.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{ ");
    write_joined(out, &block.children, "; ");
    out.push_str(" }");
}

#[allow(clippy::too_many_lines)]
fn write_node(out: &mut String, node: &Node) {
    let kids = &node.children;
    match node.kind {
        NodeKind::Ident | NodeKind::BasicLit => out.push_str(node.token()),
        NodeKind::ParenExpr => {
            out.push('(');
            write_joined(out, kids, "");
            out.push(')');
        }
        NodeKind::UnaryExpr => {
            out.push_str(node.token());
            write_joined(out, kids, "");
        }
        NodeKind::StarExpr => {
            out.push('*');
            write_joined(out, kids, "");
        }
        NodeKind::BinaryExpr => {
            let _ = write!(out, "{} {} {}", Child(kids, 0), node.token(), Child(kids, 1));
        }
        NodeKind::CallExpr => {
            if let Some((fun, args)) = kids.split_first() {
                write_node(out, fun);
                out.push('(');
                write_joined(out, args, ", ");
                if node.token() == "..." {
                    out.push_str("...");
                }
                out.push(')');
            }
        }
        NodeKind::SelectorExpr => {
            let _ = write!(out, "{}.{}", Child(kids, 0), Child(kids, 1));
        }
        NodeKind::IndexExpr => {
            let _ = write!(out, "{}[{}]", Child(kids, 0), Child(kids, 1));
        }
        NodeKind::TypeAssertExpr => {
            let _ = write!(out, "{}.({})", Child(kids, 0), Child(kids, 1));
        }
        NodeKind::ArrayType => {
            out.push_str("[]");
            write_joined(out, kids, "");
        }
        NodeKind::InterfaceType => out.push_str("interface{}"),
        NodeKind::Ellipsis => {
            out.push_str("...");
            write_joined(out, kids, "");
        }
        NodeKind::FuncType => {
            out.push_str("func");
            write_signature(out, node);
        }
        NodeKind::ExprStmt => write_joined(out, kids, ""),
        NodeKind::AssignStmt => {
            let _ = write!(out, "{} {} {}", Child(kids, 0), node.token(), Child(kids, 1));
        }
        NodeKind::IncDecStmt => {
            write_joined(out, kids, "");
            out.push_str(node.token());
        }
        NodeKind::ReturnStmt => {
            out.push_str("return");
            if !kids.is_empty() {
                out.push(' ');
                write_joined(out, kids, ", ");
            }
        }
        NodeKind::IfStmt => {
            out.push_str("if ");
            if let Some(cond) = kids.first() {
                write_node(out, cond);
            }
            out.push(' ');
            if let Some(then) = kids.get(1) {
                write_block(out, then);
            }
            if let Some(els) = kids.get(2) {
                out.push_str(" else ");
                if els.kind == NodeKind::BlockStmt {
                    write_block(out, els);
                } else {
                    write_node(out, els);
                }
            }
        }
        NodeKind::BlockStmt => write_block(out, node),
        NodeKind::DeclStmt => {
            for spec in kids {
                match spec.kind {
                    NodeKind::TypeSpec => out.push_str("type "),
                    _ => out.push_str("var "),
                }
                write_node(out, spec);
            }
        }
        NodeKind::ExprList => write_joined(out, kids, ", "),
        NodeKind::ImportSpec => {
            let _ = write!(out, "import {}", node.token());
        }
        NodeKind::ValueSpec => {
            write_joined(out, &kids[..kids.len().min(1)], "");
            if let Some(ty) = kids.get(1).filter(|n| n.kind != NodeKind::Empty) {
                out.push(' ');
                write_node(out, ty);
            }
            if let Some(value) = kids.get(2).filter(|n| n.kind != NodeKind::Empty) {
                out.push_str(" = ");
                write_node(out, value);
            }
        }
        NodeKind::TypeSpec => {
            let sep = if node.token() == "=" { " = " } else { " " };
            let _ = write!(out, "{}{sep}{}", Child(kids, 0), Child(kids, 1));
        }
        NodeKind::FuncDecl => {
            let _ = write!(out, "func {}", Child(kids, 0));
            if let Some(sig) = kids.get(1) {
                write_signature(out, sig);
            }
            if let Some(body) = kids.get(2) {
                out.push(' ');
                write_block(out, body);
            }
        }
        NodeKind::FieldList => {
            out.push('(');
            write_joined(out, kids, ", ");
            out.push(')');
        }
        NodeKind::Field => {
            if let Some((ty, names)) = kids.split_last() {
                if !names.is_empty() {
                    write_joined(out, names, ", ");
                    out.push(' ');
                }
                write_node(out, ty);
            }
        }
        NodeKind::File => {
            let _ = write!(out, "package {}", node.token());
            for decl in kids {
                out.push('\n');
                write_node(out, decl);
            }
        }
        NodeKind::Empty => {}
    }
}

fn write_signature(out: &mut String, sig: &Node) {
    if let Some(params) = sig.children.first() {
        write_node(out, params);
    }
    if let Some(results) = sig.children.get(1) {
        match results.children.as_slice() {
            [] => {}
            [single] if single.children.len() == 1 => {
                out.push(' ');
                write_node(out, single);
            }
            _ => {
                out.push(' ');
                write_node(out, results);
            }
        }
    }
}

/// Displays the child at an index, or nothing when it is missing.
struct Child<'a>(&'a [Node], usize);

impl fmt::Display for Child<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get(self.1) {
            Some(node) => fmt::Display::fmt(node, f),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse_expr, parse_stmts};

    use super::*;

    fn roundtrip_expr(src: &str) -> String {
        render(&parse_expr(src).unwrap())
    }

    #[test]
    fn renders_expressions() {
        assert_eq!(roundtrip_expr("f().(int)+2"), "f().(int) + 2");
        assert_eq!(roundtrip_expr("p.first"), "p.first");
        assert_eq!(roundtrip_expr("f((10))"), "f((10))");
        assert_eq!(roundtrip_expr("g(a,b,xs...)"), "g(a, b, xs...)");
        assert_eq!(roundtrip_expr("-x[ i ]"), "-x[i]");
        assert_eq!(roundtrip_expr("*p"), "*p");
        assert_eq!(roundtrip_expr("[]byte(s)"), "[]byte(s)");
        assert_eq!(roundtrip_expr("\"a\" + `b`"), "\"a\" + `b`");
    }

    #[test]
    fn renders_statements() {
        let stmts = parse_stmts("x,y=y,x\ni++\nif ok { return 1 } else { return }").unwrap();
        let rendered: Vec<String> = stmts.iter().map(render).collect();
        assert_eq!(
            rendered,
            vec!["x, y = y, x", "i++", "if ok { return 1 } else { return }"]
        );
    }

    #[test]
    fn render_list_joins() {
        let stmts = parse_stmts("a := 1; b := 2").unwrap();
        let refs: Vec<&Node> = stmts.iter().collect();
        assert_eq!(render_list(&refs, "; "), "a := 1; b := 2");
    }
}
