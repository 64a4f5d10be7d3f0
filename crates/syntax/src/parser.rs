//! Hand-written recursive descent parser for the Go-like source language.
//!
//! The parser uses `nom` for low-level token recognition and implements
//! precedence climbing manually. A newline ends a statement unless the line
//! ends with a binary operator, a comma or an opening bracket.
//!
//! Identifiers may start with `$` or `$*` so that rule patterns such as
//! `$x + $_` or `f($*args)` parse with the same grammar.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, one_of, satisfy},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    sequence::{pair, tuple},
};
use tracing::debug;

use crate::ast::{Node, NodeKind};
use crate::error::SyntaxError;
use crate::source::{SourceFile, Span};

type PResult<'a, T> = IResult<&'a str, T>;

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Binary operators with their Go precedence, longest spelling first.
const BINARY_OPS: &[(&str, u8)] = &[
    ("||", 1),
    ("&&", 2),
    ("==", 3),
    ("!=", 3),
    ("<=", 3),
    (">=", 3),
    ("<<", 5),
    (">>", 5),
    ("&^", 5),
    ("<", 3),
    (">", 3),
    ("+", 4),
    ("-", 4),
    ("|", 4),
    ("^", 4),
    ("*", 5),
    ("/", 5),
    ("%", 5),
    ("&", 5),
];

const ASSIGN_OPS: &[&str] = &[
    "<<=", ">>=", "&^=", ":=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "=",
];

/// Parse a whole source file.
///
/// A missing `package` clause is accepted and treated as `package main`.
pub fn parse_file(file: &SourceFile) -> Result<Node, SyntaxError> {
    let mut root = run(file, |p, input| p.file(input))?;
    let mut next = 0;
    root.renumber(&mut next);
    debug!(file = file.name(), nodes = next, "parsed source file");
    Ok(root)
}

/// Parse a single expression.
pub fn parse_expr(src: &str) -> Result<Node, SyntaxError> {
    let file = SourceFile::new("<expr>", src);
    let mut node = run(&file, |p, input| p.expr(input))?;
    node.renumber(&mut 0);
    Ok(node)
}

/// Parse a list of statements separated by newlines or semicolons.
pub fn parse_stmts(src: &str) -> Result<Vec<Node>, SyntaxError> {
    let file = SourceFile::new("<stmts>", src);
    let mut stmts = run(&file, |p, input| p.stmt_list(input))?;
    let mut next = 0;
    for stmt in &mut stmts {
        stmt.renumber(&mut next);
    }
    Ok(stmts)
}

/// Parse a type expression such as `[]byte` or `*pkg.T`.
pub fn parse_type(src: &str) -> Result<Node, SyntaxError> {
    let file = SourceFile::new("<type>", src);
    let mut node = run(&file, |p, input| p.ty(input))?;
    node.renumber(&mut 0);
    Ok(node)
}

fn run<'a, T>(
    file: &'a SourceFile,
    f: impl FnOnce(&Parser<'a>, &'a str) -> PResult<'a, T>,
) -> Result<T, SyntaxError> {
    let parser = Parser { src: file.text() };
    let input = match skip_separators(file.text()) {
        Ok((input, ())) => input,
        Err(e) => return Err(parser.error(file, e)),
    };
    match f(&parser, input) {
        Ok((rest, value)) => {
            let rest = skip_separators(rest).map_or(rest, |(r, ())| r);
            if rest.is_empty() {
                Ok(value)
            } else {
                Err(parser.unexpected(file, rest))
            }
        }
        Err(e) => Err(parser.error(file, e)),
    }
}

fn fail<T>(input: &str) -> PResult<'_, T> {
    Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)))
}

// ---------------------------------------------------------------------------
// Whitespace and tokens
// ---------------------------------------------------------------------------

/// Skip spaces, tabs and comments on the current line.
fn sp(input: &str) -> PResult<'_, ()> {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start_matches([' ', '\t', '\r']);
        if let Some(after) = trimmed.strip_prefix("//") {
            let end = after.find('\n').unwrap_or(after.len());
            rest = &after[end..];
        } else if let Some(after) = trimmed.strip_prefix("/*") {
            let Some(end) = after.find("*/") else {
                return fail(trimmed);
            };
            rest = &after[end + 2..];
        } else {
            return Ok((trimmed, ()));
        }
    }
}

/// Skip whitespace and comments, newlines included.
fn ws(input: &str) -> PResult<'_, ()> {
    let mut rest = input;
    loop {
        let (after, ()) = sp(rest)?;
        match after.strip_prefix('\n') {
            Some(next) => rest = next,
            None => return Ok((after, ())),
        }
    }
}

/// Skip whitespace, comments and statement separators.
fn skip_separators(input: &str) -> PResult<'_, ()> {
    let mut rest = input;
    loop {
        let (after, ()) = ws(rest)?;
        match after.strip_prefix(';') {
            Some(next) => rest = next,
            None => return Ok((after, ())),
        }
    }
}

fn at_stmt_end(input: &str) -> bool {
    input.is_empty() || input.starts_with([';', '\n', '}'])
}

/// Match a keyword that is not the prefix of a longer identifier.
fn keyword<'a>(input: &'a str, word: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(word)?;
    if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        None
    } else {
        Some(rest)
    }
}

/// An identifier, optionally prefixed with `$` or `$*`.
fn ident_str(input: &str) -> PResult<'_, &str> {
    recognize(tuple((
        opt(alt((tag("$*"), tag("$")))),
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    )))(input)
}

/// An identifier that is not a keyword.
fn name(input: &str) -> PResult<'_, &str> {
    let (rest, word) = ident_str(input)?;
    if KEYWORDS.contains(&word) {
        return fail(input);
    }
    Ok((rest, word))
}

fn number(input: &str) -> PResult<'_, &str> {
    let prefixed = recognize(pair(
        alt((tag_no_case("0x"), tag_no_case("0b"), tag_no_case("0o"))),
        take_while1(|c: char| c.is_ascii_hexdigit() || c == '_'),
    ))(input);
    if prefixed.is_ok() {
        return prefixed;
    }
    recognize(tuple((
        satisfy(|c| c.is_ascii_digit()),
        take_while(|c: char| c.is_ascii_digit() || c == '_'),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt(tuple((
            one_of("eE"),
            opt(one_of("+-")),
            take_while1(|c: char| c.is_ascii_digit()),
        ))),
    )))(input)
}

/// A quoted literal delimited by `quote`, returned with its quotes.
fn quoted(input: &str, quote: char) -> PResult<'_, &str> {
    let (body, _) = char(quote)(input)?;
    if quote == '`' {
        return match body.find('`') {
            Some(end) => Ok((&body[end + 1..], &input[..end + 2])),
            None => fail(input),
        };
    }
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\n' => break,
            c if c == quote => {
                let end = i + 2;
                return Ok((&input[end..], &input[..end]));
            }
            _ => {}
        }
    }
    fail(input)
}

fn binary_op(input: &str) -> Option<(&'static str, u8)> {
    let (op, prec) = BINARY_OPS
        .iter()
        .copied()
        .find(|(op, _)| input.starts_with(op))?;
    let rest = &input[op.len()..];
    // `+=`, `<<=` and friends are assignments; `++` and `--` are statements.
    if prec != 3 && rest.starts_with('=') {
        return None;
    }
    if matches!(op, "+" | "-") && rest.starts_with(op) {
        return None;
    }
    Some((op, prec))
}

fn assign_op(input: &str) -> Option<&'static str> {
    let op = ASSIGN_OPS.iter().copied().find(|op| input.starts_with(op))?;
    if op == "=" && input.starts_with("==") {
        return None;
    }
    Some(op)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
}

impl<'a> Parser<'a> {
    #[allow(clippy::cast_possible_truncation)]
    fn pos(&self, rest: &str) -> u32 {
        (self.src.len() - rest.len()) as u32
    }

    fn node(&self, kind: NodeKind, start: &str, end: &str) -> Node {
        Node::new(kind, Span::new(self.pos(start), self.pos(end)))
    }

    fn empty(&self, at: &str) -> Node {
        self.node(NodeKind::Empty, at, at)
    }

    fn list(&self, kind: NodeKind, items: Vec<Node>, at: &str) -> Node {
        let span = match (items.first(), items.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => Span::new(self.pos(at), self.pos(at)),
        };
        Node::new(kind, span).with_children(items)
    }

    fn error(&self, file: &SourceFile, err: nom::Err<Error<&str>>) -> SyntaxError {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => self.unexpected(file, e.input),
            nom::Err::Incomplete(_) => self.unexpected(file, ""),
        }
    }

    fn unexpected(&self, file: &SourceFile, rest: &str) -> SyntaxError {
        let rest = rest.trim_start();
        let offset = self.pos(rest);
        let message = if rest.is_empty() {
            "unexpected end of input".to_owned()
        } else {
            let near: String = rest
                .split(char::is_whitespace)
                .next()
                .unwrap_or_default()
                .chars()
                .take(16)
                .collect();
            format!("unexpected {near:?}")
        };
        SyntaxError::Parse {
            location: file.location(Span::new(offset, offset)),
            message,
        }
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn expr(&self, input: &'a str) -> PResult<'a, Node> {
        self.binary(input, 1)
    }

    fn binary(&self, input: &'a str, min_prec: u8) -> PResult<'a, Node> {
        let start = input;
        let (mut input, mut left) = self.unary(input)?;
        loop {
            let (next, ()) = sp(input)?;
            let Some((op, prec)) = binary_op(next) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            let (rest, ()) = ws(&next[op.len()..])?;
            let (rest, right) = self.binary(rest, prec + 1)?;
            left = self
                .node(NodeKind::BinaryExpr, start, rest)
                .with_token(op)
                .with_children(vec![left, right]);
            input = rest;
        }
        Ok((input, left))
    }

    fn unary(&self, input: &'a str) -> PResult<'a, Node> {
        let Some(after) = input.strip_prefix(['+', '-', '!', '^', '&', '*']) else {
            return self.postfix(input);
        };
        let op = &input[..1];
        let (rest, ()) = sp(after)?;
        let (rest, operand) = self.unary(rest)?;
        let node = if op == "*" {
            self.node(NodeKind::StarExpr, input, rest)
        } else {
            self.node(NodeKind::UnaryExpr, input, rest).with_token(op)
        };
        Ok((rest, node.with_children(vec![operand])))
    }

    fn postfix(&self, input: &'a str) -> PResult<'a, Node> {
        let start = input;
        let (mut input, mut node) = self.operand(input)?;
        loop {
            let (next, ()) = sp(input)?;
            if let Some(after) = next.strip_prefix('.') {
                let (after, ()) = ws(after)?;
                if let Some(inner) = after.strip_prefix('(') {
                    let (inner, ()) = ws(inner)?;
                    let (inner, ty) = self.ty(inner)?;
                    let (inner, ()) = ws(inner)?;
                    let (rest, _) = char(')')(inner)?;
                    node = self
                        .node(NodeKind::TypeAssertExpr, start, rest)
                        .with_children(vec![node, ty]);
                    input = rest;
                    continue;
                }
                let (rest, sel) = name(after)?;
                let sel = self.node(NodeKind::Ident, after, rest).with_token(sel);
                node = self
                    .node(NodeKind::SelectorExpr, start, rest)
                    .with_children(vec![node, sel]);
                input = rest;
                continue;
            }
            if let Some(after) = next.strip_prefix('[') {
                let (after, ()) = ws(after)?;
                let (after, index) = self.expr(after)?;
                let (after, ()) = ws(after)?;
                let (rest, _) = char(']')(after)?;
                node = self
                    .node(NodeKind::IndexExpr, start, rest)
                    .with_children(vec![node, index]);
                input = rest;
                continue;
            }
            if let Some(after) = next.strip_prefix('(') {
                let (rest, (args, spread)) = self.call_args(after)?;
                let mut children = Vec::with_capacity(args.len() + 1);
                children.push(node);
                children.extend(args);
                node = self
                    .node(NodeKind::CallExpr, start, rest)
                    .with_children(children);
                if spread {
                    node = node.with_token("...");
                }
                input = rest;
                continue;
            }
            break;
        }
        Ok((input, node))
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn call_args(&self, input: &'a str) -> PResult<'a, (Vec<Node>, bool)> {
        let mut args = Vec::new();
        let mut spread = false;
        let (mut input, ()) = ws(input)?;
        while !input.starts_with(')') {
            let (rest, arg) = self.expr(input)?;
            args.push(arg);
            let (mut rest, ()) = ws(rest)?;
            if let Some(after) = rest.strip_prefix("...") {
                spread = true;
                rest = ws(after)?.0;
            }
            match rest.strip_prefix(',') {
                Some(after) if !spread => input = ws(after)?.0,
                _ => {
                    input = rest;
                    break;
                }
            }
        }
        let (rest, _) = char(')')(input)?;
        Ok((rest, (args, spread)))
    }

    fn operand(&self, input: &'a str) -> PResult<'a, Node> {
        let Some(first) = input.chars().next() else {
            return fail(input);
        };
        match first {
            '(' => {
                let (rest, ()) = ws(&input[1..])?;
                let (rest, inner) = self.expr(rest)?;
                let (rest, ()) = ws(rest)?;
                let (rest, _) = char(')')(rest)?;
                let node = self
                    .node(NodeKind::ParenExpr, input, rest)
                    .with_children(vec![inner]);
                Ok((rest, node))
            }
            '[' => self.ty(input),
            '"' | '`' | '\'' => {
                let (rest, text) = quoted(input, first)?;
                let node = self.node(NodeKind::BasicLit, input, rest).with_token(text);
                Ok((rest, node))
            }
            c if c.is_ascii_digit() => {
                let (rest, text) = number(input)?;
                let node = self.node(NodeKind::BasicLit, input, rest).with_token(text);
                Ok((rest, node))
            }
            _ if keyword(input, "interface").is_some() || keyword(input, "func").is_some() => {
                self.ty(input)
            }
            _ => {
                let (rest, word) = name(input)?;
                let node = self.node(NodeKind::Ident, input, rest).with_token(word);
                Ok((rest, node))
            }
        }
    }

    fn expr_list(&self, input: &'a str) -> PResult<'a, Vec<Node>> {
        let (mut rest, first) = self.expr(input)?;
        let mut items = vec![first];
        loop {
            let (after, ()) = sp(rest)?;
            let Some(after) = after.strip_prefix(',') else {
                break;
            };
            let (after, ()) = ws(after)?;
            let (after, item) = self.expr(after)?;
            items.push(item);
            rest = after;
        }
        Ok((rest, items))
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    fn ty(&self, input: &'a str) -> PResult<'a, Node> {
        let wrap = |kind: NodeKind, after: &'a str| -> PResult<'a, Node> {
            let (after, ()) = sp(after)?;
            let (rest, elem) = self.ty(after)?;
            Ok((rest, self.node(kind, input, rest).with_children(vec![elem])))
        };
        if let Some(after) = input.strip_prefix('*') {
            return wrap(NodeKind::StarExpr, after);
        }
        if let Some(after) = input.strip_prefix('[') {
            let (after, ()) = sp(after)?;
            let (after, _) = char(']')(after)?;
            return wrap(NodeKind::ArrayType, after);
        }
        if let Some(after) = input.strip_prefix("...") {
            return wrap(NodeKind::Ellipsis, after);
        }
        if let Some(after) = input.strip_prefix('(') {
            let (after, ()) = ws(after)?;
            let (after, inner) = self.ty(after)?;
            let (after, ()) = ws(after)?;
            let (rest, _) = char(')')(after)?;
            let node = self
                .node(NodeKind::ParenExpr, input, rest)
                .with_children(vec![inner]);
            return Ok((rest, node));
        }
        if let Some(after) = keyword(input, "interface") {
            let (after, ()) = sp(after)?;
            let (after, _) = char('{')(after)?;
            let (after, ()) = ws(after)?;
            let (rest, _) = char('}')(after)?;
            return Ok((rest, self.node(NodeKind::InterfaceType, input, rest)));
        }
        if let Some(after) = keyword(input, "func") {
            let (after, ()) = sp(after)?;
            let (rest, (params, results)) = self.signature(after)?;
            let node = self
                .node(NodeKind::FuncType, input, rest)
                .with_children(vec![params, results]);
            return Ok((rest, node));
        }
        let (rest, word) = name(input)?;
        let ident = self.node(NodeKind::Ident, input, rest).with_token(word);
        if let Some(after) = rest.strip_prefix('.') {
            if let Ok((end, sel)) = name(after) {
                let sel = self.node(NodeKind::Ident, after, end).with_token(sel);
                let node = self
                    .node(NodeKind::SelectorExpr, input, end)
                    .with_children(vec![ident, sel]);
                return Ok((end, node));
            }
        }
        Ok((rest, ident))
    }

    /// `(params) results`, returned as two field lists.
    fn signature(&self, input: &'a str) -> PResult<'a, (Node, Node)> {
        let (rest, params) = self.field_list(input)?;
        let (after, ()) = sp(rest)?;
        if after.starts_with('(') {
            let (rest, results) = self.field_list(after)?;
            return Ok((rest, (params, results)));
        }
        if let Ok((end, ty)) = self.ty(after) {
            let field = Node::new(NodeKind::Field, ty.span).with_children(vec![ty]);
            let results = self.list(NodeKind::FieldList, vec![field], after);
            return Ok((end, (params, results)));
        }
        Ok((rest, (params, self.list(NodeKind::FieldList, Vec::new(), rest))))
    }

    /// A parenthesized parameter or result list.
    ///
    /// Names are grouped Go-style: in `(x, y int, z string)` both `x` and
    /// `y` belong to the first field.
    fn field_list(&self, input: &'a str) -> PResult<'a, Node> {
        let (mut rest, _) = char('(')(input)?;
        rest = ws(rest)?.0;
        let mut entries: Vec<(Option<Node>, Node)> = Vec::new();
        while !rest.starts_with(')') {
            let named = name(rest).ok().and_then(|(after_name, word)| {
                // `pkg.T` is a qualified type, not a name.
                if after_name.starts_with('.') && !after_name.starts_with("...") {
                    return None;
                }
                let (after_sp, ()) = sp(after_name).ok()?;
                if after_sp.starts_with([',', ')']) {
                    return None;
                }
                let ident = self.node(NodeKind::Ident, rest, after_name).with_token(word);
                Some((after_sp, ident))
            });
            let (after, entry) = match named {
                Some((after_sp, ident)) => {
                    let (after, ty) = self.ty(after_sp)?;
                    (after, (Some(ident), ty))
                }
                None => {
                    let (after, ty) = self.ty(rest)?;
                    (after, (None, ty))
                }
            };
            entries.push(entry);
            let (after, ()) = ws(after)?;
            match after.strip_prefix(',') {
                Some(next) => rest = ws(next)?.0,
                None => {
                    rest = after;
                    break;
                }
            }
        }
        let (end, _) = char(')')(rest)?;

        let mut fields = Vec::new();
        if entries.iter().any(|(n, _)| n.is_some()) {
            let mut pending: Vec<Node> = Vec::new();
            for (name, ty) in entries {
                match name {
                    Some(name) => {
                        pending.push(name);
                        let span = pending[0].span.to(ty.span);
                        let mut children = std::mem::take(&mut pending);
                        children.push(ty);
                        fields.push(Node::new(NodeKind::Field, span).with_children(children));
                    }
                    None if ty.kind == NodeKind::Ident => pending.push(ty),
                    None => return fail(input),
                }
            }
            if !pending.is_empty() {
                // Named and unnamed parameters cannot be mixed.
                return fail(input);
            }
        } else {
            fields = entries
                .into_iter()
                .map(|(_, ty)| Node::new(NodeKind::Field, ty.span).with_children(vec![ty]))
                .collect();
        }
        let node = self
            .node(NodeKind::FieldList, input, end)
            .with_children(fields);
        Ok((end, node))
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn stmt_list(&self, input: &'a str) -> PResult<'a, Vec<Node>> {
        let mut stmts = Vec::new();
        let (mut input, ()) = skip_separators(input)?;
        while !input.is_empty() && !input.starts_with('}') {
            let (rest, stmt) = self.stmt(input)?;
            stmts.push(stmt);
            let (rest, ()) = sp(rest)?;
            if !at_stmt_end(rest) {
                return fail(rest);
            }
            input = skip_separators(rest)?.0;
        }
        Ok((input, stmts))
    }

    fn stmt(&self, input: &'a str) -> PResult<'a, Node> {
        if let Some(rest) = keyword(input, "return") {
            return self.return_stmt(input, rest);
        }
        if let Some(rest) = keyword(input, "if") {
            return self.if_stmt(input, rest);
        }
        if let Some(rest) = keyword(input, "var") {
            let (rest, ()) = sp(rest)?;
            let (rest, spec) = self.value_spec(rest)?;
            let node = self
                .node(NodeKind::DeclStmt, input, rest)
                .with_children(vec![spec]);
            return Ok((rest, node));
        }
        if let Some(rest) = keyword(input, "type") {
            let (rest, ()) = sp(rest)?;
            let (rest, spec) = self.type_spec(rest)?;
            let node = self
                .node(NodeKind::DeclStmt, input, rest)
                .with_children(vec![spec]);
            return Ok((rest, node));
        }
        if input.starts_with('{') {
            return self.block(input);
        }
        self.simple_stmt(input)
    }

    fn return_stmt(&self, start: &'a str, rest: &'a str) -> PResult<'a, Node> {
        let (after, ()) = sp(rest)?;
        if at_stmt_end(after) {
            return Ok((rest, self.node(NodeKind::ReturnStmt, start, rest)));
        }
        let (rest, results) = self.expr_list(after)?;
        let node = self
            .node(NodeKind::ReturnStmt, start, rest)
            .with_children(results);
        Ok((rest, node))
    }

    fn if_stmt(&self, start: &'a str, rest: &'a str) -> PResult<'a, Node> {
        let (rest, ()) = sp(rest)?;
        let (rest, cond) = self.expr(rest)?;
        let (rest, ()) = sp(rest)?;
        let (mut rest, then) = self.block(rest)?;
        let mut children = vec![cond, then];
        let (after, ()) = sp(rest)?;
        if let Some(after_else) = keyword(after, "else") {
            let (after_else, ()) = sp(after_else)?;
            let (end, els) = match keyword(after_else, "if") {
                Some(after_if) => self.if_stmt(after_else, after_if)?,
                None => self.block(after_else)?,
            };
            children.push(els);
            rest = end;
        }
        let node = self
            .node(NodeKind::IfStmt, start, rest)
            .with_children(children);
        Ok((rest, node))
    }

    fn block(&self, input: &'a str) -> PResult<'a, Node> {
        let (rest, _) = char('{')(input)?;
        let (rest, stmts) = self.stmt_list(rest)?;
        let (rest, _) = char('}')(rest)?;
        let node = self
            .node(NodeKind::BlockStmt, input, rest)
            .with_children(stmts);
        Ok((rest, node))
    }

    fn simple_stmt(&self, input: &'a str) -> PResult<'a, Node> {
        let (rest, mut lhs) = self.expr_list(input)?;
        let (after, ()) = sp(rest)?;
        if let Some(op) = assign_op(after) {
            let (rhs_start, ()) = ws(&after[op.len()..])?;
            let (rest, rhs) = self.expr_list(rhs_start)?;
            let lhs = self.list(NodeKind::ExprList, lhs, input);
            let rhs = self.list(NodeKind::ExprList, rhs, rhs_start);
            let node = self
                .node(NodeKind::AssignStmt, input, rest)
                .with_token(op)
                .with_children(vec![lhs, rhs]);
            return Ok((rest, node));
        }
        if lhs.len() != 1 {
            return fail(after);
        }
        for op in ["++", "--"] {
            if let Some(rest) = after.strip_prefix(op) {
                let node = self
                    .node(NodeKind::IncDecStmt, input, rest)
                    .with_token(op)
                    .with_children(lhs);
                return Ok((rest, node));
            }
        }
        let expr = lhs.remove(0);
        let node = Node::new(NodeKind::ExprStmt, expr.span).with_children(vec![expr]);
        Ok((rest, node))
    }

    fn value_spec(&self, input: &'a str) -> PResult<'a, Node> {
        let (rest, word) = name(input)?;
        let ident = self.node(NodeKind::Ident, input, rest).with_token(word);
        let (mut rest, ()) = sp(rest)?;
        let ty = if rest.starts_with('=') || at_stmt_end(rest) {
            self.empty(rest)
        } else {
            let (after, ty) = self.ty(rest)?;
            rest = sp(after)?.0;
            ty
        };
        let value = match assign_op(rest) {
            Some("=") => {
                let (after, ()) = ws(&rest[1..])?;
                let (after, value) = self.expr(after)?;
                rest = after;
                value
            }
            _ => self.empty(rest),
        };
        if ty.kind == NodeKind::Empty && value.kind == NodeKind::Empty {
            return fail(rest);
        }
        let node = self
            .node(NodeKind::ValueSpec, input, rest)
            .with_children(vec![ident, ty, value]);
        Ok((rest, node))
    }

    fn type_spec(&self, input: &'a str) -> PResult<'a, Node> {
        let (rest, word) = name(input)?;
        let ident = self.node(NodeKind::Ident, input, rest).with_token(word);
        let (rest, ()) = sp(rest)?;
        let (rest, alias) = match assign_op(rest) {
            Some("=") => (sp(&rest[1..])?.0, true),
            _ => (rest, false),
        };
        let (rest, ty) = self.ty(rest)?;
        let mut node = self
            .node(NodeKind::TypeSpec, input, rest)
            .with_children(vec![ident, ty]);
        if alias {
            node = node.with_token("=");
        }
        Ok((rest, node))
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    fn file(&self, input: &'a str) -> PResult<'a, Node> {
        let mut package = "main";
        let mut rest = input;
        if let Some(after) = keyword(rest, "package") {
            let (after, ()) = sp(after)?;
            let (after, word) = name(after)?;
            package = word;
            rest = after;
        }
        let mut decls = Vec::new();
        loop {
            rest = skip_separators(rest)?.0;
            if rest.is_empty() {
                break;
            }
            if let Some(after) = keyword(rest, "import") {
                let (after, ()) = sp(after)?;
                rest = self.imports(after, &mut decls)?.0;
            } else if let Some(after) = keyword(rest, "func") {
                let (after, decl) = self.func_decl(rest, after)?;
                decls.push(decl);
                rest = after;
            } else if keyword(rest, "var").is_some() || keyword(rest, "type").is_some() {
                let (after, decl) = self.stmt(rest)?;
                decls.push(decl);
                rest = after;
            } else {
                return fail(rest);
            }
        }
        let node = self
            .node(NodeKind::File, input, rest)
            .with_token(package)
            .with_children(decls);
        Ok((rest, node))
    }

    fn imports(&self, input: &'a str, decls: &mut Vec<Node>) -> PResult<'a, ()> {
        let import = |input: &'a str| -> PResult<'a, Node> {
            let quote = if input.starts_with('`') { '`' } else { '"' };
            let (rest, path) = quoted(input, quote)?;
            Ok((rest, self.node(NodeKind::ImportSpec, input, rest).with_token(path)))
        };
        let Some(mut rest) = input.strip_prefix('(') else {
            let (rest, spec) = import(input)?;
            decls.push(spec);
            return Ok((rest, ()));
        };
        loop {
            rest = skip_separators(rest)?.0;
            if let Some(after) = rest.strip_prefix(')') {
                return Ok((after, ()));
            }
            let (after, spec) = import(rest)?;
            decls.push(spec);
            rest = after;
        }
    }

    fn func_decl(&self, start: &'a str, after_kw: &'a str) -> PResult<'a, Node> {
        let (rest, ()) = sp(after_kw)?;
        let name_start = rest;
        let (rest, word) = name(rest)?;
        let ident = self.node(NodeKind::Ident, name_start, rest).with_token(word);
        let (rest, ()) = sp(rest)?;
        let (rest, (params, results)) = self.signature(rest)?;
        let sig = self
            .node(NodeKind::FuncType, start, rest)
            .with_children(vec![params, results]);
        let (after, ()) = sp(rest)?;
        let (rest, body) = self.block(after)?;
        let node = self
            .node(NodeKind::FuncDecl, start, rest)
            .with_children(vec![ident, sig, body]);
        Ok((rest, node))
    }
}
