//! Parser for the filter language of `where:` clauses.
//!
//! ```text
//! m["x"].Const && !m["y"].Type.Is("string") || m["x"].Value.Int() >= 10
//! ```
//!
//! `!` binds tighter than `&&`, which binds tighter than `||`. The parser
//! uses `nom` for token recognition and produces an untyped tree first, so
//! that type specs, node kinds and regular expressions can be validated with
//! proper errors once the syntax is known to be sound.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{map, map_opt, not, opt, peek, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use astguard_rules::{CompareOp, Filter, Predicate, RuleError, ValueKind};
use astguard_syntax::ConstValue;

/// Parse a complete filter expression.
pub fn parse_filter(input: &str) -> Result<Filter, RuleError> {
    let source = input.trim();
    if source.is_empty() {
        return Err(RuleError::Parse("empty filter".to_owned()));
    }
    let (rest, ast) = parse_or(source).map_err(|e| {
        let at = match &e {
            nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
            nom::Err::Incomplete(_) => "",
        };
        RuleError::Parse(format!("invalid filter {source:?} near {:?}", snippet(at)))
    })?;
    let rest = rest.trim();
    if !rest.is_empty() {
        return Err(RuleError::Parse(format!(
            "unexpected trailing input in filter: {:?}",
            snippet(rest)
        )));
    }
    lower(ast)
}

fn snippet(input: &str) -> &str {
    input.char_indices().nth(20).map_or(input, |(i, _)| &input[..i])
}

#[derive(Debug, Clone, PartialEq)]
enum Ast {
    Leaf { capture: String, method: Method },
    And(Vec<Ast>),
    Or(Vec<Ast>),
    Not(Box<Ast>),
}

#[derive(Debug, Clone, PartialEq)]
enum Method {
    TypeIs(String),
    Const,
    Pure,
    Value(ValueKind, CompareOp, String),
    NodeIs(String),
    TextMatches(String),
}

fn lower(ast: Ast) -> Result<Filter, RuleError> {
    Ok(match ast {
        Ast::Leaf { capture, method } => Filter::Leaf(lower_leaf(capture, method)?),
        Ast::And(children) => Filter::And(children.into_iter().map(lower).collect::<Result<_, _>>()?),
        Ast::Or(children) => Filter::Or(children.into_iter().map(lower).collect::<Result<_, _>>()?),
        Ast::Not(child) => lower(*child)?.negate(),
    })
}

fn lower_leaf(capture: String, method: Method) -> Result<Predicate, RuleError> {
    match method {
        Method::TypeIs(spec) => Predicate::type_is(capture, &spec),
        Method::Const => Ok(Predicate::IsConst { capture }),
        Method::Pure => Ok(Predicate::Pure { capture }),
        Method::Value(kind, op, literal) => Ok(Predicate::ValueCompare {
            capture,
            kind,
            op,
            literal: number(&literal)?,
        }),
        Method::NodeIs(kind) => Predicate::node_kind_is(capture, &kind),
        Method::TextMatches(re) => Predicate::text_matches(capture, &re),
    }
}

fn number(text: &str) -> Result<ConstValue, RuleError> {
    let invalid = |e: &dyn std::fmt::Display| RuleError::Parse(format!("invalid number {text:?}: {e}"));
    if text.contains(['.', 'e', 'E']) {
        text.parse().map(ConstValue::Float).map_err(|e| invalid(&e))
    } else {
        text.parse().map(ConstValue::Int).map_err(|e| invalid(&e))
    }
}

// ---------------------------------------------------------------------------
// Boolean structure
// ---------------------------------------------------------------------------

/// Consume optional whitespace around a parser.
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn fold(first: Ast, rest: Vec<Ast>, make: fn(Vec<Ast>) -> Ast) -> Ast {
    if rest.is_empty() {
        return first;
    }
    let mut all = Vec::with_capacity(rest.len() + 1);
    all.push(first);
    all.extend(rest);
    make(all)
}

fn parse_or(input: &str) -> IResult<&str, Ast> {
    let (input, first) = parse_and(input)?;
    let (input, rest) = many0(preceded(ws(tag("||")), parse_and))(input)?;
    Ok((input, fold(first, rest, Ast::Or)))
}

fn parse_and(input: &str) -> IResult<&str, Ast> {
    let (input, first) = parse_unary(input)?;
    let (input, rest) = many0(preceded(ws(tag("&&")), parse_unary))(input)?;
    Ok((input, fold(first, rest, Ast::And)))
}

fn parse_unary(input: &str) -> IResult<&str, Ast> {
    let (input, _) = multispace0(input)?;
    alt((
        map(preceded(char('!'), parse_unary), |a| Ast::Not(Box::new(a))),
        parse_paren,
        parse_leaf,
    ))(input)
}

fn parse_paren(input: &str) -> IResult<&str, Ast> {
    delimited(char('('), parse_or, ws(char(')')))(input)
}

// ---------------------------------------------------------------------------
// Leaves: m["x"].<method>
// ---------------------------------------------------------------------------

fn parse_leaf(input: &str) -> IResult<&str, Ast> {
    let (input, capture) = preceded(
        char('m'),
        delimited(ws(char('[')), string_lit, ws(char(']'))),
    )(input)?;
    let (input, method) = preceded(
        char('.'),
        alt((
            map(preceded(tag("Type.Is"), string_arg), Method::TypeIs),
            value(Method::Const, keyword("Const")),
            value(Method::Pure, keyword("Pure")),
            parse_value,
            map(preceded(tag("Node.Is"), string_arg), Method::NodeIs),
            map(preceded(tag("Text.Matches"), string_arg), Method::TextMatches),
        )),
    )(input)?;
    Ok((input, Ast::Leaf { capture, method }))
}

/// A word not followed by further identifier characters.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(
        tag(word),
        not(peek(satisfy(|c: char| c.is_alphanumeric() || c == '_'))),
    )
}

fn parse_value(input: &str) -> IResult<&str, Method> {
    let (input, (_, kind, _, op, literal)) = tuple((
        tag("Value."),
        alt((
            value(ValueKind::Int, tag("Int")),
            value(ValueKind::Float, tag("Float")),
        )),
        tag("()"),
        ws(compare_op),
        number_lit,
    ))(input)?;
    Ok((input, Method::Value(kind, op, literal.to_owned())))
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    map_opt(
        alt((tag("=="), tag("!="), tag("<="), tag(">="), tag("<"), tag(">"))),
        CompareOp::from_symbol,
    )(input)
}

fn number_lit(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit0)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

/// `("...")`
fn string_arg(input: &str) -> IResult<&str, String> {
    delimited(ws(char('(')), string_lit, ws(char(')')))(input)
}

fn string_lit(input: &str) -> IResult<&str, String> {
    alt((
        double_quoted,
        map(
            delimited(char('`'), take_while(|c| c != '`'), char('`')),
            str::to_owned,
        ),
    ))(input)
}

/// A double-quoted string with the usual backslash escapes.
fn double_quoted(input: &str) -> IResult<&str, String> {
    let error = |at| nom::Err::Error(nom::error::Error::new(at, nom::error::ErrorKind::Escaped));
    let (mut rest, _) = char('"')(input)?;
    let mut out = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => return Err(error(input)),
            Some('"') => return Ok((chars.as_str(), out)),
            Some('\\') => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some(c @ ('\\' | '"')) => c,
                    _ => return Err(error(rest)),
                };
                out.push(escaped);
            }
            Some(c) => out.push(c),
        }
        rest = chars.as_str();
    }
}
