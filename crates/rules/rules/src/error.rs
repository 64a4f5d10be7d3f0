use thiserror::Error;

/// Errors that can occur while compiling or loading rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A pattern could not be parsed or has an unsupported shape.
    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    /// A child list holds more than one multi wildcard.
    #[error("ambiguous pattern `{0}`: more than one multi wildcard in one list")]
    AmbiguousPattern(String),

    /// A filter, template or `at` clause names a capture the pattern does not bind.
    #[error("capture ${0} is not bound by every pattern")]
    UnboundCapture(String),

    /// A message or suggestion template is malformed.
    #[error("invalid template: {0}")]
    Template(String),

    /// A type given to `Type.Is` is not a type expression.
    #[error("invalid type spec: {0}")]
    TypeSpec(String),

    /// An invalid regular expression was supplied to `Text.Matches`.
    #[error("invalid regex: {0}")]
    InvalidRegex(String),

    /// A node kind given to `Node.Is` does not exist.
    #[error("unknown node kind: {0}")]
    UnknownNodeKind(String),

    /// A parse error when loading rules from a frontend.
    #[error("parse error: {0}")]
    Parse(String),

    /// An error attributed to one rule.
    #[error("rule {rule}: {source}")]
    Rule {
        rule: String,
        #[source]
        source: Box<RuleError>,
    },

    /// Every failure of a rule set compilation.
    #[error("{} rule(s) failed to compile: {}", .0.len(), join(.0))]
    Compile(Vec<RuleError>),
}

impl RuleError {
    /// Attribute this error to the named rule.
    #[must_use]
    pub fn in_rule(self, rule: impl Into<String>) -> Self {
        Self::Rule {
            rule: rule.into(),
            source: Box::new(self),
        }
    }
}

fn join(errors: &[RuleError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
