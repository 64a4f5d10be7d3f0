use thiserror::Error;

use crate::source::Location;

/// Errors reported by the front-end.
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// The source text does not follow the grammar.
    #[error("{location}: parse error: {message}")]
    Parse { location: Location, message: String },

    /// The tree parsed but is not well typed.
    #[error("{location}: {message}")]
    Check { location: Location, message: String },
}

impl SyntaxError {
    /// Location the error points at.
    pub fn location(&self) -> &Location {
        match self {
            Self::Parse { location, .. } | Self::Check { location, .. } => location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = SyntaxError::Parse {
            location: Location::new("a.go", 3),
            message: "unexpected \"}\"".into(),
        };
        assert_eq!(err.to_string(), "a.go:3: parse error: unexpected \"}\"");

        let err = SyntaxError::Check {
            location: Location::new("a.go", 7),
            message: "undefined: y".into(),
        };
        assert_eq!(err.to_string(), "a.go:7: undefined: y");
        assert_eq!(err.location().line, 7);
    }
}
