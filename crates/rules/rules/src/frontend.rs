use crate::error::RuleError;
use crate::ir::rule::RuleSpec;

/// Trait for rule frontends that parse rules from various formats.
///
/// Implementations turn a rule file into [`RuleSpec`]s; compiling them into
/// matchers is left to [`RuleSet::compile`](crate::RuleSet::compile).
pub trait RuleFrontend: Send + Sync {
    /// Return the file extensions this frontend supports (e.g., `["yaml", "yml"]`).
    fn extensions(&self) -> &[&str];

    /// Parse rules from the content of the file called `file`.
    ///
    /// `file` is used for rule locations only.
    fn parse(&self, file: &str, content: &str) -> Result<Vec<RuleSpec>, RuleError>;

    /// Parse rules from a file path.
    ///
    /// The default implementation reads the file and delegates to [`parse`](Self::parse).
    fn parse_file(&self, path: &std::path::Path) -> Result<Vec<RuleSpec>, RuleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RuleError::Parse(format!("cannot read {}: {e}", path.display())))?;
        self.parse(&path.display().to_string(), &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A trivial frontend producing one rule per non-empty line.
    struct LineFrontend;

    impl RuleFrontend for LineFrontend {
        fn extensions(&self) -> &[&str] {
            &["test"]
        }

        fn parse(&self, file: &str, content: &str) -> Result<Vec<RuleSpec>, RuleError> {
            Ok(content
                .lines()
                .enumerate()
                .filter(|(_, l)| !l.trim().is_empty())
                .map(|(i, line)| RuleSpec {
                    name: format!("{file}#{i}"),
                    patterns: vec![line.trim().to_owned()],
                    report: "$$".into(),
                    ..RuleSpec::default()
                })
                .collect())
        }
    }

    #[test]
    fn frontend_extensions() {
        assert_eq!(LineFrontend.extensions(), &["test"]);
    }

    #[test]
    fn frontend_parse() {
        let specs = LineFrontend.parse("r.test", "$x + 1\n\n$x - 1\n").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].name, "r.test#2");
        assert_eq!(specs[1].patterns, vec!["$x - 1"]);
    }

    #[test]
    fn frontend_parse_nonexistent_file() {
        let result = LineFrontend.parse_file(std::path::Path::new("/nonexistent/path.test"));
        assert!(matches!(result, Err(RuleError::Parse(msg)) if msg.contains("cannot read")));
    }
}
