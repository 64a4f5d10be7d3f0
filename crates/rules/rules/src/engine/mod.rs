pub mod binding;
pub mod eval;
pub mod executor;
pub mod matcher;
pub mod predicate;
pub mod render;
pub mod report;
pub mod semantics;
pub mod sink;
pub mod trace;

pub use binding::{Binding, Bound, CaptureEnv};
pub use eval::{Evaluation, Witness, evaluate};
pub use executor::{Outcome, RuleEngine, RunSummary, Target};
pub use matcher::{Match, match_pattern};
pub use report::Report;
pub use semantics::Semantics;
pub use sink::{Collector, Discard, ReportSink, TraceSink};
pub use trace::{CaptureTrace, TraceEntry};

#[cfg(test)]
pub(crate) mod tests {
    use astguard_syntax::{CheckedFile, ConstValue, Node, Type, render};

    use super::Semantics;

    /// Semantics that knows nothing.
    pub(crate) struct NoFacts;

    impl Semantics for NoFacts {
        fn type_of(&self, _: &Node) -> Option<&Type> {
            None
        }

        fn const_value(&self, _: &Node) -> Option<&ConstValue> {
            None
        }

        fn resolve_type(&self, _: &Node) -> Option<Type> {
            None
        }

        fn is_type_expr(&self, _: &Node) -> bool {
            false
        }
    }

    /// Check `body` as the body of a function in a small test package.
    pub(crate) fn checked(body: &str) -> CheckedFile {
        let text = format!(
            "\npackage testrule\nfunc testfunc() {{\n\t{body}\n}}\nfunc f(...interface{{}}) interface{{}} {{ return 10 }}\nvar sink interface{{}}\n"
        );
        CheckedFile::parse("input.go", text).unwrap()
    }

    /// The first node, in pre-order, that renders as `text`.
    pub(crate) fn find<'a>(file: &'a CheckedFile, text: &str) -> &'a Node {
        file.root
            .preorder()
            .find(|n| render(n) == text)
            .unwrap_or_else(|| panic!("no node renders as {text:?}"))
    }
}
