pub mod engine;
pub mod error;
pub mod frontend;
pub mod ir;

pub use engine::{
    CaptureTrace, Collector, Discard, Outcome, Report, ReportSink, RuleEngine, RunSummary,
    Semantics, Target, TraceEntry, TraceSink,
};
pub use error::RuleError;
pub use frontend::RuleFrontend;
pub use ir::filter::{CompareOp, Filter, Predicate, TypeSpec, ValueKind};
pub use ir::pattern::Pattern;
pub use ir::rule::{Rule, RuleSet, RuleSpec};
pub use ir::template::Template;
