use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};

use astguard_syntax::{CheckedFile, Location, Node, NodeKind, SourceFile};
use serde::Serialize;
use tracing::{debug, instrument, trace};

use super::eval::{Witness, evaluate};
use super::matcher::{Match, match_pattern};
use super::render::{render_capture, render_message};
use super::report::Report;
use super::semantics::Semantics;
use super::sink::{ReportSink, TraceSink};
use super::trace::TraceEntry;
use crate::ir::rule::{Rule, RuleSet};

/// A parsed tree together with its semantic facts.
#[derive(Clone, Copy)]
pub struct Target<'t> {
    pub file: &'t SourceFile,
    pub root: &'t Node,
    pub semantics: &'t dyn Semantics,
}

impl<'t> From<&'t CheckedFile> for Target<'t> {
    fn from(file: &'t CheckedFile) -> Self {
        Self {
            file: &file.source,
            root: &file.root,
            semantics: &file.info,
        }
    }
}

/// What happened when one rule was tried at one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No pattern matched structurally.
    NotMatched,
    /// A pattern matched and the filter held; one report was emitted.
    Fired,
    /// A pattern matched but the filter rejected it.
    Rejected,
}

/// Counters for one run over one tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub nodes_visited: usize,
    pub fired: usize,
    pub rejected: usize,
    /// The run was abandoned before the whole tree was visited.
    pub cancelled: bool,
}

/// The rule engine matches a compiled rule set against syntax trees.
///
/// Nodes are visited in pre-order. At each node the rules are tried in
/// declaration order, so reports arrive in a deterministic order. The engine
/// is immutable while running and can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: RuleSet,
}

impl RuleEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Look up a rule by name.
    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.rule_by_name(name)
    }

    /// Return a list of all rule names.
    pub fn list_rules(&self) -> Vec<&str> {
        self.rules.list_rules()
    }

    /// Turn on rejection tracing for a rule. Returns true if the rule was found.
    pub fn enable_debug(&mut self, name: &str) -> bool {
        self.rules.enable_debug(name)
    }

    /// Match every rule against every node of `target`.
    pub fn run(
        &self,
        target: Target<'_>,
        reports: &dyn ReportSink,
        traces: &dyn TraceSink,
    ) -> RunSummary {
        self.run_until(target, reports, traces, &AtomicBool::new(false))
    }

    /// Like [`RuleEngine::run`], but stops before the next node once `cancel`
    /// is set. The node being processed is always finished.
    #[instrument(skip_all, fields(file = target.file.name(), rules = self.rules.len()))]
    pub fn run_until(
        &self,
        target: Target<'_>,
        reports: &dyn ReportSink,
        traces: &dyn TraceSink,
        cancel: &AtomicBool,
    ) -> RunSummary {
        let mut walk = Walk {
            engine: self,
            target,
            reports,
            traces,
            cancel,
            summary: RunSummary::default(),
        };
        if walk.visit(target.root, None).is_break() {
            walk.summary.cancelled = true;
            debug!(nodes = walk.summary.nodes_visited, "run cancelled");
        }
        debug!(
            nodes = walk.summary.nodes_visited,
            fired = walk.summary.fired,
            rejected = walk.summary.rejected,
            "run finished"
        );
        walk.summary
    }

    /// Try one rule at one node.
    ///
    /// `siblings` starts at `node` and runs to the end of the enclosing
    /// block, if `node` is a statement of a block.
    pub fn apply<'t>(
        &self,
        rule: &Rule,
        node: &'t Node,
        siblings: Option<&'t [Node]>,
        target: Target<'t>,
        reports: &dyn ReportSink,
        traces: &dyn TraceSink,
    ) -> Outcome {
        let Some(found) = rule
            .patterns
            .iter()
            .find_map(|p| match_pattern(p, node, siblings, target.semantics))
        else {
            return Outcome::NotMatched;
        };
        let location = target.file.location(found.nodes[0].span);

        if let Some(filter) = &rule.filter {
            let eval = evaluate(filter, &found.env, target.semantics);
            if !eval.matched {
                let witness = eval.witness.unwrap_or_else(|| Witness::of(filter));
                trace!(rule = %rule.name, %location, by = %witness.description, "match rejected");
                if rule.debug {
                    let captures = witness
                        .captures
                        .iter()
                        .filter_map(|name| found.env.get(name).map(|b| render_capture(name, b)))
                        .collect();
                    traces.trace(TraceEntry {
                        rule: rule.name.clone(),
                        rule_location: rule.location.clone(),
                        location,
                        rejected_by: witness.description,
                        captures,
                    });
                }
                return Outcome::Rejected;
            }
        }

        debug!(rule = %rule.name, %location, "rule fired");
        reports.report(Report {
            rule: rule.name.clone(),
            rule_location: rule.location.clone(),
            location: report_location(rule, &found, target.file),
            message: render_message(&rule.report, found.nodes, &found.env),
            suggestion: rule
                .suggest
                .as_ref()
                .map(|t| render_message(t, found.nodes, &found.env)),
        });
        Outcome::Fired
    }
}

/// The `at` capture's first node when it has one, otherwise the match.
fn report_location(rule: &Rule, found: &Match<'_>, file: &SourceFile) -> Location {
    let node = rule
        .at
        .as_deref()
        .and_then(|name| found.env.get(name))
        .and_then(|b| b.nodes().first())
        .unwrap_or(&found.nodes[0]);
    file.location(node.span)
}

struct Walk<'a, 't> {
    engine: &'a RuleEngine,
    target: Target<'t>,
    reports: &'a dyn ReportSink,
    traces: &'a dyn TraceSink,
    cancel: &'a AtomicBool,
    summary: RunSummary,
}

impl<'t> Walk<'_, 't> {
    fn visit(&mut self, node: &'t Node, siblings: Option<&'t [Node]>) -> ControlFlow<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return ControlFlow::Break(());
        }
        self.summary.nodes_visited += 1;
        for rule in self.engine.rules.rules() {
            match self
                .engine
                .apply(rule, node, siblings, self.target, self.reports, self.traces)
            {
                Outcome::Fired => self.summary.fired += 1,
                Outcome::Rejected => self.summary.rejected += 1,
                Outcome::NotMatched => {}
            }
        }
        let in_block = node.kind == NodeKind::BlockStmt;
        for (i, child) in node.children.iter().enumerate() {
            let siblings = in_block.then(|| &node.children[i..]);
            self.visit(child, siblings)?;
        }
        ControlFlow::Continue(())
    }
}
