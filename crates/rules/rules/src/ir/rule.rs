use std::path::Path;

use astguard_syntax::Location;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::filter::Filter;
use super::optimize::simplify;
use super::pattern::Pattern;
use super::template::Template;
use crate::error::RuleError;
use crate::frontend::RuleFrontend;

/// A rule as written in a rule file, before compilation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSpec {
    /// A human-readable name for the rule.
    pub name: String,
    /// Alternative patterns; the first one that matches a node is used.
    pub patterns: Vec<String>,
    /// Optional filter over the captures.
    pub filter: Option<Filter>,
    /// Report message template.
    pub report: String,
    /// Optional suggestion template.
    #[serde(default)]
    pub suggest: Option<String>,
    /// Capture whose node the report points at instead of the whole match.
    #[serde(default)]
    pub at: Option<String>,
    /// Where the rule is declared.
    pub location: Location,
    /// Record a trace entry whenever the filter rejects a match.
    #[serde(default)]
    pub debug: bool,
}

/// A compiled rule.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub name: String,
    pub patterns: Vec<Pattern>,
    pub filter: Option<Filter>,
    pub report: Template,
    pub suggest: Option<Template>,
    pub at: Option<String>,
    pub location: Location,
    pub debug: bool,
}

impl Rule {
    /// Compile a rule spec, checking that every capture referenced by the
    /// filter, templates and `at` clause is bound by every pattern.
    pub fn compile(spec: RuleSpec) -> Result<Self, RuleError> {
        let name = spec.name.clone();
        Self::compile_inner(spec).map_err(|e| e.in_rule(name))
    }

    fn compile_inner(spec: RuleSpec) -> Result<Self, RuleError> {
        if spec.patterns.is_empty() {
            return Err(RuleError::Pattern {
                pattern: String::new(),
                message: "rule has no patterns".into(),
            });
        }
        let patterns = spec
            .patterns
            .iter()
            .map(|p| Pattern::compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        let report = Template::compile(&spec.report)?;
        let suggest = spec.suggest.as_deref().map(Template::compile).transpose()?;
        let filter = spec.filter.map(simplify);

        let referenced = filter
            .iter()
            .flat_map(Filter::captures)
            .chain(report.captures())
            .chain(suggest.iter().flat_map(Template::captures))
            .chain(spec.at.as_deref());
        for name in referenced {
            if !patterns.iter().all(|p| p.binds(name)) {
                return Err(RuleError::UnboundCapture(name.to_owned()));
            }
        }

        Ok(Self {
            name: spec.name,
            patterns,
            filter,
            report,
            suggest,
            at: spec.at,
            location: spec.location,
            debug: spec.debug,
        })
    }
}

/// An ordered, compiled rule set. Declaration order is evaluation order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile every spec. All failures are collected and reported together;
    /// no rule is dropped silently.
    pub fn compile(specs: Vec<RuleSpec>) -> Result<Self, RuleError> {
        let mut rules = Vec::with_capacity(specs.len());
        let mut errors = Vec::new();
        for spec in specs {
            match Rule::compile(spec) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(RuleError::Compile(errors));
        }
        let set = Self::new(rules);
        let names = set.list_rules();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                warn!(rule = %name, "duplicate rule name");
            }
        }
        debug!(rules = set.len(), "compiled rule set");
        Ok(set)
    }

    /// Parse and compile rule files, picking a frontend by file extension.
    pub fn load_files<P: AsRef<Path>>(
        paths: &[P],
        frontends: &[&dyn RuleFrontend],
    ) -> Result<Self, RuleError> {
        let mut specs = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("");
            let frontend = frontends
                .iter()
                .find(|f| f.extensions().contains(&extension))
                .ok_or_else(|| {
                    RuleError::Parse(format!("no rule frontend for {}", path.display()))
                })?;
            specs.extend(frontend.parse_file(path)?);
        }
        Self::compile(specs)
    }

    /// Return the rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by name.
    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Return a list of all rule names.
    pub fn list_rules(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Turn on rejection tracing for a rule. Returns true if the rule was found.
    pub fn enable_debug(&mut self, name: &str) -> bool {
        let mut found = false;
        for rule in self.rules.iter_mut().filter(|r| r.name == name) {
            rule.debug = true;
            found = true;
        }
        found
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::filter::Predicate;

    fn spec(name: &str, pattern: &str) -> RuleSpec {
        RuleSpec {
            name: name.into(),
            patterns: vec![pattern.into()],
            report: "found $$".into(),
            location: Location::new("rules.go", 5),
            ..RuleSpec::default()
        }
    }

    fn is_const(name: &str) -> Filter {
        Predicate::IsConst {
            capture: name.into(),
        }
        .into()
    }

    #[test]
    fn compiles_and_simplifies() {
        let mut s = spec("add", "$x + $y");
        s.filter = Some(Filter::And(vec![
            is_const("x"),
            Filter::And(vec![is_const("y")]),
        ]));
        let rule = Rule::compile(s).unwrap();
        assert_eq!(rule.filter, Some(Filter::And(vec![is_const("x"), is_const("y")])));
        assert_eq!(rule.patterns.len(), 1);
        assert_eq!(rule.location.to_string(), "rules.go:5");
    }

    #[test]
    fn unbound_captures_are_rejected() {
        let mut s = spec("add", "$x + $_");
        s.filter = Some(is_const("y"));
        let err = Rule::compile(s).unwrap_err();
        assert_eq!(err.to_string(), "rule add: capture $y is not bound by every pattern");

        let mut s = spec("msg", "$x + 1");
        s.report = "$z".into();
        assert!(Rule::compile(s).is_err());

        let mut s = spec("at", "$x + 1");
        s.at = Some("w".into());
        assert!(Rule::compile(s).is_err());
    }

    #[test]
    fn captures_must_be_bound_by_every_alternative() {
        let mut s = spec("alt", "$x + 1");
        s.patterns.push("1 + $y".into());
        s.report = "$x".into();
        assert!(Rule::compile(s).is_err());

        let mut s = spec("alt", "$x + 1");
        s.patterns.push("1 + $x".into());
        s.report = "$x".into();
        assert_eq!(Rule::compile(s).unwrap().patterns.len(), 2);
    }

    #[test]
    fn set_compile_collects_every_failure() {
        let specs = vec![
            spec("good", "$x + 1"),
            spec("bad1", "$x +"),
            RuleSpec {
                report: "$nope".into(),
                ..spec("bad2", "$x")
            },
        ];
        let Err(RuleError::Compile(errors)) = RuleSet::compile(specs) else {
            panic!("expected a compile error");
        };
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("rule bad1: invalid pattern"));
        assert!(messages[1].starts_with("rule bad2: capture $nope"));
    }

    #[test]
    fn rule_set_management() {
        let mut set = RuleSet::compile(vec![spec("a", "$x + 1"), spec("b", "$x - 1")]).unwrap();
        assert_eq!(set.list_rules(), vec!["a", "b"]);
        assert!(set.rule_by_name("b").is_some());
        assert!(set.rule_by_name("c").is_none());
        assert!(!set.rules()[1].debug);
        assert!(set.enable_debug("b"));
        assert!(set.rules()[1].debug);
        assert!(!set.enable_debug("c"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn load_files_requires_a_frontend() {
        let err = RuleSet::load_files(&["rules.unknown"], &[]).unwrap_err();
        assert!(err.to_string().contains("no rule frontend"));
    }
}
