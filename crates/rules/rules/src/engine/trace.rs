use std::fmt;

use astguard_syntax::Location;
use serde::{Deserialize, Serialize};

/// One capture as shown in a rejection trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTrace {
    /// Capture name, without the `$`.
    pub name: String,
    /// Rendered type of the bound subtree (`unknown` when not known).
    #[serde(rename = "type")]
    pub ty: String,
    /// Canonical text of the bound subtree.
    pub text: String,
}

impl fmt::Display for CaptureTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.name, self.ty, self.text)
    }
}

/// Why a structural match was dropped by its rule's filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Name of the rule.
    pub rule: String,
    /// Where the rule is declared.
    pub rule_location: Location,
    /// Where the rejected match is.
    pub location: Location,
    /// Description of the rejecting sub-filter.
    pub rejected_by: String,
    /// Captures the rejecting sub-filter looked at, in first-reference order.
    pub captures: Vec<CaptureTrace>,
}

impl TraceEntry {
    /// The console rendering: a header line, then one indented line per capture.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.captures.len() + 1);
        lines.push(format!(
            "{}: [{}] rejected by {}",
            self.location, self.rule_location, self.rejected_by
        ));
        lines.extend(self.captures.iter().map(|c| format!("  {c}")));
        lines
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}
