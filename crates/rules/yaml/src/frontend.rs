use astguard_rules::{RuleError, RuleFrontend, RuleSpec};
use astguard_syntax::Location;

use crate::dsl::parse_filter;
use crate::parser::{YamlRule, YamlRuleFile};

/// A [`RuleFrontend`] implementation that reads YAML rule files.
///
/// ```yaml
/// rules:
///   - name: self-assign
///     match: "$x = $x"
///     where: m["x"].Pure
///     report: "suspicious self-assignment in $$"
/// ```
pub struct YamlFrontend;

impl RuleFrontend for YamlFrontend {
    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }

    fn parse(&self, file: &str, content: &str) -> Result<Vec<RuleSpec>, RuleError> {
        let parsed: YamlRuleFile = serde_yaml_ng::from_str(content)
            .map_err(|e| RuleError::Parse(format!("YAML parse error in {file}: {e}")))?;
        let lines = name_lines(content);
        parsed
            .rules
            .into_iter()
            .enumerate()
            .map(|(i, rule)| {
                let line = lines.get(i).copied().unwrap_or(1);
                compile_rule(rule, Location::new(file, line))
            })
            .collect()
    }
}

fn compile_rule(yaml: YamlRule, location: Location) -> Result<RuleSpec, RuleError> {
    let filter = yaml
        .filter
        .as_deref()
        .map(parse_filter)
        .transpose()
        .map_err(|e| e.in_rule(yaml.name.as_str()))?;
    Ok(RuleSpec {
        name: yaml.name,
        patterns: yaml.patterns.into_vec(),
        filter,
        report: yaml.report,
        suggest: yaml.suggest,
        at: yaml.at,
        location,
        debug: yaml.debug,
    })
}

/// 1-based lines of the `name` keys, in file order. Every rule has exactly
/// one, so the n-th entry is the line of the n-th rule. Block scalar bodies
/// are skipped, and a flow mapping line contributes one entry per `name` key.
fn name_lines(content: &str) -> Vec<u32> {
    let mut lines = Vec::new();
    let mut block_parent: Option<usize> = None;
    for (line, n) in content.lines().zip(1..) {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if let Some(parent) = block_parent {
            if line.trim().is_empty() || indent > parent {
                continue;
            }
            block_parent = None;
        }

        let mut key = line.trim_start();
        let mut column = indent;
        while let Some(rest) = key
            .strip_prefix('-')
            .filter(|rest| rest.is_empty() || rest.starts_with(' '))
        {
            let trimmed = rest.trim_start();
            column += key.len() - trimmed.len();
            key = trimmed;
        }
        if key.starts_with('#') {
            continue;
        }
        if key.starts_with("name:") {
            lines.push(n);
        }
        lines.extend(std::iter::repeat_n(n, flow_name_keys(key)));
        if opens_block_scalar(key) {
            block_parent = Some(column);
        }
    }
    lines
}

/// `key: |` or `key: >`, with optional chomping and indentation indicators.
fn opens_block_scalar(line: &str) -> bool {
    let Some((_, value)) = line.split_once(": ") else {
        return false;
    };
    let value = value.split(" #").next().unwrap_or_default().trim();
    value
        .strip_prefix(['|', '>'])
        .is_some_and(|rest| rest.chars().all(|c| matches!(c, '+' | '-' | '0'..='9')))
}

/// Number of `name` keys opening an entry of a flow mapping on this line.
fn flow_name_keys(line: &str) -> usize {
    let mut count = 0;
    let mut depth = 0usize;
    let mut at_key = false;
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && q == '"' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == ' ' {
            continue;
        }
        if at_key && line[i..].starts_with("name:") {
            count += 1;
        }
        at_key = false;
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => {
                depth += 1;
                at_key = true;
            }
            '}' => depth = depth.saturating_sub(1),
            ',' => at_key = depth > 0,
            _ => {}
        }
    }
    count
}
