use serde::Deserialize;

/// Top-level structure of a YAML rule file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlRuleFile {
    pub rules: Vec<YamlRule>,
}

/// A single rule as written in YAML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlRule {
    pub name: String,
    #[serde(rename = "match")]
    pub patterns: YamlPatterns,
    #[serde(default, rename = "where")]
    pub filter: Option<String>,
    pub report: String,
    #[serde(default)]
    pub suggest: Option<String>,
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub debug: bool,
}

/// `match:` takes one pattern or a list of alternatives.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum YamlPatterns {
    One(String),
    Many(Vec<String>),
}

impl YamlPatterns {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(pattern) => vec![pattern],
            Self::Many(patterns) => patterns,
        }
    }
}
