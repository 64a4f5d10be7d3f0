use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// A piece of a compiled message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// `$$`: the whole match.
    WholeMatch,
    /// `$name`
    Capture(String),
}

/// A report or suggestion template such as `"$x is always $$"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Split the template into literal text and placeholders.
    pub fn compile(source: &str) -> Result<Self, RuleError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = source;
        while let Some(idx) = rest.find('$') {
            text.push_str(&rest[..idx]);
            let after = &rest[idx + 1..];
            if let Some(tail) = after.strip_prefix('$') {
                flush(&mut text, &mut segments);
                segments.push(Segment::WholeMatch);
                rest = tail;
                continue;
            }
            let len = after
                .char_indices()
                .find(|&(i, c)| !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit())))
                .map_or(after.len(), |(i, _)| i);
            if len == 0 {
                let offset = source.len() - rest.len() + idx;
                return Err(RuleError::Template(format!(
                    "dangling $ at offset {offset} in {source:?}"
                )));
            }
            flush(&mut text, &mut segments);
            segments.push(Segment::Capture(after[..len].to_owned()));
            rest = &after[len..];
        }
        text.push_str(rest);
        flush(&mut text, &mut segments);
        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Capture names referenced by the template.
    pub fn captures(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

fn flush(text: &mut String, segments: &mut Vec<Segment>) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

impl TryFrom<String> for Template {
    type Error = RuleError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::compile(&source)
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_placeholders() {
        let t = Template::compile("suspicious $x+$y2 in $$.").unwrap();
        assert_eq!(
            t.segments(),
            &[
                Segment::Text("suspicious ".into()),
                Segment::Capture("x".into()),
                Segment::Text("+".into()),
                Segment::Capture("y2".into()),
                Segment::Text(" in ".into()),
                Segment::WholeMatch,
                Segment::Text(".".into()),
            ]
        );
        assert_eq!(t.captures().collect::<Vec<_>>(), vec!["x", "y2"]);
        assert_eq!(t.source(), "suspicious $x+$y2 in $$.");
    }

    #[test]
    fn plain_text() {
        let t = Template::compile("no placeholders").unwrap();
        assert_eq!(t.segments(), &[Segment::Text("no placeholders".into())]);
        assert!(Template::compile("").unwrap().segments().is_empty());
    }

    #[test]
    fn rejects_dangling_dollar() {
        assert!(matches!(
            Template::compile("cost: $5"),
            Err(RuleError::Template(_))
        ));
        assert!(matches!(
            Template::compile("trailing $"),
            Err(RuleError::Template(_))
        ));
    }
}
