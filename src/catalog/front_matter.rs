//! Front matter of content files.
//!
//! ```text
//! ---
//! title: First Post
//! tags: [rust, web]
//! ---
//! Markdown body...
//! ```
//!
//! The fenced block is YAML. Its top level must be a mapping.

use anyhow::{Result, bail};
use serde_yaml::Value;
use std::collections::BTreeMap;

const FENCE: &str = "---";

/// Top-level fields of a front matter block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: BTreeMap<String, Value>,
}

impl FrontMatter {
    /// Parse the YAML between the fences. A blank block has no fields.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let fields = match serde_yaml::from_str(raw)? {
            Value::Null => BTreeMap::new(),
            Value::Mapping(mapping) => mapping
                .into_iter()
                .filter_map(|(key, value)| scalar_text(&key).map(|key| (key, value)))
                .collect(),
            _ => bail!("front matter must be a mapping of fields"),
        };
        Ok(Self { fields })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Scalar value of `key` as text.
    pub fn get(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(scalar_text)
    }

    /// Values of `key`: the scalars of a sequence, or a comma separated
    /// string. Empty entries are dropped.
    pub fn values(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(scalar_text)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .collect(),
            Some(Value::String(text)) => text
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .collect(),
            Some(other) => scalar_text(other).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Split `source` into front matter and body, the body trimmed.
///
/// Without an opening fence on the first line, or without a closing fence,
/// the whole source is body. Malformed YAML inside the fences is an error.
pub fn split(source: &str) -> Result<(FrontMatter, &str)> {
    let source = source.trim_start_matches('\u{feff}');

    let mut lines = source.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((FrontMatter::default(), source.trim()));
    };
    if first.trim_end() != FENCE {
        return Ok((FrontMatter::default(), source.trim()));
    }

    let mut offset = first.len();
    for line in lines {
        if line.trim_end() == FENCE {
            let front_matter = FrontMatter::parse(&source[first.len()..offset])?;
            let body = &source[offset + line.len()..];
            return Ok((front_matter, body.trim()));
        }
        offset += line.len();
    }

    Ok((FrontMatter::default(), source.trim()))
}
