use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml_ng::Value as YamlValue;

use super::{Declaration, Parser};
use crate::error::{Result, TraceablesError};

/// YAML parser: the document is a sequence of `{tag, attributes}` mappings.
///
/// ```yaml
/// - tag: REQ-1
///   attributes:
///     title: The system shall work
///     parents: [REQ-0, REQ-2]
///     version: 1.2
/// ```
///
/// Scalar attribute values are stringified; sequences are joined with `, `
/// so they read like any other tag list.
pub struct YamlParser;

#[derive(Debug, Deserialize)]
struct YamlDeclaration {
    tag: String,
    #[serde(default)]
    attributes: BTreeMap<String, YamlValue>,
}

impl Parser for YamlParser {
    fn can_parse(&self, extension: &str) -> bool {
        matches!(extension, "yaml" | "yml")
    }

    fn parse(&self, content: &str, path: &str) -> Result<Vec<Declaration>> {
        let entries: Option<Vec<YamlDeclaration>> = serde_yaml_ng::from_str(content)
            .map_err(|e| TraceablesError::Parse(format!("YAML parse error in {}: {}", path, e)))?;

        let mut declarations = Vec::new();
        for entry in entries.unwrap_or_default() {
            let mut declaration = Declaration::new(entry.tag.trim(), locate(content, &entry.tag));
            for (name, value) in entry.attributes {
                let text = yaml_value_to_text(&value).ok_or_else(|| {
                    TraceablesError::Parse(format!(
                        "{}:{}: attribute '{}' of '{}' must be a scalar or a list of scalars",
                        path, declaration.line, name, declaration.tag
                    ))
                })?;
                declaration.attributes.insert(name, text);
            }
            declarations.push(declaration);
        }

        Ok(declarations)
    }
}

/// Line of the first `tag: <tag>` entry, or 1 when it cannot be found.
fn locate(content: &str, tag: &str) -> usize {
    content
        .lines()
        .position(|line| {
            let line = line.trim_start().trim_start_matches("- ").trim();
            line.strip_prefix("tag:")
                .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\'') == tag)
                .unwrap_or(false)
        })
        .map_or(1, |index| index + 1)
}

fn yaml_value_to_text(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Null => Some(String::new()),
        YamlValue::Sequence(seq) => {
            let parts = seq
                .iter()
                .map(|item| match item {
                    YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
                    scalar => yaml_value_to_text(scalar),
                })
                .collect::<Option<Vec<_>>>()?;
            Some(parts.join(", "))
        }
        YamlValue::Mapping(_) | YamlValue::Tagged(_) => None,
    }
}
