use std::sync::OnceLock;

use regex::Regex;

use super::{Declaration, Parser};
use crate::error::{Result, TraceablesError};

/// reStructuredText parser for the `traceable` directive:
///
/// ```text
/// .. traceable:: REQ-1
///     :title: Something the system must do
///     :parents: REQ-0
///
///     Free-form body, ignored here.
/// ```
///
/// Option lines directly follow the directive. A deeper-indented line that
/// is not itself an option continues the previous value.
pub struct RstParser;

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)\.\.\s+traceable::(.*)$").expect("Invalid regex pattern"))
}

fn option_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s+):([^:\s][^:]*):(?:\s+(.*))?$").expect("Invalid regex pattern"))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

impl Parser for RstParser {
    fn can_parse(&self, extension: &str) -> bool {
        matches!(extension, "rst" | "txt")
    }

    fn parse(&self, content: &str, path: &str) -> Result<Vec<Declaration>> {
        let lines: Vec<&str> = content.lines().collect();
        let mut declarations = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some(caps) = directive_re().captures(lines[i]) else {
                i += 1;
                continue;
            };
            let directive_indent = caps[1].len();
            let line = i + 1;
            let argument = caps[2].trim();
            if argument.is_empty() || argument.contains(char::is_whitespace) {
                return Err(TraceablesError::Parse(format!(
                    "{}:{}: traceable directive takes exactly one tag, got '{}'",
                    path, line, argument
                )));
            }

            let mut declaration = Declaration::new(argument, line);
            let mut last: Option<(String, usize)> = None;
            i += 1;

            while i < lines.len() {
                let current = lines[i];
                if current.trim().is_empty() || indent_of(current) <= directive_indent {
                    break;
                }
                if let Some(option) = option_re().captures(current) {
                    let name = option[2].trim().to_string();
                    let value = option.get(3).map_or("", |m| m.as_str()).trim().to_string();
                    last = Some((name.clone(), option[1].len()));
                    declaration.attributes.insert(name, value);
                } else {
                    match &last {
                        Some((name, option_indent)) if indent_of(current) > *option_indent => {
                            if let Some(value) = declaration.attributes.get_mut(name) {
                                if !value.is_empty() {
                                    value.push(' ');
                                }
                                value.push_str(current.trim());
                            }
                        }
                        // First body line without a blank separator: options are over.
                        _ => break,
                    }
                }
                i += 1;
            }

            log::debug!("{}:{}: traceable '{}'", path, line, declaration.tag);
            declarations.push(declaration);
        }

        Ok(declarations)
    }
}
