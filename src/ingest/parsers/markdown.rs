use pulldown_cmark::{CodeBlockKind, Event, Parser as CmarkParser, Tag, TagEnd};

use super::{Declaration, Parser};
use crate::error::{Result, TraceablesError};

/// Markdown parser: a traceable is a fenced code block whose info string
/// is `traceable TAG`, with one `name: value` attribute per line.
///
/// ````text
/// ```traceable REQ-1
/// title: The system shall work
/// parents: REQ-0
/// ```
/// ````
pub struct MarkdownParser;

impl Parser for MarkdownParser {
    fn can_parse(&self, extension: &str) -> bool {
        extension == "md"
    }

    fn parse(&self, content: &str, path: &str) -> Result<Vec<Declaration>> {
        let mut declarations = Vec::new();
        let mut current: Option<(Declaration, String)> = None;

        for (event, range) in CmarkParser::new(content).into_offset_iter() {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let mut words = info.split_whitespace();
                    if words.next() != Some("traceable") {
                        continue;
                    }
                    let line = line_of(content, range.start);
                    let tag = match (words.next(), words.next()) {
                        (Some(tag), None) => tag,
                        _ => {
                            return Err(TraceablesError::Parse(format!(
                                "{}:{}: traceable block takes exactly one tag, got '{}'",
                                path, line, info
                            )))
                        }
                    };
                    current = Some((Declaration::new(tag, line), String::new()));
                }
                Event::Text(text) => {
                    if let Some((_, body)) = current.as_mut() {
                        body.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((mut declaration, body)) = current.take() {
                        parse_body(&body, &mut declaration, path)?;
                        log::debug!("{}:{}: traceable '{}'", path, declaration.line, declaration.tag);
                        declarations.push(declaration);
                    }
                }
                _ => {}
            }
        }

        Ok(declarations)
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

/// Fill attributes from `name: value` lines; blank lines and `#` comments
/// are skipped.
fn parse_body(body: &str, declaration: &mut Declaration, path: &str) -> Result<()> {
    for (n, raw) in body.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let Some((name, value)) = text.split_once(':') else {
            return Err(TraceablesError::Parse(format!(
                "{}:{}: expected 'name: value' in traceable '{}', got '{}'",
                path,
                declaration.line + n + 1,
                declaration.tag,
                text
            )));
        };
        declaration
            .attributes
            .insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(())
}
