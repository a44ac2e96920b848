pub mod markdown;
pub mod rst;
pub mod yaml;

use std::collections::BTreeMap;

use crate::error::{Result, TraceablesError};

/// One traceable declaration found in a source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// 1-based line of the declaration
    pub line: usize,
}

impl Declaration {
    pub fn new(tag: impl Into<String>, line: usize) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            line,
        }
    }
}

/// Trait for declaration parsers
pub trait Parser {
    /// Check if this parser can handle the given file extension
    fn can_parse(&self, extension: &str) -> bool;

    /// Extract every traceable declaration from `content`
    fn parse(&self, content: &str, path: &str) -> Result<Vec<Declaration>>;
}

/// Parser registry that selects the appropriate parser by extension
pub struct ParserRegistry {
    parsers: Vec<Box<dyn Parser>>,
}

impl ParserRegistry {
    /// Create a new parser registry with all built-in parsers
    pub fn new() -> Self {
        let mut registry = Self {
            parsers: Vec::new(),
        };

        registry.register(Box::new(rst::RstParser));
        registry.register(Box::new(markdown::MarkdownParser));
        registry.register(Box::new(yaml::YamlParser));

        registry
    }

    /// Register a parser
    pub fn register(&mut self, parser: Box<dyn Parser>) {
        self.parsers.push(parser);
    }

    /// Find a parser that can handle the given extension
    pub fn find_parser(&self, extension: &str) -> Option<&dyn Parser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(extension))
            .map(|p| p.as_ref())
    }

    /// Parse content using the appropriate parser for the extension
    pub fn parse(&self, content: &str, path: &str, extension: &str) -> Result<Vec<Declaration>> {
        let parser = self.find_parser(extension).ok_or_else(|| {
            TraceablesError::Parse(format!("No parser found for extension: {}", extension))
        })?;
        parser.parse(content, path)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
