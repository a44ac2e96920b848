use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

/// Where a traceable was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Origin {
    /// Document identifier, usually the path relative to the source folder.
    pub document: String,
    /// 1-based line of the declaration within the document.
    pub line: usize,
}

impl Origin {
    pub fn new(document: impl Into<String>, line: usize) -> Self {
        Self {
            document: document.into(),
            line,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.document, self.line)
    }
}

/// A uniquely tagged entity participating in relationships.
///
/// Items without an [`Origin`] are placeholders: they were referenced by
/// some relationship attribute but never declared, and always carry an
/// empty attribute map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Relationship name -> tags of the related items, in tag order.
    pub relationships: BTreeMap<String, BTreeSet<String>>,
    pub origin: Option<Origin>,
}

impl Item {
    /// A declared item.
    pub fn declared(
        tag: impl Into<String>,
        attributes: BTreeMap<String, String>,
        origin: Origin,
    ) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            relationships: BTreeMap::new(),
            origin: Some(origin),
        }
    }

    /// An item that is only known because something referenced it.
    pub fn placeholder(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            origin: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.origin.is_some()
    }

    /// The `title` attribute, or the tag when no usable title is set.
    pub fn title(&self) -> &str {
        match self.attributes.get("title").map(|t| t.trim()) {
            Some(title) if !title.is_empty() => title,
            _ => &self.tag,
        }
    }

    pub fn has_title(&self) -> bool {
        self.title() != self.tag
    }

    /// Tags related to this item under `name`.
    pub fn relatives(&self, name: &str) -> impl Iterator<Item = &str> {
        self.relationships
            .get(name)
            .into_iter()
            .flat_map(|tags| tags.iter().map(String::as_str))
    }

    pub fn is_related(&self, name: &str, tag: &str) -> bool {
        self.relationships
            .get(name)
            .is_some_and(|tags| tags.contains(tag))
    }

    pub(crate) fn add_relative(&mut self, name: &str, tag: &str) {
        self.relationships
            .entry(name.to_string())
            .or_default()
            .insert(tag.to_string());
    }
}

/// Result of looking up one attribute by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    Text(&'a str),
    Absent,
}

impl<'a> AttributeValue<'a> {
    pub fn as_text(self) -> Option<&'a str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Absent => None,
        }
    }
}

impl<'a> From<Option<&'a String>> for AttributeValue<'a> {
    fn from(value: Option<&'a String>) -> Self {
        value.map_or(AttributeValue::Absent, |v| AttributeValue::Text(v.as_str()))
    }
}

/// Anything a filter expression can bind identifiers against.
pub trait AttributeSource {
    fn attribute(&self, name: &str) -> AttributeValue<'_>;
}

impl AttributeSource for Item {
    /// Attributes plus the synthetic `tag` identifier.
    fn attribute(&self, name: &str) -> AttributeValue<'_> {
        if name == "tag" {
            return AttributeValue::Text(&self.tag);
        }
        self.attributes.get(name).into()
    }
}

impl AttributeSource for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> AttributeValue<'_> {
        self.get(name).into()
    }
}

impl AttributeSource for HashMap<String, String> {
    fn attribute(&self, name: &str) -> AttributeValue<'_> {
        self.get(name).into()
    }
}

/// Split a relationship attribute value into tags.
///
/// `"A, B,,C "` -> `["A", "B", "C"]`
pub fn split_tags(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_title_falls_back_to_tag() {
        let item = Item::declared("REQ-1", attrs(&[("title", "  ")]), Origin::new("a.rst", 1));
        assert_eq!(item.title(), "REQ-1");
        assert!(!item.has_title());

        let item = Item::declared("REQ-2", attrs(&[("title", "Boot fast")]), Origin::new("a.rst", 4));
        assert_eq!(item.title(), "Boot fast");
        assert!(item.has_title());
    }

    #[test]
    fn test_placeholder_is_unresolved() {
        let item = Item::placeholder("GHOST");
        assert!(!item.is_resolved());
        assert!(item.attributes.is_empty());
    }

    #[test]
    fn test_tag_is_bound_as_attribute() {
        let item = Item::declared("AQUILA", attrs(&[("color", "red")]), Origin::new("x.md", 3));
        assert_eq!(item.attribute("tag"), AttributeValue::Text("AQUILA"));
        assert_eq!(item.attribute("color"), AttributeValue::Text("red"));
        assert_eq!(item.attribute("version"), AttributeValue::Absent);
    }

    #[test]
    fn test_split_tags_drops_empty_entries() {
        let tags: Vec<&str> = split_tags(" A, B,,C ,").collect();
        assert_eq!(tags, vec!["A", "B", "C"]);
        assert_eq!(split_tags("").count(), 0);
    }
}
