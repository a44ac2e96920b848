//! Registry of the traceables known to one build session.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Item, Origin};

/// A tag was declared again while another declaration already owns it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("More than one traceable with tag '{tag}' found (first declared at {first})")]
pub struct DuplicateTagError {
    pub tag: String,
    /// Declaration that stays authoritative.
    pub first: Origin,
    /// Declaration that was rejected.
    pub duplicate: Origin,
}

/// Tag-ordered store of items.
///
/// The first declaration of a tag wins. Rejected declarations are kept aside
/// so that purging the winning document promotes the next one instead of
/// losing the tag until its document happens to be re-read.
#[derive(Debug, Default)]
pub struct Registry {
    items: BTreeMap<String, Item>,
    shadowed: Vec<Item>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a declared item.
    ///
    /// A declaration replaces a placeholder of the same tag. Registering a
    /// placeholder for a tag that already exists is a no-op.
    pub fn register(&mut self, item: Item) -> Result<(), DuplicateTagError> {
        let Some(new_origin) = item.origin.clone() else {
            self.items.entry(item.tag.clone()).or_insert(item);
            return Ok(());
        };

        match self.items.get(&item.tag).and_then(|existing| existing.origin.clone()) {
            Some(first) => {
                let err = DuplicateTagError {
                    tag: item.tag.clone(),
                    first,
                    duplicate: new_origin,
                };
                self.shadowed.push(item);
                Err(err)
            }
            None => {
                self.items.insert(item.tag.clone(), item);
                Ok(())
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<&Item> {
        self.items.get(tag)
    }

    pub(crate) fn get_mut(&mut self, tag: &str) -> Option<&mut Item> {
        self.items.get_mut(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.items.contains_key(tag)
    }

    /// Existing item for `tag`, or a freshly inserted placeholder.
    pub fn get_or_create_placeholder(&mut self, tag: &str) -> &mut Item {
        self.items
            .entry(tag.to_string())
            .or_insert_with(|| Item::placeholder(tag))
    }

    /// Remove every item declared in `document`.
    ///
    /// Returns the removed tags. A removed tag with a shadowed declaration
    /// from another document is immediately re-registered from it.
    pub fn purge_by_origin(&mut self, document: &str) -> Vec<String> {
        let removed: Vec<String> = self
            .items
            .values()
            .filter(|item| from_document(item, document))
            .map(|item| item.tag.clone())
            .collect();
        for tag in &removed {
            self.items.remove(tag);
        }
        self.shadowed.retain(|item| !from_document(item, document));

        for tag in &removed {
            if let Some(pos) = self.shadowed.iter().position(|item| &item.tag == tag) {
                let mut promoted = self.shadowed.remove(pos);
                promoted.relationships.clear();
                log::debug!(
                    "Promoting shadowed declaration of '{}' from {}",
                    tag,
                    promoted.origin.as_ref().map(ToString::to_string).unwrap_or_default()
                );
                self.items.insert(tag.clone(), promoted);
            }
        }

        removed
    }

    /// Drop all placeholders and all relationships, keeping declared items.
    pub(crate) fn reset_resolution(&mut self) {
        self.items.retain(|_, item| item.is_resolved());
        for item in self.items.values_mut() {
            item.relationships.clear();
        }
    }

    /// All items in tag order.
    pub fn all(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn from_document(item: &Item, document: &str) -> bool {
    item.origin
        .as_ref()
        .is_some_and(|origin| origin.document == document)
}
