//! Relationship graphs: bounded breadth-first walks over resolved items.
//!
//! Walks start from one or more tags and follow only the requested
//! relationship names, each with its own hop limit. Edges are normalised so
//! the same link read from either end is reported once.

mod traversal;

pub use traversal::{traverse_graph, GraphWalker};

use serde::{Deserialize, Serialize};

use crate::model::{Direction, Item};

/// Which items to start from and which relationships to follow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphRequest {
    pub start_tags: Vec<String>,
    /// Relationship name with its maximum hop count (`None`: unbounded).
    pub relationships: Vec<(String, Option<usize>)>,
}

impl GraphRequest {
    pub fn new<I, S>(start_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            start_tags: start_tags.into_iter().map(Into::into).collect(),
            relationships: Vec::new(),
        }
    }

    pub fn follow(mut self, relationship: impl Into<String>, max_depth: Option<usize>) -> Self {
        self.relationships.push((relationship.into(), max_depth));
        self
    }
}

/// One normalised link: `source --relationship--> target`.
///
/// After normalisation `direction` is either `Forward` or `Symmetric`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relationship: String,
    pub direction: Direction,
}

/// Items and links reached by a walk.
#[derive(Debug, Clone, Serialize)]
pub struct GraphResult<'a> {
    /// Reached items in tag order, start items included.
    pub traceables: Vec<&'a Item>,
    /// Sorted, deduplicated edges.
    pub relationships: Vec<GraphEdge>,
}

impl GraphResult<'_> {
    pub fn is_empty(&self) -> bool {
        self.traceables.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.traceables
            .binary_search_by(|item| item.tag.as_str().cmp(tag))
            .is_ok()
    }
}
