//! BFS traversal over resolved relationships.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::graph::{GraphEdge, GraphRequest, GraphResult};
use crate::model::{Direction, Item, RelationshipIndex};
use crate::registry::Registry;
use crate::{Result, TraceablesError};

/// Edge exactly as it was encountered, before normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RawEdge {
    source: String,
    target: String,
    relationship: String,
    direction: Direction,
}

/// Walks a resolved registry.
pub struct GraphWalker<'a> {
    registry: &'a Registry,
    index: &'a RelationshipIndex,
}

impl<'a> GraphWalker<'a> {
    pub fn new(registry: &'a Registry, index: &'a RelationshipIndex) -> Self {
        Self { registry, index }
    }

    pub fn walk(&self, request: &GraphRequest) -> Result<GraphResult<'a>> {
        traverse_graph(self.registry, self.index, request)
    }
}

/// Traverse the relationship graph using BFS.
///
/// All start items enter the queue at depth 0, so every item is expanded
/// exactly once, at its smallest distance from any start item. A
/// relationship is followed from an item only while that distance is below
/// the relationship's own limit. The result does not depend on the order of
/// the start tags, and cycles terminate because no item is expanded twice.
pub fn traverse_graph<'a>(
    registry: &'a Registry,
    index: &RelationshipIndex,
    request: &GraphRequest,
) -> Result<GraphResult<'a>> {
    let mut follow = Vec::with_capacity(request.relationships.len());
    for (name, max_depth) in &request.relationships {
        let direction = index.require(name)?;
        follow.push((name.as_str(), *max_depth, direction));
    }
    for tag in &request.start_tags {
        if !registry.contains(tag) {
            return Err(TraceablesError::UnknownTag(tag.clone()));
        }
    }

    // Item tag -> smallest depth it was reached at.
    let mut depths: HashMap<&'a str, usize> = HashMap::new();
    let mut queue: VecDeque<(&'a Item, usize)> = VecDeque::new();
    for item in request.start_tags.iter().filter_map(|tag| registry.get(tag)) {
        if depths.insert(item.tag.as_str(), 0).is_none() {
            queue.push_back((item, 0));
        }
    }

    let mut relationships: BTreeSet<GraphEdge> = BTreeSet::new();
    while let Some((item, depth)) = queue.pop_front() {
        for &(name, max_depth, direction) in &follow {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for relative in item.relatives(name) {
                relationships.insert(normalize(
                    RawEdge {
                        source: item.tag.clone(),
                        target: relative.to_string(),
                        relationship: name.to_string(),
                        direction,
                    },
                    index,
                ));
                if let Some(next) = registry.get(relative) {
                    if !depths.contains_key(next.tag.as_str()) {
                        depths.insert(next.tag.as_str(), depth + 1);
                        queue.push_back((next, depth + 1));
                    }
                }
            }
        }
    }

    let nodes: BTreeSet<&'a str> = depths.into_keys().collect();

    log::debug!(
        "Graph walk from {:?}: {} traceables, {} relationships",
        request.start_tags,
        nodes.len(),
        relationships.len()
    );

    Ok(GraphResult {
        traceables: nodes.into_iter().filter_map(|tag| registry.get(tag)).collect(),
        relationships: relationships.into_iter().collect(),
    })
}

/// Rewrite backward edges as their forward opposite and orient symmetric
/// edges from the lower tag.
fn normalize(edge: RawEdge, index: &RelationshipIndex) -> GraphEdge {
    let RawEdge {
        source,
        target,
        relationship,
        direction,
    } = edge;
    match direction {
        Direction::Backward => GraphEdge {
            relationship: index
                .opposite(&relationship)
                .map(str::to_string)
                .unwrap_or(relationship),
            source: target,
            target: source,
            direction: Direction::Forward,
        },
        Direction::Symmetric if target < source => GraphEdge {
            source: target,
            target: source,
            relationship,
            direction,
        },
        Direction::Forward | Direction::Symmetric => GraphEdge {
            source,
            target,
            relationship,
            direction,
        },
    }
}
