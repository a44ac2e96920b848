//! Traceable items and relationship declarations.

mod item;
mod relationship;

pub use item::{split_tags, AttributeSource, AttributeValue, Item, Origin};
pub use relationship::{default_relationships, Direction, RelationshipIndex, RelationshipType};
