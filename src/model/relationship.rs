use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Result, TraceablesError};

/// A declared `(forward, backward, directional)` relationship triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipType {
    pub forward: String,
    pub backward: String,
    #[serde(default = "default_directional")]
    pub directional: bool,
}

fn default_directional() -> bool {
    true
}

impl RelationshipType {
    pub fn directional(forward: &str, backward: &str) -> Self {
        Self {
            forward: forward.to_string(),
            backward: backward.to_string(),
            directional: true,
        }
    }

    pub fn symmetric(name: &str) -> Self {
        Self {
            forward: name.to_string(),
            backward: name.to_string(),
            directional: false,
        }
    }
}

/// Relationship types used when the configuration declares none.
pub fn default_relationships() -> Vec<RelationshipType> {
    vec![
        RelationshipType::directional("parents", "children"),
        RelationshipType::symmetric("sibling"),
        RelationshipType::directional("output", "created-in"),
        RelationshipType::directional("used-in", "input"),
        RelationshipType::directional("create", "created-by"),
    ]
}

/// Orientation of a relationship name within its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Direction {
    Forward,
    Backward,
    Symmetric,
}

impl Direction {
    pub fn sign(self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
            Direction::Symmetric => 0,
        }
    }
}

/// Lookup tables derived once from the configured relationship types.
#[derive(Debug, Clone)]
pub struct RelationshipIndex {
    types: Vec<RelationshipType>,
    opposites: BTreeMap<String, String>,
    directions: BTreeMap<String, Direction>,
}

impl RelationshipIndex {
    /// Build the index, rejecting inconsistent declarations.
    pub fn new(types: Vec<RelationshipType>) -> Result<Self> {
        let mut opposites: BTreeMap<String, String> = BTreeMap::new();
        let mut directions = BTreeMap::new();

        for declaration in &types {
            let RelationshipType { forward, backward, directional } = declaration;
            if forward.trim().is_empty() || backward.trim().is_empty() {
                return Err(TraceablesError::Config(
                    "relationship names must not be empty".to_string(),
                ));
            }
            if *directional && forward == backward {
                return Err(TraceablesError::Config(format!(
                    "directional relationship '{}' needs distinct forward and backward names",
                    forward
                )));
            }
            if !*directional && forward != backward {
                return Err(TraceablesError::Config(format!(
                    "symmetric relationship '{}'/'{}' must use the same name twice",
                    forward, backward
                )));
            }

            for (name, opposite) in [(forward, backward), (backward, forward)] {
                if let Some(existing) = opposites.get(name) {
                    if existing != opposite {
                        return Err(TraceablesError::Config(format!(
                            "relationship '{}' declared with opposites '{}' and '{}'",
                            name, existing, opposite
                        )));
                    }
                }
                opposites.insert(name.clone(), opposite.clone());
            }

            if *directional {
                directions.insert(forward.clone(), Direction::Forward);
                directions.insert(backward.clone(), Direction::Backward);
            } else {
                directions.insert(forward.clone(), Direction::Symmetric);
            }
        }

        Ok(Self {
            types,
            opposites,
            directions,
        })
    }

    pub fn types(&self) -> &[RelationshipType] {
        &self.types
    }

    pub fn contains(&self, name: &str) -> bool {
        self.opposites.contains_key(name)
    }

    pub fn opposite(&self, name: &str) -> Option<&str> {
        self.opposites.get(name).map(String::as_str)
    }

    pub fn direction(&self, name: &str) -> Option<Direction> {
        self.directions.get(name).copied()
    }

    /// All relationship names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.opposites.keys().cloned().collect()
    }

    /// Direction of `name`, or the request-scoped error for an unknown name.
    pub fn require(&self, name: &str) -> Result<Direction> {
        self.direction(name)
            .ok_or_else(|| TraceablesError::InvalidRelationshipName {
                name: name.to_string(),
                available: self.names(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_opposites_and_directions() {
        let index = RelationshipIndex::new(default_relationships()).unwrap();
        assert_eq!(index.opposite("parents"), Some("children"));
        assert_eq!(index.opposite("children"), Some("parents"));
        assert_eq!(index.opposite("sibling"), Some("sibling"));
        assert_eq!(index.direction("parents").map(Direction::sign), Some(1));
        assert_eq!(index.direction("children").map(Direction::sign), Some(-1));
        assert_eq!(index.direction("sibling").map(Direction::sign), Some(0));
        assert!(!index.contains("cousin"));
    }

    #[test]
    fn test_require_unknown_name() {
        let index = RelationshipIndex::new(vec![RelationshipType::directional("children", "parents")]).unwrap();
        let err = index.require("cousin").unwrap_err();
        assert!(matches!(err, TraceablesError::InvalidRelationshipName { ref name, .. } if name == "cousin"));
    }

    #[test]
    fn test_conflicting_declarations_rejected() {
        let types = vec![
            RelationshipType::directional("children", "parents"),
            RelationshipType::directional("children", "owners"),
        ];
        assert!(RelationshipIndex::new(types).is_err());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let bad_symmetric = RelationshipType {
            forward: "a".to_string(),
            backward: "b".to_string(),
            directional: false,
        };
        assert!(RelationshipIndex::new(vec![bad_symmetric]).is_err());
        assert!(RelationshipIndex::new(vec![RelationshipType::directional("x", "x")]).is_err());
    }

    #[test]
    fn test_repeated_identical_declaration_is_fine() {
        let types = vec![
            RelationshipType::directional("children", "parents"),
            RelationshipType::directional("children", "parents"),
        ];
        assert!(RelationshipIndex::new(types).is_ok());
    }
}
