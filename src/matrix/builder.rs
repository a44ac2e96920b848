use std::collections::BTreeSet;

use serde::Deserialize;

use super::Matrix;
use crate::filter::{filter_items, ExpressionCache};
use crate::model::{Item, RelationshipIndex};
use crate::registry::Registry;
use crate::Result;

/// What a matrix should contain and how it should be paged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatrixRequest {
    pub relationship: String,
    #[serde(default)]
    pub filter_primaries: Option<String>,
    #[serde(default)]
    pub filter_secondaries: Option<String>,
    #[serde(default)]
    pub max_primaries: Option<usize>,
    #[serde(default)]
    pub max_secondaries: Option<usize>,
}

impl MatrixRequest {
    pub fn new(relationship: impl Into<String>) -> Self {
        Self {
            relationship: relationship.into(),
            ..Self::default()
        }
    }
}

/// Builds matrices from a resolved registry.
pub struct MatrixBuilder<'a> {
    registry: &'a Registry,
    index: &'a RelationshipIndex,
    cache: &'a ExpressionCache,
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(registry: &'a Registry, index: &'a RelationshipIndex, cache: &'a ExpressionCache) -> Self {
        Self {
            registry,
            index,
            cache,
        }
    }

    /// Full matrix for `request`, ignoring its page limits.
    pub fn build(&self, request: &MatrixRequest) -> Result<Matrix<'a>> {
        self.index.require(&request.relationship)?;
        let opposite = self
            .index
            .opposite(&request.relationship)
            .unwrap_or(&request.relationship);

        let primaries = self.admissible(request.filter_primaries.as_deref())?;
        let secondaries: BTreeSet<&str> = self
            .admissible(request.filter_secondaries.as_deref())?
            .into_iter()
            .map(|item| item.tag.as_str())
            .collect();

        let mut matrix = Matrix::new(request.relationship.as_str(), opposite);
        for primary in primaries {
            for tag in primary.relatives(&request.relationship) {
                if !secondaries.contains(tag) {
                    continue;
                }
                if let Some(secondary) = self.registry.get(tag) {
                    matrix.add_pair(primary, secondary);
                }
            }
        }

        log::debug!(
            "Matrix '{}': {} primaries x {} secondaries",
            request.relationship,
            matrix.primaries().len(),
            matrix.secondaries().len()
        );
        Ok(matrix)
    }

    /// The matrix for `request`, split by its page limits.
    pub fn build_pages(&self, request: &MatrixRequest) -> Result<Vec<Matrix<'a>>> {
        let matrix = self.build(request)?;
        Ok(matrix.split(request.max_secondaries, request.max_primaries))
    }

    fn admissible(&self, filter: Option<&str>) -> Result<Vec<&'a Item>> {
        let registry: &'a Registry = self.registry;
        match filter.map(str::trim).filter(|f| !f.is_empty()) {
            Some(filter) => {
                let expression = self.cache.get_or_parse(filter)?;
                Ok(filter_items(registry.all(), &expression))
            }
            None => Ok(registry.all().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::model::{default_relationships, Origin};
    use crate::resolve::RelationshipResolver;
    use crate::TraceablesError;
    use std::collections::BTreeMap;

    fn declare(registry: &mut Registry, tag: &str, attributes: &[(&str, &str)]) {
        let attributes: BTreeMap<String, String> = attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        registry
            .register(Item::declared(tag, attributes, Origin::new("index.rst", 1)))
            .unwrap();
    }

    fn fixture() -> (Registry, RelationshipIndex) {
        let index = RelationshipIndex::new(default_relationships()).unwrap();
        let mut registry = Registry::new();
        declare(&mut registry, "CEPHEUS", &[("color", "red")]);
        declare(&mut registry, "SAGITTA", &[("color", "blue")]);
        declare(&mut registry, "AQUILA", &[("parents", "CEPHEUS, SAGITTA"), ("color", "red")]);
        declare(&mut registry, "LYRA", &[("parents", "CEPHEUS, VEGA")]);
        let mut diagnostics = Diagnostics::new();
        RelationshipResolver::new(&index).resolve(&mut registry, &mut diagnostics);
        (registry, index)
    }

    fn tags(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.tag.clone()).collect()
    }

    #[test]
    fn test_build_unfiltered() {
        let (registry, index) = fixture();
        let cache = ExpressionCache::new(8);
        let builder = MatrixBuilder::new(&registry, &index, &cache);

        let matrix = builder.build(&MatrixRequest::new("children")).unwrap();
        assert_eq!(matrix.relationship(), "children");
        assert_eq!(matrix.opposite(), "parents");
        assert_eq!(tags(matrix.primaries()), vec!["CEPHEUS", "SAGITTA", "VEGA"]);
        assert_eq!(tags(matrix.secondaries()), vec!["AQUILA", "LYRA"]);
        assert_eq!(matrix.boolean_row("SAGITTA"), vec![true, false]);
        assert_eq!(matrix.boolean_row("VEGA"), vec![false, true]);
    }

    #[test]
    fn test_placeholder_participates() {
        let (registry, index) = fixture();
        let cache = ExpressionCache::new(8);
        let builder = MatrixBuilder::new(&registry, &index, &cache);

        let matrix = builder.build(&MatrixRequest::new("parents")).unwrap();
        assert_eq!(tags(matrix.primaries()), vec!["AQUILA", "LYRA"]);
        assert_eq!(tags(matrix.secondaries()), vec!["CEPHEUS", "SAGITTA", "VEGA"]);
        assert!(!matrix.secondaries()[2].is_resolved());
    }

    #[test]
    fn test_filters_restrict_both_axes() {
        let (registry, index) = fixture();
        let cache = ExpressionCache::new(8);
        let builder = MatrixBuilder::new(&registry, &index, &cache);

        let request = MatrixRequest {
            filter_primaries: Some("color == 'red'".to_string()),
            ..MatrixRequest::new("children")
        };
        let matrix = builder.build(&request).unwrap();
        assert_eq!(tags(matrix.primaries()), vec!["CEPHEUS"]);

        // Placeholders have no attributes, so an attribute filter drops VEGA.
        let request = MatrixRequest {
            filter_secondaries: Some("color in ['red', 'blue']".to_string()),
            ..MatrixRequest::new("parents")
        };
        let matrix = builder.build(&request).unwrap();
        assert_eq!(tags(matrix.primaries()), vec!["AQUILA", "LYRA"]);
        assert_eq!(tags(matrix.secondaries()), vec!["CEPHEUS", "SAGITTA"]);
    }

    #[test]
    fn test_invalid_relationship_name() {
        let (registry, index) = fixture();
        let cache = ExpressionCache::new(8);
        let builder = MatrixBuilder::new(&registry, &index, &cache);

        let err = builder.build(&MatrixRequest::new("cousin")).unwrap_err();
        match err {
            TraceablesError::InvalidRelationshipName { name, available } => {
                assert_eq!(name, "cousin");
                assert!(available.contains(&"children".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_filter_syntax_error_fails_request() {
        let (registry, index) = fixture();
        let cache = ExpressionCache::new(8);
        let builder = MatrixBuilder::new(&registry, &index, &cache);

        let request = MatrixRequest {
            filter_primaries: Some("color is 'red'".to_string()),
            ..MatrixRequest::new("children")
        };
        assert!(matches!(builder.build(&request), Err(TraceablesError::FilterSyntax(_))));
    }

    #[test]
    fn test_build_pages() {
        let (registry, index) = fixture();
        let cache = ExpressionCache::new(8);
        let builder = MatrixBuilder::new(&registry, &index, &cache);

        let request = MatrixRequest {
            max_secondaries: Some(2),
            max_primaries: Some(1),
            ..MatrixRequest::new("parents")
        };
        let pages = builder.build_pages(&request).unwrap();
        assert_eq!(pages.len(), 4);
        assert_eq!(tags(pages[3].primaries()), vec!["LYRA"]);
        assert_eq!(tags(pages[3].secondaries()), vec!["VEGA"]);
        assert_eq!(pages[3].boolean_row("LYRA"), vec![true]);
    }
}
