//! Relationship resolution: one full pass over the registry.
//!
//! Relationships are never patched incrementally. Each pass starts from the
//! declared items alone (placeholders and previous links are discarded), so
//! running it twice over the same registry yields the same result.

use std::collections::BTreeSet;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::model::{split_tags, Origin, RelationshipIndex};
use crate::registry::Registry;

/// Counters reported after a resolve pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSummary {
    pub declared: usize,
    pub placeholders: usize,
    /// Directed links stored, counting both directions of a pair.
    pub links: usize,
}

struct Link {
    from: String,
    to: String,
    name: String,
}

struct Reference {
    referrer: String,
    origin: Option<Origin>,
    tag: String,
}

pub struct RelationshipResolver<'a> {
    index: &'a RelationshipIndex,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(index: &'a RelationshipIndex) -> Self {
        Self { index }
    }

    /// Recompute every item's relationships from its attributes.
    pub fn resolve(&self, registry: &mut Registry, diagnostics: &mut Diagnostics) -> ResolveSummary {
        registry.reset_resolution();
        diagnostics.clear_resolution();

        let declared = registry.len();
        let (links, references) = self.collect(registry);

        let mut reported: BTreeSet<(String, String)> = BTreeSet::new();
        let mut placeholders = 0;
        for reference in &references {
            if registry.contains(&reference.tag) {
                if registry.get(&reference.tag).is_some_and(|item| item.is_resolved()) {
                    continue;
                }
            } else {
                registry.get_or_create_placeholder(&reference.tag);
                placeholders += 1;
            }
            if reported.insert((reference.referrer.clone(), reference.tag.clone())) {
                diagnostics.record_resolution(Diagnostic {
                    kind: DiagnosticKind::UnresolvedReference,
                    tag: reference.tag.clone(),
                    message: format!(
                        "Traceables: no traceable with tag '{}' found (referenced by '{}')",
                        reference.tag, reference.referrer
                    ),
                    location: reference.origin.clone(),
                });
            }
        }

        let mut stored = 0;
        for link in &links {
            let item = registry.get_or_create_placeholder(&link.from);
            if !item.is_related(&link.name, &link.to) {
                item.add_relative(&link.name, &link.to);
                stored += 1;
            }
        }

        log::info!(
            "Resolved relationships: {} declared, {} placeholders, {} links",
            declared,
            placeholders,
            stored
        );

        ResolveSummary {
            declared,
            placeholders,
            links: stored,
        }
    }

    fn collect(&self, registry: &Registry) -> (Vec<Link>, Vec<Reference>) {
        let mut links = Vec::new();
        let mut references = Vec::new();

        for declaration in self.index.types() {
            let primary = declaration.forward.as_str();
            let secondary = declaration.backward.as_str();

            for item in registry.all().filter(|item| item.is_resolved()) {
                // `primary: X` means item -primary-> X, `secondary: X` means X -primary-> item.
                for (attribute, outgoing, incoming) in [(primary, primary, secondary), (secondary, secondary, primary)] {
                    let Some(value) = item.attributes.get(attribute) else {
                        continue;
                    };
                    for tag in split_tags(value) {
                        links.push(Link {
                            from: item.tag.clone(),
                            to: tag.to_string(),
                            name: outgoing.to_string(),
                        });
                        links.push(Link {
                            from: tag.to_string(),
                            to: item.tag.clone(),
                            name: incoming.to_string(),
                        });
                        references.push(Reference {
                            referrer: item.tag.clone(),
                            origin: item.origin.clone(),
                            tag: tag.to_string(),
                        });
                    }
                    if primary == secondary {
                        break;
                    }
                }
            }
        }

        (links, references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_relationships, Item, RelationshipType};
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

    fn relatives(registry: &Registry, tag: &str, name: &str) -> Vec<String> {
        registry
            .get(tag)
            .map(|item| item.relatives(name).map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn assert_symmetric_closure(registry: &Registry, index: &RelationshipIndex) {
        for item in registry.all() {
            for (name, tags) in &item.relationships {
                let opposite = index.opposite(name).unwrap();
                for tag in tags {
                    let other = registry.get(tag).unwrap();
                    assert!(
                        other.is_related(opposite, &item.tag),
                        "{} -{}-> {} has no {} link back",
                        item.tag,
                        name,
                        tag,
                        opposite
                    );
                }
            }
        }
    }

    #[test]
    fn test_parent_child_scenario() {
        let index = RelationshipIndex::new(vec![RelationshipType::directional("children", "parents")]).unwrap();
        let mut registry = Registry::new();
        let mut diagnostics = Diagnostics::new();
        declare(&mut registry, "REQ-0", &[]);
        declare(&mut registry, "REQ-1", &[("parents", "REQ-0")]);

        RelationshipResolver::new(&index).resolve(&mut registry, &mut diagnostics);

        assert_eq!(relatives(&registry, "REQ-0", "children"), vec!["REQ-1"]);
        assert_eq!(relatives(&registry, "REQ-1", "parents"), vec!["REQ-0"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_reference_creates_placeholder() {
        let index = RelationshipIndex::new(default_relationships()).unwrap();
        let mut registry = Registry::new();
        let mut diagnostics = Diagnostics::new();
        declare(&mut registry, "TEST-1", &[("parents", "REQ-404, REQ-405")]);

        let summary = RelationshipResolver::new(&index).resolve(&mut registry, &mut diagnostics);

        assert_eq!(summary.placeholders, 2);
        let ghost = registry.get("REQ-404").unwrap();
        assert!(!ghost.is_resolved());
        assert!(ghost.attributes.is_empty());
        assert_eq!(relatives(&registry, "REQ-404", "children"), vec!["TEST-1"]);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::UnresolvedReference).count(), 2);
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.location, Some(Origin::new("index.rst", 1)));
    }

    #[test]
    fn test_both_attribute_sides_and_symmetric_closure() {
        let index = RelationshipIndex::new(default_relationships()).unwrap();
        let mut registry = Registry::new();
        let mut diagnostics = Diagnostics::new();
        declare(&mut registry, "A", &[("children", "B, C"), ("sibling", "D")]);
        declare(&mut registry, "B", &[("parents", "A")]);
        declare(&mut registry, "C", &[]);
        declare(&mut registry, "D", &[("output", "E")]);
        declare(&mut registry, "E", &[("used-in", "A")]);

        RelationshipResolver::new(&index).resolve(&mut registry, &mut diagnostics);

        assert_eq!(relatives(&registry, "A", "children"), vec!["B", "C"]);
        assert_eq!(relatives(&registry, "C", "parents"), vec!["A"]);
        assert_eq!(relatives(&registry, "D", "sibling"), vec!["A"]);
        assert_eq!(relatives(&registry, "E", "created-in"), vec!["D"]);
        assert_eq!(relatives(&registry, "A", "input"), vec!["E"]);
        assert_symmetric_closure(&registry, &index);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let index = RelationshipIndex::new(default_relationships()).unwrap();
        let mut registry = Registry::new();
        let mut diagnostics = Diagnostics::new();
        declare(&mut registry, "A", &[("parents", "B, MISSING")]);
        declare(&mut registry, "B", &[("sibling", "A")]);

        let resolver = RelationshipResolver::new(&index);
        let first = resolver.resolve(&mut registry, &mut diagnostics);
        let snapshot: Vec<Item> = registry.all().cloned().collect();
        let second = resolver.resolve(&mut registry, &mut diagnostics);
        let again: Vec<Item> = registry.all().cloned().collect();

        assert_eq!(first, second);
        assert_eq!(snapshot, again);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::UnresolvedReference).count(), 1);
    }

    #[test]
    fn test_unconfigured_attribute_is_plain_data() {
        let index = RelationshipIndex::new(vec![RelationshipType::directional("children", "parents")]).unwrap();
        let mut registry = Registry::new();
        let mut diagnostics = Diagnostics::new();
        declare(&mut registry, "A", &[("owner", "B")]);

        let summary = RelationshipResolver::new(&index).resolve(&mut registry, &mut diagnostics);
        assert_eq!(summary.links, 0);
        assert!(registry.get("B").is_none());
    }
}
