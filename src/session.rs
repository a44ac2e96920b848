//! One build session: the registry, its relationship index and everything
//! queries need, behind a single owner.
//!
//! Mutations (`register_item`, `resolve`, `purge_document`) take `&mut self`;
//! queries take `&self` and never see a half-resolved registry.

use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::filter::{filter_items, is_valid_identifier, ExpressionCache};
use crate::graph::{GraphRequest, GraphResult, GraphWalker};
use crate::matrix::{Matrix, MatrixBuilder, MatrixRequest};
use crate::model::{Item, Origin, RelationshipIndex, RelationshipType};
use crate::registry::Registry;
use crate::resolve::{RelationshipResolver, ResolveSummary};
use crate::{Result, TraceablesError};

pub struct BuildSession {
    registry: Registry,
    index: RelationshipIndex,
    diagnostics: Diagnostics,
    filter_cache: ExpressionCache,
}

impl BuildSession {
    pub fn new(relationships: Vec<RelationshipType>, cache_capacity: usize) -> Result<Self> {
        Ok(Self {
            registry: Registry::new(),
            index: RelationshipIndex::new(relationships)?,
            diagnostics: Diagnostics::new(),
            filter_cache: ExpressionCache::new(cache_capacity),
        })
    }

    /// Register one declared traceable.
    ///
    /// A duplicate tag is recorded as a diagnostic and returned as an error;
    /// the first declaration stays in place. Attribute names a filter could
    /// never reference are kept but reported.
    pub fn register_item(
        &mut self,
        tag: &str,
        attributes: BTreeMap<String, String>,
        origin: Origin,
    ) -> Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(TraceablesError::Parse(format!(
                "{}: traceable declared without a tag",
                origin
            )));
        }

        for name in attributes.keys().filter(|name| !is_valid_identifier(name)) {
            self.diagnostics.record_registration(Diagnostic {
                kind: DiagnosticKind::InvalidAttributeName,
                tag: tag.to_string(),
                message: format!(
                    "Traceable '{}' has invalid attribute name '{}'; it cannot be used in filters",
                    tag, name
                ),
                location: Some(origin.clone()),
            });
        }

        let item = Item::declared(tag, attributes, origin);
        if let Err(err) = self.registry.register(item) {
            self.diagnostics.record_registration(Diagnostic {
                kind: DiagnosticKind::DuplicateTag,
                tag: err.tag.clone(),
                message: format!("More than one traceable with tag '{}' found!", err.tag),
                location: Some(err.duplicate.clone()),
            });
            return Err(err.into());
        }
        log::debug!("Registered traceable '{}'", tag);
        Ok(())
    }

    /// Recompute all relationships from scratch.
    pub fn resolve(&mut self) -> ResolveSummary {
        RelationshipResolver::new(&self.index).resolve(&mut self.registry, &mut self.diagnostics)
    }

    /// Remove everything declared in `document` and re-resolve.
    ///
    /// Items that still reference a purged tag keep the link, now to a
    /// placeholder.
    pub fn purge_document(&mut self, document: &str) -> Vec<String> {
        let removed = self.forget_document(document);
        self.resolve();
        removed
    }

    /// Purge without resolving; callers must resolve before the next query.
    pub(crate) fn forget_document(&mut self, document: &str) -> Vec<String> {
        let removed = self.registry.purge_by_origin(document);
        self.diagnostics.purge_document(document);
        for tag in &removed {
            // A promoted duplicate is no longer a duplicate.
            if let Some(origin) = self.registry.get(tag).and_then(|item| item.origin.as_ref()) {
                self.diagnostics.dismiss(DiagnosticKind::DuplicateTag, tag, origin);
            }
        }
        if !removed.is_empty() {
            log::info!("Purged {} traceables from {}", removed.len(), document);
        }
        removed
    }

    /// Items matching `expression`, in tag order.
    pub fn filter(&self, expression: &str) -> Result<Vec<&Item>> {
        let expression = self.filter_cache.get_or_parse(expression)?;
        Ok(filter_items(self.registry.all(), &expression))
    }

    pub fn item(&self, tag: &str) -> Result<&Item> {
        self.registry
            .get(tag)
            .ok_or_else(|| TraceablesError::UnknownTag(tag.to_string()))
    }

    pub fn matrix(&self, request: &MatrixRequest) -> Result<Matrix<'_>> {
        self.matrix_builder().build(request)
    }

    /// The matrix for `request`, split by its page limits.
    pub fn matrix_pages(&self, request: &MatrixRequest) -> Result<Vec<Matrix<'_>>> {
        self.matrix_builder().build_pages(request)
    }

    pub fn graph(&self, request: &GraphRequest) -> Result<GraphResult<'_>> {
        GraphWalker::new(&self.registry, &self.index).walk(request)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn relationships(&self) -> &RelationshipIndex {
        &self.index
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn matrix_builder(&self) -> MatrixBuilder<'_> {
        MatrixBuilder::new(&self.registry, &self.index, &self.filter_cache)
    }
}
