//! Non-fatal problems found while registering and resolving traceables.
//!
//! Every diagnostic is logged at `warn` level when it is recorded, so a build
//! run with the default log filter shows them without extra plumbing.

use serde::Serialize;

use crate::model::Origin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateTag,
    UnresolvedReference,
    InvalidAttributeName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Tag the diagnostic is about.
    pub tag: String,
    pub message: String,
    pub location: Option<Origin>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(origin) => write!(f, "{}: {}", origin, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Registration-time diagnostics survive until their document is purged;
/// resolution-time diagnostics are rebuilt on every resolve.
#[derive(Debug, Default)]
pub struct Diagnostics {
    registration: Vec<Diagnostic>,
    resolution: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_registration(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.registration.push(diagnostic);
    }

    pub(crate) fn record_resolution(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.resolution.push(diagnostic);
    }

    pub(crate) fn clear_resolution(&mut self) {
        self.resolution.clear();
    }

    /// Drop registration diagnostics raised by declarations in `document`.
    pub(crate) fn purge_document(&mut self, document: &str) {
        self.registration.retain(|d| {
            d.location
                .as_ref()
                .map_or(true, |origin| origin.document != document)
        });
    }

    /// Drop the registration diagnostic of `kind` about `tag` raised at `location`.
    pub(crate) fn dismiss(&mut self, kind: DiagnosticKind, tag: &str, location: &Origin) {
        self.registration.retain(|d| {
            !(d.kind == kind && d.tag == tag && d.location.as_ref() == Some(location))
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.registration.iter().chain(self.resolution.iter())
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.registration.len() + self.resolution.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
