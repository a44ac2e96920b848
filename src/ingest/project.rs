//! A source folder loaded into a build session, kept in sync by content hash.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{Result, TraceablesError};
use crate::ingest::{classify_files, discover_files, find_deleted_documents, FileMetadata, ParserRegistry};
use crate::model::Origin;
use crate::session::BuildSession;

/// What a refresh changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
    /// Declarations registered during this refresh, duplicates included.
    pub declarations: usize,
}

impl RefreshSummary {
    pub fn has_changes(&self) -> bool {
        self.added + self.modified + self.removed > 0
    }
}

pub struct Project {
    root: PathBuf,
    parsers: ParserRegistry,
    /// Relative path -> content hash as of the last refresh.
    hashes: HashMap<String, String>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            parsers: ParserRegistry::new(),
            hashes: HashMap::new(),
        }
    }

    /// Register every document below `root` and resolve.
    pub fn load(root: impl Into<PathBuf>, session: &mut BuildSession) -> Result<(Self, RefreshSummary)> {
        let mut project = Self::new(root);
        let summary = project.refresh(session)?;
        Ok((project, summary))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bring `session` in line with the files on disk.
    ///
    /// Modified and deleted documents are purged, new and modified ones are
    /// registered, then relationships are resolved once. Unchanged documents
    /// are not re-read. Nothing fails between the purge and the resolve; an
    /// unreadable document is skipped and counts as changed.
    pub fn refresh(&mut self, session: &mut BuildSession) -> Result<RefreshSummary> {
        let files = discover_files(&self.root)?;
        let classification = classify_files(&files, &self.hashes)?;
        let on_disk: HashSet<String> = files.iter().map(|f| f.relative_path.clone()).collect();
        let deleted = find_deleted_documents(&self.hashes, &on_disk);

        for document in deleted
            .iter()
            .chain(classification.modified_files.iter().map(|f| &f.relative_path))
        {
            session.forget_document(document);
        }

        let mut declarations = 0;
        for file in classification
            .new_files
            .iter()
            .chain(&classification.modified_files)
        {
            declarations += self.register_file(file, session);
        }

        let summary = RefreshSummary {
            added: classification.new_files.len(),
            modified: classification.modified_files.len(),
            removed: deleted.len(),
            unchanged: classification.unchanged_files.len(),
            declarations,
        };
        self.hashes = classification.hashes;

        if summary.has_changes() {
            session.resolve();
        }
        log::info!(
            "Refreshed {}: {} added, {} modified, {} removed, {} unchanged",
            self.root.display(),
            summary.added,
            summary.modified,
            summary.removed,
            summary.unchanged
        );
        Ok(summary)
    }

    /// Register the declarations of one file. A file that cannot be read,
    /// is not UTF-8 or fails to parse is logged and contributes nothing.
    fn register_file(&self, file: &FileMetadata, session: &mut BuildSession) -> usize {
        let declarations = match read_source(file).and_then(|content| {
            self.parsers
                .parse(&content, &file.relative_path, &file.extension)
        }) {
            Ok(declarations) => declarations,
            Err(e) => {
                log::warn!("Skipping {}: {}", file.relative_path, e);
                return 0;
            }
        };

        let count = declarations.len();
        for declaration in declarations {
            let origin = Origin::new(file.relative_path.as_str(), declaration.line);
            match session.register_item(&declaration.tag, declaration.attributes, origin) {
                // Already recorded as a diagnostic.
                Ok(()) | Err(TraceablesError::DuplicateTag(_)) => {}
                Err(e) => log::warn!("{}", e),
            }
        }
        log::debug!("Registered {} traceables from {}", count, file.relative_path);
        count
    }
}

fn read_source(file: &FileMetadata) -> Result<String> {
    let bytes = std::fs::read(&file.absolute_path)?;
    String::from_utf8(bytes).map_err(|e| {
        TraceablesError::Parse(format!("{} is not valid UTF-8: {}", file.relative_path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::model::default_relationships;
    use std::fs;
    use tempfile::TempDir;

    fn session() -> BuildSession {
        BuildSession::new(default_relationships(), 16).unwrap()
    }

    fn write_sources(root: &Path) {
        fs::write(
            root.join("index.rst"),
            ".. traceable:: REQ-0\n    :title: Root\n\n.. traceable:: REQ-1\n    :parents: REQ-0\n",
        )
        .unwrap();
        fs::write(
            root.join("design.md"),
            "# Design\n\n```traceable DES-0\nparents: REQ-1\n```\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_registers_and_resolves() {
        let temp_dir = TempDir::new().unwrap();
        write_sources(temp_dir.path());

        let mut session = session();
        let (_project, summary) = Project::load(temp_dir.path(), &mut session).unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.declarations, 3);

        let req1 = session.item("REQ-1").unwrap();
        assert!(req1.is_related("children", "DES-0"));
        assert_eq!(req1.origin, Some(Origin::new("index.rst", 4)));
        assert_eq!(session.item("DES-0").unwrap().origin, Some(Origin::new("design.md", 3)));
    }

    #[test]
    fn test_refresh_without_changes() {
        let temp_dir = TempDir::new().unwrap();
        write_sources(temp_dir.path());

        let mut session = session();
        let (mut project, _) = Project::load(temp_dir.path(), &mut session).unwrap();
        let summary = project.refresh(&mut session).unwrap();
        assert!(!summary.has_changes());
        assert_eq!(summary.unchanged, 2);
        assert_eq!(session.registry().len(), 3);
    }

    #[test]
    fn test_refresh_modified_and_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_sources(root);

        let mut session = session();
        let (mut project, _) = Project::load(root, &mut session).unwrap();

        fs::write(root.join("index.rst"), ".. traceable:: REQ-1\n    :color: red\n").unwrap();
        let summary = project.refresh(&mut session).unwrap();
        assert_eq!(summary.modified, 1);
        assert!(session.item("REQ-1").unwrap().attributes.contains_key("color"));
        assert!(session.item("REQ-0").is_err());

        fs::remove_file(root.join("index.rst")).unwrap();
        let summary = project.refresh(&mut session).unwrap();
        assert_eq!(summary.removed, 1);

        // DES-0 still names REQ-1, which now survives only as a placeholder.
        let placeholder = session.item("REQ-1").unwrap();
        assert!(!placeholder.is_resolved());
        assert!(placeholder.is_related("children", "DES-0"));
        assert_eq!(
            session.diagnostics().of_kind(DiagnosticKind::UnresolvedReference).count(),
            1
        );
    }

    #[test]
    fn test_unparseable_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("broken.yaml"), "key: value\n").unwrap();
        fs::write(root.join("ok.txt"), ".. traceable:: OK\n").unwrap();

        let mut session = session();
        let (_project, summary) = Project::load(root, &mut session).unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.declarations, 1);
        assert!(session.item("OK").is_ok());
    }

    #[test]
    fn test_duplicates_across_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.rst"), ".. traceable:: DUP\n    :title: A\n").unwrap();
        fs::write(root.join("b.rst"), ".. traceable:: DUP\n    :title: B\n").unwrap();

        let mut session = session();
        let (mut project, _) = Project::load(root, &mut session).unwrap();
        assert_eq!(session.item("DUP").unwrap().title(), "A");
        assert_eq!(session.diagnostics().of_kind(DiagnosticKind::DuplicateTag).count(), 1);

        fs::remove_file(root.join("a.rst")).unwrap();
        project.refresh(&mut session).unwrap();
        assert_eq!(session.item("DUP").unwrap().title(), "B");
    }

    #[test]
    fn test_non_utf8_file_is_skipped_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_sources(root);
        fs::write(root.join("latin1.txt"), b"caf\xe9\n.. traceable:: CAFE\n").unwrap();

        let mut session = session();
        let (_project, summary) = Project::load(root, &mut session).unwrap();
        assert_eq!(summary.added, 3);
        assert_eq!(summary.declarations, 3);
        assert!(session.item("REQ-1").is_ok());
        assert!(session.item("CAFE").is_err());
    }

    #[test]
    fn test_refresh_resolves_after_unreadable_rewrite() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.rst"), ".. traceable:: REQ-0\n").unwrap();
        fs::write(root.join("b.rst"), ".. traceable:: REQ-1\n    :parents: REQ-0\n").unwrap();

        let mut session = session();
        let (mut project, _) = Project::load(root, &mut session).unwrap();
        assert!(session.item("REQ-0").unwrap().is_resolved());

        fs::write(root.join("a.rst"), b".. traceable:: REQ-0\n\xff\xfe\n").unwrap();
        let summary = project.refresh(&mut session).unwrap();
        assert_eq!(summary.modified, 1);
        assert_eq!(summary.declarations, 0);

        // REQ-0 was purged; REQ-1 now links to its placeholder.
        let placeholder = session.item("REQ-0").unwrap();
        assert!(!placeholder.is_resolved());
        assert!(placeholder.is_related("children", "REQ-1"));
        assert!(session.item("REQ-1").unwrap().is_related("parents", "REQ-0"));

        // The bad content is remembered and not re-read.
        let summary = project.refresh(&mut session).unwrap();
        assert!(!summary.has_changes());
    }
}
