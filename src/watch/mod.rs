//! File watcher: refresh the project when source documents change.
//!
//! The notify thread only reports paths. Every mutation of the build session
//! happens on the calling thread, one refresh per debounced batch.

mod watcher;

pub use watcher::run_watcher_thread;

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::error::Result;
use crate::ingest::{is_source_file, Project, RefreshSummary};
use crate::session::BuildSession;

/// Whether a changed path can affect the registry: a source document below
/// `root`. Deleted files count, so the path is not required to exist.
pub fn is_relevant(path: &Path, root: &Path) -> bool {
    path.starts_with(root) && is_source_file(path)
}

/// Refresh `project` if any of `paths` is relevant.
///
/// Returns `None` when the batch held nothing worth a refresh.
pub fn handle_changes(
    paths: &[PathBuf],
    project: &mut Project,
    session: &mut BuildSession,
) -> Result<Option<RefreshSummary>> {
    let root = project.root().to_path_buf();
    let relevant: Vec<&PathBuf> = paths.iter().filter(|p| is_relevant(p, &root)).collect();
    if relevant.is_empty() {
        return Ok(None);
    }
    for path in &relevant {
        log::debug!("watch: changed {}", path.display());
    }

    let summary = project.refresh(session)?;
    if summary.has_changes() {
        let problems = session.diagnostics().len();
        for diagnostic in session.diagnostics().iter() {
            log::warn!("{}", diagnostic);
        }
        log::info!(
            "watch: {} traceables, {} problem(s)",
            session.registry().len(),
            problems
        );
    }
    Ok(Some(summary))
}

/// Watch the project root until the watcher thread stops.
pub fn run_watcher(project: &mut Project, session: &mut BuildSession, debounce: Duration) -> Result<()> {
    let root = project.root().to_path_buf();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        if let Err(e) = run_watcher_thread(&root, debounce, tx) {
            log::error!("watcher thread error: {}", e);
        }
    });

    while let Ok(paths) = rx.recv() {
        if let Err(e) = handle_changes(&paths, project, session) {
            log::error!("watch refresh failed: {}", e);
        }
    }
    Ok(())
}
