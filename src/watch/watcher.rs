//! Watcher thread: notify + debounce, send settled path batches to main.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};

use crate::error::{Result, TraceablesError};

/// Watch `root` recursively and send batches of paths over `tx` once no new
/// event has touched them for `debounce`.
///
/// Returns when the receiving side hangs up or the watcher fails.
pub fn run_watcher_thread(root: &Path, debounce: Duration, tx: mpsc::Sender<Vec<PathBuf>>) -> Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<Vec<PathBuf>>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                let _ = event_tx.send(event.paths);
            }
            Err(e) => log::warn!("watch error: {}", e),
        }
    })
    .map_err(|e| TraceablesError::Config(format!("cannot start watcher: {}", e)))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| TraceablesError::Config(format!("cannot watch {}: {}", root.display(), e)))?;

    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();

    loop {
        match event_rx.recv_timeout(debounce) {
            Ok(paths) => {
                let now = Instant::now();
                for path in paths {
                    pending.insert(path, now);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let ready = take_settled(&mut pending, Instant::now(), debounce);
                if !ready.is_empty() && tx.send(ready).is_err() {
                    return Ok(());
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

/// Remove and return, sorted, the paths quiet for at least `debounce`.
fn take_settled(pending: &mut HashMap<PathBuf, Instant>, now: Instant, debounce: Duration) -> Vec<PathBuf> {
    let mut ready: Vec<PathBuf> = pending
        .iter()
        .filter(|(_, seen)| now.duration_since(**seen) >= debounce)
        .map(|(path, _)| path.clone())
        .collect();
    for path in &ready {
        pending.remove(path);
    }
    ready.sort();
    ready
}
