//! Background execution of directory scans.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::events::UserEvent;
use super::helpers::{lock_state, notify_state};
use super::proxy::EventProxy;
use super::state::AppState;

use crate::core::{normalize_path, CoreError, DirectoryScanner, FileTree, ScanFilter};

/// Starts scanning `path` in the background.
///
/// A scan already in flight is aborted and its result discarded, so only the
/// newest request ever installs a tree. The previous tree stays in place until
/// the new one is ready; a failed scan leaves it untouched.
pub fn start_scan_on_path<P: EventProxy>(path: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    let directory_path = normalize_path(&path);

    let mut state_guard = lock_state(&state);
    state_guard.cancel_current_scan();
    state_guard.scan_generation += 1;
    let generation = state_guard.scan_generation;
    let filter = state_guard.config.scan_filter();

    state_guard.is_scanning = true;
    state_guard.status = format!("Scanning {}...", directory_path.display());

    let proxy_clone = proxy.clone();
    let state_clone = state.clone();

    tracing::info!("Spawning scan task #{} for {:?}", generation, directory_path);
    let handle = tokio::spawn(async move {
        scan_directory_task(directory_path, filter, generation, proxy_clone, state_clone).await;
    });
    state_guard.scan_task = Some(handle);

    notify_state(&state_guard, &proxy);
}

/// Runs the synchronous scanner on the blocking pool and publishes the result.
async fn scan_directory_task<P: EventProxy>(
    path: PathBuf,
    filter: ScanFilter,
    generation: u64,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    let scan_path = path.clone();
    let scan_result: Result<FileTree, CoreError> =
        tokio::task::spawn_blocking(move || DirectoryScanner::new(filter).scan(&scan_path))
            .await
            .map_err(CoreError::from)
            .and_then(|result| result);

    let mut state_lock = lock_state(&state);
    if state_lock.scan_generation != generation {
        tracing::warn!("Scan #{} was superseded. Discarding results.", generation);
        return;
    }
    state_lock.scan_task = None;
    state_lock.is_scanning = false;

    match scan_result {
        Ok(tree) => {
            let node_count = tree.len();
            state_lock.install_tree(path.clone(), tree);
            state_lock.status = format!("Scan complete. {} entries loaded.", node_count);
            if state_lock.config.root_folder.as_ref() != Some(&path) {
                state_lock.config.root_folder = Some(path);
                state_lock.persist_config();
            }
        }
        Err(e) => {
            tracing::error!("Scan of {:?} failed: {}", path, e);
            state_lock.status = format!("Scan failed: {}", e);
            proxy.send_event(UserEvent::ShowError(e.to_string()));
        }
    }

    notify_state(&state_lock, &proxy);
}
