//! Defines the central, mutable state of the application.

use crate::config::{self, AppConfig};
use crate::core::{FileTree, NodeId, Selection};
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` to allow for safe, shared access
/// from the command handlers and the background scan task.
pub struct AppState {
    /// The application's configuration settings.
    pub config: AppConfig,
    /// Where the configuration is persisted; `None` means the platform default.
    pub config_path: Option<PathBuf>,
    /// The root of the tree currently shown, normalized.
    pub current_root: Option<PathBuf>,
    /// The tree of the last successful scan.
    pub tree: Option<FileTree>,
    /// Selection flags for `tree`. Replaced together with it.
    pub selection: Selection,
    /// The defect description typed by the user.
    pub description: String,
    /// `true` while a directory scan is in progress.
    pub is_scanning: bool,
    /// A handle to the currently running scan task, allowing it to be aborted.
    pub scan_task: Option<JoinHandle<()>>,
    /// Bumped for every scan request; results from older requests are dropped.
    pub scan_generation: u64,
    /// The last generated prompt, without any clipboard notice.
    pub generated_prompt: Option<String>,
    /// A short human-readable status line.
    pub status: String,
}

impl AppState {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            current_root: None,
            tree: None,
            selection: Selection::default(),
            description: String::new(),
            is_scanning: false,
            scan_task: None,
            scan_generation: 0,
            generated_prompt: None,
            status: "Ready.".to_string(),
        }
    }

    /// Aborts the running scan task, if any.
    pub fn cancel_current_scan(&mut self) {
        if let Some(handle) = self.scan_task.take() {
            tracing::info!("Aborting running scan task.");
            handle.abort();
        }
        self.is_scanning = false;
    }

    /// Drops the current tree, its selection and any running scan.
    pub fn clear_tree(&mut self) {
        self.cancel_current_scan();
        self.scan_generation += 1;
        self.tree = None;
        self.selection = Selection::default();
        self.current_root = None;
        self.generated_prompt = None;
    }

    /// Swaps in a freshly scanned tree with an empty selection.
    pub fn install_tree(&mut self, root: PathBuf, tree: FileTree) {
        self.selection = Selection::new(&tree);
        self.tree = Some(tree);
        self.current_root = Some(root);
        self.generated_prompt = None;
    }

    /// Toggles a node of the current tree. Returns `false` if there is no tree,
    /// a scan is running, or the id is out of range.
    pub fn toggle(&mut self, id: NodeId) -> bool {
        if self.is_scanning {
            tracing::warn!("Ignoring selection change while a scan is running.");
            return false;
        }
        match &self.tree {
            Some(tree) if id.0 < tree.len() => {
                self.selection.toggle(tree, id);
                true
            }
            Some(_) => {
                tracing::warn!("Ignoring toggle of unknown node {:?}.", id);
                false
            }
            None => {
                tracing::warn!("Ignoring toggle: no folder has been scanned.");
                false
            }
        }
    }

    /// Persists the configuration, logging instead of failing.
    pub fn persist_config(&self) {
        if let Err(e) = config::settings::save_config(&self.config, self.config_path.as_deref()) {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
