//! Contains the command handlers invoked by the shell.
//!
//! Each handler interacts with the `AppState` and the `core` logic and reports
//! back to the display through `UserEvent`s.

use super::clipboard::ClipboardSink;
use super::events::UserEvent;
use super::file_dialog::DialogService;
use super::helpers::{lock_state, notify_state, with_state_and_notify};
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks::start_scan_on_path;
use crate::config;
use crate::core::{normalize_path, PromptAssembler, PromptRequest, TreeGenerator};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Scans the root remembered in the settings, if there is one.
pub fn initialize<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let saved_root = {
        let state_guard = lock_state(&state);
        if state_guard.tree.is_some() {
            None
        } else {
            state_guard.config.normalized_root()
        }
    };

    match saved_root {
        Some(root) => {
            tracing::info!("Loading saved root folder {:?}", root);
            start_scan_on_path(root, proxy, state);
        }
        None => notify_state(&lock_state(&state), &proxy),
    }
}

/// Opens a folder dialog and scans the chosen root.
pub fn select_root_folder<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    if let Some(path) = dialog.pick_directory() {
        start_scan_on_path(path, proxy, state);
    } else {
        tracing::info!("User cancelled root folder selection.");
        notify_state(&lock_state(&state), &proxy);
    }
}

/// Re-scans the current root. Selection is reset with the new tree.
pub fn rescan_directory<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let current_root = lock_state(&state).current_root.clone();
    if let Some(root) = current_root {
        start_scan_on_path(root, proxy, state);
    }
}

/// Opens a file dialog for the prompt template.
pub fn select_template<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    match dialog.pick_template() {
        Some(path) => set_template(path, proxy, state),
        None => {
            tracing::info!("User cancelled template selection.");
            notify_state(&lock_state(&state), &proxy);
        }
    }
}

/// Opens a file dialog for the context file.
pub fn select_context<P: EventProxy, D: DialogService + ?Sized>(
    dialog: &D,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    match dialog.pick_context() {
        Some(path) => set_context(path, proxy, state),
        None => {
            tracing::info!("User cancelled context selection.");
            notify_state(&lock_state(&state), &proxy);
        }
    }
}

/// Records and persists the template path.
pub fn set_template<P: EventProxy>(path: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.config.prompt_template = Some(normalize_path(&path));
        s.persist_config();
    });
}

/// Records and persists the context file path.
pub fn set_context<P: EventProxy>(path: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.config.context_file = Some(normalize_path(&path));
        s.persist_config();
    });
}

pub fn set_description<P: EventProxy>(text: String, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| s.description = text);
}

/// Toggles a node by its id in the current tree.
pub fn toggle_node<P: EventProxy>(id: usize, proxy: P, state: Arc<Mutex<AppState>>) {
    with_state_and_notify(&state, &proxy, |s| {
        s.toggle(crate::core::NodeId(id));
    });
}

/// Toggles a node addressed by its path relative to the root.
/// Returns `false` when no such node exists in the current tree.
pub fn toggle_path<P: EventProxy>(
    relative: &Path,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) -> bool {
    let mut found = false;
    with_state_and_notify(&state, &proxy, |s| {
        let id = s.tree.as_ref().and_then(|tree| tree.find(relative));
        match id {
            Some(id) => found = s.toggle(id),
            None => tracing::warn!("No node at {:?} in the current tree.", relative),
        }
    });
    found
}

/// Selects every node of the current tree.
pub fn select_all<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    set_all(proxy, state, true);
}

/// Clears the selection.
pub fn deselect_all<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    set_all(proxy, state, false);
}

fn set_all<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>, selected: bool) {
    with_state_and_notify(&state, &proxy, |s| {
        if s.is_scanning {
            tracing::warn!("Ignoring selection change while a scan is running.");
            return;
        }
        if let Some(tree) = &s.tree {
            s.selection.set(tree, tree.root(), selected);
        }
    });
}

/// Builds the prompt from the current state, shows it and copies it.
///
/// A clipboard failure only appends a notice to the displayed text; the
/// generated prompt itself is kept as is.
pub fn generate_prompt<P: EventProxy, C: ClipboardSink + ?Sized>(
    proxy: P,
    state: Arc<Mutex<AppState>>,
    clipboard: &C,
) {
    let prepared = {
        let state_guard = lock_state(&state);
        prepare_request(&state_guard)
    };
    let (mut request, template_path, context_path, max_file_size) = match prepared {
        Ok(parts) => parts,
        Err(message) => {
            tracing::warn!("{}", message);
            proxy.send_event(UserEvent::ShowError(message));
            return;
        }
    };

    let texts = read_optional_text(template_path.as_deref())
        .and_then(|t| read_optional_text(context_path.as_deref()).map(|c| (t, c)));
    match texts {
        Ok((template, context)) => {
            request.template = template;
            request.context = context;
        }
        Err(e) => {
            tracing::error!("Failed to read prompt inputs: {:#}", e);
            proxy.send_event(UserEvent::ShowError(format!("{:#}", e)));
            return;
        }
    }

    let prompt = match PromptAssembler::new(max_file_size).assemble(&request) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("Prompt assembly failed: {}", e);
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
    };

    let (display, status) = match clipboard.copy_text(&prompt) {
        Ok(()) => (prompt.clone(), "Prompt generated and copied to clipboard.".to_string()),
        Err(e) => {
            tracing::warn!("Clipboard copy failed: {}", e);
            (
                format!("{prompt}\n\n[Clipboard error: {e}]"),
                "Prompt generated, but copying to the clipboard failed.".to_string(),
            )
        }
    };

    with_state_and_notify(&state, &proxy, |s| {
        s.generated_prompt = Some(prompt);
        s.status = status;
    });
    proxy.send_event(UserEvent::ShowGeneratedContent(display));
}

/// Replaces the settings with the ones in `path`.
///
/// The current tree is dropped first, so nothing scanned under the old
/// exclusions survives. The imported root is not scanned here; `initialize`
/// picks it up. Returns `false` if the file could not be imported.
pub fn import_config<P: EventProxy>(path: &Path, proxy: P, state: Arc<Mutex<AppState>>) -> bool {
    match config::settings::import_config(path) {
        Ok(new_config) => {
            with_state_and_notify(&state, &proxy, |s| {
                s.clear_tree();
                s.config = new_config;
                s.persist_config();
                s.status = format!("Imported settings from {}.", path.display());
            });
            true
        }
        Err(e) => {
            tracing::error!("Failed to import config from {:?}: {:#}", path, e);
            proxy.send_event(UserEvent::ShowError(format!("Failed to import config: {e:#}")));
            false
        }
    }
}

/// Writes the current settings to `path`. Returns `false` on failure.
pub fn export_config<P: EventProxy>(path: &Path, proxy: P, state: Arc<Mutex<AppState>>) -> bool {
    let config = lock_state(&state).config.clone();
    match config::settings::export_config(&config, path) {
        Ok(()) => {
            with_state_and_notify(&state, &proxy, |s| {
                s.status = format!("Exported settings to {}.", path.display());
            });
            true
        }
        Err(e) => {
            tracing::error!("Failed to export config to {:?}: {:#}", path, e);
            proxy.send_event(UserEvent::ShowError(format!("Failed to export config: {e:#}")));
            false
        }
    }
}

type PreparedRequest = (PromptRequest, Option<PathBuf>, Option<PathBuf>, u64);

/// Snapshots everything generation needs from the state, so the lock is not
/// held during file reads.
fn prepare_request(state: &AppState) -> std::result::Result<PreparedRequest, String> {
    if state.is_scanning {
        return Err("Please wait for the folder scan to finish.".to_string());
    }
    let (Some(tree), Some(root)) = (&state.tree, &state.current_root) else {
        return Err("No root folder has been scanned yet.".to_string());
    };

    let selected_files = state
        .selection
        .selected_files(tree)
        .into_iter()
        .map(|id| tree.path_of(id))
        .collect();
    let tree_diagram = TreeGenerator::render(&tree.pruned(&state.selection));

    let request = PromptRequest {
        description: state.description.clone(),
        root_path: root.clone(),
        selected_files,
        tree_diagram,
        ..PromptRequest::default()
    };

    Ok((
        request,
        state.config.prompt_template.as_deref().map(normalize_path),
        state.config.context_file.as_deref().map(normalize_path),
        state.config.max_file_size_bytes(),
    ))
}

/// Reads a template or context file. An unset or nonexistent path reads as empty.
fn read_optional_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path.exists() => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        Some(path) => {
            tracing::info!("{} does not exist; using empty text.", path.display());
            Ok(String::new())
        }
        None => Ok(String::new()),
    }
}
