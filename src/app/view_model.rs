//! Responsible for transforming the `AppState` into a `UiState` view model.

use crate::core::{FileTree, NodeId, Selection, TreeGenerator};
use serde::Serialize;

use super::state::AppState;

/// A serializable representation of the application state for the display.
#[derive(Serialize, Clone, Debug)]
pub struct UiState {
    pub root_folder: Option<String>,
    pub prompt_template: Option<String>,
    pub context_file: Option<String>,
    pub description: String,
    pub is_scanning: bool,
    /// Every node of the current tree in pre-order.
    pub nodes: Vec<UiTreeNode>,
    /// The full tree as an ASCII diagram, empty when nothing is loaded.
    pub tree_diagram: String,
    pub selected_files_count: usize,
    pub status_message: String,
}

/// A single row of the interactive tree.
#[derive(Serialize, Clone, Debug)]
pub struct UiTreeNode {
    pub id: usize,
    pub name: String,
    pub relative_path: String,
    pub depth: usize,
    pub is_directory: bool,
    /// "full", "partial" or "none".
    pub selection_state: String,
}

/// Creates the complete `UiState` from the current `AppState`.
pub fn generate_ui_state(state: &AppState) -> UiState {
    let (nodes, tree_diagram, selected_files_count) = match &state.tree {
        Some(tree) => (
            build_ui_nodes(tree, &state.selection),
            TreeGenerator::render(tree),
            state.selection.selected_count(tree),
        ),
        None => (Vec::new(), String::new(), 0),
    };

    UiState {
        root_folder: state
            .current_root
            .as_ref()
            .map(|p| p.display().to_string()),
        prompt_template: state
            .config
            .prompt_template
            .as_ref()
            .map(|p| p.display().to_string()),
        context_file: state
            .config
            .context_file
            .as_ref()
            .map(|p| p.display().to_string()),
        description: state.description.clone(),
        is_scanning: state.is_scanning,
        nodes,
        tree_diagram,
        selected_files_count,
        status_message: state.status.clone(),
    }
}

fn build_ui_nodes(tree: &FileTree, selection: &Selection) -> Vec<UiTreeNode> {
    let depths = tree.depths();
    let within = selection.selection_within(tree);
    tree.pre_order()
        .map(|id| {
            let node = tree.node(id);
            UiTreeNode {
                id: id.0,
                name: node.name.clone(),
                relative_path: tree.relative_path_of(id).display().to_string(),
                depth: depths[id.0],
                is_directory: node.is_directory(),
                selection_state: selection_state(tree, selection, &within, id).to_string(),
            }
        })
        .collect()
}

fn selection_state(
    tree: &FileTree,
    selection: &Selection,
    within: &[bool],
    id: NodeId,
) -> &'static str {
    if selection.is_selected(id) {
        "full"
    } else if tree.is_dir(id) && within[id.0] {
        "partial"
    } else {
        "none"
    }
}
