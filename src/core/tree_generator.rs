//! Generates an ASCII representation of a directory tree.

use super::{FileTree, NodeId, Selection};

/// A utility struct for generating an ASCII directory tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders every node of `tree`, one line per node.
    ///
    /// The root line is the root name followed by `/`. Nothing is filtered here;
    /// render a [`FileTree::pruned`] view to show only a selection.
    pub fn render(tree: &FileTree) -> String {
        let mut result = String::new();
        result.push_str(&format!("{}/\n", tree.node(tree.root()).name));
        Self::render_children(tree, tree.root(), &mut result, "");
        result
    }

    /// Renders the children of a tree node.
    fn render_children(tree: &FileTree, id: NodeId, result: &mut String, prefix: &str) {
        let children = tree.children(id);

        for (i, child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };

            result.push_str(&format!("{prefix}{connector}{}\n", tree.node(*child).name));

            if !tree.children(*child).is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                Self::render_children(tree, *child, result, &new_prefix);
            }
        }
    }
}

impl FileTree {
    /// Builds a new tree holding only the root, the selected nodes and the
    /// directories leading to them. Child order is preserved.
    pub fn pruned(&self, selection: &Selection) -> FileTree {
        let mut pruned = FileTree::new(self.root_path(), self.node(self.root()).name.clone());
        let within = selection.selection_within(self);

        // (node in self, its parent in `pruned`)
        let mut stack: Vec<(NodeId, NodeId)> = self
            .children(self.root())
            .iter()
            .rev()
            .map(|c| (*c, pruned.root()))
            .collect();

        while let Some((id, new_parent)) = stack.pop() {
            if !within[id.0] {
                continue;
            }
            let node = self.node(id);
            let new_id = pruned.add_child(new_parent, node.file_name.clone(), node.kind);
            stack.extend(self.children(id).iter().rev().map(|c| (*c, new_id)));
        }

        pruned
    }
}
