//! Hierarchical selection state overlaid on a `FileTree`.

use super::{FileTree, NodeId};

/// Selection flags for every node of one tree, indexed by `NodeId`.
///
/// A directory is selected exactly when all of its children are. Every
/// mutating method restores that before returning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    flags: Vec<bool>,
}

impl Selection {
    /// An empty selection sized for `tree`.
    pub fn new(tree: &FileTree) -> Self {
        Self {
            flags: vec![false; tree.len()],
        }
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.flags.get(id.0).copied().unwrap_or(false)
    }

    /// Flips a node, pushes the new state down to every descendant and
    /// recomputes the ancestor chain.
    pub fn toggle(&mut self, tree: &FileTree, id: NodeId) {
        let target = !self.is_selected(id);
        self.set(tree, id, target);
    }

    /// Sets a node (and its subtree) to `selected`, then recomputes ancestors.
    pub fn set(&mut self, tree: &FileTree, id: NodeId, selected: bool) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.flags[current.0] = selected;
            stack.extend_from_slice(tree.children(current));
        }

        let mut ancestor = tree.parent(id);
        while let Some(parent) = ancestor {
            self.flags[parent.0] = tree
                .children(parent)
                .iter()
                .all(|child| self.flags[child.0]);
            ancestor = tree.parent(parent);
        }
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.flags.iter_mut().for_each(|f| *f = false);
    }

    /// Selected file nodes in depth-first pre-order. Directories are never included.
    pub fn selected_files(&self, tree: &FileTree) -> Vec<NodeId> {
        tree.pre_order()
            .filter(|id| !tree.is_dir(*id) && self.is_selected(*id))
            .collect()
    }

    pub fn selected_count(&self, tree: &FileTree) -> usize {
        tree.pre_order()
            .filter(|id| !tree.is_dir(*id) && self.is_selected(*id))
            .count()
    }

    /// For every node, whether it or anything below it is selected.
    ///
    /// Children always sit after their parent in the arena, so one backwards
    /// pass sees every child before its parent.
    pub fn selection_within(&self, tree: &FileTree) -> Vec<bool> {
        let mut within: Vec<bool> = (0..tree.len())
            .map(|index| self.is_selected(NodeId(index)))
            .collect();
        for index in (1..tree.len()).rev() {
            if within[index] {
                if let Some(parent) = tree.parent(NodeId(index)) {
                    within[parent.0] = true;
                }
            }
        }
        within
    }
}
