pub mod error;
pub mod path_normalizer;
pub mod prompt_assembler;
pub mod scanner;
pub mod selection;
pub mod tree_generator;

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

/// Index of a node inside a `FileTree` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// One filesystem entry below the scanned root.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Display name, lossily decoded.
    pub name: String,
    /// The name as stored on disk. Paths are rebuilt from this.
    pub file_name: OsString,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// An immutable directory tree produced by a single scan.
///
/// Nodes live in an arena owned by the tree; `children` hold ownership order and
/// `parent` is a plain back-index used for upward walks. The root is always
/// `NodeId(0)`.
#[derive(Debug, Clone)]
pub struct FileTree {
    root_path: PathBuf,
    nodes: Vec<TreeNode>,
}

impl FileTree {
    /// Creates a tree holding only a root directory node.
    pub fn new(root_path: impl Into<PathBuf>, root_name: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            nodes: vec![TreeNode {
                name: root_name.into(),
                file_name: OsString::new(),
                kind: NodeKind::Directory,
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    /// Appends a child under `parent`. Children keep insertion order, so callers
    /// must add them already sorted.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        file_name: impl Into<OsString>,
        kind: NodeKind,
    ) -> NodeId {
        let file_name = file_name.into();
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            kind,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_directory()
    }

    /// Depth of a node, the root being 0.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    /// Depth of every node, indexed by `NodeId`, in one forward pass.
    /// Parents always precede their children in the arena.
    pub fn depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                depths[index] = depths[parent.0] + 1;
            }
        }
        depths
    }

    /// Path of a node relative to the root, rebuilt from the parent chain.
    pub fn relative_path_of(&self, id: NodeId) -> PathBuf {
        let mut names: Vec<&OsStr> = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent(current) {
            names.push(self.nodes[current.0].file_name.as_os_str());
            current = p;
        }
        names.iter().rev().collect()
    }

    /// Absolute path of a node.
    pub fn path_of(&self, id: NodeId) -> PathBuf {
        self.root_path.join(self.relative_path_of(id))
    }

    /// Looks up a node by its path relative to the root. An empty path is the root.
    pub fn find(&self, relative: &Path) -> Option<NodeId> {
        let mut current = self.root();
        for component in relative.components() {
            match component {
                Component::CurDir => continue,
                Component::Normal(name) => {
                    current = *self
                        .children(current)
                        .iter()
                        .find(|c| self.nodes[c.0].file_name.as_os_str() == name)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Depth-first pre-order over every node, starting at the root.
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![self.root()],
        }
    }
}

/// Iterator returned by [`FileTree::pre_order`].
pub struct PreOrder<'a> {
    tree: &'a FileTree,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}

/// Exclusion rules applied while the tree is being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    pub excluded_folder_names: HashSet<String>,
    pub excluded_extensions: HashSet<String>,
}

impl ScanFilter {
    /// Builds a filter, normalizing extensions to lowercase with a leading dot.
    pub fn new<F, E>(folders: F, extensions: E) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let excluded_folder_names = folders
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        let excluded_extensions = extensions
            .into_iter()
            .filter_map(|e| {
                let e = e.as_ref().trim().to_lowercase();
                match e.as_str() {
                    "" | "." => None,
                    _ if e.starts_with('.') => Some(e),
                    _ => Some(format!(".{e}")),
                }
            })
            .collect();

        Self {
            excluded_folder_names,
            excluded_extensions,
        }
    }

    pub fn excludes_folder(&self, name: &str) -> bool {
        self.excluded_folder_names.contains(name)
    }

    pub fn excludes_file(&self, name: &str) -> bool {
        if self.excluded_extensions.is_empty() {
            return false;
        }
        let lower = name.to_lowercase();
        self.excluded_extensions
            .iter()
            .any(|ext| lower.len() > ext.len() && lower.ends_with(ext.as_str()))
    }
}

pub use error::CoreError;
pub use path_normalizer::{normalize, normalize_path};
pub use prompt_assembler::{PromptAssembler, PromptRequest};
pub use scanner::DirectoryScanner;
pub use selection::Selection;
pub use tree_generator::TreeGenerator;
