use super::{CoreError, FileTree, NodeId, NodeKind, ScanFilter};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Builds a `FileTree` from a directory on disk.
///
/// Filtering happens while walking: excluded folders are never descended and
/// excluded files never get a node.
pub struct DirectoryScanner {
    filter: ScanFilter,
}

/// One entry that survived the walk, in walk order.
struct WalkedEntry {
    path: PathBuf,
    name: OsString,
    depth: usize,
    is_dir: bool,
}

impl DirectoryScanner {
    pub fn new(filter: ScanFilter) -> Self {
        Self { filter }
    }

    /// Scans `root_path` synchronously.
    ///
    /// Directories that cannot be listed are left out of the tree instead of
    /// failing the scan. Only a missing or non-directory root is an error.
    pub fn scan(&self, root_path: &Path) -> Result<FileTree, CoreError> {
        let metadata = match std::fs::metadata(root_path) {
            Ok(md) => md,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::RootNotFound(root_path.to_path_buf()));
            }
            Err(e) => return Err(CoreError::Io(e, root_path.to_path_buf())),
        };
        if !metadata.is_dir() {
            return Err(CoreError::NotADirectory(root_path.to_path_buf()));
        }

        let (entries, unreadable) = self.walk(root_path);
        let tree = Self::build_tree(root_path, entries, &unreadable);

        let files = tree.pre_order().filter(|id| !tree.is_dir(*id)).count();
        tracing::info!(
            "Scanned {}: {} directories, {} files, {} unreadable entries skipped",
            root_path.display(),
            tree.len() - files,
            files,
            unreadable.len()
        );
        Ok(tree)
    }

    /// Walks the directory and collects surviving entries in pre-order, plus the
    /// set of directories whose listing failed.
    fn walk(&self, root_path: &Path) -> (Vec<WalkedEntry>, HashSet<PathBuf>) {
        let mut entries = Vec::new();
        let mut unreadable = HashSet::new();

        let walker = WalkDir::new(root_path)
            .follow_links(true)
            .min_depth(1)
            .sort_by(compare_entries)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        for result in walker {
            match result {
                Ok(entry) => {
                    let is_dir = entry.file_type().is_dir();
                    entries.push(WalkedEntry {
                        name: entry.file_name().to_os_string(),
                        path: entry.path().to_path_buf(),
                        depth: entry.depth(),
                        is_dir,
                    });
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf);
                    if e.loop_ancestor().is_some() {
                        tracing::debug!("Skipping symlink loop at {:?}", path);
                    } else {
                        tracing::debug!("Skipping unreadable entry {:?}: {}", path, e);
                    }
                    match path {
                        Some(p) if p.as_path() == root_path => {
                            tracing::warn!(
                                "Root folder {} could not be listed: {}",
                                p.display(),
                                e
                            );
                        }
                        Some(p) => {
                            unreadable.insert(p);
                        }
                        None => {}
                    }
                }
            }
        }

        (entries, unreadable)
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        if entry_is_dir(entry) {
            self.filter.excludes_folder(&name)
        } else {
            self.filter.excludes_file(&name)
        }
    }

    /// Turns the flat pre-order walk into an arena tree, dropping any directory
    /// that failed to list together with everything recorded beneath it.
    fn build_tree(
        root_path: &Path,
        entries: Vec<WalkedEntry>,
        unreadable: &HashSet<PathBuf>,
    ) -> FileTree {
        let root_name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.display().to_string());
        let mut tree = FileTree::new(root_path, root_name);

        // stack[d] is the node id of the most recent directory at depth d.
        let mut stack: Vec<NodeId> = vec![tree.root()];
        let mut skip_below: Option<usize> = None;

        for entry in entries {
            if let Some(depth) = skip_below {
                if entry.depth > depth {
                    continue;
                }
                skip_below = None;
            }
            if unreadable.contains(&entry.path) {
                skip_below = Some(entry.depth);
                continue;
            }

            stack.truncate(entry.depth);
            let Some(&parent) = stack.last() else {
                continue;
            };
            let kind = if entry.is_dir {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            let id = tree.add_child(parent, entry.name, kind);
            if entry.is_dir {
                stack.push(id);
            }
        }

        tree
    }
}

/// Sorting runs before links are resolved, so a symlink is classified by its target.
fn entry_is_dir(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        entry.path().is_dir()
    } else {
        file_type.is_dir()
    }
}

/// Directories first, then case-insensitive name, then exact name.
fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = entry_is_dir(a);
    let b_dir = entry_is_dir(b);
    b_dir.cmp(&a_dir).then_with(|| {
        let a_name = a.file_name().to_string_lossy();
        let b_name = b.file_name().to_string_lossy();
        a_name
            .to_lowercase()
            .cmp(&b_name.to_lowercase())
            .then_with(|| a_name.cmp(&b_name))
    })
}
