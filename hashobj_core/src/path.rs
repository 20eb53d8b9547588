//! Root context and work-tree relative path handling.

use std::path::{Path, PathBuf};

/// Where the store lives and where the process sits relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootContext {
    store_dir: PathBuf,
    work_tree: PathBuf,
    prefix_dir: PathBuf,
    prefix: String,
}

impl RootContext {
    /// Create a root context. `prefix_dir` is the current directory relative
    /// to `work_tree`, empty at the top of the work tree.
    pub fn new(store_dir: PathBuf, work_tree: PathBuf, prefix_dir: PathBuf) -> Self {
        let prefix = prefix_string(&prefix_dir);
        Self {
            store_dir,
            work_tree,
            prefix_dir,
            prefix,
        }
    }

    /// Directory holding the store (`.hashobj`).
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Top of the work tree the store belongs to.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Current directory relative to the work tree, as it is on disk.
    pub fn prefix_dir(&self) -> &Path {
        &self.prefix_dir
    }

    /// Current directory relative to the work tree, with a trailing `/`.
    ///
    /// Non-UTF-8 components are rendered lossily; use [`prefix_dir`] to reach
    /// the directory itself.
    ///
    /// [`prefix_dir`]: RootContext::prefix_dir
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix.len()
    }

    /// Where a path given relative to the current directory lives on disk.
    pub fn resolve(&self, raw: &Path) -> PathBuf {
        self.work_tree.join(&self.prefix_dir).join(raw)
    }
}

/// Render a relative directory as a `/`-separated prefix with a trailing
/// slash, or the empty string for the work tree itself.
fn prefix_string(rel: &Path) -> String {
    let mut prefix = String::new();
    for component in rel.components() {
        prefix.push_str(&component.as_os_str().to_string_lossy());
        prefix.push('/');
    }
    prefix
}

/// Turn a path given on the command line into the path used for store
/// bookkeeping.
///
/// Without a root context the path is returned unchanged. With one, relative
/// paths get the prefix prepended; absolute paths pass through. No `.` or
/// `..` collapsing is done.
pub fn normalize(root: Option<&RootContext>, path: &str) -> String {
    match root {
        Some(root) if !Path::new(path).is_absolute() => format!("{}{}", root.prefix(), path),
        _ => path.to_string(),
    }
}

/// Where to open `raw`, a path as given relative to the current directory.
///
/// Joins onto the on-disk prefix directory rather than the text prefix, so
/// directories whose names are not UTF-8 still resolve.
pub fn physical(root: Option<&RootContext>, raw: &Path) -> PathBuf {
    match root {
        Some(root) => root.resolve(raw),
        None => raw.to_path_buf(),
    }
}
