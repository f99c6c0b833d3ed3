//! Source tree access.
//!
//! Discovery only needs to list and read files relative to a root, so it goes
//! through [`SourceTree`] instead of touching the filesystem directly. Builds
//! use [`FsTree`]; tests inject a [`MemoryTree`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A tree of source files addressed by root-relative paths.
pub trait SourceTree {
    /// Whether the root itself exists.
    fn is_present(&self) -> bool;

    /// Walk every file below the root.
    ///
    /// The iterator is lazy and finite. Call `walk` again to start over.
    fn walk(&self) -> Box<dyn Iterator<Item = PathBuf> + '_>;

    /// Whether a file exists at the relative path.
    fn exists(&self, relative: &Path) -> bool;

    /// Read a file as UTF-8.
    fn read_to_string(&self, relative: &Path) -> io::Result<String>;
}

/// A source tree backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl FsTree {
    /// Create a tree rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Skip everything below `dir` while walking.
    ///
    /// `dir` may be given relative to the root or as the same path the root
    /// was built from (`dev/resources` for a root of `dev`).
    pub fn exclude(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        self.excluded.push(relative.to_path_buf());
        self
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.excluded.iter().any(|dir| relative.starts_with(dir))
    }
}

impl SourceTree for FsTree {
    fn is_present(&self) -> bool {
        self.root.is_dir()
    }

    fn walk(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
                !self.is_excluded(relative)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(Path::to_path_buf)
            });

        Box::new(walker)
    }

    fn exists(&self, relative: &Path) -> bool {
        self.root.join(relative).is_file()
    }

    fn read_to_string(&self, relative: &Path) -> io::Result<String> {
        fs::read_to_string(self.root.join(relative))
    }
}

/// An in-memory source tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous contents.
    pub fn insert(&mut self, relative: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(relative.into(), contents.into());
    }

    /// Builder-style [`MemoryTree::insert`].
    pub fn with_file(mut self, relative: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(relative, contents);
        self
    }
}

impl SourceTree for MemoryTree {
    fn is_present(&self) -> bool {
        true
    }

    fn walk(&self) -> Box<dyn Iterator<Item = PathBuf> + '_> {
        Box::new(self.files.keys().cloned())
    }

    fn exists(&self, relative: &Path) -> bool {
        self.files.contains_key(relative)
    }

    fn read_to_string(&self, relative: &Path) -> io::Result<String> {
        self.files.get(relative).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not in tree", relative.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn walks_files_relative_to_root() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("dev");
        fs::create_dir_all(root.join("week1")).unwrap();
        fs::write(root.join("week1/ex1.html"), "<p></p>").unwrap();
        fs::write(root.join("week1/ex1.js"), "").unwrap();

        let tree = FsTree::new(&root);
        let files: Vec<PathBuf> = tree.walk().collect();

        assert_eq!(
            files,
            vec![PathBuf::from("week1/ex1.html"), PathBuf::from("week1/ex1.js")]
        );
    }

    #[test]
    fn skips_excluded_directories() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("dev");
        fs::create_dir_all(root.join("resources")).unwrap();
        fs::create_dir_all(root.join("week2")).unwrap();
        fs::write(root.join("resources/page.html"), "").unwrap();
        fs::write(root.join("week2/ex1.html"), "").unwrap();

        let tree = FsTree::new(&root).exclude(root.join("resources"));
        let files: Vec<PathBuf> = tree.walk().collect();

        assert_eq!(files, vec![PathBuf::from("week2/ex1.html")]);
    }

    #[test]
    fn reads_and_checks_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.js"), "let a = 1;").unwrap();

        let tree = FsTree::new(temp.path());

        assert!(tree.exists(Path::new("a.js")));
        assert!(!tree.exists(Path::new("b.js")));
        assert_eq!(tree.read_to_string(Path::new("a.js")).unwrap(), "let a = 1;");
    }

    #[test]
    fn memory_tree_reports_missing_files() {
        let tree = MemoryTree::new().with_file("week1/ex1.html", "<p></p>");

        assert!(tree.exists(Path::new("week1/ex1.html")));
        let err = tree.read_to_string(Path::new("week1/ex1.js")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
