//! Discovery of exercise templates in a source tree.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::descriptor::{ExerciseDescriptor, Group, Manifest};
use crate::tree::SourceTree;

static WEEK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)week(\d+)/ex(\d+)\.html$").expect("week pattern is valid")
});

static CATEGORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|/)shader/shader_ex(\d+)\.html$").expect("category pattern is valid")
});

/// Recognizes exercise templates and builds the manifest.
#[derive(Debug, Clone)]
pub struct Discovery {
    category_label: String,
}

impl Discovery {
    /// Create a discovery pass labelling the fixed category with `category_label`.
    pub fn new(category_label: impl Into<String>) -> Self {
        Self {
            category_label: category_label.into(),
        }
    }

    /// Every HTML template in the tree, recognized or not.
    pub fn templates<'a>(&self, tree: &'a dyn SourceTree) -> Templates<'a> {
        Templates { inner: tree.walk() }
    }

    /// Match a root-relative template path against the known layouts.
    ///
    /// Returns `None` for paths that belong to no navigation group.
    pub fn recognize(&self, path: &Path) -> Option<ExerciseDescriptor> {
        let path = to_slash(path);

        if let Some(caps) = WEEK_PATTERN.captures(&path) {
            let week = caps[1].parse().ok()?;
            let index = caps[2].parse().ok()?;
            return Some(ExerciseDescriptor::new(Group::Week(week), index, path));
        }

        if let Some(caps) = CATEGORY_PATTERN.captures(&path) {
            let index = caps[1].parse().ok()?;
            return Some(ExerciseDescriptor::new(
                Group::Category(self.category_label.clone()),
                index,
                path,
            ));
        }

        None
    }

    /// Walk the tree and collect recognized templates into an ordered manifest.
    pub fn discover(&self, tree: &dyn SourceTree) -> Manifest {
        self.templates(tree)
            .filter_map(|path| {
                let descriptor = self.recognize(&path);
                if descriptor.is_none() {
                    tracing::debug!("Not in navigation: {}", path.display());
                }
                descriptor
            })
            .collect()
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new("Shader")
    }
}

/// Lazy sequence of template paths produced by a single walk.
pub struct Templates<'a> {
    inner: Box<dyn Iterator<Item = PathBuf> + 'a>,
}

impl Iterator for Templates<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        self.inner.find(|path| is_template(path))
    }
}

fn is_template(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("html")
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
