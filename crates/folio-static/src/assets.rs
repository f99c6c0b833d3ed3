//! Static asset copying.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Copy every file below `source` to the same relative location below `dest`.
    ///
    /// Files are copied byte for byte and overwrite existing ones. Returns the
    /// written paths.
    pub fn copy_tree(source: &Path, dest: &Path) -> io::Result<Vec<PathBuf>> {
        let mut copied = Vec::new();

        for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            let target = dest.join(relative);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;

            tracing::info!("Copied: {}", target.display());
            copied.push(target);
        }

        Ok(copied)
    }

    /// Location below the publish root that mirrors `resources`.
    ///
    /// Resources inside the source root keep their position relative to it
    /// (`dev/resources` → `resources`); anything else keeps its directory name.
    pub fn mirror_dir(source_root: &Path, resources: &Path) -> PathBuf {
        match resources.strip_prefix(source_root) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
            _ => resources
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("resources")),
        }
    }
}
