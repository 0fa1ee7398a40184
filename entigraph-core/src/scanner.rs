//! Entity file discovery.
//!
//! Only the top level of each known category directory is listed. Anything
//! else under the root (other directories, nested folders) is ignored.

use crate::error::{EntityError, Result};
use crate::node::Category;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extension of entity files, without the dot.
pub const ENTITY_EXTENSION: &str = "md";

/// Lists entity files under `root` for every category.
///
/// Categories are visited in [`Category::ALL`] order and files inside one
/// category are sorted by name, so an unchanged tree always yields the same
/// sequence. Missing category directories are skipped.
pub fn discover_entity_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for category in Category::ALL {
        let type_dir = root.join(category.as_str());
        if !type_dir.is_dir() {
            debug!("Skipping missing category directory {}", type_dir.display());
            continue;
        }

        let before = files.len();
        for entry in WalkDir::new(&type_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| EntityError::Discovery {
                path: type_dir.clone(),
                source,
            })?;

            if entry.file_type().is_file() && is_entity_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        debug!("Found {} files in {}", files.len() - before, category);
    }

    Ok(files)
}

fn is_entity_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == ENTITY_EXTENSION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discovers_only_markdown_in_known_categories() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("concepts/nested")).unwrap();
        fs::create_dir_all(root.join("misc")).unwrap();
        fs::write(root.join("concepts/b.md"), "# B").unwrap();
        fs::write(root.join("concepts/a.md"), "# A").unwrap();
        fs::write(root.join("concepts/notes.txt"), "ignored").unwrap();
        fs::write(root.join("concepts/nested/deep.md"), "ignored").unwrap();
        fs::write(root.join("misc/other.md"), "ignored").unwrap();
        fs::write(root.join("top.md"), "ignored").unwrap();

        let files = discover_entity_files(root).unwrap();

        assert_eq!(
            files,
            vec![root.join("concepts/a.md"), root.join("concepts/b.md")]
        );
    }

    #[test]
    fn test_category_order_is_fixed() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("skills")).unwrap();
        fs::create_dir_all(root.join("people")).unwrap();
        fs::write(root.join("skills/rust.md"), "").unwrap();
        fs::write(root.join("people/ada.md"), "").unwrap();

        let files = discover_entity_files(root).unwrap();

        assert_eq!(
            files,
            vec![root.join("people/ada.md"), root.join("skills/rust.md")]
        );
    }

    #[test]
    fn test_empty_root_is_not_an_error() {
        let dir = tempdir().unwrap();
        let files = discover_entity_files(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let files = discover_entity_files(&dir.path().join("absent")).unwrap();
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_entry_is_discovery_error() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("concepts")).unwrap();
        std::os::unix::fs::symlink(root.join("gone.md"), root.join("concepts/x.md")).unwrap();

        let err = discover_entity_files(root).unwrap_err();

        assert!(matches!(err, EntityError::Discovery { .. }));
        assert_eq!(err.path(), Some(root.join("concepts").as_path()));
    }
}
