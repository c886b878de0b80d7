//! Notebook discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Notebook file extension.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Notebooks under a virtual environment's `site-packages` belong to
/// dependencies and are never checked.
pub fn is_in_virtualenv(path: &Path) -> bool {
    path.to_string_lossy().contains("site-packages")
}

fn is_notebook(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == NOTEBOOK_EXTENSION)
}

/// Collect the notebooks to check for `path`.
///
/// A directory is walked recursively in sorted order. Symlinked directories
/// are not descended into; symlinked notebook files are kept. A file must have
/// the `.ipynb` extension.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let found = walk(path)?;
        tracing::debug!(path = %path.display(), count = found.len(), "discovered notebooks");
        Ok(found)
    } else if is_notebook(path) {
        Ok(vec![path.to_path_buf()])
    } else {
        Err(Error::InvalidPath(path.to_path_buf()))
    }
}

fn walk(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_in_virtualenv(e.path()))
    {
        let entry = entry?;
        let path = entry.path();
        // `is_file` follows the link, so linked notebooks count but linked
        // directories do not.
        if is_notebook(path) && path.is_file() {
            found.push(entry.into_path());
        }
    }

    Ok(found)
}
