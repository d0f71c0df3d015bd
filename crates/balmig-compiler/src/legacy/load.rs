//! Loading serialized legacy flow documents from disk.

use std::path::Path;
use walkdir::WalkDir;

use crate::diagnostic::MigrateError;
use super::{LegacyFile, LegacyProject};

/// Loads every `*.json` flow document under `dir`.
///
/// Files are visited in sorted path order so counters and memoized names come
/// out the same on every run. A document without a `name` is named after its
/// path relative to `dir` (`orders/api.json` becomes `orders_api`).
pub fn load_directory(dir: &Path) -> Result<LegacyProject, MigrateError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }

        let mut file = load_file(path)?;
        if file.name.is_empty() {
            file.name = module_name_for(dir, path);
        }
        files.push(file);
    }

    tracing::debug!(dir = %dir.display(), files = files.len(), "loaded legacy flow documents");
    Ok(LegacyProject { files })
}

/// Loads a single flow document.
pub fn load_file(path: &Path) -> Result<LegacyFile, MigrateError> {
    let content = std::fs::read_to_string(path).map_err(|e| MigrateError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| MigrateError::InvalidFlowDocument {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn module_name_for(root: &Path, path: &Path) -> String {
    let relative = pathdiff::diff_paths(path.with_extension(""), root)
        .unwrap_or_else(|| path.with_extension(""));

    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("_")
}
