use std::fs;
use std::path::Path;

use log::debug;

use super::index::{IndexFile, merge_index};
use crate::GeneratedFile;
use crate::error::EmitError;

/// Write generated files under `root`, creating parent directories as needed.
pub fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<(), EmitError> {
    for file in files {
        let path = root.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| EmitError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &file.content).map_err(|source| EmitError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("wrote {}", path.display());
    }
    Ok(())
}

/// Write an index file. In incremental mode existing lines on disk are kept.
pub fn write_index(root: &Path, index: &IndexFile, incremental: bool) -> Result<(), EmitError> {
    let path = root.join(&index.path);
    let existing = if incremental && path.exists() {
        Some(fs::read_to_string(&path).map_err(|source| EmitError::Read {
            path: path.clone(),
            source,
        })?)
    } else {
        None
    };
    let content = merge_index(existing.as_deref(), &index.lines);
    write_files(
        root,
        &[GeneratedFile {
            path: index.path.clone(),
            content,
        }],
    )
}
