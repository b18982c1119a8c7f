//! Locating, reading and atomically rewriting the project descriptor.
//!
//! Writes use the temp-file + fsync + rename pattern so an interrupted run
//! never leaves a truncated descriptor behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PatchError, Result};

/// Descriptor file name inside an `.xcodeproj` bundle.
pub const DESCRIPTOR_FILENAME: &str = "project.pbxproj";

const BUNDLE_EXTENSION: &str = "xcodeproj";

/// Map a bundle or directory to the descriptor inside it; other paths are
/// taken as the descriptor itself.
pub fn descriptor_path(project: &Path) -> PathBuf {
    let is_bundle = project
        .extension()
        .is_some_and(|ext| ext == BUNDLE_EXTENSION);
    if is_bundle || project.is_dir() {
        project.join(DESCRIPTOR_FILENAME)
    } else {
        project.to_path_buf()
    }
}

/// The single `*.xcodeproj` bundle directly inside `dir`.
pub fn find_project(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|source| PatchError::FileRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && path
                    .extension()
                    .is_some_and(|ext| ext == BUNDLE_EXTENSION)
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(PatchError::ProjectNotFound {
            dir: dir.to_path_buf(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(PatchError::AmbiguousProject {
            dir: dir.to_path_buf(),
            candidates: candidates
                .iter()
                .filter_map(|path| Some(path.file_name()?.to_string_lossy().into_owned()))
                .collect(),
        }),
    }
}

/// Resolve the descriptor to patch: an explicit project relative to `cwd`,
/// or the one bundle found in `cwd`.
pub fn resolve_descriptor(project: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let path = match project {
        Some(project) => descriptor_path(&cwd.join(project)),
        None => find_project(cwd)?.join(DESCRIPTOR_FILENAME),
    };
    tracing::debug!(path = %path.display(), "resolved project descriptor");
    Ok(path)
}

pub fn read_descriptor(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| PatchError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `contents` atomically:
/// 1. Write to a temporary file in the same directory
/// 2. fsync the temporary file
/// 3. Rename (atomic on POSIX) over the target
///
/// The original file's permissions carry over to the replacement.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let write_err = |path: &Path, source: std::io::Error| PatchError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .map_or_else(|| DESCRIPTOR_FILENAME.into(), std::ffi::OsStr::to_string_lossy);
    let temp_path = path.with_file_name(format!(".{file_name}.xcpatch.tmp"));

    let result = (|| {
        let mut file = fs::File::create(&temp_path).map_err(|e| write_err(&temp_path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| write_err(&temp_path, e))?;
        // fsync for durability
        file.sync_all().map_err(|e| write_err(&temp_path, e))?;
        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(&temp_path, metadata.permissions())
                .map_err(|e| write_err(&temp_path, e))?;
        }
        fs::rename(&temp_path, path).map_err(|e| write_err(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
