//! Error taxonomy for patch runs.
//!
//! Every variant is raised before the descriptor is written, so a failed
//! run leaves the file on disk untouched.

use std::path::PathBuf;

use thiserror::Error;
use xcpatch_pbxproj::PbxError;

use crate::config::ConfigError;
use crate::entry::EntryParseError;
use crate::region::Region;

/// Patcher result type alias
pub type Result<T> = std::result::Result<T, PatchError>;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: PbxError },

    #[error("No .xcodeproj found in {dir}")]
    ProjectNotFound { dir: PathBuf },

    #[error("Several .xcodeproj bundles found in {dir}: {candidates:?}; pass --project")]
    AmbiguousProject {
        dir: PathBuf,
        candidates: Vec<String>,
    },

    #[error("{region} not found: {detail}")]
    RegionNotFound { region: Region, detail: String },

    #[error("Object {id} is a {found}, expected {expected}")]
    WrongObjectType {
        id: String,
        expected: &'static str,
        found: String,
    },

    #[error("Could not allocate object ids: {0}")]
    Ids(#[source] PbxError),

    #[error("Patched descriptor no longer parses: {0}")]
    InvalidOutput(#[source] PbxError),

    #[error("Invalid file entry: {0}")]
    InvalidEntry(#[from] EntryParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PatchError {
    /// Failures that non-strict runs downgrade to a skipped region.
    pub fn is_unresolved_region(&self) -> bool {
        matches!(
            self,
            PatchError::RegionNotFound { .. } | PatchError::WrongObjectType { .. }
        )
    }

    /// Configuration and usage problems, as opposed to failures while patching.
    pub fn is_config(&self) -> bool {
        matches!(self, PatchError::Config(_) | PatchError::InvalidEntry(_))
    }
}
