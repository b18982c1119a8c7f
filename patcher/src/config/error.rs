use std::path::PathBuf;
use thiserror::Error;

/// Problems with `xcpatch.toml`, the `XCPATCH_*` environment or the merged
/// settings. All of them exit with the usage code, before any descriptor is
/// read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be merged: bad TOML, or a key of the wrong type.
    #[error("could not read xcpatch settings: {0}")]
    LoadError(String),

    /// `--config` named a file that does not exist.
    #[error("xcpatch config file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// The built-in defaults could not be encoded as the base layer.
    #[error("could not encode default xcpatch settings: {0}")]
    ParseError(String),

    /// Values that parse but cannot drive a patch run.
    #[error("{0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
