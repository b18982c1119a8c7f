use thiserror::Error;

/// Result alias for descriptor operations.
pub type Result<T> = std::result::Result<T, PbxError>;

/// Errors raised while parsing or editing a descriptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PbxError {
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        offset: usize,
        line: usize,
        column: usize,
    },

    #[error("document has no top-level `objects` dictionary")]
    MissingObjects,

    #[error("edit at offset {offset} is outside the document or splits a character (length {len})")]
    EditOutOfBounds { offset: usize, len: usize },

    #[error("could not allocate a unique object id after {attempts} attempts")]
    IdExhausted { attempts: usize },

    #[error("invalid object id `{0}`: expected 24 uppercase hexadecimal characters")]
    InvalidId(String),
}

impl PbxError {
    /// Build a parse error at `offset`, computing the 1-based line and column.
    pub(crate) fn parse_at(input: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(input, offset);
        PbxError::Parse {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}

fn line_col(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let before = input.get(..offset).unwrap_or(input);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
