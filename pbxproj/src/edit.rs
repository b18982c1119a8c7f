use crate::error::{PbxError, Result};

/// Text inserted at a byte offset of the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub text: String,
}

impl Edit {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

/// Apply `edits` to `text`. Offsets refer to the original text; inserts at
/// the same offset land in the order they were given.
pub fn apply_edits(text: &str, edits: &[Edit]) -> Result<String> {
    for edit in edits {
        if edit.offset > text.len() || !text.is_char_boundary(edit.offset) {
            return Err(PbxError::EditOutOfBounds {
                offset: edit.offset,
                len: text.len(),
            });
        }
    }

    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|edit| edit.offset);

    let extra: usize = edits.iter().map(|edit| edit.text.len()).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    for edit in ordered {
        out.push_str(&text[cursor..edit.offset]);
        out.push_str(&edit.text);
        cursor = edit.offset;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}
