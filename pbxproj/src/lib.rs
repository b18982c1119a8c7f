//! Parsing and splicing for Xcode `project.pbxproj` descriptors.
//!
//! A descriptor is an old-style (NeXTSTEP) ASCII property list. This crate
//! parses it into a value tree where every node remembers its byte span, so
//! callers can locate records structurally and then splice new text into the
//! original buffer without re-serializing (and reformatting) the rest of it.
//!
//! ```
//! use xcpatch_pbxproj::Document;
//!
//! let doc = Document::parse(
//!     "{ objects = { 0123456789ABCDEF01234567 /* Main */ = { isa = PBXGroup; children = ( ); }; }; }",
//! )
//! .unwrap();
//! let group = doc.object("0123456789ABCDEF01234567").unwrap();
//! assert_eq!(group.isa(), Some("PBXGroup"));
//! assert_eq!(group.comment, Some("Main"));
//! ```

#![deny(clippy::print_stdout, clippy::print_stderr)]

mod document;
mod edit;
mod error;
mod id;
mod parser;
mod value;

pub use document::{Document, Object, Section};
pub use edit::{Edit, apply_edits};
pub use error::{PbxError, Result};
pub use id::{
    ID_LEN, IdAllocator, IdGenerator, ObjectId, RandomIdGenerator, SequentialIdGenerator,
};
pub use parser::{Comment, parse_value};
pub use value::{Array, Data, Dict, DictEntry, Span, Str, Value};
