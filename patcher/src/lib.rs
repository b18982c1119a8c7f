//! Registers source files in an Xcode project descriptor.
//!
//! For each [`Entry`] a run adds a `PBXBuildFile` record, a
//! `PBXFileReference` record, a child of the chosen group and a file of the
//! chosen Sources build phase. Regions are located on the parsed document and
//! new text is spliced into the original, so the rest of the file keeps its
//! exact bytes.
//!
//! ```no_run
//! use std::path::Path;
//! use xcpatch_patcher::{Entry, PatchOptions, Patcher};
//!
//! let options = PatchOptions {
//!     entries: vec![Entry::new("User.swift", "User.swift")],
//!     ..PatchOptions::default()
//! };
//! let report = Patcher::new(options)
//!     .patch_file(Path::new("Test12.xcodeproj/project.pbxproj"), false)
//!     .expect("patch");
//! assert_eq!(report.added.len(), 1);
//! ```

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod entry;
pub mod error;
pub mod io;
pub mod patch;
pub mod region;
pub mod render;

pub use config::{AppConfig, ConfigError, ConfigLoader};
pub use entry::{Entry, EntryParseError, last_known_file_type};
pub use error::{PatchError, Result};
pub use io::{DESCRIPTOR_FILENAME, resolve_descriptor};
pub use patch::{AddedFile, PatchOptions, PatchReport, Patcher};
pub use region::{GroupSelector, PhaseSelector, Region};
pub use render::EntryIds;
