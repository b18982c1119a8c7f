//! Text for the four records written per entry.
//!
//! Shapes follow what Xcode itself writes: records on one tab-indented line
//! with `isa` first, list items with a trailing comma, and an inline comment
//! naming the file everywhere an identifier appears.

use xcpatch_pbxproj::ObjectId;

use crate::entry::Entry;

/// Indentation of records inside an `objects` section.
pub const RECORD_INDENT: &str = "\t\t";

/// Identifiers allocated for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryIds {
    pub file_ref: ObjectId,
    pub build_file: ObjectId,
}

/// `ID /* Name in Sources */ = {isa = PBXBuildFile; fileRef = ID /* Name */; };`
pub fn build_file_record(entry: &Entry, ids: &EntryIds, phase_name: &str) -> String {
    let name = comment_text(&entry.name);
    let phase = comment_text(phase_name);
    format!(
        "{RECORD_INDENT}{bf} /* {name} in {phase} */ = {{isa = PBXBuildFile; fileRef = {fr} /* {name} */; }};\n",
        bf = ids.build_file,
        fr = ids.file_ref,
    )
}

/// `ID /* Name */ = {isa = PBXFileReference; lastKnownFileType = ...; path = "..."; sourceTree = "<group>"; };`
pub fn file_reference_record(entry: &Entry, ids: &EntryIds) -> String {
    let comment = comment_text(&entry.name);
    let file_type = bare_or_quoted(entry.file_type());
    let name_field = if entry.needs_name_field() {
        format!("name = {}; ", quote(&entry.name))
    } else {
        String::new()
    };
    format!(
        "{RECORD_INDENT}{fr} /* {comment} */ = {{isa = PBXFileReference; lastKnownFileType = {file_type}; {name_field}path = {path}; sourceTree = \"<group>\"; }};\n",
        fr = ids.file_ref,
        path = quote(entry.path()),
    )
}

/// `ID /* Name */,` for a group's `children`.
pub fn group_child_line(entry: &Entry, ids: &EntryIds, indent: &str) -> String {
    format!(
        "{indent}{fr} /* {name} */,\n",
        fr = ids.file_ref,
        name = comment_text(&entry.name),
    )
}

/// `ID /* Name in Sources */,` for a build phase's `files`.
pub fn phase_file_line(entry: &Entry, ids: &EntryIds, indent: &str, phase_name: &str) -> String {
    format!(
        "{indent}{bf} /* {name} in {phase} */,\n",
        bf = ids.build_file,
        name = comment_text(&entry.name),
        phase = comment_text(phase_name),
    )
}

/// Wrap in double quotes, escaping backslashes, quotes and control
/// characters.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Leave plain identifiers such as `sourcecode.swift` unquoted.
pub fn bare_or_quoted(value: &str) -> String {
    let bare = !value.is_empty()
        && !value.contains("/*")
        && !value.contains("//")
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b'.' | b'-'));
    if bare {
        value.to_string()
    } else {
        quote(value)
    }
}

/// Keep names from closing the surrounding comment early.
fn comment_text(value: &str) -> String {
    value.replace("*/", "* /").replace('\n', " ")
}
