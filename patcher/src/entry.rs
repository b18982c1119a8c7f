use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A file to register: its display name and project-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,

    /// Defaults to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// `lastKnownFileType` override; inferred from the extension otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryParseError {
    #[error("file entry `{0}` has an empty name")]
    EmptyName(String),
    #[error("file entry `{0}` has an empty path")]
    EmptyPath(String),
}

impl Entry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            file_type: None,
        }
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    pub fn file_type(&self) -> &str {
        match &self.file_type {
            Some(file_type) => file_type,
            None => last_known_file_type(self.path()),
        }
    }

    /// Xcode writes an explicit `name` only when it differs from the last
    /// path component.
    pub fn needs_name_field(&self) -> bool {
        let path = self.path();
        let file_name = path.rsplit('/').next().unwrap_or(path);
        file_name != self.name
    }

    pub(crate) fn validate(&self) -> Result<(), EntryParseError> {
        if self.name.trim().is_empty() {
            return Err(EntryParseError::EmptyName(self.name.clone()));
        }
        if self.path().trim().is_empty() {
            return Err(EntryParseError::EmptyPath(self.name.clone()));
        }
        Ok(())
    }
}

impl FromStr for Entry {
    type Err = EntryParseError;

    /// `NAME` or `NAME=PATH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entry = match s.split_once('=') {
            Some((name, path)) => Entry::new(name.trim(), path.trim()),
            None => Entry {
                name: s.trim().to_string(),
                path: None,
                file_type: None,
            },
        };
        if entry.name.is_empty() {
            return Err(EntryParseError::EmptyName(s.to_string()));
        }
        if entry.path().is_empty() {
            return Err(EntryParseError::EmptyPath(s.to_string()));
        }
        Ok(entry)
    }
}

/// Xcode's `lastKnownFileType` for a path, by extension.
pub fn last_known_file_type(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return "text";
    };
    match ext.to_ascii_lowercase().as_str() {
        "swift" => "sourcecode.swift",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "h" => "sourcecode.c.h",
        "hpp" | "hh" | "hxx" => "sourcecode.cpp.h",
        "c" => "sourcecode.c.c",
        "cpp" | "cc" | "cxx" => "sourcecode.cpp.cpp",
        "metal" => "sourcecode.metal",
        "s" => "sourcecode.asm",
        "plist" => "text.plist.xml",
        "entitlements" => "text.plist.entitlements",
        "strings" => "text.plist.strings",
        "xcstrings" => "text.json.xcstrings",
        "json" => "text.json",
        "md" => "net.daringfireball.markdown",
        "xcconfig" => "text.xcconfig",
        "storyboard" => "file.storyboard",
        "xib" => "file.xib",
        "xcassets" => "folder.assetcatalog",
        "xcdatamodeld" => "wrapper.xcdatamodel",
        "framework" => "wrapper.framework",
        "png" => "image.png",
        "jpg" | "jpeg" => "image.jpeg",
        "pdf" => "image.pdf",
        _ => "text",
    }
}
