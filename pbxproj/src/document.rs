use std::collections::HashSet;

use crate::error::{PbxError, Result};
use crate::id::ObjectId;
use crate::parser::{Comment, parse_document};
use crate::value::{Array, Dict, Span, Value};

/// A parsed descriptor together with its source text.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    root: Dict,
    comments: Vec<Comment>,
}

/// One record of the `objects` dictionary.
#[derive(Debug, Clone, Copy)]
pub struct Object<'a> {
    pub id: &'a str,
    /// Inline comment after the key, e.g. `Sources` in `ID /* Sources */`.
    pub comment: Option<&'a str>,
    pub fields: &'a Dict,
}

/// A `/* Begin X section */ ... /* End X section */` marker pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub begin: Span,
    pub end: Span,
}

impl<'a> Object<'a> {
    pub fn isa(&self) -> Option<&'a str> {
        self.fields.get_str("isa")
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.fields.get_str(key)
    }

    pub fn get_array(&self, key: &str) -> Option<&'a Array> {
        self.fields.get_array(key)
    }

    /// String items of the array field `key`, typically object references.
    pub fn references(&self, key: &str) -> Vec<&'a str> {
        self.get_array(key)
            .map(|array| array.strings().collect())
            .unwrap_or_default()
    }

    /// `name`, then `path`, then the inline comment.
    pub fn display_name(&self) -> Option<&'a str> {
        self.get_str("name")
            .or_else(|| self.get_str("path"))
            .or(self.comment)
    }
}

impl Document {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let (value, comments) = parse_document(&text)?;
        let root = match value {
            Value::Dict(dict) => dict,
            other => {
                return Err(PbxError::parse_at(
                    &text,
                    other.span().start,
                    format!("top-level value must be a dictionary, found {}", other.kind()),
                ));
            }
        };
        tracing::debug!(
            bytes = text.len(),
            comments = comments.len(),
            "parsed project descriptor"
        );
        Ok(Self {
            text,
            root,
            comments,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn root(&self) -> &Dict {
        &self.root
    }

    pub fn objects(&self) -> Result<&Dict> {
        self.root.get_dict("objects").ok_or(PbxError::MissingObjects)
    }

    pub fn object(&self, id: &str) -> Option<Object<'_>> {
        let objects = self.objects().ok()?;
        objects
            .entries
            .iter()
            .rev()
            .find(|entry| entry.key.value == id)
            .and_then(|entry| {
                Some(Object {
                    id: &entry.key.value,
                    comment: entry.key.comment.as_deref(),
                    fields: entry.value.as_dict()?,
                })
            })
    }

    /// Every object record in file order.
    pub fn all_objects(&self) -> impl Iterator<Item = Object<'_>> {
        self.objects()
            .ok()
            .into_iter()
            .flat_map(|objects| objects.entries.iter())
            .filter_map(|entry| {
                Some(Object {
                    id: &entry.key.value,
                    comment: entry.key.comment.as_deref(),
                    fields: entry.value.as_dict()?,
                })
            })
    }

    /// Records whose `isa` equals `isa`, in file order.
    pub fn objects_of<'a>(&'a self, isa: &'a str) -> impl Iterator<Item = Object<'a>> + 'a {
        self.all_objects()
            .filter(move |object| object.isa() == Some(isa))
    }

    /// The `PBXProject` named by `rootObject`.
    pub fn root_object(&self) -> Option<Object<'_>> {
        let id = self.root.get_str("rootObject")?;
        self.object(id)
    }

    /// Section marker pairs inside `objects`, in file order. A `Begin` marker
    /// without a matching `End` is ignored.
    pub fn sections(&self) -> Vec<Section> {
        let Ok(objects) = self.objects() else {
            return Vec::new();
        };
        let mut open: Vec<(&str, Span)> = Vec::new();
        let mut sections = Vec::new();
        for comment in &self.comments {
            if comment.span.start < objects.span.start || comment.span.end > objects.span.end {
                continue;
            }
            let Some(marker) = comment.text.strip_suffix(" section") else {
                continue;
            };
            if let Some(name) = marker.strip_prefix("Begin ") {
                open.push((name, comment.span.clone()));
            } else if let Some(name) = marker.strip_prefix("End ")
                && let Some(pos) = open.iter().rposition(|(open_name, _)| *open_name == name)
            {
                let (_, begin) = open.remove(pos);
                sections.push(Section {
                    name: name.to_string(),
                    begin,
                    end: comment.span.clone(),
                });
            }
        }
        sections.sort_by_key(|section| section.begin.start);
        sections
    }

    pub fn section(&self, name: &str) -> Option<Section> {
        self.sections()
            .into_iter()
            .find(|section| section.name == name)
    }

    /// Every identifier-shaped key or string value in the document.
    pub fn identifiers(&self) -> HashSet<ObjectId> {
        let mut ids = HashSet::new();
        collect_ids(&self.root, &mut ids);
        ids
    }

    /// Line terminator in use, judged by the first line break.
    pub fn line_ending(&self) -> &'static str {
        match self.text.find('\n') {
            Some(i) if self.text[..i].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    /// Offset of the first byte of the line containing `offset`.
    pub fn line_start(&self, offset: usize) -> usize {
        self.text[..offset].rfind('\n').map_or(0, |i| i + 1)
    }

    /// Offset just past the newline ending the line containing `offset`, or
    /// the end of the text on the last line.
    pub fn next_line_start(&self, offset: usize) -> usize {
        self.text[offset..]
            .find('\n')
            .map_or(self.text.len(), |i| offset + i + 1)
    }

    /// Leading tabs and spaces of the line containing `offset`.
    pub fn line_indent(&self, offset: usize) -> &str {
        let start = self.line_start(offset);
        let line = &self.text[start..];
        let len = line
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        &line[..len]
    }

    /// True when only spaces and tabs precede `offset` on its line.
    pub fn starts_line(&self, offset: usize) -> bool {
        let start = self.line_start(offset);
        self.text[start..offset]
            .bytes()
            .all(|b| matches!(b, b' ' | b'\t'))
    }
}

fn collect_ids(dict: &Dict, ids: &mut HashSet<ObjectId>) {
    for entry in &dict.entries {
        if let Ok(id) = ObjectId::parse(&entry.key.value) {
            ids.insert(id);
        }
        collect_value_ids(&entry.value, ids);
    }
}

fn collect_value_ids(value: &Value, ids: &mut HashSet<ObjectId>) {
    match value {
        Value::String(s) => {
            if let Ok(id) = ObjectId::parse(&s.value) {
                ids.insert(id);
            }
        }
        Value::Dict(dict) => collect_ids(dict, ids),
        Value::Array(array) => {
            for item in &array.items {
                collect_value_ids(item, ids);
            }
        }
        Value::Data(_) => {}
    }
}
