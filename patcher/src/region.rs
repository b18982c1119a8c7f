//! Locating the four places an entry is written to.
//!
//! Regions are found structurally: sections by their marker comments inside
//! `objects`, the group and build phase by identifier or by walking from the
//! project object. Each resolves to a [`Slot`], the byte offset where new
//! lines go plus whatever framing text the insertion needs.

use std::fmt;
use std::str::FromStr;

use xcpatch_pbxproj::{Array, Document, Edit, ID_LEN, Object, ObjectId};

use crate::error::{PatchError, Result};
use crate::render::RECORD_INDENT;

/// Display name used for build-file comments when the phase has none.
pub const DEFAULT_PHASE_NAME: &str = "Sources";

const GROUP_ISA: &str = "PBXGroup";
const SOURCES_PHASE_ISA: &str = "PBXSourcesBuildPhase";
const NATIVE_TARGET_ISA: &str = "PBXNativeTarget";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    BuildFiles,
    FileReferences,
    GroupChildren,
    BuildPhaseFiles,
}

impl Region {
    /// Section holding this region's records, for the two table regions.
    pub fn section_name(self) -> Option<&'static str> {
        match self {
            Region::BuildFiles => Some("PBXBuildFile"),
            Region::FileReferences => Some("PBXFileReference"),
            Region::GroupChildren | Region::BuildPhaseFiles => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Region::BuildFiles => "build file section",
            Region::FileReferences => "file reference section",
            Region::GroupChildren => "group children list",
            Region::BuildPhaseFiles => "build phase file list",
        })
    }
}

/// Which group receives the new children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSelector {
    Id(ObjectId),
    /// Matched against `name`, `path`, then the inline comment.
    Name(String),
    /// The project's `mainGroup`.
    Main,
}

impl GroupSelector {
    /// `main` selects the main group, a valid identifier selects by id, and
    /// anything else is a group name.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("main") {
            return GroupSelector::Main;
        }
        match ObjectId::parse(value) {
            Ok(id) => GroupSelector::Id(id),
            Err(_) => GroupSelector::Name(value.to_string()),
        }
    }

    /// Hex-only values of id-like length that are not valid identifiers:
    /// lowercase ids, or ids with a character missing or doubled.
    pub fn is_malformed_id(value: &str) -> bool {
        value.len() >= ID_LEN / 2
            && value.bytes().all(|b| b.is_ascii_hexdigit())
            && !ObjectId::is_valid(value)
    }
}

impl FromStr for GroupSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for GroupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSelector::Id(id) => write!(f, "{id}"),
            GroupSelector::Name(name) => f.write_str(name),
            GroupSelector::Main => f.write_str("main"),
        }
    }
}

/// Which `PBXSourcesBuildPhase` receives the new build files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PhaseSelector {
    Id(ObjectId),
    /// Sources phase of the native target with this name.
    Target(String),
    /// Sources phase of the project's first target.
    #[default]
    FirstTarget,
}

/// A resolved group or build phase and the list new items go into.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedList<'a> {
    pub region: Region,
    pub object: Object<'a>,
    pub list: &'a Array,
    /// Name of the native target owning a build phase, when known.
    pub target_name: Option<&'a str>,
}

impl<'a> ResolvedList<'a> {
    /// Inline comment, then `name`, then `Sources`.
    pub fn display_name(&self) -> &'a str {
        self.object
            .comment
            .or_else(|| self.object.get_str("name"))
            .unwrap_or(DEFAULT_PHASE_NAME)
    }
}

/// Where one region's lines are inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub region: Region,
    pub offset: usize,
    /// Framing written before and after the rendered lines.
    pub prefix: String,
    pub suffix: String,
    /// Indentation for each rendered line.
    pub indent: String,
    /// Offset where a separating `,` must be added after the last list item.
    pub comma_at: Option<usize>,
    /// True when the section did not exist and the framing creates it.
    pub creates_section: bool,
}

impl Slot {
    /// Inserts for `lines`, with every line break written as `newline`.
    pub fn edits(&self, lines: &str, newline: &str) -> Vec<Edit> {
        let mut edits = Vec::with_capacity(2);
        if let Some(at) = self.comma_at {
            edits.push(Edit::insert(at, ","));
        }
        let mut text = format!("{}{lines}{}", self.prefix, self.suffix);
        if newline != "\n" {
            text = text.replace('\n', newline);
        }
        edits.push(Edit::insert(self.offset, text));
        edits
    }
}

fn not_found(region: Region, detail: impl Into<String>) -> PatchError {
    PatchError::RegionNotFound {
        region,
        detail: detail.into(),
    }
}

fn expect_isa(object: &Object<'_>, expected: &'static str) -> Result<()> {
    match object.isa() {
        Some(isa) if isa == expected => Ok(()),
        other => Err(PatchError::WrongObjectType {
            id: object.id.to_string(),
            expected,
            found: other.unwrap_or("record without isa").to_string(),
        }),
    }
}

/// Slot at the end of a table section, creating the section when absent.
pub fn section_slot(doc: &Document, region: Region) -> Result<Slot> {
    let Some(name) = region.section_name() else {
        return Err(not_found(region, "region is not a section"));
    };
    let objects = doc
        .objects()
        .map_err(|err| not_found(region, err.to_string()))?;
    let sections = doc.sections();

    let mut slot = Slot {
        region,
        offset: 0,
        prefix: String::new(),
        suffix: String::new(),
        indent: RECORD_INDENT.to_string(),
        comma_at: None,
        creates_section: false,
    };

    if let Some(section) = sections.iter().find(|section| section.name == name) {
        slot.offset = doc.line_start(section.end.start);
        return Ok(slot);
    }

    // Xcode keeps sections sorted by class name.
    let begin = format!("/* Begin {name} section */\n");
    let end = format!("/* End {name} section */\n");
    slot.creates_section = true;
    if let Some(next) = sections.iter().find(|section| section.name.as_str() > name) {
        slot.offset = doc.line_start(next.begin.start);
        slot.prefix = begin;
        slot.suffix = format!("{end}\n");
    } else if let Some(last) = sections.last() {
        slot.offset = doc.next_line_start(last.end.end);
        slot.prefix = format!("\n{begin}");
        slot.suffix = end;
    } else {
        let close = objects.close_offset();
        if doc.starts_line(close) {
            slot.offset = doc.line_start(close);
            slot.prefix = format!("\n{begin}");
            slot.suffix = end;
        } else {
            slot.offset = close;
            slot.prefix = format!("\n\n{begin}");
            slot.suffix = format!("{end}{}", doc.line_indent(close));
        }
    }
    Ok(slot)
}

/// Slot just before the closing `)` of `list`.
pub fn list_slot(doc: &Document, region: Region, list: &Array) -> Slot {
    let close = list.close_offset();
    let comma_at = list.items.last().and_then(|last| {
        let end = last.span().end;
        (!starts_with_comma(&doc.text()[end..close])).then_some(end)
    });

    if doc.starts_line(close) {
        let base = doc.line_indent(close);
        Slot {
            region,
            offset: doc.line_start(close),
            prefix: String::new(),
            suffix: String::new(),
            indent: format!("{base}\t"),
            comma_at,
            creates_section: false,
        }
    } else {
        // `children = ( );` or items sharing a line with the `)`: indent
        // from the line holding the key, and move `)` back under it.
        let base = doc.line_indent(list.span.start).to_string();
        Slot {
            region,
            offset: close,
            prefix: "\n".to_string(),
            indent: format!("{base}\t"),
            suffix: base,
            comma_at,
            creates_section: false,
        }
    }
}

/// True when the first token of `text`, skipping whitespace and comments,
/// is a `,`.
fn starts_with_comma(text: &str) -> bool {
    let mut rest = text;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix("/*") {
            match after.find("*/") {
                Some(end) => rest = &after[end + 2..],
                None => return false,
            }
        } else if let Some(after) = trimmed.strip_prefix("//") {
            rest = after.find('\n').map_or("", |i| &after[i..]);
        } else {
            return trimmed.starts_with(',');
        }
    }
}

/// Resolve the build phase that receives the new build files.
pub fn resolve_phase<'a>(doc: &'a Document, selector: &PhaseSelector) -> Result<ResolvedList<'a>> {
    let region = Region::BuildPhaseFiles;
    let (phase, target_name) = match selector {
        PhaseSelector::Id(id) => {
            let phase = doc
                .object(id.as_str())
                .ok_or_else(|| not_found(region, format!("no object with id {id}")))?;
            expect_isa(&phase, SOURCES_PHASE_ISA)?;
            let owner = doc.objects_of(NATIVE_TARGET_ISA).find(|target| {
                target
                    .references("buildPhases")
                    .contains(&id.as_str())
            });
            (phase, owner.and_then(|target| target.get_str("name")))
        }
        PhaseSelector::Target(name) => {
            let target = doc
                .objects_of(NATIVE_TARGET_ISA)
                .find(|target| target.get_str("name") == Some(name.as_str()))
                .ok_or_else(|| not_found(region, format!("no native target named `{name}`")))?;
            (sources_phase_of(doc, &target)?, target.get_str("name"))
        }
        PhaseSelector::FirstTarget => {
            let project = doc
                .root_object()
                .ok_or_else(|| not_found(region, "document has no rootObject"))?;
            let first = project
                .references("targets")
                .first()
                .copied()
                .ok_or_else(|| not_found(region, "project has no targets"))?;
            let target = doc
                .object(first)
                .ok_or_else(|| not_found(region, format!("target {first} is missing")))?;
            (sources_phase_of(doc, &target)?, target.get_str("name"))
        }
    };

    let list = phase
        .get_array("files")
        .ok_or_else(|| not_found(region, format!("build phase {} has no files list", phase.id)))?;
    tracing::debug!(phase = phase.id, target = ?target_name, "resolved build phase");
    Ok(ResolvedList {
        region,
        object: phase,
        list,
        target_name,
    })
}

fn sources_phase_of<'a>(doc: &'a Document, target: &Object<'a>) -> Result<Object<'a>> {
    target
        .references("buildPhases")
        .into_iter()
        .filter_map(|id| doc.object(id))
        .find(|phase| phase.isa() == Some(SOURCES_PHASE_ISA))
        .ok_or_else(|| {
            not_found(
                Region::BuildPhaseFiles,
                format!(
                    "target `{}` has no Sources build phase",
                    target.display_name().unwrap_or(target.id)
                ),
            )
        })
}

/// Resolve the group that receives the new file references. Without a
/// selector, a group named after `target_name` is preferred, then the main
/// group.
pub fn resolve_group<'a>(
    doc: &'a Document,
    selector: Option<&GroupSelector>,
    target_name: Option<&str>,
) -> Result<ResolvedList<'a>> {
    let region = Region::GroupChildren;
    let group = match selector {
        Some(GroupSelector::Id(id)) => {
            let group = doc
                .object(id.as_str())
                .ok_or_else(|| not_found(region, format!("no object with id {id}")))?;
            expect_isa(&group, GROUP_ISA)?;
            group
        }
        Some(GroupSelector::Name(name)) => find_group_named(doc, name)
            .ok_or_else(|| not_found(region, format!("no group named `{name}`")))?,
        Some(GroupSelector::Main) => main_group(doc)?,
        None => match target_name.and_then(|name| find_group_named(doc, name)) {
            Some(group) => group,
            None => main_group(doc)?,
        },
    };

    let list = group
        .get_array("children")
        .ok_or_else(|| not_found(region, format!("group {} has no children list", group.id)))?;
    tracing::debug!(group = group.id, name = ?group.display_name(), "resolved group");
    Ok(ResolvedList {
        region,
        object: group,
        list,
        target_name: None,
    })
}

fn find_group_named<'a>(doc: &'a Document, name: &str) -> Option<Object<'a>> {
    doc.objects_of(GROUP_ISA).find(|group| {
        group.get_str("name") == Some(name)
            || group.get_str("path") == Some(name)
            || group.comment == Some(name)
    })
}

fn main_group(doc: &Document) -> Result<Object<'_>> {
    let region = Region::GroupChildren;
    let project = doc
        .root_object()
        .ok_or_else(|| not_found(region, "document has no rootObject"))?;
    let id = project
        .get_str("mainGroup")
        .ok_or_else(|| not_found(region, "project has no mainGroup"))?;
    let group = doc
        .object(id)
        .ok_or_else(|| not_found(region, format!("main group {id} is missing")))?;
    expect_isa(&group, GROUP_ISA)?;
    Ok(group)
}
