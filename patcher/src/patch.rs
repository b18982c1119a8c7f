//! One patch run: resolve regions, allocate ids, render and splice.
//!
//! Every edit is an insertion into the original text, so bytes outside the
//! four regions are preserved exactly. The result is re-parsed before it is
//! handed back; a descriptor that would no longer parse is never written.

use std::path::Path;

use similar::TextDiff;
use xcpatch_pbxproj::{Document, IdAllocator, IdGenerator, RandomIdGenerator, apply_edits};

use crate::entry::Entry;
use crate::error::{PatchError, Result};
use crate::io;
use crate::region::{
    DEFAULT_PHASE_NAME, GroupSelector, PhaseSelector, Region, Slot, list_slot, resolve_group,
    resolve_phase, section_slot,
};
use crate::render::{self, EntryIds};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
    pub entries: Vec<Entry>,
    /// `None` picks the group named after the target, then the main group.
    pub group: Option<GroupSelector>,
    pub phase: PhaseSelector,
    /// Fail instead of skipping when the group or build phase is missing.
    pub strict: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            group: None,
            phase: PhaseSelector::default(),
            strict: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedFile {
    pub entry: Entry,
    pub ids: EntryIds,
}

/// Outcome of a run, including both texts so callers can diff them.
#[derive(Debug, Clone)]
pub struct PatchReport {
    pub added: Vec<AddedFile>,
    /// Regions left untouched by a non-strict run.
    pub skipped: Vec<Region>,
    /// Sections that did not exist and were created.
    pub created_sections: Vec<&'static str>,
    pub original: String,
    pub patched: String,
    /// True once the patched text is on disk.
    pub written: bool,
}

impl PatchReport {
    fn unchanged(original: &str) -> Self {
        Self {
            added: Vec::new(),
            skipped: Vec::new(),
            created_sections: Vec::new(),
            original: original.to_string(),
            patched: original.to_string(),
            written: false,
        }
    }

    pub fn changed(&self) -> bool {
        self.original != self.patched
    }

    /// Unified diff of the run, labelled with `label` on both sides.
    pub fn unified_diff(&self, label: &str) -> String {
        TextDiff::from_lines(&self.original, &self.patched)
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{label}"), &format!("b/{label}"))
            .to_string()
    }
}

/// Applies [`PatchOptions`] to descriptors. Generic over the id source so
/// tests can use deterministic ids.
#[derive(Debug)]
pub struct Patcher<G = RandomIdGenerator> {
    options: PatchOptions,
    generator: G,
}

impl Patcher<RandomIdGenerator> {
    pub fn new(options: PatchOptions) -> Self {
        Self::with_generator(options, RandomIdGenerator)
    }
}

impl<G: IdGenerator> Patcher<G> {
    pub fn with_generator(options: PatchOptions, generator: G) -> Self {
        Self { options, generator }
    }

    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    /// Compute the patched text for `doc` without touching the filesystem.
    pub fn apply(&mut self, doc: &Document) -> Result<PatchReport> {
        for entry in &self.options.entries {
            entry.validate()?;
        }
        if self.options.entries.is_empty() {
            tracing::info!("no files to add");
            return Ok(PatchReport::unchanged(doc.text()));
        }

        let strict = self.options.strict;
        let mut skipped = Vec::new();

        let phase = tolerate(
            resolve_phase(doc, &self.options.phase),
            Region::BuildPhaseFiles,
            strict,
            &mut skipped,
        )?;
        let target_name = phase.and_then(|phase| phase.target_name);
        let group = tolerate(
            resolve_group(doc, self.options.group.as_ref(), target_name),
            Region::GroupChildren,
            strict,
            &mut skipped,
        )?;
        let phase_name = phase.map_or(DEFAULT_PHASE_NAME, |phase| phase.display_name());

        let build_slot = tolerate(
            section_slot(doc, Region::BuildFiles),
            Region::BuildFiles,
            strict,
            &mut skipped,
        )?;
        let ref_slot = tolerate(
            section_slot(doc, Region::FileReferences),
            Region::FileReferences,
            strict,
            &mut skipped,
        )?;
        let group_slot = group.map(|group| list_slot(doc, Region::GroupChildren, group.list));
        let phase_slot = phase.map(|phase| list_slot(doc, Region::BuildPhaseFiles, phase.list));

        let mut allocator = IdAllocator::new(&mut self.generator, doc.identifiers());
        let mut build_lines = String::new();
        let mut ref_lines = String::new();
        let mut child_lines = String::new();
        let mut phase_lines = String::new();
        let mut added = Vec::with_capacity(self.options.entries.len());

        for entry in &self.options.entries {
            let file_ref = allocator.allocate().map_err(PatchError::Ids)?;
            let build_file = allocator.allocate().map_err(PatchError::Ids)?;
            let ids = EntryIds {
                file_ref,
                build_file,
            };

            build_lines.push_str(&render::build_file_record(entry, &ids, phase_name));
            ref_lines.push_str(&render::file_reference_record(entry, &ids));
            if let Some(slot) = &group_slot {
                child_lines.push_str(&render::group_child_line(entry, &ids, &slot.indent));
            }
            if let Some(slot) = &phase_slot {
                phase_lines.push_str(&render::phase_file_line(
                    entry,
                    &ids,
                    &slot.indent,
                    phase_name,
                ));
            }

            tracing::info!(
                name = %entry.name,
                path = entry.path(),
                file_ref = %ids.file_ref,
                build_file = %ids.build_file,
                "adding file"
            );
            added.push(AddedFile {
                entry: entry.clone(),
                ids,
            });
        }

        let newline = doc.line_ending();
        let mut created_sections = Vec::new();
        let mut edits = Vec::new();
        // Creation order matters when two new sections share an offset.
        for (slot, lines) in [
            (build_slot, build_lines),
            (ref_slot, ref_lines),
            (group_slot, child_lines),
            (phase_slot, phase_lines),
        ] {
            let Some(slot) = slot else { continue };
            record_creation(&slot, &mut created_sections);
            edits.extend(slot.edits(&lines, newline));
        }

        let patched = apply_edits(doc.text(), &edits).map_err(PatchError::InvalidOutput)?;
        Document::parse(patched.as_str()).map_err(PatchError::InvalidOutput)?;

        Ok(PatchReport {
            added,
            skipped,
            created_sections,
            original: doc.text().to_string(),
            patched,
            written: false,
        })
    }

    /// Read, patch and (unless `dry_run`) atomically rewrite the descriptor
    /// at `path`. Nothing is written when any step fails.
    pub fn patch_file(&mut self, path: &Path, dry_run: bool) -> Result<PatchReport> {
        let text = io::read_descriptor(path)?;
        let doc = Document::parse(text).map_err(|source| PatchError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut report = self.apply(&doc)?;
        if dry_run {
            tracing::info!(path = %path.display(), "dry run, descriptor not written");
        } else if report.changed() {
            io::write_atomic(path, &report.patched)?;
            report.written = true;
            tracing::info!(
                path = %path.display(),
                files = report.added.len(),
                "descriptor updated"
            );
        }
        Ok(report)
    }
}

/// Downgrade an unresolved region to a skip when not strict.
fn tolerate<T>(
    result: Result<T>,
    region: Region,
    strict: bool,
    skipped: &mut Vec<Region>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if !strict && err.is_unresolved_region() => {
            tracing::warn!(%region, error = %err, "skipping region");
            skipped.push(region);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn record_creation(slot: &Slot, created: &mut Vec<&'static str>) {
    if !slot.creates_section {
        return;
    }
    if let Some(name) = slot.region.section_name() {
        tracing::warn!(section = name, "section missing, creating it");
        created.push(name);
    }
}
