//! End-to-end patch runs against realistic descriptors.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use xcpatch_patcher::{
    Entry, GroupSelector, PatchError, PatchOptions, PatchReport, Patcher, PhaseSelector, Region,
};
use xcpatch_pbxproj::{Document, IdGenerator, ObjectId, SequentialIdGenerator};

const TEST12: &str = include_str!("../../testdata/Test12.pbxproj");
const MINIMAL: &str = include_str!("../../testdata/minimal.pbxproj");

const GROUP_ID: &str = "F1C41758CE68463E8CB18870";
const PHASE_ID: &str = "3EA678BEFCB54B688ADE0265";

fn entries(names: &[&str]) -> Vec<Entry> {
    names.iter().map(|name| Entry::new(*name, *name)).collect()
}

fn explicit_options(entries: Vec<Entry>) -> PatchOptions {
    PatchOptions {
        entries,
        group: Some(GroupSelector::parse(GROUP_ID)),
        phase: PhaseSelector::Id(PHASE_ID.parse().expect("phase id")),
        strict: true,
    }
}

fn run(text: &str, options: PatchOptions) -> PatchReport {
    let doc = Document::parse(text).expect("parse");
    let generator = SequentialIdGenerator::new("C0FFEE").expect("prefix");
    Patcher::with_generator(options, generator)
        .apply(&doc)
        .expect("apply")
}

fn scratch_project(text: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let bundle = dir.path().join("Test12.xcodeproj");
    fs::create_dir(&bundle).expect("bundle");
    let path = bundle.join("project.pbxproj");
    fs::write(&path, text).expect("seed descriptor");
    (dir, path)
}

/// Lines of `patched` that mention none of the ids added by the run.
fn without_added_lines(report: &PatchReport) -> String {
    let ids: Vec<String> = report
        .added
        .iter()
        .flat_map(|added| [added.ids.file_ref.to_string(), added.ids.build_file.to_string()])
        .collect();
    report
        .patched
        .split_inclusive('\n')
        .filter(|line| !ids.iter().any(|id| line.contains(id.as_str())))
        .collect()
}

#[test]
fn two_files_land_in_all_four_regions_in_order() {
    let report = run(MINIMAL, explicit_options(entries(&["User.swift", "Model.swift"])));
    let doc = Document::parse(report.patched.as_str()).expect("reparse");

    let build_files: Vec<_> = doc
        .objects_of("PBXBuildFile")
        .map(|object| object.comment)
        .collect();
    assert_eq!(
        build_files,
        vec![Some("User.swift in Sources"), Some("Model.swift in Sources")]
    );

    let file_refs: Vec<_> = doc
        .objects_of("PBXFileReference")
        .filter_map(|object| object.get_str("path"))
        .collect();
    assert_eq!(file_refs, vec!["User.swift", "Model.swift"]);

    let group = doc.object(GROUP_ID).expect("group");
    let phase = doc.object(PHASE_ID).expect("phase");
    let expected_children: Vec<_> = report
        .added
        .iter()
        .map(|added| added.ids.file_ref.as_str())
        .collect();
    let expected_files: Vec<_> = report
        .added
        .iter()
        .map(|added| added.ids.build_file.as_str())
        .collect();
    assert_eq!(group.references("children"), expected_children);
    assert_eq!(phase.references("files"), expected_files);
}

#[test]
fn build_file_points_at_its_own_file_reference() {
    let report = run(
        TEST12,
        PatchOptions {
            entries: entries(&["A.swift", "B.m", "C.h"]),
            ..PatchOptions::default()
        },
    );
    let doc = Document::parse(report.patched.as_str()).expect("reparse");

    for added in &report.added {
        let build_file = doc
            .object(added.ids.build_file.as_str())
            .expect("build file record");
        assert_eq!(build_file.isa(), Some("PBXBuildFile"));
        assert_eq!(build_file.get_str("fileRef"), Some(added.ids.file_ref.as_str()));

        let file_ref = doc
            .object(added.ids.file_ref.as_str())
            .expect("file reference record");
        assert_eq!(file_ref.isa(), Some("PBXFileReference"));
        assert_eq!(file_ref.get_str("path"), Some(added.entry.path()));
        assert_eq!(file_ref.get_str("sourceTree"), Some("<group>"));
    }

    let types: Vec<_> = report
        .added
        .iter()
        .filter_map(|added| doc.object(added.ids.file_ref.as_str()))
        .filter_map(|object| object.get_str("lastKnownFileType"))
        .collect();
    assert_eq!(
        types,
        vec!["sourcecode.swift", "sourcecode.c.objc", "sourcecode.c.h"]
    );
}

#[test]
fn defaults_pick_first_target_and_its_group() {
    let report = run(
        TEST12,
        PatchOptions {
            entries: entries(&["User.swift"]),
            ..PatchOptions::default()
        },
    );
    let doc = Document::parse(report.patched.as_str()).expect("reparse");
    let added = &report.added[0];

    let group = doc.object(GROUP_ID).expect("group");
    assert_eq!(
        group.references("children").last().copied(),
        Some(added.ids.file_ref.as_str())
    );
    let phase = doc.object(PHASE_ID).expect("phase");
    assert_eq!(phase.references("files").len(), 3);
    assert!(
        report
            .patched
            .contains(&format!("\t\t\t\t{} /* User.swift in Sources */,\n\t\t\t);", added.ids.build_file))
    );
}

#[test]
fn bytes_outside_inserted_lines_are_untouched() {
    let report = run(
        TEST12,
        PatchOptions {
            entries: entries(&["User.swift", "Settings.plist"]),
            ..PatchOptions::default()
        },
    );
    assert_eq!(without_added_lines(&report), TEST12);
    assert_eq!(
        report.patched.lines().count(),
        TEST12.lines().count() + 4 * report.added.len()
    );
}

#[test]
fn thousand_entries_get_unique_ids() {
    let names: Vec<String> = (0..1000).map(|i| format!("File{i}.swift")).collect();
    let doc = Document::parse(TEST12).expect("parse");
    let existing = doc.identifiers();
    let options = PatchOptions {
        entries: names.iter().map(|name| Entry::new(name, name)).collect(),
        ..PatchOptions::default()
    };

    let report = Patcher::new(options).apply(&doc).expect("apply");

    let mut seen: HashSet<ObjectId> = HashSet::new();
    for added in &report.added {
        for id in [&added.ids.file_ref, &added.ids.build_file] {
            assert!(ObjectId::is_valid(id.as_str()));
            assert!(!existing.contains(id), "{id} collides with the document");
            assert!(seen.insert(id.clone()), "{id} allocated twice");
        }
    }
    assert_eq!(seen.len(), 2000);
}

#[test]
fn running_twice_doubles_every_region() {
    let options = explicit_options(entries(&["User.swift"]));
    let first = run(MINIMAL, options.clone());

    let doc = Document::parse(first.patched.as_str()).expect("parse");
    let generator = SequentialIdGenerator::new("BEEF").expect("prefix");
    let second = Patcher::with_generator(options, generator)
        .apply(&doc)
        .expect("apply");

    let doc = Document::parse(second.patched.as_str()).expect("reparse");
    assert_eq!(doc.objects_of("PBXBuildFile").count(), 2);
    assert_eq!(doc.objects_of("PBXFileReference").count(), 2);
    assert_eq!(doc.object(GROUP_ID).expect("group").references("children").len(), 2);
    assert_eq!(doc.object(PHASE_ID).expect("phase").references("files").len(), 2);
}

#[test]
fn display_name_differing_from_path_adds_name_field() {
    let report = run(
        MINIMAL,
        explicit_options(vec![Entry::new("Model", "Shared/Model.swift")]),
    );
    let doc = Document::parse(report.patched.as_str()).expect("reparse");
    let file_ref = doc
        .object(report.added[0].ids.file_ref.as_str())
        .expect("file ref");
    assert_eq!(file_ref.get_str("name"), Some("Model"));
    assert_eq!(file_ref.get_str("path"), Some("Shared/Model.swift"));
}

#[test]
fn inline_lists_are_expanded() {
    let text = MINIMAL
        .replace("children = (\n\t\t\t);", "children = ();")
        .replace("files = (\n\t\t\t);", "files = ( );");
    let report = run(&text, explicit_options(entries(&["A.swift"])));
    let doc = Document::parse(report.patched.as_str()).expect("reparse");

    let added = &report.added[0];
    assert_eq!(
        doc.object(GROUP_ID).expect("group").references("children"),
        vec![added.ids.file_ref.as_str()]
    );
    assert!(report.patched.contains(&format!(
        "children = (\n\t\t\t\t{} /* A.swift */,\n\t\t\t);",
        added.ids.file_ref
    )));
}

#[test]
fn items_sharing_a_line_with_the_close_get_list_indent() {
    let text = MINIMAL.replace(
        "children = (\n\t\t\t);",
        "children = (\n\t\t\t\tAAAAAAAAAAAAAAAAAAAAAAAA /* A.swift */);",
    );
    let report = run(&text, explicit_options(entries(&["B.swift"])));
    let added = &report.added[0];

    assert!(report.patched.contains(&format!(
        "\t\t\t\tAAAAAAAAAAAAAAAAAAAAAAAA, /* A.swift */\n\t\t\t\t{} /* B.swift */,\n\t\t\t);",
        added.ids.file_ref
    )));
    let doc = Document::parse(report.patched.as_str()).expect("reparse");
    assert_eq!(
        doc.object(GROUP_ID).expect("group").references("children"),
        vec!["AAAAAAAAAAAAAAAAAAAAAAAA", added.ids.file_ref.as_str()]
    );
}

#[test]
fn crlf_descriptor_keeps_crlf_line_endings() {
    let text = MINIMAL.replace('\n', "\r\n");
    let report = run(&text, explicit_options(entries(&["User.swift", "Model.swift"])));

    let lone_lf = report
        .patched
        .match_indices('\n')
        .filter(|(i, _)| !report.patched[..*i].ends_with('\r'))
        .count();
    assert_eq!(lone_lf, 0);
    assert_eq!(
        report.patched.matches("\r\n").count(),
        text.matches("\r\n").count() + 8
    );
    assert_eq!(
        report.patched.replace("\r\n", "\n"),
        run(MINIMAL, explicit_options(entries(&["User.swift", "Model.swift"]))).patched
    );
}

/// Replays fixed ids, then falls back to sequential ones.
struct Replay {
    ids: Vec<&'static str>,
    rest: SequentialIdGenerator,
}

impl IdGenerator for Replay {
    fn next_id(&mut self) -> ObjectId {
        if self.ids.is_empty() {
            self.rest.next_id()
        } else {
            ObjectId::parse(self.ids.remove(0)).expect("scripted id")
        }
    }
}

#[test]
fn ids_already_in_the_document_are_never_reused() {
    let existing = "A1B2C3D4E5F60718293A4B11";
    let doc = Document::parse(TEST12).expect("parse");
    let generator = Replay {
        ids: vec![existing, GROUP_ID, "BEEF00000000000000000001"],
        rest: SequentialIdGenerator::new("C0FFEE").expect("prefix"),
    };

    let report = Patcher::with_generator(
        PatchOptions {
            entries: entries(&["User.swift"]),
            ..PatchOptions::default()
        },
        generator,
    )
    .apply(&doc)
    .expect("apply");

    let ids = &report.added[0].ids;
    assert_eq!(ids.file_ref.as_str(), "BEEF00000000000000000001");
    assert_eq!(ids.build_file.as_str(), "C0FFEE000000000000000001");
    assert_eq!(report.patched.matches(existing).count(), TEST12.matches(existing).count());
}

#[test]
fn patch_file_writes_atomically() {
    let (_dir, path) = scratch_project(MINIMAL);
    let mut patcher = Patcher::new(explicit_options(entries(&["User.swift"])));

    let report = patcher.patch_file(&path, false).expect("patch");

    assert!(report.written);
    let on_disk = fs::read_to_string(&path).expect("read back");
    assert_eq!(on_disk, report.patched);
    Document::parse(on_disk).expect("written file parses");
}

#[test]
fn dry_run_leaves_file_untouched() {
    let (_dir, path) = scratch_project(MINIMAL);
    let mut patcher = Patcher::new(explicit_options(entries(&["User.swift"])));

    let report = patcher.patch_file(&path, true).expect("patch");

    assert!(!report.written);
    assert!(report.changed());
    assert_eq!(fs::read_to_string(&path).expect("read"), MINIMAL);
    let diff = report.unified_diff("project.pbxproj");
    assert!(diff.starts_with("--- a/project.pbxproj\n+++ b/project.pbxproj\n"));
    assert_eq!(diff.lines().filter(|line| line.starts_with('+') && !line.starts_with("+++")).count(), 4);
}

#[test]
fn strict_failure_leaves_file_untouched() {
    let (_dir, path) = scratch_project(MINIMAL);
    let mut options = explicit_options(entries(&["User.swift"]));
    options.group = Some(GroupSelector::Name("Missing".to_string()));

    let err = Patcher::new(options).patch_file(&path, false).unwrap_err();

    assert!(matches!(
        err,
        PatchError::RegionNotFound {
            region: Region::GroupChildren,
            ..
        }
    ));
    assert_eq!(fs::read_to_string(&path).expect("read"), MINIMAL);
}

#[test]
fn lenient_run_patches_remaining_regions() {
    let (_dir, path) = scratch_project(MINIMAL);
    let options = PatchOptions {
        entries: entries(&["User.swift"]),
        group: Some(GroupSelector::parse(GROUP_ID)),
        phase: PhaseSelector::Target("Ghost".to_string()),
        strict: false,
    };

    let report = Patcher::new(options).patch_file(&path, false).expect("patch");

    assert_eq!(report.skipped, vec![Region::BuildPhaseFiles]);
    let doc = Document::parse(fs::read_to_string(&path).expect("read")).expect("parse");
    assert_eq!(doc.objects_of("PBXBuildFile").count(), 1);
    assert_eq!(doc.objects_of("PBXFileReference").count(), 1);
    assert_eq!(doc.object(GROUP_ID).expect("group").references("children").len(), 1);
    assert!(doc.object(PHASE_ID).expect("phase").references("files").is_empty());
}

#[test]
fn missing_descriptor_is_a_read_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("project.pbxproj");
    let err = Patcher::new(explicit_options(entries(&["A.swift"])))
        .patch_file(&path, false)
        .unwrap_err();
    assert!(matches!(err, PatchError::FileRead { .. }));
    assert!(!path.exists());
}

#[test]
fn malformed_descriptor_reports_position() {
    let (_dir, path) = scratch_project("{\n\tobjects = {\n\t\tA = ;\n\t};\n}\n");
    let err = Patcher::new(explicit_options(entries(&["A.swift"])))
        .patch_file(&path, false)
        .unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, PatchError::Parse { .. }), "{message}");
    assert!(message.contains("line 3"), "{message}");
}

#[test]
fn empty_entry_list_does_not_write() {
    let (_dir, path) = scratch_project(MINIMAL);
    let report = Patcher::new(explicit_options(Vec::new()))
        .patch_file(&path, false)
        .expect("patch");
    assert!(!report.written);
    assert_eq!(fs::read_to_string(&path).expect("read"), MINIMAL);
}
