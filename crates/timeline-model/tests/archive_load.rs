use std::path::Path;

use placescrub_timeline_model::{
    period_files, ArchiveError, SemanticType, SkipReason, TimelineArchive,
};

const VALID_PERIOD: &str = r#"{
    "timelineObjects": [
        {"placeVisit": {
            "location": {"latitudeE7": 374040000, "longitudeE7": -1221430000, "semanticType": "TYPE_HOME"},
            "duration": {"startTimestamp": "2023-01-05T08:00:00Z", "endTimestamp": "2023-01-05T09:00:00Z"}
        }}
    ]
}"#;

fn write(path: &Path, content: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn load_counts_empty_and_broken_periods_separately() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("2023/2023_JANUARY.json"), VALID_PERIOD.as_bytes());
    write(&root.join("2023/2023_FEBRUARY.json"), b"{}");
    write(&root.join("2023/2023_MARCH.json"), b"{\"timelineObjects\": [");
    write(&root.join("2023/notes.txt"), b"not a period");
    write(&root.join("2022/2022_DECEMBER.json"), VALID_PERIOD.as_bytes());
    write(&root.join("stray.json"), VALID_PERIOD.as_bytes());

    let (archive, report) = TimelineArchive::load(root).unwrap();

    assert_eq!(report.periods_loaded, 2);
    assert_eq!(report.empty_count(), 1);
    assert_eq!(report.parse_failures(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Parse);
    assert!(report.skipped[0].path.ends_with("2023_MARCH.json"));

    let years: Vec<_> = archive.years.keys().cloned().collect();
    assert_eq!(years, vec!["2022".to_string(), "2023".to_string()]);
    let january = &archive.years["2023"]["2023_JANUARY"];
    let visit = january.place_visits().next().unwrap();
    assert_eq!(
        visit.location.as_ref().unwrap().semantic_type,
        Some(SemanticType::Home)
    );
}

#[test]
fn load_decodes_utf16_period_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = vec![0xFF, 0xFE];
    for unit in VALID_PERIOD.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    write(&dir.path().join("2023/2023_JANUARY.json"), &bytes);

    let (archive, report) = TimelineArchive::load(dir.path()).unwrap();
    assert_eq!(report.periods_loaded, 1);
    assert_eq!(archive.period_count(), 1);
}

#[test]
fn load_rejects_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    let err = TimelineArchive::load(&missing).unwrap_err();
    assert!(matches!(err, ArchiveError::RootNotFound { .. }));
}

#[test]
fn written_archive_reloads_identically() {
    let source = tempfile::tempdir().unwrap();
    write(
        &source.path().join("2023/2023_JANUARY.json"),
        VALID_PERIOD.as_bytes(),
    );
    let (archive, _) = TimelineArchive::load(source.path()).unwrap();

    let target = tempfile::tempdir().unwrap();
    let written = archive.write_to(target.path()).unwrap();
    assert_eq!(written, 1);
    assert!(target.path().join("2023/2023_JANUARY.json").is_file());

    let (reloaded, report) = TimelineArchive::load(target.path()).unwrap();
    assert_eq!(report.parse_failures(), 0);
    assert_eq!(reloaded, archive);
}

#[test]
fn period_files_walks_recursively_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("2023/b.json"), b"{}");
    write(&dir.path().join("2023/a.json"), b"{}");
    write(&dir.path().join("2022/deep/c.json"), b"{}");
    write(&dir.path().join("2022/readme.md"), b"#");

    let names: Vec<String> = period_files(dir.path())
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["c.json", "a.json", "b.json"]);
}
