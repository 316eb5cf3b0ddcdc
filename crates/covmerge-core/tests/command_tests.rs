use covmerge_core::commands::{
    execute_merge, execute_report, validate_coverage_file, MergeArgs, ReportArgs,
};
use covmerge_core::output::read_coverage_map;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

const RUN_ONE: &str = r#"{"/src/a.js":{"path":"/src/a.js",
"statementMap":{"0":{"start":{"line":1,"column":0},"end":{"line":1,"column":9}}},
"s":{"0":3}}}"#;

const RUN_TWO: &str = r#"{"/src/a.js":{"path":"/src/a.js",
"statementMap":{"0":{"start":{"line":1,"column":0},"end":{"line":1,"column":9}}},
"s":{"0":2}},
"/src/b.js":{"path":"/src/b.js",
"statementMap":{"0":{"start":{"line":4,"column":2},"end":{"line":4,"column":8}}},
"s":{"0":0}}}"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_merge_writes_summed_counts() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "out/1/coverage.raw.json", RUN_ONE);
    write(dir.path(), "out/2/coverage-2.raw.json", RUN_TWO);
    let output = dir.path().join("coverage").join("coverage-merged.json");

    execute_merge(MergeArgs {
        root: Some(dir.path().to_path_buf()),
        output: output.clone(),
        ..Default::default()
    })
    .unwrap();

    let merged = read_coverage_map(&output).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.file_coverage_for("/src/a.js").unwrap().s[&0], 5);
    assert_eq!(merged.file_coverage_for("/src/b.js").unwrap().s[&0], 0);
}

#[test]
fn test_merge_with_no_inputs_writes_empty_map() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("merged.json");

    execute_merge(MergeArgs {
        root: Some(dir.path().to_path_buf()),
        output: output.clone(),
        ..Default::default()
    })
    .unwrap();

    assert!(read_coverage_map(&output).unwrap().is_empty());
}

#[test]
fn test_merge_fails_on_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "coverage.raw.json", "{ broken");
    let output = dir.path().join("merged.json");

    let result = execute_merge(MergeArgs {
        root: Some(dir.path().to_path_buf()),
        output: output.clone(),
        ..Default::default()
    });

    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn test_validate_accepts_raw_coverage() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "coverage.raw.json", RUN_TWO);

    assert!(validate_coverage_file(dir.path().join("coverage.raw.json")).is_ok());
}

#[test]
fn test_validate_rejects_malformed_record() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "coverage.raw.json",
        r#"{"a.js":{"statementMap":{},"s":{"4":1}}}"#,
    );

    let err = validate_coverage_file(dir.path().join("coverage.raw.json")).unwrap_err();
    assert!(err.to_string().contains("is not valid coverage"));
}

#[test]
fn test_validate_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(validate_coverage_file(dir.path().join("absent.json")).is_err());
}

#[test]
fn test_report_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "coverage.raw.json", RUN_ONE);
    let report_dir = dir.path().join("reports");

    let err = execute_report(ReportArgs {
        formats: vec!["bogus".to_string()],
        root: Some(dir.path().to_path_buf()),
        dir: Some(report_dir.clone()),
        ..Default::default()
    })
    .unwrap_err();

    assert!(err.to_string().contains("Invalid arguments"));
    assert!(!report_dir.exists());
}

#[test]
fn test_report_writes_requested_formats() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "out/coverage.raw.json", RUN_ONE);
    write(dir.path(), "out/coverage-2.raw.json", RUN_TWO);
    let report_dir = dir.path().join("reports");

    execute_report(ReportArgs {
        formats: vec!["json".to_string(), "lcovonly".to_string()],
        root: Some(dir.path().to_path_buf()),
        dir: Some(report_dir.clone()),
        ..Default::default()
    })
    .unwrap();

    let final_map = read_coverage_map(report_dir.join("coverage-final.json")).unwrap();
    assert_eq!(final_map.file_coverage_for("/src/a.js").unwrap().s[&0], 5);

    let lcov = fs::read_to_string(report_dir.join("lcov.info")).unwrap();
    assert!(lcov.contains("SF:/src/a.js"));
    assert!(lcov.contains("DA:1,5"));
}
