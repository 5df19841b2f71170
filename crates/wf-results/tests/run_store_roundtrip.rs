use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use wf_results::{ResultsError, RunManifest, RunStore, RunType};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn manifest(run_id: &str, study: &str, timestamp: &str, run_type: RunType) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        study_name: study.to_string(),
        timestamp: timestamp.to_string(),
        run_type,
        solver_version: "0.1.0".to_string(),
    }
}

#[test]
fn save_list_load_roundtrip() {
    let study_dir = unique_temp_dir("wf_results_study");
    fs::create_dir_all(&study_dir).expect("failed to create temp study dir");
    let study_path = study_dir.join("study.yaml");
    fs::write(&study_path, "version: 1\nname: test\n").expect("failed to write study file");

    let store = RunStore::for_study(&study_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".waterflow/runs"));

    let sweep = manifest(
        "run-2",
        "s1",
        "2026-02-26T00:00:01+00:00",
        RunType::Sweep {
            samples: 2,
            failed: 1,
        },
    );
    let solve = manifest("run-1", "s1", "2026-02-26T00:00:00+00:00", RunType::Solve);
    let other = manifest("run-3", "s2", "2026-02-26T00:00:02+00:00", RunType::Solve);

    let csv = "x,y\n0,1\n1,NaN\n";
    store.save_run(&sweep, csv, None).expect("failed to save run");
    store
        .save_run(&solve, "name,value\nlcow,0.5\n", Some("report text\n"))
        .expect("failed to save run");
    store.save_run(&other, "", None).expect("failed to save run");

    let runs = store.list_runs("s1").expect("failed to list runs");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, "run-1");
    assert_eq!(runs[1], sweep);

    assert!(store.has_run("run-2"));
    assert_eq!(store.load_manifest("run-2").unwrap(), sweep);
    assert_eq!(store.load_results("run-2").unwrap(), csv);
    assert_eq!(store.load_report("run-2").unwrap(), None);
    assert_eq!(
        store.load_report("run-1").unwrap().as_deref(),
        Some("report text\n")
    );

    store.delete_run("run-2").unwrap();
    assert!(!store.has_run("run-2"));
    assert!(matches!(
        store.load_manifest("run-2"),
        Err(ResultsError::RunNotFound { .. })
    ));

    fs::remove_dir_all(&study_dir).ok();
}

#[test]
fn missing_run_is_reported() {
    let store = RunStore::new(unique_temp_dir("wf_results_empty")).unwrap();
    assert!(!store.has_run("nope"));
    assert!(matches!(
        store.load_results("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));
    assert!(store.list_runs("any").unwrap().is_empty());
    fs::remove_dir_all(store.root_dir()).ok();
}

#[test]
fn manifest_timestamp_is_rfc3339() {
    let m = RunManifest::now("id".into(), "study", RunType::Solve, "0.1.0");
    assert!(chrono::DateTime::parse_from_rfc3339(&m.timestamp).is_ok());
}
