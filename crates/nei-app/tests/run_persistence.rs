use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use nei_app::{
    AppError, EquilibriumRequest, RunOptions, RunRequest, RunStage, equilibrium, query,
    run_service,
};
use nei_core::Element;
use nei_results::{RunStatus, RunStore};

const CASE: &str = r#"
version: 1
name: app hydrogen helium
elements: [H, He]
temperature: { type: Constant, value: 1e5, unit: K }
density: { type: Constant, value: 1e9 }
time_start: 0
dt: 10 s
max_steps: 20
rate_table: { log_t_min: 4.0, log_t_max: 6.0, points: 41 }
"#;

fn write_case(prefix: &str, body: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create case dir");
    let path = dir.join("case.yaml");
    fs::write(&path, body).expect("failed to write case");
    path
}

fn cleanup(case_path: &Path) {
    if let Some(dir) = case_path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

#[test]
fn run_is_stored_then_served_from_cache() {
    let case_path = write_case("nei_app_cache", CASE);
    let request = RunRequest {
        case_path: &case_path,
        options: RunOptions::default(),
    };

    let mut stages = Vec::new();
    let first = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| stages.push(event.stage)),
    )
    .expect("first run failed");
    assert!(!first.loaded_from_cache);
    assert_eq!(first.manifest.columns, 21);
    assert_eq!(first.manifest.status, RunStatus::Complete);
    assert_eq!(first.manifest.elements, vec!["H", "He"]);
    assert!(stages.contains(&RunStage::Simulating));
    assert_eq!(stages.last(), Some(&RunStage::Completed));

    let second = run_service::ensure_run(&request).expect("cached run failed");
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);

    let forced = run_service::ensure_run(&RunRequest {
        case_path: &case_path,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    })
    .expect("forced run failed");
    assert!(!forced.loaded_from_cache);
    assert_eq!(forced.run_id, first.run_id);

    let runs = run_service::list_runs(&case_path).expect("failed to list runs");
    assert_eq!(runs.len(), 1);

    let (_, records) = run_service::load_run(&case_path, &first.run_id).expect("load failed");
    let summary = query::get_run_summary(&records).expect("summary failed");
    assert_eq!(summary.record_count, 21);
    assert_eq!(summary.time_range, (0.0, 200.0));
    assert_eq!(summary.elements, vec!["H", "He"]);

    for record in &records {
        for element in record.elements.values() {
            let sum: f64 = element.ionic_fractions.iter().sum();
            assert!((sum - 1.0).abs() < 1e-10);
        }
    }

    let series = query::extract_series(&records, &query::parse_target("He"), "fraction_2")
        .expect("series failed");
    assert_eq!(series.len(), 21);
    assert_eq!(series[20].0, 200.0);

    cleanup(&case_path);
}

#[test]
fn failed_run_keeps_committed_columns() {
    let body = format!("{CASE}time_max: 50 s\n");
    let case_path = write_case("nei_app_failed", &body);
    let request = RunRequest {
        case_path: &case_path,
        options: RunOptions::default(),
    };

    let err = run_service::ensure_run(&request).unwrap_err();
    let run_id = match err {
        AppError::RunFailed {
            run_id, columns, ..
        } => {
            assert_eq!(columns, 6);
            run_id
        }
        other => panic!("unexpected {other:?}"),
    };

    let store = RunStore::for_case(&case_path).expect("store");
    let manifest = store.load_manifest(&run_id).expect("manifest");
    assert!(matches!(manifest.status, RunStatus::Failed { step: 6, .. }));
    let records = store.load_timeseries(&run_id).expect("records");
    assert_eq!(records.len(), 6);
    assert_eq!(records[5].time_s, 50.0);

    // failed runs are recomputed, never served from the cache
    assert!(matches!(
        run_service::ensure_run(&request),
        Err(AppError::RunFailed { .. })
    ));

    cleanup(&case_path);
}

#[test]
fn equilibrium_selectors() {
    let case_path = write_case("nei_app_equilibrium", CASE);

    let constant = equilibrium(&case_path, EquilibriumRequest::default()).expect("equilibrium");
    let at_time = equilibrium(
        &case_path,
        EquilibriumRequest {
            temperature_k: None,
            time_s: Some(30.0),
        },
    )
    .expect("equilibrium at time");
    assert_eq!(constant, at_time);

    let he = Element::from_symbol("He").unwrap();
    let hot = equilibrium(
        &case_path,
        EquilibriumRequest {
            temperature_k: Some(5e5),
            time_s: None,
        },
    )
    .expect("equilibrium at temperature");
    assert_eq!(hot[&he].len(), 3);
    assert!((hot[&he].iter().sum::<f64>() - 1.0).abs() < 1e-10);
    assert!(hot[&he][2] > constant[&he][2]);

    assert!(matches!(
        equilibrium(
            &case_path,
            EquilibriumRequest {
                temperature_k: Some(5e5),
                time_s: Some(1.0),
            },
        ),
        Err(AppError::Simulation(_))
    ));

    cleanup(&case_path);
}
