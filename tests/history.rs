use serde_json::json;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use thermo_solver::history::{HistoryStore, NewHistoryRecord, ProcessMode};
use thermo_solver::process::{RankineInput, TankDischargeInput};
use thermo_solver::properties::StandardBackend;
use thermo_solver::service::{Solver, ThermoOutcome, ThermoRequest};

fn temp_store() -> (TempDir, HistoryStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = HistoryStore::open(dir.path().join("history.db")).expect("open store");
    (dir, store)
}

/// 다른 연결에서 이력 테이블을 지워 저장소 쓰기를 실패하게 만든다.
fn drop_history_table(path: &std::path::Path) {
    let conn = rusqlite::Connection::open(path).expect("second connection");
    conn.execute_batch("DROP TABLE history_log").expect("drop table");
}

fn record(mode: ProcessMode, primary: f64) -> NewHistoryRecord {
    NewHistoryRecord::now(
        mode,
        "Water",
        json!({ "boiler_pressure_bar": 30.0 }),
        json!({ "thermal_efficiency": primary }),
        primary,
        primary * 10.0,
    )
}

#[test]
fn append_then_list_preserves_order() {
    let (_dir, store) = temp_store();
    let ids: Vec<i64> = (0..5)
        .map(|i| store.append(&record(ProcessMode::Rankine, i as f64)).unwrap())
        .collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 5);
    let primaries: Vec<f64> = listed.iter().map(|r| r.primary_value).collect();
    assert_eq!(primaries, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(listed[2].inputs, json!({ "boiler_pressure_bar": 30.0 }));
    assert_eq!(listed[2].secondary_value, 20.0);
}

#[test]
fn clear_empties_and_is_idempotent() {
    let (_dir, store) = temp_store();
    for i in 0..3 {
        store.append(&record(ProcessMode::Unsteady, i as f64)).unwrap();
    }
    assert_eq!(store.clear().unwrap(), 3);
    assert!(store.list().unwrap().is_empty());
    assert_eq!(store.clear().unwrap(), 0);
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    {
        let store = HistoryStore::open(&path).unwrap();
        store.append(&record(ProcessMode::Rankine, 0.33)).unwrap();
    }
    let store = HistoryStore::open(&path).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].mode, ProcessMode::Rankine);
}

#[test]
fn concurrent_appends_are_all_kept() {
    let (_dir, store) = temp_store();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    store
                        .append(&record(ProcessMode::Unsteady, (t * 100 + i) as f64))
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 40);
    assert!(listed.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn solver_records_successful_calculations() {
    let (_dir, store) = temp_store();
    let solver = Solver::new(Arc::new(StandardBackend::new()), Some(store));

    let rankine = solver
        .calculate(&ThermoRequest::Rankine(RankineInput::default()))
        .unwrap();
    let tank = solver
        .calculate(&ThermoRequest::TankDischarge(TankDischargeInput::default()))
        .unwrap();
    assert!(rankine.history_id.is_some());
    assert!(tank.history_id.is_some());

    let listed = solver.history(None).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].mode, ProcessMode::Rankine);
    assert_eq!(listed[0].fluid, "Water");
    assert_eq!(listed[1].mode, ProcessMode::Unsteady);
    assert_eq!(listed[1].fluid, "Air");

    match &rankine.outcome {
        ThermoOutcome::Rankine { result, .. } => {
            assert_eq!(listed[0].primary_value, result.thermal_efficiency);
            assert_eq!(listed[0].secondary_value, result.net_work_j_per_kg);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    match &tank.outcome {
        ThermoOutcome::Unsteady(result) => {
            assert_eq!(listed[1].primary_value, result.max_work_j);
            assert_eq!(listed[1].secondary_value, result.discharged_mass_kg);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let last = solver.history(Some(1)).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].mode, ProcessMode::Unsteady);

    assert_eq!(solver.clear_history().unwrap(), 2);
    assert!(solver.history(None).unwrap().is_empty());
}

#[test]
fn history_failure_keeps_computed_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    let store = HistoryStore::open(&path).unwrap();
    let solver = Solver::new(Arc::new(StandardBackend::new()), Some(store));
    drop_history_table(&path);

    let response = solver
        .calculate(&ThermoRequest::Rankine(RankineInput::default()))
        .expect("calculation still succeeds");
    assert!(response.history_id.is_none());
    let message = response.history_error.expect("history error reported");
    assert!(message.contains("history_log"), "{message}");
    match &response.outcome {
        ThermoOutcome::Rankine { result, .. } => {
            assert!(result.thermal_efficiency > 0.0 && result.thermal_efficiency < 1.0);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert!(solver.history(None).is_err());
    assert!(solver.clear_history().is_err());
}
