use modelrun_core::results::ResultsStore;
use modelrun_core::script::{script_engine_names, ScriptBridge, DEFAULT_SCRIPT_ENGINE};
use modelrun_core::ModelRunError;
use ndarray::array;
use std::io::Write;

// Pull in the engine registration
use modelrun_script as _;

fn store() -> ResultsStore {
    let mut store = ResultsStore::new(3);
    store.insert("Y", array![2.0, 4.0, 4.0]).unwrap();
    store.insert("X", array![1.0, 2.0, 2.0]).unwrap();
    store
}

#[test]
fn test_default_engine_is_registered() {
    assert!(script_engine_names().contains(&DEFAULT_SCRIPT_ENGINE));
}

#[test]
fn test_new_series_are_appended() {
    let bridge = ScriptBridge::named("series");
    let mut store = store();

    let summary = bridge
        .apply(&mut store, 3, "R = Y / X\nC = cumsum(X)")
        .unwrap();

    assert_eq!(summary.added, vec!["R", "C"]);
    assert!(summary.updated.is_empty());
    let names: Vec<&str> = store.names().collect();
    assert_eq!(names, vec!["Y", "X", "R", "C"]);
    assert_eq!(store.get("C").unwrap(), &array![1.0, 3.0, 5.0]);
}

#[test]
fn test_existing_series_are_updated_in_place() {
    let bridge = ScriptBridge::named("series");
    let mut store = store();

    let summary = bridge.apply(&mut store, 3, "Y = Y + 1; X = X").unwrap();

    assert!(summary.added.is_empty());
    assert_eq!(summary.updated, vec!["Y"]);
    let names: Vec<&str> = store.names().collect();
    assert_eq!(names, vec!["Y", "X"]);
    assert_eq!(store.get("Y").unwrap(), &array![3.0, 5.0, 5.0]);
}

#[test]
fn test_horizon_is_visible_but_not_merged() {
    let bridge = ScriptBridge::named("series");
    let mut store = store();

    bridge
        .apply(&mut store, 3, "T = zeros(LL)\nfor i in 0..LL { T[i] = i }")
        .unwrap();

    assert!(!store.contains("LL"));
    assert!(!store.contains("i"));
    assert_eq!(store.get("T").unwrap(), &array![0.0, 1.0, 2.0]);
}

#[test]
fn test_scalars_are_not_merged() {
    let bridge = ScriptBridge::named("series");
    let mut store = store();

    let summary = bridge.apply(&mut store, 3, "total = sum(Y)").unwrap();

    assert!(summary.is_empty());
    assert_eq!(store.len(), 2);
}

#[test]
fn test_failed_script_leaves_results_untouched() {
    let bridge = ScriptBridge::named("series");
    let mut store = store();
    let before = store.clone();

    let err = bridge
        .apply(&mut store, 3, "Y = Y * 10\nZ = [1, 2]")
        .unwrap_err();
    assert!(matches!(err, ModelRunError::Script { .. }));
    assert!(err
        .to_string()
        .contains("variable 'Z' has 2 values but the horizon is 3"));
    assert_eq!(store, before);

    let err = bridge.apply(&mut store, 3, "Y = Y +").unwrap_err();
    assert!(err.to_string().contains("line 1: syntax error"));
    assert_eq!(store, before);
}

#[test]
fn test_oversized_series_is_a_script_error() {
    let bridge = ScriptBridge::named("series");
    let mut store = store();
    let before = store.clone();

    let err = bridge.apply(&mut store, 3, "T = zeros(1e13)").unwrap_err();

    assert!(matches!(err, ModelRunError::Script { .. }));
    assert!(err.to_string().contains("exceeds the maximum series length"));
    assert_eq!(store, before);
}

#[test]
fn test_deeply_nested_script_is_a_script_error() {
    let bridge = ScriptBridge::named("series");
    let mut store = store();
    let before = store.clone();
    let source = format!("T = {}1{}", "(".repeat(200_000), ")".repeat(200_000));

    let err = bridge.apply(&mut store, 3, &source).unwrap_err();

    assert!(matches!(err, ModelRunError::Script { .. }));
    assert!(err.to_string().contains("nested more than"));
    assert_eq!(store, before);
}

#[test]
fn test_custom_horizon_name() {
    let bridge = ScriptBridge::named("series").with_horizon_name("T");
    let mut store = store();

    bridge.apply(&mut store, 3, "O = fill(T, 1)").unwrap();

    assert_eq!(store.get("O").unwrap(), &array![1.0, 1.0, 1.0]);
    assert!(!store.contains("T"));
}

#[test]
fn test_apply_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# derived").unwrap();
    writeln!(file, "D = Y - X").unwrap();

    let bridge = ScriptBridge::named("series");
    let mut store = store();
    bridge.apply_file(&mut store, 3, file.path()).unwrap();

    assert_eq!(store.get("D").unwrap(), &array![1.0, 2.0, 2.0]);
}
