#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{empty_root, render, store_with};
use serde_json::json;
use treeops_core::surface::{invoke, invoke_or_exit, Function};
use treeops_core::{ContainerId, Engine, ExErrorKind, HostValue, TreeOpsError, ValueTag};

fn args(values: &[ContainerId]) -> Vec<HostValue> {
    values.iter().map(|c| HostValue::Array(*c)).collect()
}

#[test]
fn test_every_function_returns_success_flag() {
    let engine = Engine::default();
    for function in [
        Function::Copy,
        Function::DeepFlatten,
        Function::DeepFlattenKeys,
        Function::Uniq,
    ] {
        let (mut store, src) = store_with(&json!({"a": [1, 2]}));
        let dst = empty_root(&mut store, "dst");

        let result = invoke(&engine, &mut store, function, &args(&[src, dst])).unwrap();

        assert_eq!(result, HostValue::Number(1.0), "{}", function);
    }
}

#[test]
fn test_equals_returns_its_result() {
    let engine = Engine::default();
    let (mut store, src) = store_with(&json!({"a": 1}));
    let dst = empty_root(&mut store, "dst");

    let before = invoke(&engine, &mut store, Function::Equals, &args(&[src, dst])).unwrap();
    invoke(&engine, &mut store, Function::Copy, &args(&[src, dst])).unwrap();
    let after = invoke(&engine, &mut store, Function::Equals, &args(&[src, dst])).unwrap();

    assert_eq!(before, HostValue::Number(0.0));
    assert_eq!(after, HostValue::Number(1.0));
}

#[test]
fn test_uniq_mode_argument() {
    let engine = Engine::default();
    let (mut store, src) = store_with(&json!({"k": "v"}));
    let dst = empty_root(&mut store, "dst");
    let mut call = args(&[src, dst]);
    call.push(HostValue::String("keys".to_string()));

    invoke(&engine, &mut store, Function::Uniq, &call).unwrap();

    assert_eq!(render(&mut store, dst), json!({"k": null}));
}

#[test]
fn test_unknown_uniq_mode_is_invalid_input() {
    let engine = Engine::default();
    let (mut store, src) = store_with(&json!({"k": "v"}));
    let dst = empty_root(&mut store, "dst");
    let mut call = args(&[src, dst]);
    call.push(HostValue::String("both".to_string()));

    let err = invoke(&engine, &mut store, Function::Uniq, &call).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(
        err,
        TreeOpsError::InvalidMode {
            op: "uniq".to_string(),
            mode: "both".to_string()
        }
    );
    assert_eq!(store_len(&store, dst), 0);
}

#[test]
fn test_wrong_argument_count() {
    let engine = Engine::default();
    let (mut store, src) = store_with(&json!({}));

    let err = invoke(&engine, &mut store, Function::Copy, &args(&[src])).unwrap_err();

    assert_eq!(
        err,
        TreeOpsError::ArgumentCount {
            op: "copy".to_string(),
            expected: "2".to_string(),
            got: 1
        }
    );
}

#[test]
fn test_scalar_root_argument_is_rejected() {
    let engine = Engine::default();
    let (mut store, src) = store_with(&json!({}));

    let err = invoke(
        &engine,
        &mut store,
        Function::DeepFlatten,
        &[HostValue::Number(3.0), HostValue::Array(src)],
    )
    .unwrap_err();

    assert_eq!(
        err,
        TreeOpsError::ArgumentNotContainer {
            op: "deep_flatten".to_string(),
            position: 1,
            found: ValueTag::Number
        }
    );
}

#[test]
fn test_self_alias_through_surface() {
    let engine = Engine::default();
    let (mut store, src) = store_with(&json!({"a": 1}));

    let err = invoke(&engine, &mut store, Function::Uniq, &args(&[src, src])).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::SelfAlias);
}

#[test]
fn test_invoke_or_exit_passes_through_success() {
    let engine = Engine::default();
    let (mut store, src) = store_with(&json!({"a": 1}));

    let result = invoke_or_exit(&engine, &mut store, Function::Equals, &args(&[src, src]));

    assert_eq!(result, HostValue::Number(1.0));
}

const FATAL_CHILD_ENV: &str = "TREEOPS_FATAL_CHILD";

#[test]
fn test_invoke_or_exit_terminates_on_failure() {
    if std::env::var_os(FATAL_CHILD_ENV).is_some() {
        let engine = Engine::default();
        let (mut store, src) = store_with(&json!({"a": 1}));
        invoke_or_exit(&engine, &mut store, Function::Copy, &args(&[src, src]));
        unreachable!("self-aliased copy returned");
    }

    let output = std::process::Command::new(std::env::current_exe().unwrap())
        .args([
            "--exact",
            "test_invoke_or_exit_terminates_on_failure",
            "--test-threads=1",
            "--nocapture",
        ])
        .env(FATAL_CHILD_ENV, "1")
        .output()
        .expect("failed to re-run test binary");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(treeops_core::fatal::EXIT_STATUS));
    assert!(
        stderr.contains("Error: [ERR_SELF_ALIAS] in operation 'copy'"),
        "stderr was: {}",
        stderr
    );
}

fn store_len(store: &treeops_core::MemoryStore, container: ContainerId) -> usize {
    store.len(container).unwrap()
}
