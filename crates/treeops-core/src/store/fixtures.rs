//! JSON fixtures for building and inspecting container trees
//!
//! Objects become containers keyed by text, arrays become containers keyed
//! by their numeric index, `null` becomes undefined. Trees are built top-down
//! so the construction rules of [`ContainerStore`] are honoured.

use serde_json::{Map, Number, Value};

use super::ContainerStore;
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, HostValue, Scalar};

/// Build a container tree from JSON and bind it under `name`
///
/// # Errors
///
/// Returns `Internal` if `json` is not an object or array, and propagates
/// store errors.
pub fn load_json<S: ContainerStore + ?Sized>(
    store: &mut S,
    name: &str,
    json: &Value,
) -> Result<ContainerId> {
    if !(json.is_object() || json.is_array()) {
        return Err(TreeOpsError::Internal {
            message: format!("root of {} must be an object or array", name),
        });
    }

    let created = store.create_container()?;
    let root = bind(store.bind_name(name, HostValue::Array(created))?)?;

    let mut pending = vec![(json, root)];
    while let Some((node, container)) = pending.pop() {
        for (key, value) in children(node) {
            match value {
                Value::Object(_) | Value::Array(_) => {
                    let child = store.create_container()?;
                    let stored = store.set_entry(container, key, HostValue::Array(child))?;
                    pending.push((value, bind(stored)?));
                }
                scalar => {
                    store.set_entry(container, key, scalar_to_host(scalar))?;
                }
            }
        }
    }
    Ok(root)
}

/// Render a container tree as JSON, keyed by subscript text
///
/// # Errors
///
/// Propagates store errors. Snapshots taken here are always released.
pub fn to_json<S: ContainerStore + ?Sized>(store: &mut S, container: ContainerId) -> Result<Value> {
    let Some(snapshot) = store.snapshot(container)? else {
        return Ok(Value::Object(Map::new()));
    };

    let mut object = Map::new();
    let mut outcome = Ok(());
    for entry in snapshot.entries() {
        let key = Scalar::from_host(&entry.key)
            .map(|k| k.subscript())
            .unwrap_or_default();
        let value = match &entry.value {
            HostValue::Array(child) => match to_json(store, *child) {
                Ok(value) => value,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            },
            other => host_to_json(other),
        };
        object.insert(key, value);
    }

    store.release_snapshot(container, snapshot)?;
    outcome.map(|()| Value::Object(object))
}

fn bind(value: HostValue) -> Result<ContainerId> {
    value.as_container().ok_or_else(|| TreeOpsError::Internal {
        message: format!("expected a container handle, got {}", value.tag()),
    })
}

fn children(node: &Value) -> Vec<(Scalar, &Value)> {
    match node {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (Scalar::Text(k.clone()), v))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (Scalar::from(i), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn scalar_to_host(value: &Value) -> HostValue {
    match value {
        Value::Null => HostValue::Undefined,
        Value::Bool(b) => HostValue::Bool(*b),
        Value::Number(n) => HostValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => HostValue::String(s.clone()),
        Value::Object(_) | Value::Array(_) => HostValue::Undefined,
    }
}

fn host_to_json(value: &HostValue) -> Value {
    match value {
        HostValue::String(s) | HostValue::Regex(s) | HostValue::StrNum(s) => {
            Value::String(s.clone())
        }
        HostValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
            Value::Number(Number::from(*n as i64))
        }
        HostValue::Number(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        HostValue::Bool(b) => Value::Bool(*b),
        _ => Value::Null,
    }
}
