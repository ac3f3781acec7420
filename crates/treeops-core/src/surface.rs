//! Host call surface
//!
//! The five operations as the host sees them: positional [`HostValue`]
//! arguments in, a numeric success flag out. Argument shape is checked here
//! before any engine runs.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use treeops_core::engine::Engine;
//! use treeops_core::model::HostValue;
//! use treeops_core::store::{fixtures, MemoryStore};
//! use treeops_core::surface::{invoke, Function};
//!
//! let mut store = MemoryStore::new();
//! let src = fixtures::load_json(&mut store, "src", &json!([1, 1, 2])).unwrap();
//! let dst = store.new_root("dst").unwrap();
//!
//! let args = [HostValue::Array(src), HostValue::Array(dst)];
//! let flag = invoke(&Engine::default(), &mut store, Function::Uniq, &args).unwrap();
//! assert_eq!(flag, HostValue::Number(1.0));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::engine::{copy, equality, flatten, uniq, Engine, FlattenMode};
use crate::errors::{Result, TreeOpsError};
use crate::fatal;
use crate::model::{ContainerId, HostValue};
use crate::store::ContainerStore;

/// Operations exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Copy,
    DeepFlatten,
    DeepFlattenKeys,
    Equals,
    Uniq,
}

impl Function {
    pub const ALL: [Function; 5] = [
        Function::Copy,
        Function::DeepFlatten,
        Function::DeepFlattenKeys,
        Function::Equals,
        Function::Uniq,
    ];

    /// Name the host registers the function under
    pub fn name(&self) -> &'static str {
        match self {
            Function::Copy => copy::OP,
            Function::DeepFlatten => flatten::OP_VALUES,
            Function::DeepFlattenKeys => flatten::OP_KEYS,
            Function::Equals => equality::OP,
            Function::Uniq => uniq::OP,
        }
    }

    /// Accepted argument counts, inclusive
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Function::Uniq => (2, 3),
            _ => (2, 2),
        }
    }

    fn check_arity(&self, got: usize) -> Result<()> {
        let (min, max) = self.arity();
        if (min..=max).contains(&got) {
            return Ok(());
        }
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} or {}", min, max)
        };
        Err(TreeOpsError::ArgumentCount {
            op: self.name().to_string(),
            expected,
            got,
        })
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = TreeOpsError;

    fn from_str(s: &str) -> Result<Self> {
        Function::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| TreeOpsError::Internal {
                message: format!("no function named '{}'", s),
            })
    }
}

/// Run `function` against `args` and return its result flag
///
/// `equals` yields `1` or `0`; every other function yields `1` on success.
///
/// # Errors
///
/// Returns `ArgumentCount`, `ArgumentNotContainer` or `InvalidMode` for
/// malformed calls, and any engine error.
pub fn invoke<S: ContainerStore + ?Sized>(
    engine: &Engine,
    store: &mut S,
    function: Function,
    args: &[HostValue],
) -> Result<HostValue> {
    function.check_arity(args.len())?;
    let source = container_arg(function, args, 0)?;
    let dest = container_arg(function, args, 1)?;

    match function {
        Function::Copy => engine.copy(store, source, dest).map(|()| flag(true)),
        Function::DeepFlatten => engine.deep_flatten(store, source, dest).map(|_| flag(true)),
        Function::DeepFlattenKeys => engine
            .deep_flatten_keys(store, source, dest)
            .map(|_| flag(true)),
        Function::Equals => engine.equals(store, source, dest).map(flag),
        Function::Uniq => {
            let mode = uniq_mode(args.get(2))?;
            engine.uniq(store, source, dest, mode).map(|_| flag(true))
        }
    }
}

/// Like [`invoke`], but a failure terminates the process
pub fn invoke_or_exit<S: ContainerStore + ?Sized>(
    engine: &Engine,
    store: &mut S,
    function: Function,
    args: &[HostValue],
) -> HostValue {
    match invoke(engine, store, function, args) {
        Ok(value) => value,
        Err(err) => fatal::terminate(err),
    }
}

fn container_arg(function: Function, args: &[HostValue], index: usize) -> Result<ContainerId> {
    let value = args.get(index).unwrap_or(&HostValue::Undefined);
    value
        .as_container()
        .ok_or_else(|| TreeOpsError::ArgumentNotContainer {
            op: function.name().to_string(),
            position: index + 1,
            found: value.tag(),
        })
}

fn uniq_mode(arg: Option<&HostValue>) -> Result<FlattenMode> {
    match arg {
        None => Ok(FlattenMode::Values),
        Some(HostValue::String(mode)) | Some(HostValue::StrNum(mode)) => mode.parse(),
        Some(other) => Err(TreeOpsError::InvalidMode {
            op: uniq::OP.to_string(),
            mode: other.tag().to_string(),
        }),
    }
}

fn flag(value: bool) -> HostValue {
    HostValue::Number(if value { 1.0 } else { 0.0 })
}
