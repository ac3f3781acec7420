use std::fmt;

use serde::{Deserialize, Serialize};

use super::scalar::Scalar;

/// Opaque handle to a host-owned container
///
/// Handles are only meaningful to the store that issued them. A store may
/// retire a handle when the container is attached; callers must use the
/// handle returned by the attach call from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Build a handle from its raw host representation
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw host representation
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Variant tag of a host value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    String,
    Regex,
    StrNum,
    Number,
    Bool,
    Undefined,
    Array,
    /// Host-internal scalar cookie; never handed to extensions in practice
    ScalarCookie,
    /// Host-internal cached value cookie; never handed to extensions in practice
    ValueCookie,
}

impl ValueTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueTag::String => "string",
            ValueTag::Regex => "regex",
            ValueTag::StrNum => "strnum",
            ValueTag::Number => "number",
            ValueTag::Bool => "bool",
            ValueTag::Undefined => "undefined",
            ValueTag::Array => "array",
            ValueTag::ScalarCookie => "scalar_cookie",
            ValueTag::ValueCookie => "value_cookie",
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value as the host represents it: a variant tag plus payload
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    String(String),
    Regex(String),
    /// Text that also reads as a number (user input)
    StrNum(String),
    Number(f64),
    Bool(bool),
    Undefined,
    Array(ContainerId),
    ScalarCookie(u64),
    ValueCookie(u64),
}

impl HostValue {
    pub fn tag(&self) -> ValueTag {
        match self {
            HostValue::String(_) => ValueTag::String,
            HostValue::Regex(_) => ValueTag::Regex,
            HostValue::StrNum(_) => ValueTag::StrNum,
            HostValue::Number(_) => ValueTag::Number,
            HostValue::Bool(_) => ValueTag::Bool,
            HostValue::Undefined => ValueTag::Undefined,
            HostValue::Array(_) => ValueTag::Array,
            HostValue::ScalarCookie(_) => ValueTag::ScalarCookie,
            HostValue::ValueCookie(_) => ValueTag::ValueCookie,
        }
    }

    /// Container handle, if this value is a container
    pub fn as_container(&self) -> Option<ContainerId> {
        match self {
            HostValue::Array(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<Scalar> for HostValue {
    fn from(scalar: Scalar) -> Self {
        scalar.into_host()
    }
}

/// Decoded value of a container entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Scalar(Scalar),
    Container(ContainerId),
}

impl EntryValue {
    /// Decode a host value, or report the tag the engine cannot handle
    pub fn decode(value: &HostValue) -> std::result::Result<Self, ValueTag> {
        if let Some(id) = value.as_container() {
            return Ok(EntryValue::Container(id));
        }
        Scalar::from_host(value)
            .map(EntryValue::Scalar)
            .ok_or_else(|| value.tag())
    }

    /// Whether two entry values have the same variant (scalar kind or container)
    pub fn same_variant(&self, other: &EntryValue) -> bool {
        match (self, other) {
            (EntryValue::Scalar(a), EntryValue::Scalar(b)) => a.kind() == b.kind(),
            (EntryValue::Container(_), EntryValue::Container(_)) => true,
            _ => false,
        }
    }
}
