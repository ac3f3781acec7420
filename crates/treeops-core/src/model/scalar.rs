//! Scalar codec
//!
//! Converts between host values and the internal [`Scalar`] variant, and
//! defines scalar equality: same variant and same content, with two
//! undefined scalars always equal.

use std::fmt;

use super::value::HostValue;

/// Variant of a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Pattern,
    NumericText,
    Number,
    Bool,
    Undefined,
}

/// Immutable scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Pattern(String),
    NumericText(String),
    Number(f64),
    Bool(bool),
    Undefined,
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Text(_) => ScalarKind::Text,
            Scalar::Pattern(_) => ScalarKind::Pattern,
            Scalar::NumericText(_) => ScalarKind::NumericText,
            Scalar::Number(_) => ScalarKind::Number,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Undefined => ScalarKind::Undefined,
        }
    }

    /// Decode a host value into a scalar
    ///
    /// Returns `None` for containers and for host-internal cookies.
    pub fn from_host(value: &HostValue) -> Option<Scalar> {
        match value {
            HostValue::String(s) => Some(Scalar::Text(s.clone())),
            HostValue::Regex(s) => Some(Scalar::Pattern(s.clone())),
            HostValue::StrNum(s) => Some(Scalar::NumericText(s.clone())),
            HostValue::Number(n) => Some(Scalar::Number(*n)),
            HostValue::Bool(b) => Some(Scalar::Bool(*b)),
            HostValue::Undefined => Some(Scalar::Undefined),
            HostValue::Array(_) | HostValue::ScalarCookie(_) | HostValue::ValueCookie(_) => None,
        }
    }

    /// Encode back into the host representation
    pub fn into_host(self) -> HostValue {
        match self {
            Scalar::Text(s) => HostValue::String(s),
            Scalar::Pattern(s) => HostValue::Regex(s),
            Scalar::NumericText(s) => HostValue::StrNum(s),
            Scalar::Number(n) => HostValue::Number(n),
            Scalar::Bool(b) => HostValue::Bool(b),
            Scalar::Undefined => HostValue::Undefined,
        }
    }

    /// Scalar equality: exact variant and exact content
    ///
    /// `NaN` equals `NaN` so that every tree equals itself.
    pub fn equals(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Text(a), Scalar::Text(b))
            | (Scalar::Pattern(a), Scalar::Pattern(b))
            | (Scalar::NumericText(a), Scalar::NumericText(b)) => a == b,
            (Scalar::Number(a), Scalar::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Undefined, Scalar::Undefined) => true,
            _ => false,
        }
    }

    /// Canonical subscript text used when this scalar is a container key
    ///
    /// Integral numbers print without a fraction so `1` and `"1"` address
    /// the same slot.
    pub fn subscript(&self) -> String {
        match self {
            Scalar::Text(s) | Scalar::Pattern(s) | Scalar::NumericText(s) => s.clone(),
            Scalar::Number(n) => number_subscript(*n),
            Scalar::Bool(true) => "1".to_string(),
            Scalar::Bool(false) => "0".to_string(),
            Scalar::Undefined => String::new(),
        }
    }
}

fn number_subscript(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subscript())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<usize> for Scalar {
    fn from(n: usize) -> Self {
        Scalar::Number(n as f64)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}
