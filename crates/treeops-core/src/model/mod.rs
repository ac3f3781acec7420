pub mod scalar;
pub mod value;

pub use scalar::{Scalar, ScalarKind};
pub use value::{ContainerId, EntryValue, HostValue, ValueTag};
