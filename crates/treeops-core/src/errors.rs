use thiserror::Error;

use crate::model::{ContainerId, ValueTag};

/// Result type alias using TreeOpsError
pub type Result<T> = std::result::Result<T, TreeOpsError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error that reaches the call surface is fatal. The kind gives it a
/// stable code so callers and tests can match on it without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Arguments/configuration
    InvalidInput,
    InvalidConfig,
    SelfAlias,

    // Traversal
    Allocation,
    UnsupportedValue,

    // Host store
    StoreWrite,
    StoreAttach,
    StoreSnapshot,
    NotFound,
    StaleHandle,
    Unrooted,
    AlreadyAttached,
    SnapshotMismatch,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::SelfAlias => "ERR_SELF_ALIAS",
            ExErrorKind::Allocation => "ERR_ALLOCATION",
            ExErrorKind::UnsupportedValue => "ERR_UNSUPPORTED_VALUE",
            ExErrorKind::StoreWrite => "ERR_STORE_WRITE",
            ExErrorKind::StoreAttach => "ERR_STORE_ATTACH",
            ExErrorKind::StoreSnapshot => "ERR_STORE_SNAPSHOT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::StaleHandle => "ERR_STALE_HANDLE",
            ExErrorKind::Unrooted => "ERR_UNROOTED",
            ExErrorKind::AlreadyAttached => "ERR_ALREADY_ATTACHED",
            ExErrorKind::SnapshotMismatch => "ERR_SNAPSHOT_MISMATCH",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and the
/// operation/container context needed for a useful fatal message.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    container: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            container: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add container context
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the container context, if any
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(container) = &self.container {
            write!(f, " (container: {})", container)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for tree operations and the host store boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeOpsError {
    // ===== Argument Errors =====
    /// Wrong number of arguments at the call surface
    #[error("{op}: expected {expected} arguments, got {got}")]
    ArgumentCount {
        op: String,
        expected: String,
        got: usize,
    },

    /// A root argument is not a container
    #[error("{op}: argument {position} must be a container, found {found}")]
    ArgumentNotContainer {
        op: String,
        position: usize,
        found: ValueTag,
    },

    /// Uniq mode is neither "keys" nor "values"
    #[error("{op}: unknown mode '{mode}', expected \"keys\" or \"values\"")]
    InvalidMode { op: String, mode: String },

    /// Source and destination are the same container
    #[error("{op}: source and destination are the same container {container}")]
    SelfAliasing { op: String, container: ContainerId },

    /// Engine configuration is unusable
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Traversal Errors =====
    /// The worklist could not grow to hold the discovered frontier
    #[error("{op}: cannot grow worklist to {requested} items")]
    WorklistAllocation { op: String, requested: usize },

    /// A snapshot entry holds a value the engine cannot interpret
    #[error("{op}: unsupported {tag} value at entry {index} of container {container}")]
    UnsupportedValue {
        op: String,
        container: ContainerId,
        index: usize,
        tag: ValueTag,
    },

    /// Writing a scalar entry into a destination failed
    #[error("{op}: writing key '{key}' into container {container} failed: {source}")]
    WriteFailed {
        op: String,
        container: ContainerId,
        key: String,
        source: Box<TreeOpsError>,
    },

    /// Attaching a new subcontainer to its parent failed
    #[error("{op}: attaching subcontainer under '{key}' in container {container} failed: {source}")]
    AttachFailed {
        op: String,
        container: ContainerId,
        key: String,
        source: Box<TreeOpsError>,
    },

    /// The host refused to snapshot a container
    #[error("{op}: snapshot of container {container} failed: {source}")]
    SnapshotFailed {
        op: String,
        container: ContainerId,
        source: Box<TreeOpsError>,
    },

    // ===== Host Store Errors =====
    /// Container handle does not name any container
    #[error("Container not found: {container}")]
    ContainerNotFound { container: ContainerId },

    /// Container handle was retired by an attach and must be re-fetched
    #[error("Stale container handle: {container}")]
    StaleHandle { container: ContainerId },

    /// Container has not been attached to a parent or bound to a name
    #[error("Container {container} is not rooted")]
    UnrootedContainer { container: ContainerId },

    /// Container is already attached elsewhere
    #[error("Container {container} is already attached")]
    AlreadyAttached { container: ContainerId },

    /// Snapshot token was not issued for this container or was already released
    #[error("Snapshot {token} is not outstanding for container {container}")]
    UnknownSnapshot { container: ContainerId, token: u64 },

    /// Name is not bound in the host
    #[error("Name is not bound: {name}")]
    NameNotBound { name: String },

    // ===== Internal Errors =====
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TreeOpsError {
    /// Classify this error into the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            TreeOpsError::ArgumentCount { .. }
            | TreeOpsError::ArgumentNotContainer { .. }
            | TreeOpsError::InvalidMode { .. } => ExErrorKind::InvalidInput,
            TreeOpsError::SelfAliasing { .. } => ExErrorKind::SelfAlias,
            TreeOpsError::InvalidConfig { .. } => ExErrorKind::InvalidConfig,
            TreeOpsError::WorklistAllocation { .. } => ExErrorKind::Allocation,
            TreeOpsError::UnsupportedValue { .. } => ExErrorKind::UnsupportedValue,
            TreeOpsError::WriteFailed { .. } => ExErrorKind::StoreWrite,
            TreeOpsError::AttachFailed { .. } => ExErrorKind::StoreAttach,
            TreeOpsError::SnapshotFailed { .. } => ExErrorKind::StoreSnapshot,
            TreeOpsError::ContainerNotFound { .. } | TreeOpsError::NameNotBound { .. } => {
                ExErrorKind::NotFound
            }
            TreeOpsError::StaleHandle { .. } => ExErrorKind::StaleHandle,
            TreeOpsError::UnrootedContainer { .. } => ExErrorKind::Unrooted,
            TreeOpsError::AlreadyAttached { .. } => ExErrorKind::AlreadyAttached,
            TreeOpsError::UnknownSnapshot { .. } => ExErrorKind::SnapshotMismatch,
            TreeOpsError::Internal { .. } => ExErrorKind::Internal,
        }
    }

    /// Operation that raised this error, when the variant records one
    pub fn op(&self) -> Option<&str> {
        match self {
            TreeOpsError::ArgumentCount { op, .. }
            | TreeOpsError::ArgumentNotContainer { op, .. }
            | TreeOpsError::InvalidMode { op, .. }
            | TreeOpsError::SelfAliasing { op, .. }
            | TreeOpsError::WorklistAllocation { op, .. }
            | TreeOpsError::UnsupportedValue { op, .. }
            | TreeOpsError::WriteFailed { op, .. }
            | TreeOpsError::AttachFailed { op, .. }
            | TreeOpsError::SnapshotFailed { op, .. } => Some(op),
            _ => None,
        }
    }

    /// Innermost store error for wrapped write/attach/snapshot failures
    pub fn root_cause(&self) -> &TreeOpsError {
        match self {
            TreeOpsError::WriteFailed { source, .. }
            | TreeOpsError::AttachFailed { source, .. }
            | TreeOpsError::SnapshotFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Conversion from TreeOpsError to ExError
impl From<TreeOpsError> for ExError {
    fn from(err: TreeOpsError) -> Self {
        let kind = err.kind();
        let base = ExError::new(kind);
        match err {
            TreeOpsError::ArgumentCount { op, expected, got } => base
                .with_op(op)
                .with_message(format!("expected {} arguments, got {}", expected, got)),

            TreeOpsError::ArgumentNotContainer {
                op,
                position,
                found,
            } => base.with_op(op).with_message(format!(
                "argument {} must be a container, found {}",
                position, found
            )),

            TreeOpsError::InvalidMode { op, mode } => base
                .with_op(op)
                .with_message(format!("unknown mode '{}'", mode)),

            TreeOpsError::SelfAliasing { op, container } => base
                .with_op(op)
                .with_container(container.to_string())
                .with_message("source and destination are the same container"),

            TreeOpsError::InvalidConfig { reason } => base.with_message(reason),

            TreeOpsError::WorklistAllocation { op, requested } => base
                .with_op(op)
                .with_message(format!("cannot grow worklist to {} items", requested)),

            TreeOpsError::UnsupportedValue {
                op,
                container,
                index,
                tag,
            } => base
                .with_op(op)
                .with_container(container.to_string())
                .with_message(format!("unsupported {} value at entry {}", tag, index)),

            TreeOpsError::WriteFailed {
                op,
                container,
                key,
                source,
            } => base
                .with_op(op)
                .with_container(container.to_string())
                .with_message(format!("writing key '{}' failed", key))
                .with_source((*source).into()),

            TreeOpsError::AttachFailed {
                op,
                container,
                key,
                source,
            } => base
                .with_op(op)
                .with_container(container.to_string())
                .with_message(format!("attaching subcontainer under '{}' failed", key))
                .with_source((*source).into()),

            TreeOpsError::SnapshotFailed {
                op,
                container,
                source,
            } => base
                .with_op(op)
                .with_container(container.to_string())
                .with_message("snapshot failed")
                .with_source((*source).into()),

            TreeOpsError::ContainerNotFound { container } => base
                .with_container(container.to_string())
                .with_message("Container not found"),

            TreeOpsError::StaleHandle { container } => base
                .with_container(container.to_string())
                .with_message("Container handle is stale; re-fetch it after attaching"),

            TreeOpsError::UnrootedContainer { container } => base
                .with_container(container.to_string())
                .with_message("Container must be attached before it is populated"),

            TreeOpsError::AlreadyAttached { container } => base
                .with_container(container.to_string())
                .with_message("Container is already attached"),

            TreeOpsError::UnknownSnapshot { container, token } => base
                .with_container(container.to_string())
                .with_message(format!("Snapshot {} is not outstanding", token)),

            TreeOpsError::NameNotBound { name } => {
                base.with_message(format!("Name is not bound: {}", name))
            }

            TreeOpsError::Internal { message } => base.with_message(message),
        }
    }
}

/// Conversion from toml::de::Error to TreeOpsError
impl From<toml::de::Error> for TreeOpsError {
    fn from(err: toml::de::Error) -> Self {
        TreeOpsError::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
