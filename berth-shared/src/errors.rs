//! Error types for the container backend.
//!
//! Errors are split by the boundary they come from:
//! - [`RuntimeError`]: failures reported by the container runtime client
//! - [`BerthError`]: failures surfaced on the adapter's capability surface
//!
//! `BerthError::NotFound` and `BerthError::NotImplemented` are ordinary
//! outcomes, not faults. Callers branch on them:
//! ```ignore
//! match container.property("owner").await {
//!     Ok(value) => { /* present */ }
//!     Err(e) if e.is_not_found() => { /* absent */ }
//!     Err(e) if e.is_not_implemented() => { /* unsupported */ }
//!     Err(e) => { /* broken */ }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Result alias for adapter operations.
pub type BerthResult<T> = Result<T, BerthError>;

/// Result alias for runtime client operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

// ============================================================================
// Runtime Client Errors
// ============================================================================

/// Errors reported by the container runtime client.
///
/// `NotFound` is first-class: the runtime object is shared with other
/// collaborators and may disappear between calls.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The referenced container, task or process does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The object exists but is in the wrong state for the request.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// The request was rejected as malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The runtime could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Any other runtime-side failure.
    #[error("internal: {0}")]
    Internal(String),

    /// Local I/O failure (rootfs setup, stream wiring).
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Whether the runtime reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}

// ============================================================================
// Adapter Errors
// ============================================================================

/// Errors surfaced by the container adapter.
///
/// Wrapped variants name the operation that failed and keep the runtime
/// cause as their `source`.
#[derive(Debug, Error)]
pub enum BerthError {
    /// Caller-supplied arguments fail a precondition.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No active task exists for the container.
    #[error("task unavailable for container {container}: {source}")]
    TaskUnavailable {
        container: String,
        #[source]
        source: RuntimeError,
    },

    /// The referenced process does not exist in the task.
    #[error("process {process} not found: {source}")]
    ProcessNotFound {
        process: String,
        #[source]
        source: RuntimeError,
    },

    /// The attach target exists but is not running.
    #[error("process {process} not running: status = {status}")]
    ProcessNotRunning { process: String, status: String },

    /// A requested property key is absent.
    #[error("property not found: {0}")]
    NotFound(String),

    /// The operation is outside the supported surface.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The container's process template could not be read or built.
    #[error("{op}: {source}")]
    SpecInvalid {
        op: &'static str,
        #[source]
        source: RuntimeError,
    },

    /// Stream wiring for a process failed.
    #[error("{op}: {source}")]
    IoSetupFailed {
        op: &'static str,
        #[source]
        source: RuntimeError,
    },

    /// The working directory could not be prepared in the rootfs.
    #[error("setup cwd {cwd}: {source}")]
    CwdSetupFailed {
        cwd: String,
        #[source]
        source: RuntimeError,
    },

    /// The runtime refused to create the process.
    #[error("task exec {process}: {source}")]
    ProcessCreateFailed {
        process: String,
        #[source]
        source: RuntimeError,
    },

    /// The runtime refused to start the created process.
    #[error("proc start {process}: {source}")]
    ProcessStartFailed {
        process: String,
        #[source]
        source: RuntimeError,
    },

    /// A termination signal could not be delivered to the task.
    #[error("signal {signal}: {source}")]
    SignalDeliveryFailed {
        signal: String,
        #[source]
        source: RuntimeError,
    },

    /// `Stop` failed inside the termination policy.
    #[error("kill container {container}: {source}")]
    TerminationFailed {
        container: String,
        #[source]
        source: Box<BerthError>,
    },

    /// The container label store could not be read.
    #[error("labels retrieval: {0}")]
    PropertiesUnavailable(#[source] RuntimeError),

    /// A label could not be written.
    #[error("set label {name}: {source}")]
    PropertiesWriteFailed {
        name: String,
        #[source]
        source: RuntimeError,
    },

    /// The identifier generator produced no usable identifier.
    #[error("process id generation: {0}")]
    IdGeneration(String),

    /// The runtime dropped the exit notifier before delivering a status.
    #[error("exit channel closed for process {process}")]
    ExitChannelClosed { process: String },

    /// Any other runtime call that failed (wait, status, close-io, resize).
    #[error("{op}: {source}")]
    Runtime {
        op: &'static str,
        #[source]
        source: RuntimeError,
    },
}

impl BerthError {
    /// Whether this is the expected "property absent" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BerthError::NotFound(_))
    }

    /// Whether the operation is unsupported by this adapter.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, BerthError::NotImplemented(_))
    }

    /// Wrap a runtime failure with the name of the operation that failed.
    pub fn runtime(op: &'static str, source: RuntimeError) -> Self {
        Self::Runtime { op, source }
    }
}
