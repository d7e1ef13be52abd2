//! Container runtime client interface.
//!
//! The adapter does not own the runtime objects behind these traits. They are
//! shared with other collaborators (garbage collection, an operator) and can
//! change state or disappear between calls, so every method is fallible and
//! "not found" is reported as [`RuntimeError::NotFound`].
//!
//! [`RuntimeError::NotFound`]: berth_shared::RuntimeError::NotFound

pub mod types;

pub use types::{
    ExitReceiver, ExitSender, ExitStatus, IoAttach, IoConfig, IoCreator, IoReader, IoWriter,
    ProcessStatus,
};

use async_trait::async_trait;
use berth_shared::RuntimeResult;
use nix::sys::signal::Signal;
use oci_spec::runtime::{Process as ProcessTemplate, Spec};
use std::collections::HashMap;
use std::sync::Arc;

/// A runtime-managed container created elsewhere.
#[async_trait]
pub trait RuntimeContainer: Send + Sync {
    /// Container identifier, stable for the container's lifetime.
    fn id(&self) -> &str;

    /// OCI runtime spec the container was created with.
    async fn spec(&self) -> RuntimeResult<Spec>;

    /// The container's current task.
    async fn task(&self) -> RuntimeResult<Arc<dyn RuntimeTask>>;

    /// Container-level labels.
    async fn labels(&self) -> RuntimeResult<HashMap<String, String>>;

    /// Merge `labels` into the label store and return the resulting set.
    async fn set_labels(
        &self,
        labels: HashMap<String, String>,
    ) -> RuntimeResult<HashMap<String, String>>;
}

/// The primary executing unit of a container.
#[async_trait]
pub trait RuntimeTask: Send + Sync {
    fn id(&self) -> &str;

    /// Create (but do not start) an additional process in the task.
    async fn exec(
        &self,
        id: &str,
        template: &ProcessTemplate,
        io: IoCreator,
    ) -> RuntimeResult<Box<dyn RuntimeProcess>>;

    /// Load an existing process, attaching the given streams.
    async fn load_process(&self, id: &str, io: IoAttach) -> RuntimeResult<Box<dyn RuntimeProcess>>;

    /// Deliver `signal` to the task.
    async fn kill(&self, signal: Signal) -> RuntimeResult<()>;
}

/// One process inside a task.
#[async_trait]
pub trait RuntimeProcess: Send + Sync {
    fn id(&self) -> &str;

    /// Register for the exit notification.
    ///
    /// Exits that happen before registration are not delivered.
    async fn wait(&self) -> RuntimeResult<ExitReceiver>;

    async fn start(&self) -> RuntimeResult<()>;

    async fn status(&self) -> RuntimeResult<ProcessStatus>;

    /// Close stdin once the caller's input stream is drained.
    async fn close_stdin(&self) -> RuntimeResult<()>;

    /// Resize the process terminal (character cells).
    async fn resize(&self, width: u32, height: u32) -> RuntimeResult<()>;

    /// Remove the process from the task.
    async fn delete(&self) -> RuntimeResult<()>;
}
