//! Container handle.

use super::cio;
use super::id::{self, IdGenerator, UuidGenerator};
use super::killer::{KillBehaviour, Killer, SignalKiller};
use super::process::Process;
use super::rootfs::{HostRootfsManager, RootfsManager};
use super::spec::{apply_process_spec, base_template};
use super::state::ProcessState;
use crate::capability::{ProcessIo, ProcessSpec, Properties, WorkerContainer};
use crate::options::BackendOptions;
use crate::runtime::{RuntimeContainer, RuntimeProcess, RuntimeTask};
use async_trait::async_trait;
use berth_shared::{BerthError, BerthResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Adapter over one runtime container created elsewhere.
///
/// Holds no per-container mutable state: task existence, process status
/// and labels are read from the runtime on every call, so concurrent
/// callers may share one handle.
pub struct Container {
    container: Arc<dyn RuntimeContainer>,
    killer: Box<dyn Killer>,
    rootfs: Box<dyn RootfsManager>,
    ids: Box<dyn IdGenerator>,
}

impl Container {
    pub fn new(
        container: Arc<dyn RuntimeContainer>,
        killer: Box<dyn Killer>,
        rootfs: Box<dyn RootfsManager>,
    ) -> Self {
        Self {
            container,
            killer,
            rootfs,
            ids: Box::new(UuidGenerator),
        }
    }

    /// Build with the default killer and rootfs manager configured by `options`.
    pub fn from_options(
        container: Arc<dyn RuntimeContainer>,
        options: &BackendOptions,
    ) -> BerthResult<Self> {
        let killer = SignalKiller::from_options(&options.killer)?;
        let rootfs = HostRootfsManager::from_options(&options.rootfs);
        Ok(Self::new(container, Box::new(killer), Box::new(rootfs)))
    }

    /// Replace the generator used for processes run without an id.
    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    async fn task(&self) -> BerthResult<Arc<dyn RuntimeTask>> {
        self.container
            .task()
            .await
            .map_err(|source| BerthError::TaskUnavailable {
                container: self.container.id().to_string(),
                source,
            })
    }

    async fn labels(&self) -> BerthResult<HashMap<String, String>> {
        self.container
            .labels()
            .await
            .map_err(BerthError::PropertiesUnavailable)
    }
}

#[async_trait]
impl WorkerContainer for Container {
    fn handle(&self) -> &str {
        self.container.id()
    }

    async fn stop(&self, kill: bool) -> BerthResult<()> {
        let behaviour = KillBehaviour::from_force(kill);
        tracing::info!(container_id = %self.handle(), ?behaviour, "stopping container");

        let task = self.task().await?;
        self.killer
            .kill(task.as_ref(), behaviour)
            .await
            .map_err(|e| BerthError::TerminationFailed {
                container: self.handle().to_string(),
                source: Box::new(e),
            })
    }

    async fn run(&self, spec: ProcessSpec, io: ProcessIo) -> BerthResult<Process> {
        let process_id = id::process_id(&spec.id, self.ids.as_ref())?;
        tracing::info!(
            container_id = %self.handle(),
            process_id = %process_id,
            path = %spec.path,
            tty = spec.tty.is_some(),
            "running process"
        );

        let container_spec = self
            .container
            .spec()
            .await
            .map_err(|source| BerthError::SpecInvalid {
                op: "container spec",
                source,
            })?;

        let mut template = base_template(&container_spec)?;
        apply_process_spec(&spec, &mut template)?;

        let cwd = template.cwd().clone();
        self.rootfs
            .setup_cwd(&container_spec, &cwd)
            .await
            .map_err(|source| BerthError::CwdSetupFailed {
                cwd: cwd.display().to_string(),
                source,
            })?;

        let task = self.task().await?;
        let io = cio::creator(io, spec.tty.is_some());

        let process = task
            .exec(&process_id, &template, io)
            .await
            .map_err(|source| BerthError::ProcessCreateFailed {
                process: process_id.clone(),
                source,
            })?;
        tracing::debug!(process_id = %process_id, "process created");

        // Registration must precede start: an exit before it is never delivered.
        let exit_rx = match process.wait().await {
            Ok(rx) => rx,
            Err(e) => {
                discard(process.as_ref()).await;
                return Err(BerthError::runtime("proc wait", e));
            }
        };
        tracing::debug!(process_id = %process_id, "exit notification registered");

        if let Err(source) = process.start().await {
            discard(process.as_ref()).await;
            return Err(BerthError::ProcessStartFailed {
                process: process_id,
                source,
            });
        }
        tracing::debug!(process_id = %process_id, "process started");

        // The process is live and its exit is registered; the caller keeps
        // the handle so it can still wait or stop the container.
        if let Err(e) = process.close_stdin().await {
            tracing::warn!(
                process_id = %process_id,
                error = %e,
                "failed to close process stdin"
            );
        }

        Ok(Process::new(process, exit_rx, ProcessState::Started))
    }

    async fn attach(&self, process_id: &str, io: ProcessIo) -> BerthResult<Process> {
        if process_id.is_empty() {
            return Err(BerthError::InvalidInput("empty process id".into()));
        }
        tracing::info!(container_id = %self.handle(), process_id, "attaching to process");

        let task = self.task().await?;

        let process = task
            .load_process(process_id, cio::attacher(io))
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    BerthError::ProcessNotFound {
                        process: process_id.to_string(),
                        source,
                    }
                } else {
                    BerthError::IoSetupFailed {
                        op: "load process",
                        source,
                    }
                }
            })?;

        let status = process
            .status()
            .await
            .map_err(|e| BerthError::runtime("proc status", e))?;
        if !status.is_running() {
            return Err(BerthError::ProcessNotRunning {
                process: process_id.to_string(),
                status: status.to_string(),
            });
        }

        let exit_rx = process
            .wait()
            .await
            .map_err(|e| BerthError::runtime("proc wait", e))?;
        tracing::debug!(process_id, "attached");

        Ok(Process::new(process, exit_rx, ProcessState::Running))
    }

    async fn properties(&self) -> BerthResult<Properties> {
        self.labels().await
    }

    async fn property(&self, name: &str) -> BerthResult<String> {
        self.labels()
            .await?
            .remove(name)
            .ok_or_else(|| BerthError::NotFound(name.to_string()))
    }

    async fn set_property(&self, name: &str, value: &str) -> BerthResult<()> {
        tracing::debug!(container_id = %self.handle(), name, "setting property");

        let labels = HashMap::from([(name.to_string(), value.to_string())]);
        self.container
            .set_labels(labels)
            .await
            .map(|_| ())
            .map_err(|source| BerthError::PropertiesWriteFailed {
                name: name.to_string(),
                source,
            })
    }
}

/// Remove a created process that will never be handed to a caller.
async fn discard(process: &dyn RuntimeProcess) {
    if let Err(e) = process.delete().await {
        tracing::warn!(
            process_id = %process.id(),
            error = %e,
            "failed to delete process after failed run"
        );
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("handle", &self.handle())
            .finish_non_exhaustive()
    }
}

