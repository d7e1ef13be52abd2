//! Process handle.

use super::state::ProcessState;
use crate::capability::{ProcessSignal, TtySpec};
use crate::runtime::{ExitReceiver, ExitStatus, ProcessStatus, RuntimeProcess};
use berth_shared::{BerthError, BerthResult};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Handle to one execution inside a container's task.
///
/// Cheap to clone; clones share the exit notification, so every caller of
/// [`Process::wait`] observes the same terminal code.
///
/// # Examples
///
/// ```rust,no_run
/// # async fn example(container: &berth::Container) -> berth::BerthResult<()> {
/// use berth::{ProcessIo, ProcessSpec, WorkerContainer};
///
/// let process = container
///     .run(ProcessSpec::new("/bin/true"), ProcessIo::new())
///     .await?;
/// assert_eq!(process.wait().await?, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Process {
    inner: Arc<ProcessInner>,
}

struct ProcessInner {
    id: String,
    runtime: Box<dyn RuntimeProcess>,
    /// Registered before the process was started.
    exit_rx: Mutex<Option<ExitReceiver>>,
    exit: OnceCell<ExitStatus>,
    state: parking_lot::Mutex<ProcessState>,
}

impl Process {
    pub(crate) fn new(
        runtime: Box<dyn RuntimeProcess>,
        exit_rx: ExitReceiver,
        state: ProcessState,
    ) -> Self {
        let inner = ProcessInner {
            id: runtime.id().to_string(),
            runtime,
            exit_rx: Mutex::new(Some(exit_rx)),
            exit: OnceCell::new(),
            state: parking_lot::Mutex::new(state),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Identifier of the process within its container.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Last lifecycle state observed by this handle.
    pub fn state(&self) -> ProcessState {
        *self.inner.state.lock()
    }

    /// Wait for the process to exit and return its exit code.
    pub async fn wait(&self) -> BerthResult<i32> {
        self.exit_status().await.map(|status| status.code)
    }

    /// Wait for the process to exit and return the full status.
    ///
    /// Cancel-safe: dropping the future leaves the notification in place
    /// for the next caller.
    pub async fn exit_status(&self) -> BerthResult<ExitStatus> {
        let status = self
            .inner
            .exit
            .get_or_try_init(|| async {
                let mut guard = self.inner.exit_rx.lock().await;
                let receiver = guard.as_mut().ok_or_else(|| self.channel_closed())?;
                let outcome = receiver.await;

                match outcome {
                    Ok(status) => Ok(status),
                    Err(_) => {
                        *guard = None;
                        Err(self.channel_closed())
                    }
                }
            })
            .await?;

        self.advance(ProcessState::Exited);
        tracing::debug!(process_id = %self.id(), code = status.code, "process exited");
        Ok(*status)
    }

    /// Live status from the runtime.
    pub async fn status(&self) -> BerthResult<ProcessStatus> {
        if self.inner.exit.initialized() {
            return Ok(ProcessStatus::Stopped);
        }

        let status = self
            .inner
            .runtime
            .status()
            .await
            .map_err(|e| BerthError::runtime("proc status", e))?;

        if status.is_running() {
            self.advance(ProcessState::Running);
        }
        Ok(status)
    }

    /// Whether the runtime still reports the process as live.
    pub async fn is_alive(&self) -> BerthResult<bool> {
        Ok(self.status().await?.is_alive())
    }

    /// Resize the process terminal.
    ///
    /// A spec without a window size leaves the terminal as it is.
    pub async fn set_tty(&self, tty: TtySpec) -> BerthResult<()> {
        let Some(size) = tty.window_size else {
            return Ok(());
        };

        self.inner
            .runtime
            .resize(u32::from(size.columns), u32::from(size.rows))
            .await
            .map_err(|e| BerthError::runtime("resize tty", e))
    }

    /// Per-process signalling is not supported; stop the container instead.
    pub async fn signal(&self, _signal: ProcessSignal) -> BerthResult<()> {
        Err(BerthError::NotImplemented("signal"))
    }

    fn advance(&self, target: ProcessState) {
        let mut state = self.inner.state.lock();
        if state.can_transition_to(target) {
            *state = target;
        }
    }

    fn channel_closed(&self) -> BerthError {
        BerthError::ExitChannelClosed {
            process: self.inner.id.clone(),
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}
