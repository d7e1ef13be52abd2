//! Types exchanged with the container runtime client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

/// Readable byte stream handed to the runtime as process stdin.
pub type IoReader = Box<dyn AsyncRead + Send + Unpin>;

/// Writable byte stream handed to the runtime as process stdout/stderr.
pub type IoWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Receives exactly one terminal status for a process.
pub type ExitReceiver = oneshot::Receiver<ExitStatus>;

/// Sending half of an [`ExitReceiver`], held by runtime implementations.
pub type ExitSender = oneshot::Sender<ExitStatus>;

/// Process status as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    /// The runtime cannot tell.
    Unknown,
    /// Created but not yet started.
    Created,
    /// Actively executing.
    Running,
    /// Exited; the exit status is available.
    Stopped,
    /// Frozen.
    Paused,
    /// Being frozen.
    Pausing,
}

impl ProcessStatus {
    /// Only a running process may be attached to.
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }

    /// Whether the process still occupies the task.
    pub fn is_alive(&self) -> bool {
        matches!(
            self,
            ProcessStatus::Running | ProcessStatus::Paused | ProcessStatus::Pausing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Unknown => "unknown",
            ProcessStatus::Created => "created",
            ProcessStatus::Running => "running",
            ProcessStatus::Stopped => "stopped",
            ProcessStatus::Paused => "paused",
            ProcessStatus::Pausing => "pausing",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal status of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code (0 = success).
    pub code: i32,
    /// When the runtime observed the exit, if it reports it.
    pub exited_at: Option<DateTime<Utc>>,
}

impl ExitStatus {
    pub fn new(code: i32) -> Self {
        Self {
            code,
            exited_at: Some(Utc::now()),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runtime-native stream configuration.
///
/// Streams are passed through as-is; framing and backpressure belong to
/// the runtime.
pub struct IoConfig {
    pub stdin: Option<IoReader>,
    pub stdout: Option<IoWriter>,
    pub stderr: Option<IoWriter>,
    /// Allocate (or expect) a pseudo-terminal.
    pub terminal: bool,
}

impl fmt::Debug for IoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoConfig")
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .field("terminal", &self.terminal)
            .finish()
    }
}

/// Stream configuration for a new process: the runtime creates the streams.
#[derive(Debug)]
pub struct IoCreator(pub IoConfig);

/// Stream configuration for an existing process: the runtime attaches to
/// streams that already exist.
#[derive(Debug)]
pub struct IoAttach(pub IoConfig);
