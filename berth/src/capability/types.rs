//! Portable types of the container capability surface.

use crate::runtime::{IoReader, IoWriter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

/// Flat container metadata, backed by runtime labels.
pub type Properties = HashMap<String, String>;

// ============================================================================
// PROCESS DESCRIPTION
// ============================================================================

/// Portable description of a process to run in a container.
///
/// # Examples
///
/// ```
/// use berth::capability::{ProcessSpec, TtySpec, WindowSize};
///
/// let spec = ProcessSpec::new("/bin/sh")
///     .args(["-c", "make test"])
///     .env("CI=true")
///     .dir("/tmp/build")
///     .tty(TtySpec::with_window(WindowSize::new(80, 24)));
/// assert_eq!(spec.path, "/bin/sh");
/// assert_eq!(spec.args.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Identifier within the container. Generated when empty.
    #[serde(default)]
    pub id: String,
    /// Program path.
    pub path: String,
    /// Arguments after the program path.
    #[serde(default)]
    pub args: Vec<String>,
    /// `KEY=VALUE` entries appended to the container's environment.
    #[serde(default)]
    pub env: Vec<String>,
    /// Working directory. Defaults to the filesystem root.
    #[serde(default)]
    pub dir: String,
    /// Terminal request.
    #[serde(default)]
    pub tty: Option<TtySpec>,
}

impl ProcessSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add one `KEY=VALUE` environment entry.
    pub fn env(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn tty(mut self, tty: TtySpec) -> Self {
        self.tty = Some(tty);
        self
    }
}

/// Terminal request for a process.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtySpec {
    /// Initial size; the runtime default applies when absent.
    #[serde(default)]
    pub window_size: Option<WindowSize>,
}

impl TtySpec {
    pub fn with_window(window_size: WindowSize) -> Self {
        Self {
            window_size: Some(window_size),
        }
    }
}

/// Terminal size in character cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub columns: u16,
    pub rows: u16,
}

impl WindowSize {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

/// Signals a caller may ask a single process to receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessSignal {
    Terminate,
    Kill,
}

// ============================================================================
// PROCESS I/O
// ============================================================================

/// Caller-side byte streams for a process.
///
/// Any stream left unset is not wired.
#[derive(Default)]
pub struct ProcessIo {
    pub stdin: Option<IoReader>,
    pub stdout: Option<IoWriter>,
    pub stderr: Option<IoWriter>,
}

impl ProcessIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdin(mut self, stdin: IoReader) -> Self {
        self.stdin = Some(stdin);
        self
    }

    pub fn stdout(mut self, stdout: IoWriter) -> Self {
        self.stdout = Some(stdout);
        self
    }

    pub fn stderr(mut self, stderr: IoWriter) -> Self {
        self.stderr = Some(stderr);
        self
    }
}

impl fmt::Debug for ProcessIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessIo")
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

// ============================================================================
// UNSUPPORTED SURFACE
// ============================================================================

/// Snapshot of container state (unsupported by this backend).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub state: String,
    pub events: Vec<String>,
    pub host_ip: String,
    pub container_ip: String,
    pub external_ip: String,
    pub container_path: String,
    pub process_ids: Vec<String>,
    pub properties: Properties,
    pub mapped_ports: Vec<PortMapping>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub host_port: u32,
    pub container_port: u32,
}

/// Resource usage counters (unsupported by this backend).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContainerMetrics {
    pub memory_bytes: u64,
    pub cpu_usage_ns: u64,
    pub disk_total_bytes: u64,
    pub network_rx_bytes: u64,
    pub network_tx_bytes: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthLimits {
    pub rate_in_bytes_per_second: u64,
    pub burst_rate_in_bytes_per_second: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuLimits {
    pub weight: u64,
    pub limit_in_shares: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskLimits {
    pub inode_soft: u64,
    pub inode_hard: u64,
    pub byte_soft: u64,
    pub byte_hard: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLimits {
    pub limit_in_bytes: u64,
}

/// Tar stream to unpack at `path` inside the container.
pub struct StreamInSpec {
    pub path: String,
    pub user: String,
    pub tar_stream: IoReader,
}

/// Path inside the container to stream out as a tar archive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOutSpec {
    pub path: String,
    pub user: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetProtocol {
    All,
    Tcp,
    Udp,
    Icmp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

/// Egress rule (unsupported by this backend).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetOutRule {
    pub protocol: NetProtocol,
    #[serde(default)]
    pub networks: Vec<IpRange>,
    #[serde(default)]
    pub ports: Vec<PortRange>,
    #[serde(default)]
    pub log: bool,
}
