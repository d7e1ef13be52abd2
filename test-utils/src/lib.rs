//! In-memory container runtime for exercising the berth backend.
//!
//! [`FakeContainer`] implements the runtime client traits and records every
//! call in order, so tests can assert sequencing as well as outcomes. Any
//! call can be made to fail with [`FakeContainer::fail`].

use async_trait::async_trait;
use berth::runtime::{
    ExitReceiver, ExitSender, ExitStatus, IoAttach, IoConfig, IoCreator, ProcessStatus,
    RuntimeContainer, RuntimeProcess, RuntimeTask,
};
use berth::{BerthResult, Container, IdGenerator, RootfsManager, SignalKiller};
use berth_shared::{RuntimeError, RuntimeResult};
use nix::sys::signal::Signal;
use oci_spec::runtime::{Process as ProcessTemplate, Root, Spec};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

pub const ROOTFS_PATH: &str = "/var/lib/berth/containers/fake/rootfs";
pub const BASE_ENV: &str = "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

// ============================================================================
// CALL RECORDING
// ============================================================================

/// One runtime call, in the order it reached the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Spec,
    Task,
    Labels,
    SetLabels(HashMap<String, String>),
    Exec(String),
    LoadProcess(String),
    Kill(Signal),
    Wait(String),
    Start(String),
    Status(String),
    CloseStdin(String),
    Resize(String, u32, u32),
    Delete(String),
}

/// A runtime call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failpoint {
    Spec,
    Task,
    Labels,
    SetLabels,
    Exec,
    LoadProcess,
    Kill,
    Wait,
    Start,
    Status,
    CloseStdin,
    Resize,
    Delete,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<Call>>,
    failpoints: Mutex<HashSet<Failpoint>>,
}

impl Shared {
    fn enter(&self, call: Call, point: Failpoint) -> RuntimeResult<()> {
        self.calls.lock().push(call);
        if self.failpoints.lock().contains(&point) {
            return Err(RuntimeError::Internal(format!("injected {:?} failure", point)));
        }
        Ok(())
    }
}

/// Spec the fake container is created with: absolute rootfs and a shell
/// process template with a base environment.
pub fn default_spec() -> Spec {
    let mut root = Root::default();
    root.set_path(PathBuf::from(ROOTFS_PATH));

    let mut process = ProcessTemplate::default();
    process.set_args(Some(vec!["/bin/sh".to_string()]));
    process.set_env(Some(vec![BASE_ENV.to_string()]));
    process.set_cwd(PathBuf::from("/"));
    process.set_terminal(Some(false));

    let mut spec = Spec::default();
    spec.set_root(Some(root));
    spec.set_process(Some(process));
    spec
}

// ============================================================================
// CONTAINER
// ============================================================================

pub struct FakeContainer {
    id: String,
    shared: Arc<Shared>,
    spec: Mutex<Spec>,
    labels: Mutex<HashMap<String, String>>,
    task: Mutex<Option<Arc<FakeTask>>>,
}

impl FakeContainer {
    /// A container with a running task.
    pub fn new(id: &str) -> Self {
        let container = Self::without_task(id);
        let task = Arc::new(FakeTask::new(id, container.shared.clone()));
        *container.task.lock() = Some(task);
        container
    }

    /// A container whose task is gone (or was never created).
    pub fn without_task(id: &str) -> Self {
        Self {
            id: id.to_string(),
            shared: Arc::new(Shared::default()),
            spec: Mutex::new(default_spec()),
            labels: Mutex::new(HashMap::new()),
            task: Mutex::new(None),
        }
    }

    pub fn with_spec(self, spec: Spec) -> Self {
        *self.spec.lock() = spec;
        self
    }

    pub fn with_label(self, name: &str, value: &str) -> Self {
        self.labels.lock().insert(name.to_string(), value.to_string());
        self
    }

    /// The current task, for scripting processes.
    pub fn fake_task(&self) -> Option<Arc<FakeTask>> {
        self.task.lock().clone()
    }

    /// Drop the task, as a concurrent stop or garbage collection would.
    pub fn remove_task(&self) {
        self.task.lock().take();
    }

    pub fn fail(&self, point: Failpoint) {
        self.shared.failpoints.lock().insert(point);
    }

    pub fn heal(&self, point: Failpoint) {
        self.shared.failpoints.lock().remove(&point);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.shared.calls.lock().clear();
    }

    /// Signals delivered to the task, in order.
    pub fn kills(&self) -> Vec<Signal> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Kill(signal) => Some(signal),
                _ => None,
            })
            .collect()
    }

    pub fn label_store(&self) -> HashMap<String, String> {
        self.labels.lock().clone()
    }
}

#[async_trait]
impl RuntimeContainer for FakeContainer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn spec(&self) -> RuntimeResult<Spec> {
        self.shared.enter(Call::Spec, Failpoint::Spec)?;
        Ok(self.spec.lock().clone())
    }

    async fn task(&self) -> RuntimeResult<Arc<dyn RuntimeTask>> {
        self.shared.enter(Call::Task, Failpoint::Task)?;
        match self.task.lock().clone() {
            Some(task) => Ok(task as Arc<dyn RuntimeTask>),
            None => Err(RuntimeError::NotFound(format!("no running task for container {}", self.id))),
        }
    }

    async fn labels(&self) -> RuntimeResult<HashMap<String, String>> {
        self.shared.enter(Call::Labels, Failpoint::Labels)?;
        Ok(self.labels.lock().clone())
    }

    async fn set_labels(
        &self,
        labels: HashMap<String, String>,
    ) -> RuntimeResult<HashMap<String, String>> {
        self.shared
            .enter(Call::SetLabels(labels.clone()), Failpoint::SetLabels)?;
        let mut store = self.labels.lock();
        store.extend(labels);
        Ok(store.clone())
    }
}

// ============================================================================
// TASK
// ============================================================================

type ProcessTable = Arc<Mutex<HashMap<String, Arc<Entry>>>>;

pub struct FakeTask {
    id: String,
    shared: Arc<Shared>,
    processes: ProcessTable,
    exit_on_start: Mutex<Option<i32>>,
}

struct Entry {
    status: Mutex<ProcessStatus>,
    waiters: Mutex<Vec<ExitSender>>,
    exit_on_start: Option<i32>,
    template: Option<ProcessTemplate>,
    io: Mutex<Option<IoConfig>>,
}

impl Entry {
    fn new(status: ProcessStatus, template: Option<ProcessTemplate>) -> Self {
        Self {
            status: Mutex::new(status),
            waiters: Mutex::new(Vec::new()),
            exit_on_start: None,
            template,
            io: Mutex::new(None),
        }
    }

    /// Move to Stopped and notify the waiters registered so far.
    fn exit(&self, code: i32) {
        *self.status.lock() = ProcessStatus::Stopped;
        for tx in self.waiters.lock().drain(..) {
            let _ = tx.send(ExitStatus::new(code));
        }
    }
}

impl FakeTask {
    fn new(id: &str, shared: Arc<Shared>) -> Self {
        Self {
            id: id.to_string(),
            shared,
            processes: Arc::new(Mutex::new(HashMap::new())),
            exit_on_start: Mutex::new(None),
        }
    }

    /// Processes created from now on exit with `code` as soon as they start.
    pub fn exit_on_start(&self, code: Option<i32>) {
        *self.exit_on_start.lock() = code;
    }

    /// Seed a process created outside the adapter.
    pub fn insert_process(&self, id: &str, status: ProcessStatus) {
        self.processes
            .lock()
            .insert(id.to_string(), Arc::new(Entry::new(status, None)));
    }

    /// Exit a process; returns false when it does not exist.
    pub fn finish(&self, id: &str, code: i32) -> bool {
        match self.entry(id) {
            Some(entry) => {
                entry.exit(code);
                true
            }
            None => false,
        }
    }

    /// Drop every registered exit notifier without sending a status.
    pub fn drop_notifiers(&self, id: &str) {
        if let Some(entry) = self.entry(id) {
            entry.waiters.lock().clear();
        }
    }

    pub fn process_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.processes.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn status_of(&self, id: &str) -> Option<ProcessStatus> {
        self.entry(id).map(|entry| *entry.status.lock())
    }

    /// Template the process was created with.
    pub fn template(&self, id: &str) -> Option<ProcessTemplate> {
        self.entry(id).and_then(|entry| entry.template.clone())
    }

    /// Streams handed over by the last exec or load of the process.
    pub fn take_io(&self, id: &str) -> Option<IoConfig> {
        self.entry(id).and_then(|entry| entry.io.lock().take())
    }

    fn entry(&self, id: &str) -> Option<Arc<Entry>> {
        self.processes.lock().get(id).cloned()
    }

    fn handle(&self, id: &str, entry: Arc<Entry>) -> Box<dyn RuntimeProcess> {
        Box::new(FakeProcess {
            id: id.to_string(),
            entry,
            shared: self.shared.clone(),
            processes: self.processes.clone(),
        })
    }
}

#[async_trait]
impl RuntimeTask for FakeTask {
    fn id(&self) -> &str {
        &self.id
    }

    async fn exec(
        &self,
        id: &str,
        template: &ProcessTemplate,
        io: IoCreator,
    ) -> RuntimeResult<Box<dyn RuntimeProcess>> {
        self.shared.enter(Call::Exec(id.to_string()), Failpoint::Exec)?;

        let mut processes = self.processes.lock();
        if processes.contains_key(id) {
            return Err(RuntimeError::FailedPrecondition(format!("process {} already exists", id)));
        }

        let IoCreator(io) = io;
        let mut entry = Entry::new(ProcessStatus::Created, Some(template.clone()));
        entry.exit_on_start = *self.exit_on_start.lock();
        *entry.io.lock() = Some(io);

        let entry = Arc::new(entry);
        processes.insert(id.to_string(), entry.clone());
        drop(processes);

        Ok(self.handle(id, entry))
    }

    async fn load_process(&self, id: &str, io: IoAttach) -> RuntimeResult<Box<dyn RuntimeProcess>> {
        self.shared
            .enter(Call::LoadProcess(id.to_string()), Failpoint::LoadProcess)?;

        let entry = self
            .entry(id)
            .ok_or_else(|| RuntimeError::NotFound(format!("process {}", id)))?;
        let IoAttach(io) = io;
        *entry.io.lock() = Some(io);

        Ok(self.handle(id, entry))
    }

    async fn kill(&self, signal: Signal) -> RuntimeResult<()> {
        self.shared.enter(Call::Kill(signal), Failpoint::Kill)
    }
}

// ============================================================================
// PROCESS
// ============================================================================

struct FakeProcess {
    id: String,
    entry: Arc<Entry>,
    shared: Arc<Shared>,
    processes: ProcessTable,
}

#[async_trait]
impl RuntimeProcess for FakeProcess {
    fn id(&self) -> &str {
        &self.id
    }

    async fn wait(&self) -> RuntimeResult<ExitReceiver> {
        self.shared.enter(Call::Wait(self.id.clone()), Failpoint::Wait)?;
        let (tx, rx) = oneshot::channel();
        self.entry.waiters.lock().push(tx);
        Ok(rx)
    }

    async fn start(&self) -> RuntimeResult<()> {
        self.shared.enter(Call::Start(self.id.clone()), Failpoint::Start)?;

        {
            let mut status = self.entry.status.lock();
            if *status != ProcessStatus::Created {
                return Err(RuntimeError::FailedPrecondition(format!(
                    "process {} is {}",
                    self.id, *status
                )));
            }
            *status = ProcessStatus::Running;
        }

        // Exits with no registered waiter are lost, as with a real runtime.
        if let Some(code) = self.entry.exit_on_start {
            self.entry.exit(code);
        }
        Ok(())
    }

    async fn status(&self) -> RuntimeResult<ProcessStatus> {
        self.shared
            .enter(Call::Status(self.id.clone()), Failpoint::Status)?;
        Ok(*self.entry.status.lock())
    }

    async fn close_stdin(&self) -> RuntimeResult<()> {
        self.shared
            .enter(Call::CloseStdin(self.id.clone()), Failpoint::CloseStdin)?;
        if let Some(io) = self.entry.io.lock().as_mut() {
            io.stdin = None;
        }
        Ok(())
    }

    async fn resize(&self, width: u32, height: u32) -> RuntimeResult<()> {
        self.shared
            .enter(Call::Resize(self.id.clone(), width, height), Failpoint::Resize)
    }

    async fn delete(&self) -> RuntimeResult<()> {
        self.shared
            .enter(Call::Delete(self.id.clone()), Failpoint::Delete)?;
        self.processes.lock().remove(&self.id);
        Ok(())
    }
}

// ============================================================================
// ROOTFS AND IDS
// ============================================================================

/// Rootfs manager that records requests instead of touching the filesystem.
#[derive(Clone, Default)]
pub struct RecordingRootfs {
    requests: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingRootfs {
    /// `(rootfs, cwd)` pairs in request order.
    pub fn requests(&self) -> Vec<(PathBuf, PathBuf)> {
        self.requests.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl RootfsManager for RecordingRootfs {
    async fn setup_cwd(&self, container_spec: &Spec, cwd: &Path) -> RuntimeResult<()> {
        let root = container_spec
            .root()
            .as_ref()
            .map(|r| r.path().clone())
            .unwrap_or_default();
        self.requests.lock().push((root, cwd.to_path_buf()));

        if *self.failing.lock() {
            return Err(RuntimeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only rootfs",
            )));
        }
        Ok(())
    }
}

/// Ids `"{prefix}-1"`, `"{prefix}-2"`, ...
pub struct SequenceIds {
    prefix: String,
    next: AtomicUsize,
}

impl SequenceIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicUsize::new(1),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn generate(&self) -> BerthResult<String> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-{}", self.prefix, n))
    }
}

/// Always the same id, possibly empty.
pub struct FixedId(pub String);

impl IdGenerator for FixedId {
    fn generate(&self) -> BerthResult<String> {
        Ok(self.0.clone())
    }
}

// ============================================================================
// HARNESS
// ============================================================================

/// A [`Container`] wired to a [`FakeContainer`], the default signal killer,
/// a [`RecordingRootfs`] and sequential ids.
pub struct Harness {
    pub fake: Arc<FakeContainer>,
    pub rootfs: RecordingRootfs,
    pub container: Container,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_fake(FakeContainer::new("container-1"))
    }

    pub fn with_fake(fake: FakeContainer) -> Self {
        let fake = Arc::new(fake);
        let rootfs = RecordingRootfs::default();
        let container = Container::new(
            fake.clone(),
            Box::new(SignalKiller::default()),
            Box::new(rootfs.clone()),
        )
        .with_id_generator(Box::new(SequenceIds::new("proc")));

        Self {
            fake,
            rootfs,
            container,
        }
    }

    /// The fake's task; panics if the container has none.
    pub fn task(&self) -> Arc<FakeTask> {
        self.fake.fake_task().expect("fake container has no task")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
