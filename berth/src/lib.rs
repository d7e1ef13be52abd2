//! Berth - worker-side container backend
//!
//! Runs, attaches to and stops processes inside containers that a runtime
//! client already created, and exposes container labels as properties.
//! The runtime itself is reached through the traits in [`runtime`].

pub mod backend;
pub mod capability;
pub mod options;
pub mod runtime;
pub mod util;

pub use backend::{
    Container, HostRootfsManager, IdGenerator, KillBehaviour, Killer, Process, ProcessState,
    RootfsManager, SignalKiller, UuidGenerator,
};
pub use berth_shared::{BerthError, BerthResult, RuntimeError, RuntimeResult};
pub use capability::{
    ProcessIo, ProcessSignal, ProcessSpec, Properties, TtySpec, WindowSize, WorkerContainer,
};
pub use options::{BackendOptions, KillerOptions, LogOptions, RootfsOptions};
pub use util::init_logging;

// Handles are shared across tasks by the worker.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<Container>;
    let _ = assert_send_sync::<Process>;
};
