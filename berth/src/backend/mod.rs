//! Container backend over a runtime client.
//!
//! [`Container`] composes the pieces in this module: the spec translator,
//! I/O wiring, rootfs setup, identifier generation and the [`Killer`].

mod cio;
mod container;
mod id;
mod killer;
mod process;
mod rootfs;
mod spec;
mod state;

pub use container::Container;
pub use id::{IdGenerator, UuidGenerator};
pub use killer::{KillBehaviour, Killer, SignalKiller};
pub use process::Process;
pub use rootfs::{HostRootfsManager, RootfsManager};
pub use state::ProcessState;
