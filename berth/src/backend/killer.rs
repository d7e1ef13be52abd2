//! Termination policy.

use crate::options::KillerOptions;
use crate::runtime::RuntimeTask;
use async_trait::async_trait;
use berth_shared::{BerthError, BerthResult};
use nix::sys::signal::Signal;
use std::str::FromStr;

/// How hard to stop a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillBehaviour {
    /// Ask the task to shut down.
    Graceful,
    /// Terminate unconditionally.
    Ungraceful,
}

impl KillBehaviour {
    pub fn from_force(force: bool) -> Self {
        if force {
            KillBehaviour::Ungraceful
        } else {
            KillBehaviour::Graceful
        }
    }
}

/// Delivers the termination signal for a behaviour to a task.
///
/// Implementations return after delivery; they never wait for the task to
/// exit and never retry.
#[async_trait]
pub trait Killer: Send + Sync {
    async fn kill(&self, task: &dyn RuntimeTask, behaviour: KillBehaviour) -> BerthResult<()>;
}

/// Signal-based killer: one signal per behaviour, sent once.
///
/// Graceful shutdown is not time-boxed here. Escalating to
/// [`KillBehaviour::Ungraceful`] is the caller's decision.
#[derive(Debug, Clone, Copy)]
pub struct SignalKiller {
    graceful: Signal,
    ungraceful: Signal,
}

impl SignalKiller {
    pub fn new(graceful: Signal, ungraceful: Signal) -> Self {
        Self {
            graceful,
            ungraceful,
        }
    }

    /// Build from configured signal names (e.g. `"SIGTERM"`).
    pub fn from_options(options: &KillerOptions) -> BerthResult<Self> {
        Ok(Self::new(
            parse_signal(&options.graceful_signal)?,
            parse_signal(&options.ungraceful_signal)?,
        ))
    }

    pub fn signal_for(&self, behaviour: KillBehaviour) -> Signal {
        match behaviour {
            KillBehaviour::Graceful => self.graceful,
            KillBehaviour::Ungraceful => self.ungraceful,
        }
    }
}

impl Default for SignalKiller {
    fn default() -> Self {
        Self::new(Signal::SIGTERM, Signal::SIGKILL)
    }
}

#[async_trait]
impl Killer for SignalKiller {
    async fn kill(&self, task: &dyn RuntimeTask, behaviour: KillBehaviour) -> BerthResult<()> {
        let signal = self.signal_for(behaviour);
        tracing::debug!(task_id = %task.id(), ?behaviour, %signal, "signalling task");

        task.kill(signal)
            .await
            .map_err(|source| BerthError::SignalDeliveryFailed {
                signal: signal.to_string(),
                source,
            })
    }
}

fn parse_signal(name: &str) -> BerthResult<Signal> {
    Signal::from_str(name)
        .map_err(|_| BerthError::InvalidInput(format!("unknown signal name: {}", name)))
}
