//! Process lifecycle states and the transitions between them.

use serde::{Deserialize, Serialize};

/// Lifecycle of one execution as seen by the adapter.
///
/// ```text
/// Created ──start──▶ Started ──▶ Running ──▶ Exited
///    │                  │                     ▲
///    └──start failed────┴─────────────────────┘
/// ```
///
/// `run()` hands out handles in `Started`; `attach()` hands out handles in
/// `Running`. `Exited` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// Template built, not yet handed to the runtime.
    Created,
    /// The runtime accepted the start request.
    Started,
    /// The runtime reports active execution.
    Running,
    /// Exit status observed.
    Exited,
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Exited)
    }

    pub fn can_transition_to(&self, target: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, target),
            (Created, Started)
                | (Created, Exited)
                | (Started, Running)
                | (Started, Exited)
                | (Running, Exited)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Created => "created",
            ProcessState::Started => "started",
            ProcessState::Running => "running",
            ProcessState::Exited => "exited",
        }
    }
}

impl std::str::FromStr for ProcessState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ProcessState::Created),
            "started" => Ok(ProcessState::Started),
            "running" => Ok(ProcessState::Running),
            "exited" => Ok(ProcessState::Exited),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
