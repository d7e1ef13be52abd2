//! Configuration for the container backend.

use berth_shared::constants::{envs as const_envs, logs as const_logs};
use berth_shared::constants::{process as const_process, signals as const_signals};
use berth_shared::{BerthError, BerthResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level backend options. Every field has a default, so `{}` is valid.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendOptions {
    #[serde(default)]
    pub killer: KillerOptions,

    #[serde(default)]
    pub rootfs: RootfsOptions,

    #[serde(default)]
    pub log: LogOptions,
}

impl BackendOptions {
    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> BerthResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BerthError::InvalidInput(format!("invalid backend options: {}", e)))
    }

    /// Read and parse a JSON options file.
    pub fn load(path: impl AsRef<Path>) -> BerthResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BerthError::InvalidInput(format!("read options {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `BERTH_LOG` and `BERTH_LOG_DIR` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(filter) = lookup(const_envs::BERTH_LOG).filter(|v| !v.is_empty()) {
            self.log.filter = filter;
        }
        if let Some(dir) = lookup(const_envs::BERTH_LOG_DIR).filter(|v| !v.is_empty()) {
            self.log.dir = Some(PathBuf::from(dir));
        }
    }
}

// ============================================================================
// Killer Options
// ============================================================================

/// Signals sent by the default killer, by name (e.g. `"SIGTERM"`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KillerOptions {
    #[serde(default = "default_graceful_signal")]
    pub graceful_signal: String,

    #[serde(default = "default_ungraceful_signal")]
    pub ungraceful_signal: String,
}

fn default_graceful_signal() -> String {
    const_signals::GRACEFUL.to_string()
}

fn default_ungraceful_signal() -> String {
    const_signals::UNGRACEFUL.to_string()
}

impl Default for KillerOptions {
    fn default() -> Self {
        Self {
            graceful_signal: default_graceful_signal(),
            ungraceful_signal: default_ungraceful_signal(),
        }
    }
}

// ============================================================================
// Rootfs Options
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootfsOptions {
    /// Mode for working directories created in the rootfs.
    ///
    /// Default: 0o755
    #[serde(default = "default_cwd_mode")]
    pub cwd_mode: u32,
}

fn default_cwd_mode() -> u32 {
    const_process::DEFAULT_CWD_MODE
}

impl Default for RootfsOptions {
    fn default() -> Self {
        Self {
            cwd_mode: default_cwd_mode(),
        }
    }
}

// ============================================================================
// Log Options
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogOptions {
    /// Fallback filter when `RUST_LOG` is unset.
    ///
    /// Default: "info"
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Directory for daily rolling log files. `None` logs to stderr.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_filter() -> String {
    const_logs::DEFAULT_FILTER.to_string()
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            dir: None,
        }
    }
}
