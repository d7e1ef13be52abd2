//! Shared constants between the adapter and runtime clients

/// Process defaults applied when the caller leaves a field unset.
pub mod process {
    /// Working directory used when a process spec has no `dir`.
    pub const DEFAULT_CWD: &str = "/";

    /// Mode for working directories created inside the rootfs.
    pub const DEFAULT_CWD_MODE: u32 = 0o755;
}

/// Termination defaults.
pub mod signals {
    /// Signal for cooperative shutdown.
    pub const GRACEFUL: &str = "SIGTERM";

    /// Signal for unconditional termination.
    pub const UNGRACEFUL: &str = "SIGKILL";
}

/// Environment variables read by the adapter.
pub mod envs {
    /// Log filter override (same syntax as `RUST_LOG`).
    pub const BERTH_LOG: &str = "BERTH_LOG";

    /// Directory for rolling log files.
    pub const BERTH_LOG_DIR: &str = "BERTH_LOG_DIR";
}

/// Log file naming.
pub mod logs {
    /// Prefix of the daily rolling log file.
    pub const FILE_PREFIX: &str = "berth.log";

    /// Filter used when neither `RUST_LOG` nor options set one.
    pub const DEFAULT_FILTER: &str = "info";
}
