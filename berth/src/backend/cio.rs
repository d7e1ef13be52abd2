//! Process I/O wiring.
//!
//! `run()` and `attach()` build the same stream configuration; they differ
//! only in the request type handed to the runtime afterwards.

use crate::capability::ProcessIo;
use crate::runtime::{IoAttach, IoConfig, IoCreator};

fn io_config(io: ProcessIo, tty: bool) -> IoConfig {
    IoConfig {
        stdin: io.stdin,
        stdout: io.stdout,
        stderr: io.stderr,
        terminal: tty,
    }
}

/// Streams for a new process.
pub(crate) fn creator(io: ProcessIo, tty: bool) -> IoCreator {
    IoCreator(io_config(io, tty))
}

/// Streams for an existing process. The terminal was decided when the
/// process was created, so no allocation is requested here.
pub(crate) fn attacher(io: ProcessIo) -> IoAttach {
    IoAttach(io_config(io, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_io() -> ProcessIo {
        ProcessIo::new()
            .stdin(Box::new(tokio::io::empty()))
            .stdout(Box::new(tokio::io::sink()))
            .stderr(Box::new(tokio::io::sink()))
    }

    #[test]
    fn test_creator_passes_streams_through() {
        let IoCreator(cfg) = creator(full_io(), false);
        assert!(cfg.stdin.is_some());
        assert!(cfg.stdout.is_some());
        assert!(cfg.stderr.is_some());
        assert!(!cfg.terminal);
    }

    #[test]
    fn test_creator_sets_terminal_for_tty() {
        let IoCreator(cfg) = creator(ProcessIo::new(), true);
        assert!(cfg.terminal);
        assert!(cfg.stdin.is_none());
    }

    #[test]
    fn test_attacher_never_allocates_terminal() {
        let IoAttach(cfg) = attacher(full_io());
        assert!(!cfg.terminal);
        assert!(cfg.stdout.is_some());
    }

    #[tokio::test]
    async fn test_streams_are_not_buffered() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut caller_end, runtime_end) = tokio::io::duplex(64);
        let IoCreator(mut cfg) = creator(ProcessIo::new().stdout(Box::new(runtime_end)), false);

        // Bytes written by the runtime arrive at the caller without a flush.
        let stdout = cfg.stdout.as_mut().unwrap();
        stdout.write_all(b"step output").await.unwrap();
        drop(cfg);

        let mut received = String::new();
        caller_end.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "step output");
    }
}
