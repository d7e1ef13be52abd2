use crate::options::LogOptions;
use berth_shared::constants::logs as const_logs;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `options.filter`. With `options.dir` set,
/// output goes to a daily rolling file in that directory; otherwise it goes
/// to stderr.
///
/// Keep the returned guard alive to flush the background writer. A log
/// directory that cannot be created falls back to stderr, and a subscriber
/// installed earlier is left in place.
pub fn init_logging(options: &LogOptions) -> WorkerGuard {
    let env_filter = env_filter(&options.filter);

    if let Some(dir) = &options.dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(dir, const_logs::FILE_PREFIX);
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                register_to_tracing(non_blocking, env_filter, false);
                return guard;
            }
            Err(e) => {
                eprintln!("berth: cannot create log directory {}: {}", dir.display(), e);
            }
        }
    }

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
    register_to_tracing(non_blocking, env_filter, true);
    guard
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(const_logs::DEFAULT_FILTER))
}

fn register_to_tracing(non_blocking: NonBlocking, env_filter: EnvFilter, ansi: bool) {
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(ansi),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_falls_back() {
        // Must not panic on a malformed directive.
        let _ = env_filter("berth=[");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let options = LogOptions {
            filter: "debug".into(),
            dir: Some(dir.path().to_path_buf()),
        };

        let _first = init_logging(&options);
        let _second = init_logging(&options);
        tracing::info!("logging initialized");
    }
}
