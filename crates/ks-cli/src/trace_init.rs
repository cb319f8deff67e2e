use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "ks_core=info,ks_session=info";

/// Keeps the file writer alive; pending lines are flushed on drop.
#[derive(Default)]
pub struct TraceGuard {
    #[cfg(feature = "trace")]
    _worker: Option<tracing_appender::non_blocking::WorkerGuard>,
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Human-readable logs on stderr, filtered by `RUST_LOG`.
pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .try_init();
}

/// JSON lines in `log_dir/kstool-trace.jsonl`.
#[cfg(feature = "trace")]
pub fn init_file(log_dir: &Path) -> TraceGuard {
    let file_appender = tracing_appender::rolling::never(log_dir, "kstool-trace.jsonl");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_env_filter(env_filter("ks_core=debug,ks_session=debug"))
        .try_init();
    TraceGuard {
        _worker: Some(guard),
    }
}

#[cfg(not(feature = "trace"))]
pub fn init_file(_log_dir: &Path) -> TraceGuard {
    init_stderr();
    tracing::warn!("built without the `trace` feature, logging to stderr");
    TraceGuard::default()
}
