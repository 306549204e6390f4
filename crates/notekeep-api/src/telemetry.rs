//! Tracing subscriber setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "notekeep_api=debug,tower_http=debug";

/// Install the global subscriber.
///
/// With a log file configured, output goes to a daily-rotated file through a
/// non-blocking writer; keep the returned guard alive until shutdown so
/// buffered lines are flushed.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.file.as_deref() {
        Some(path) => {
            let (dir, file_name) = split_log_path(path);
            let file_appender = tracing_appender::rolling::daily(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            if config.json {
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(non_blocking),
                    )
                    .init();
            } else {
                // No ANSI in files unless asked for
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(config.ansi.unwrap_or(false));
                registry.with(layer).init();
            }
            Some(guard)
        }
        None => {
            if config.json {
                registry
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            } else {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = config.ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
            None
        }
    }
}

fn split_log_path(path: &str) -> (&Path, &str) {
    let path = Path::new(path);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("notekeep-api.log");
    (dir, file_name)
}
