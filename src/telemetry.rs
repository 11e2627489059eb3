//! Tracing setup
//!
//! Console output is filtered by `RUST_LOG`. When `logging.activity_dir` is
//! configured, activity records are also written as JSON lines to a daily
//! rolling file, independent of the console filter.

use crate::activity::ACTIVITY_TARGET;
use crate::server::LoggingConfig;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, Targets};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

const DEFAULT_FILTER: &str = "ravensh=info,ravensh_core=info,ravensh_exec=info,tower_http=info";

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process so buffered
/// activity records are flushed on exit.
pub fn init(logging: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let console = tracing_subscriber::fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()),
    );

    let (activity, guard) = match logging.and_then(|l| l.activity_dir.as_ref().map(|d| (l, d))) {
        Some((logging, dir)) => {
            let appender = tracing_appender::rolling::daily(dir, &logging.activity_file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(Targets::new().with_target(ACTIVITY_TARGET, Level::INFO));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(activity)
        .init();

    guard
}
