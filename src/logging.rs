//! Tracing setup: compact stderr output plus a daily log file

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::errors::DocChatError;
use crate::Result;

const LOG_FILE_PREFIX: &str = "docchat.log";

/// Filter directives for the configured level; `verbose` lifts this crate to debug
fn default_directives(config: &LoggingConfig, verbose: bool) -> String {
    let crate_level = if verbose { "debug" } else { config.level.as_str() };
    format!("{},docchat={}", config.level, crate_level)
}

/// `RUST_LOG` when set, the configured directives otherwise
fn build_filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directives(config, verbose))
        .map_err(|e| DocChatError::ConfigError(format!("logging.level '{}': {e}", config.level)))
}

/// Install the global subscriber.
///
/// Console lines are compact and go to stderr so `ask` can stream answers on
/// stdout. The file layer keeps thread and source details and closes spans,
/// which is where request timings end up.
pub fn init_logging_with_config(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = build_filter(config, verbose)?;
    std::fs::create_dir_all(&config.dir)?;
    if config.backtrace {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX));

    Registry::default()
        .with(filter)
        .with(fmt::layer().compact().with_target(true).with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| DocChatError::Custom(format!("Failed to init logging: {e}")))?;

    // flushing stops when the guard drops; the subscriber lives for the whole process
    std::mem::forget(guard);

    tracing::debug!(
        "Logging to stderr and {}/{}.YYYY-MM-DD at level {}",
        config.dir.display(),
        LOG_FILE_PREFIX,
        config.level
    );
    Ok(())
}

/// Console-only subscriber at info level
pub fn init_simple_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| DocChatError::Custom(format!("Failed to init logging: {e}")))
}
