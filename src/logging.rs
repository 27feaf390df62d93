use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory where log files will be stored
    pub log_dir: PathBuf,
    /// Prefix for log file names
    pub file_prefix: String,
    /// Maximum number of log files to keep (rotation)
    pub max_files: usize,
    /// Whether to write logs to file
    pub log_to_file: bool,
    /// Write file logs as JSON lines instead of the compact text format
    pub json_file: bool,
    /// Log level filter string, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        let log_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gfycat")
            .join("logs");

        Self {
            log_dir,
            file_prefix: "gfycat-api".to_string(),
            max_files: 5,
            log_to_file: true,
            json_file: false,
            log_level: "info".to_string(),
        }
    }
}

/// Initialize logging to stdout and, optionally, a rotating log file.
///
/// # Log Targets
/// - `client` - transport, access checks and request dispatch
/// - `client::auth` - token acquisition and refresh
/// - `feed` - page fetches and enumerator transitions
/// - `api::gfy` - gfy modifications
/// - `api::upload` - upload keys, transfers and status polling
///
/// # Example
/// ```bash
/// RUST_LOG=client=debug,feed=trace cargo run
/// ```
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: LogConfig) -> Result<LogGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_ansi(true)
        .boxed();

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer];
    let mut worker_guard = None;

    if config.log_to_file {
        std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

        let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(config.max_files)
            .build(&config.log_dir)
            .context("Failed to create file appender")?;
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        worker_guard = Some(guard);

        let file_layer = if config.json_file {
            fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_target(true)
                .with_thread_ids(true)
                .boxed()
        } else {
            fmt::layer()
                .compact()
                .with_writer(non_blocking_file)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .boxed()
        };
        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install global subscriber")?;

    tracing::info!(
        target: "client",
        log_dir = %config.log_dir.display(),
        log_to_file = config.log_to_file,
        log_level = %config.log_level,
        "Logging system initialized"
    );

    Ok(LogGuard {
        _worker_guard: worker_guard,
    })
}

/// Keeps the non-blocking file writer alive; logs are flushed when dropped
pub struct LogGuard {
    _worker_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        tracing::debug!(target: "client", "Flushing logs");
    }
}
