use std::path::PathBuf;

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

static TRACING_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

pub const DEFAULT_LOG_DIRECTIVES: &str = "info,app::tracker=debug,app::store=info,app::db=info";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "ratio_tracker.log";

/// Where and how tracing output is written.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingOptions {
    pub log_dir: PathBuf,
    /// Daily files are named `<prefix>.<yyyy-mm-dd>`.
    pub file_prefix: String,
    pub directives: Option<String>,
    /// Mirror events to stdout in addition to the rolling file.
    pub console: bool,
}

impl LoggingOptions {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            file_prefix: DEFAULT_LOG_FILE_PREFIX.to_string(),
            directives: None,
            console: true,
        }
    }
}

/// Picks the filter: `RUST_LOG` first, then the configured directives, then
/// the built-in default.
pub fn resolve_filter(env: Option<&str>, directives: Option<&str>) -> AppResult<EnvFilter> {
    let source = env
        .filter(|value| !value.trim().is_empty())
        .or(directives)
        .unwrap_or(DEFAULT_LOG_DIRECTIVES);
    EnvFilter::try_new(source).map_err(|err| AppError::other(format!("解析日志级别失败: {err}")))
}

/// Installs the global subscriber. Only the first call in a process takes
/// effect; the file writer guard lives for the rest of the process.
pub fn init_logging(options: &LoggingOptions) -> AppResult<()> {
    if TRACING_GUARD.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(&options.log_dir)?;
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = resolve_filter(env.as_deref(), options.directives.as_deref())?;

    let appender = tracing_appender::rolling::daily(&options.log_dir, &options.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    if TRACING_GUARD.set(guard).is_err() {
        return Ok(());
    }

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339());
    let console_layer = options.console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| AppError::other(format!("安装日志订阅器失败: {err}")))
}
