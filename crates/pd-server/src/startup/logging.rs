//! Process log sink
//!
//! One sink for the whole process: a rolling file when a log file is
//! configured, stderr otherwise. The embedded KV component's entries reach
//! the same sink through [`LogBridge`](super::log_bridge::LogBridge), except
//! with no log file, where the component keeps its own stderr format.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use pd_common::PdConfig;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use super::log_bridge::{ComponentOutput, LogBridge};

const DEFAULT_LOG_FILE_NAME: &str = "pd.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// File writer guard, shared with the bridge so a fatal entry can flush it.
type SharedGuard = Arc<Mutex<Option<WorkerGuard>>>;

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    /// Rotate daily (default)
    Daily,
    /// Rotate hourly
    Hourly,
    /// Never rotate (single file)
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Logging configuration for the process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level when `RUST_LOG` is unset
    pub level: Level,
    /// Log file; stderr when `None`
    pub file: Option<PathBuf>,
    /// Log rotation policy
    pub rotation: LogRotation,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LogConfig {
    /// Create from process configuration. An unknown level name falls back
    /// to `info`.
    pub fn from_config(config: &PdConfig) -> Self {
        Self {
            level: config.log_level.parse().unwrap_or(Level::INFO),
            file: config
                .log_file
                .as_deref()
                .filter(|f| !f.is_empty())
                .map(PathBuf::from),
            rotation: LogRotation::Daily,
        }
    }

    /// How the embedded component's entries are written under this config.
    pub fn component_output(&self) -> ComponentOutput {
        match self.file {
            Some(_) => ComponentOutput::Redirect,
            None => ComponentOutput::Pretty,
        }
    }

    /// Directory and file name the rolling appender writes to.
    fn file_parts(&self) -> Option<(PathBuf, String)> {
        let file = self.file.as_deref()?;
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string());
        Some((dir, name))
    }
}

/// Guard that keeps the log sink alive.
///
/// Dropping it flushes buffered file output.
pub struct LoggingGuard {
    file_guard: SharedGuard,
    bridge: LogBridge,
}

impl LoggingGuard {
    /// Bridge for the embedded component, writing where this sink does.
    pub fn bridge(&self) -> &LogBridge {
        &self.bridge
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        // Bridge clones share the guard; flush now rather than on the last one
        drop(self.file_guard.lock().take());
    }
}

/// Bridge whose fatal path flushes the file writer before exiting, since
/// `process::exit` runs no destructors.
fn flushing_bridge(output: ComponentOutput, file_guard: SharedGuard) -> LogBridge {
    LogBridge::new(output).with_terminator(move |_| {
        drop(file_guard.lock().take());
        std::process::exit(1);
    })
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already installed or the log directory
/// cannot be created.
pub fn init_logger(config: &LogConfig) -> Result<LoggingGuard, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let (layer, file_guard): (BoxedLayer, Option<WorkerGuard>) =
        match config.file_parts() {
            Some((dir, name)) => {
                std::fs::create_dir_all(&dir)?;
                let appender = RollingFileAppender::new(config.rotation.into(), &dir, name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_filter(filter);
                let layer: BoxedLayer = Box::new(layer);
                (layer, Some(guard))
            }
            None => {
                let layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(filter);
                let layer: BoxedLayer = Box::new(layer);
                (layer, None)
            }
        };

    Registry::default()
        .with(layer)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))?;

    tracing::info!(
        level = %config.level,
        file = ?config.file,
        "Logging initialized"
    );

    let file_guard = Arc::new(Mutex::new(file_guard));
    Ok(LoggingGuard {
        bridge: flushing_bridge(config.component_output(), file_guard.clone()),
        file_guard,
    })
}
