//! Bridge for the embedded KV component's logs
//!
//! The embedded component has its own seven-level taxonomy. Its entries are
//! translated into `tracing` events through a fixed table; a critical entry
//! is unrecoverable for the whole process.
//!
//! | component | sink  |
//! |-----------|-------|
//! | critical  | ERROR, then exit |
//! | error     | ERROR |
//! | warning   | WARN  |
//! | notice    | INFO  |
//! | info      | INFO  |
//! | debug     | DEBUG |
//! | trace     | DEBUG |

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{Level, debug, error, info, warn};

/// Target the bridged events are emitted under.
pub const COMPONENT_TARGET: &str = "pd_server::component";

/// Severity levels of the embedded component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentLevel {
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
    Trace,
}

impl ComponentLevel {
    /// Single-letter tag used in the component's own format.
    pub fn as_char(self) -> char {
        match self {
            ComponentLevel::Critical => 'C',
            ComponentLevel::Error => 'E',
            ComponentLevel::Warning => 'W',
            ComponentLevel::Notice => 'N',
            ComponentLevel::Info => 'I',
            ComponentLevel::Debug => 'D',
            ComponentLevel::Trace => 'T',
        }
    }
}

impl fmt::Display for ComponentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Sink level a component level is emitted at.
pub fn sink_level(level: ComponentLevel) -> Level {
    match level {
        ComponentLevel::Critical | ComponentLevel::Error => Level::ERROR,
        ComponentLevel::Warning => Level::WARN,
        ComponentLevel::Notice | ComponentLevel::Info => Level::INFO,
        ComponentLevel::Debug | ComponentLevel::Trace => Level::DEBUG,
    }
}

/// Whether an entry at this level must terminate the process.
pub fn is_fatal(level: ComponentLevel) -> bool {
    level == ComponentLevel::Critical
}

/// Where component entries are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentOutput {
    /// Through the process's `tracing` sink
    Redirect,
    /// Straight to stderr in the component's own format
    Pretty,
}

type Terminator = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives the embedded component's log entries.
#[derive(Clone)]
pub struct LogBridge {
    output: ComponentOutput,
    terminate: Terminator,
}

impl fmt::Debug for LogBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogBridge")
            .field("output", &self.output)
            .finish()
    }
}

impl LogBridge {
    pub fn new(output: ComponentOutput) -> Self {
        Self {
            output,
            terminate: Arc::new(|_| std::process::exit(1)),
        }
    }

    /// Replace what happens after a critical entry is logged.
    pub fn with_terminator<F>(mut self, terminate: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.terminate = Arc::new(terminate);
        self
    }

    pub fn output(&self) -> ComponentOutput {
        self.output
    }

    /// Handle one entry from the component's package `pkg`.
    pub fn format(&self, pkg: &str, level: ComponentLevel, message: fmt::Arguments<'_>) {
        let line = render(pkg, level, message);

        match self.output {
            ComponentOutput::Redirect => emit(level, &line),
            ComponentOutput::Pretty => {
                let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f");
                let _ = writeln!(std::io::stderr().lock(), "{} {}", now, line);
            }
        }

        if is_fatal(level) {
            (self.terminate)(&line);
        }
    }
}

/// Render an entry as `<level char> | <pkg>: <message>`.
pub fn render(pkg: &str, level: ComponentLevel, message: fmt::Arguments<'_>) -> String {
    if pkg.is_empty() {
        format!("{} | {}", level, message)
    } else {
        format!("{} | {}: {}", level, pkg, message)
    }
}

fn emit(level: ComponentLevel, line: &str) {
    match sink_level(level) {
        Level::ERROR => error!(target: COMPONENT_TARGET, "{}", line),
        Level::WARN => warn!(target: COMPONENT_TARGET, "{}", line),
        Level::INFO => info!(target: COMPONENT_TARGET, "{}", line),
        _ => debug!(target: COMPONENT_TARGET, "{}", line),
    }
}
