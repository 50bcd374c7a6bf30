use std::sync::{Arc, OnceLock};

/// Sink for bridge log records, implemented by the host application.
///
/// The bridge logs through the `log` facade. Once a `Logger` is installed with
/// [`set_logger`], every record is forwarded to it. Debug and trace records
/// from other crates are dropped so the host only sees its own dependencies'
/// warnings and errors.
///
/// # Examples
///
/// ```rust
/// use bridgekit_core::logger::{LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// object BridgeLogger : Logger {
///     override fun log(level: LogLevel, message: String) {
///         Log.println(level.toPriority(), "bridgekit", message)
///     }
/// }
///
/// setLogger(BridgeLogger) // once, at startup
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Records one message at the given level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of the bridge (consents opened, navigation, announcements).
    Info,
    /// Something unexpected that the bridge recovered from.
    Warn,
    /// A failure reported back to the page or the host.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

static HOST_LOGGER: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// `log` implementation forwarding to [`HOST_LOGGER`].
struct HostLogBridge;

impl log::Log for HostLogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        should_forward(metadata.level(), metadata.target())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match HOST_LOGGER.get() {
            Some(logger) => logger.log(record.level().into(), record.args().to_string()),
            None => eprintln!("[bridgekit] {}", record.args()),
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records only pass when their target is one of our crates.
fn should_forward(level: log::Level, target: &str) -> bool {
    level <= log::Level::Info || target.starts_with("bridgekit")
}

/// Installs the host logger and routes the `log` facade to it.
///
/// Only the first call has an effect; later calls leave the installed logger
/// in place. Records up to `Trace` are forwarded until
/// [`set_log_level`] lowers the ceiling.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    static BRIDGE: HostLogBridge = HostLogBridge;

    if HOST_LOGGER.set(logger).is_err() {
        log::warn!("a host logger is already installed");
        return;
    }
    match log::set_logger(&BRIDGE) {
        Ok(()) => log::set_max_level(log::LevelFilter::Trace),
        Err(e) => eprintln!("[bridgekit] another `log` backend is active: {e}"),
    }
}

/// Sets the most verbose level forwarded to the host logger.
#[uniffi::export]
pub fn set_log_level(level: LogLevel) {
    log::set_max_level(level.into());
}
