//! Logging capability injected into [`Client`](crate::Client).
//!
//! The client only logs for observability (retry warnings, redirect hops,
//! completion lines); no behavior depends on what a logger does with a record.

use std::fmt;

/// Severity of a log record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Structured logger consumed by the client.
///
/// Implementors provide [`Logger::log`]; the plain and `*f` formatted
/// helpers are derived from it.
pub trait Logger: Send + Sync + fmt::Debug {
    fn log(&self, level: LogLevel, message: fmt::Arguments<'_>);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, format_args!("{message}"));
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, format_args!("{message}"));
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, format_args!("{message}"));
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, format_args!("{message}"));
    }

    fn debugf(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn infof(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    fn warnf(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

/// Forwards records to `tracing` under the `resilient_http` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: fmt::Arguments<'_>) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "resilient_http", "{}", message),
            LogLevel::Info => tracing::info!(target: "resilient_http", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "resilient_http", "{}", message),
            LogLevel::Error => tracing::error!(target: "resilient_http", "{}", message),
        }
    }
}

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: fmt::Arguments<'_>) {}
}
