//! Pluggable sink for the client's user-facing log records.
//!
//! The client reports startup and activation outcomes through a
//! [`LicenseLogger`]. The default sink discards everything; hosts that use
//! `tracing` can plug in [`TracingLogger`].

use std::fmt;

/// Receives client log records.
pub trait LicenseLogger: Send + Sync {
    /// Logs a formatted record, as produced by `format_args!`.
    fn log_fmt(&self, args: fmt::Arguments<'_>);

    /// Logs a single line.
    fn log_line(&self, line: &str) {
        self.log_fmt(format_args!("{line}"));
    }
}

/// Discards all records.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl LicenseLogger for NoopLogger {
    fn log_fmt(&self, _args: fmt::Arguments<'_>) {}

    fn log_line(&self, _line: &str) {}
}

/// Forwards records to `tracing` at INFO level under the `tollgate` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl LicenseLogger for TracingLogger {
    fn log_fmt(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "tollgate", "{}", args);
    }

    fn log_line(&self, line: &str) {
        tracing::info!(target: "tollgate", "{}", line);
    }
}
