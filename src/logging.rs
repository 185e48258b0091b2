//! Logging bootstrap for the binaries.
//!
//! The library only emits through the `log` facade; the `cli` and `http`
//! binaries call [`init_logging`] once at startup. Log lines go to stderr so
//! they never mix with the CLI's stdout.

use flexi_logger::{Logger, LoggerHandle};

/// Level used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_SPEC: &str = "warn";

/// Starts a stderr logger configured from `RUST_LOG`, falling back to `default_spec`.
///
/// The returned handle must be kept alive for as long as logging is needed.
///
/// # Errors
/// - Returns an error when `default_spec` is not a valid log specification.
/// - Returns an error when a logger is already installed for this process.
pub fn init_logging(default_spec: &str) -> Result<LoggerHandle, String> {
    Logger::try_with_env_or_str(default_spec)
        .map_err(|err| format!("invalid log spec `{default_spec}`: {err}"))?
        .log_to_stderr()
        .format(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}
