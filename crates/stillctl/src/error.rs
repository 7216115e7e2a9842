//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use stillctl_config::ConfigError;
use stillctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to device at {url}: {reason}")]
    #[diagnostic(
        code(stillctl::connection_failed),
        help(
            "Check that the controller is powered and that this machine is on its network.\n\
             URL: {url}\n\
             Try: stillctl --device http://<address> status"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to the device timed out")]
    #[diagnostic(
        code(stillctl::timeout),
        help("Increase the timeout with --timeout, or pass --timeout 0 to wait indefinitely.")
    )]
    Timeout,

    // ── Device ───────────────────────────────────────────────────────

    #[error("Device answered HTTP {status}: {message}")]
    #[diagnostic(code(stillctl::device_error))]
    DeviceError { status: u16, message: String },

    #[error("Device sent a response stillctl could not read: {message}")]
    #[diagnostic(
        code(stillctl::malformed_response),
        help("The firmware may be restarting. Retry in a few seconds, or check the log with: stillctl log")
    )]
    MalformedResponse { message: String },

    #[error("Device did not accept '{action}': {reason}")]
    #[diagnostic(
        code(stillctl::submission_failed),
        help(
            "Older firmware expects form posts, newer firmware expects JSON.\n\
             Try: --encoding json (or --encoding form)"
        )
    )]
    SubmissionFailed { action: String, reason: String },

    // ── Lookups ──────────────────────────────────────────────────────

    #[error("{table} has no value for {what} {index}")]
    #[diagnostic(
        code(stillctl::not_found),
        help("The device has not reported this calibration point. Check with: stillctl status")
    )]
    NotFound {
        table: String,
        what: String,
        index: usize,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stillctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(stillctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: stillctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(
        code(stillctl::config),
        help("Fix the file shown by: stillctl config path")
    )]
    Config(Box<figment::Error>),

    #[error("Could not serialize configuration: {0}")]
    #[diagnostic(code(stillctl::config_serialize))]
    ConfigSerialize(#[from] toml::ser::Error),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(stillctl::prompt),
        help("Pass the value as a flag when running without a terminal.")
    )]
    Prompt(String),

    // ── IO / Internal ────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(stillctl::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::DeviceError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout => CliError::Timeout,
            CoreError::DeviceError { status, message } => CliError::DeviceError { status, message },
            CoreError::MalformedResponse { message } => CliError::MalformedResponse { message },
            CoreError::SubmissionFailed { action, reason } => {
                CliError::SubmissionFailed { action, reason }
            }
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "command".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "device".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Serialization(e) => CliError::ConfigSerialize(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_map_to_connection_code() {
        let err = CliError::from(CoreError::ConnectionFailed {
            url: "http://192.168.4.1/".into(),
            reason: "refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn device_http_error_maps_to_connection_code() {
        let err = CliError::from(CoreError::DeviceError {
            status: 503,
            message: "busy".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn rejected_command_is_a_general_failure() {
        let err = CliError::from(CoreError::SubmissionFailed {
            action: "open valve".into(),
            reason: "HTTP 500".into(),
        });
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert!(err.to_string().contains("open valve"));
    }

    #[test]
    fn invalid_command_is_a_usage_error() {
        let err = CliError::from(CoreError::ValidationFailed {
            message: "valve seconds must be positive".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
