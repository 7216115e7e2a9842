// ── Core error types ──
//
// User-facing errors from stillctl-core. Consumers never see reqwest
// errors or JSON parse failures directly; the `From<stillctl_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Device did not respond in time")]
    Timeout,

    #[error("Device returned HTTP {status}: {message}")]
    DeviceError { status: u16, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed response from device: {message}")]
    MalformedResponse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("'{action}' was not accepted: {reason}")]
    SubmissionFailed { action: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<stillctl_api::Error> for CoreError {
    fn from(err: stillctl_api::Error) -> Self {
        match err {
            stillctl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            stillctl_api::Error::Http { status, body } => CoreError::DeviceError {
                status,
                message: body,
            },
            stillctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid device URL: {e}"),
            },
            stillctl_api::Error::ClientBuild(reason) => CoreError::Config {
                message: format!("Cannot build HTTP client: {reason}"),
            },
            stillctl_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
            stillctl_api::Error::Rejected { status } => CoreError::SubmissionFailed {
                action: "submission".into(),
                reason: format!("device status '{status}'"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_maps_to_device_error() {
        let err: CoreError = stillctl_api::Error::Http {
            status: 404,
            body: "no such page".into(),
        }
        .into();
        assert!(matches!(err, CoreError::DeviceError { status: 404, .. }));
    }

    #[test]
    fn deserialization_maps_to_malformed() {
        let err: CoreError = stillctl_api::Error::Deserialization {
            message: "eof".into(),
            body: String::new(),
        }
        .into();
        assert!(matches!(err, CoreError::MalformedResponse { .. }));
    }
}
