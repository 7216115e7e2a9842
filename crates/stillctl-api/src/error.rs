use thiserror::Error;

/// Top-level error type for the `stillctl-api` crate.
///
/// Splits failures the way the poll loop needs to see them: anything that
/// kept a response from arriving intact is a transport failure, a body that
/// arrived but could not be decoded is a malformed response, and a rejected
/// submission is reported on its own. `stillctl-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The device answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The underlying `reqwest::Client` could not be built.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Submission ──────────────────────────────────────────────────
    /// A JSON acknowledgement carried a status other than `ok`.
    #[error("Submission rejected by device: {status}")]
    Rejected { status: String },
}

impl Error {
    /// Returns `true` if a response arrived but did not decode into the
    /// expected shape.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }
}
