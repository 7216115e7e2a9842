// Shared transport configuration for building reqwest::Client instances.
//
// The controller firmware serves plain HTTP on the local network, so the
// only knobs are the request timeout and the user agent.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("stillctl/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. `None` waits indefinitely, which lets a hung
    /// device stall the poll loop until the connection drops.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: USER_AGENT.into(),
        }
    }
}

impl TransportConfig {
    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().user_agent(self.user_agent.as_str());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_timeout_and_agent() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
        assert!(cfg.user_agent.starts_with("stillctl/"));
    }

    #[test]
    fn builds_without_timeout() {
        let cfg = TransportConfig::default().with_timeout(None);
        assert!(cfg.build_client().is_ok());
    }
}
