// ── Runtime engine configuration ──
//
// Describes which device to talk to and how. Never touches disk: the front
// end builds an `EngineConfig` from its profile and hands it in.

use std::time::Duration;

use stillctl_api::SubmitEncoding;
use url::Url;

use crate::poll::DEFAULT_POLL_INTERVAL;
use crate::readout::FlowScaling;

/// Address a controller answers on in access-point mode.
pub const DEFAULT_DEVICE_URL: &str = "http://192.168.4.1";

/// [`DEFAULT_DEVICE_URL`] as a parsed URL.
#[allow(clippy::expect_used)]
fn default_device_url() -> Url {
    DEFAULT_DEVICE_URL
        .parse()
        .expect("DEFAULT_DEVICE_URL is a valid absolute URL")
}

/// Configuration for one controller.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Device root URL (e.g., `http://192.168.4.1`).
    pub device_url: Url,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Poll interval until the device declares its own.
    pub default_poll_interval: Duration,
    /// How raw flow counts are turned into displayed values.
    pub flow_scaling: FlowScaling,
    /// How submissions are encoded for this device generation.
    pub encoding: SubmitEncoding,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device_url: default_device_url(),
            timeout: Some(Duration::from_secs(30)),
            default_poll_interval: DEFAULT_POLL_INTERVAL,
            flow_scaling: FlowScaling::default(),
            encoding: SubmitEncoding::default(),
        }
    }
}
