// Wire models for the controller firmware's JSON endpoints.
//
// Firmware releases disagree on field names and on whether numbers are
// emitted as numbers, numeric strings or `null`. Every field here is
// optional or defaulted and every number goes through the lenient helpers
// below, so a sparse response decodes instead of failing as a whole.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `GET /data`.
///
/// Telemetry fields are always present on a well-behaved device; the `cfg`
/// block appears only when requested with `cfg=1` and the firmware elects
/// to include it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    /// Temperature readings by fixed sensor position.
    #[serde(default, alias = "tempC", deserialize_with = "lenient_vec")]
    pub temp: Vec<Option<f64>>,

    /// Steam heater power (W).
    #[serde(default, deserialize_with = "lenient_number")]
    pub steam: Option<f64>,

    /// Heads heater power (W).
    #[serde(default, deserialize_with = "lenient_number")]
    pub heads: Option<f64>,

    /// Raw flow-meter counts.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub flows: Vec<Option<f64>>,

    /// Current tank readings.
    #[serde(default, deserialize_with = "lenient_vec")]
    pub tn: Vec<Option<f64>>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub volts: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg: Option<WireConfig>,
}

/// The `cfg` block of a `/data` response.
///
/// Rate constants keep their firmware names on the wire; their meaning is
/// defined by the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireConfig {
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub pwd: Option<String>,

    #[serde(rename = "fR", default, deserialize_with = "lenient_number")]
    pub fr: Option<f64>,
    #[serde(rename = "sR", default, deserialize_with = "lenient_number")]
    pub sr: Option<f64>,
    #[serde(rename = "sD", default, deserialize_with = "lenient_number")]
    pub sd: Option<f64>,
    #[serde(rename = "hR", default, deserialize_with = "lenient_number")]
    pub hr: Option<f64>,
    #[serde(rename = "hD", default, deserialize_with = "lenient_number")]
    pub hd: Option<f64>,
    #[serde(rename = "vR", default, deserialize_with = "lenient_number")]
    pub vr: Option<f64>,
    #[serde(rename = "mS", default, deserialize_with = "lenient_number")]
    pub ms: Option<f64>,
    #[serde(rename = "mF", default, deserialize_with = "lenient_number")]
    pub mf: Option<f64>,
    #[serde(rename = "sF", default, deserialize_with = "lenient_number")]
    pub sf: Option<f64>,

    /// Per-valve flow calibration for the high rate class.
    #[serde(default, alias = "highFlowRates", deserialize_with = "lenient_vec")]
    pub hfr: Vec<Option<f64>>,

    /// Per-valve flow calibration for the low rate class.
    #[serde(default, alias = "lowFlowRates", deserialize_with = "lenient_vec")]
    pub lfr: Vec<Option<f64>>,

    /// Per-tank full-level calibration.
    #[serde(default, alias = "tankFull", deserialize_with = "lenient_vec")]
    pub tf: Vec<Option<f64>>,

    /// Poll interval in seconds.
    #[serde(default, deserialize_with = "lenient_number")]
    pub poll: Option<f64>,
}

/// Acknowledgement of a `/cfg` or `/run` submission.
///
/// Most firmware answers with an empty or plain-text body; the JSON
/// generation answers `{"status": "..."}`. Only that field is inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,
}

impl Ack {
    /// Decode an acknowledgement body. Anything that isn't a JSON object
    /// is treated as an opaque ack with no status.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<Self>(body).unwrap_or_default()
    }

    /// `true` unless the device reported a status other than `ok`.
    pub fn is_ok(&self) -> bool {
        self.status
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("ok"))
    }
}

// ── Lenient number decoding ─────────────────────────────────────────

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A number, numeric string, or `null`. Anything else decodes as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// An array whose elements decode like [`lenient_number`]. A missing or
/// `null` array decodes as empty; a scalar where an array belongs is an error.
fn lenient_vec<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .iter()
        .map(number_from_value)
        .collect())
}
