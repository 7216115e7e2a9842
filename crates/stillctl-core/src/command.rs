// ── Command API ──
//
// Every operator action is a `Command`. Each variant maps to one device
// endpoint and one fixed set of wire keys. The engine sends them; it never
// applies their effect locally, the next poll observes it.

use secrecy::{ExposeSecret, SecretString};
use stillctl_api::{FieldValue, FormPayload};

use crate::error::CoreError;
use crate::lookup::{RateClass, TankLevel};
use crate::model::RateSettings;

/// Which device endpoint a command posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `POST /cfg`
    Config,
    /// `POST /run`
    Run,
}

/// All operator actions against a controller.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Configuration (/cfg) ─────────────────────────────────────────
    SetNetwork {
        ssid: String,
        password: SecretString,
    },
    SetRates(RateSettings),
    /// Tell the device what the mains voltage currently is.
    SetVolts {
        volts: f64,
    },
    CalibrateFlow {
        valve: u32,
        rate: RateClass,
        flow: f64,
    },
    CalibrateTank {
        tank: u32,
        level: TankLevel,
        volume: f64,
    },
    /// Bind a physical sensor to a temperature position.
    MapSensor {
        sensor_id: u32,
        temp_index: usize,
    },
    /// Raw `name=value` fields from a settings or timer form, coerced and
    /// collapsed before sending.
    SubmitForm {
        fields: Vec<(String, String)>,
    },

    // ── Runtime (/run) ───────────────────────────────────────────────
    OpenValve {
        valve: u32,
        secs: f64,
    },
    Heat {
        on: bool,
    },
}

impl Command {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::OpenValve { .. } | Self::Heat { .. } => Endpoint::Run,
            Self::SetNetwork { .. }
            | Self::SetRates(_)
            | Self::SetVolts { .. }
            | Self::CalibrateFlow { .. }
            | Self::CalibrateTank { .. }
            | Self::MapSensor { .. }
            | Self::SubmitForm { .. } => Endpoint::Config,
        }
    }

    /// Whether the device's config may differ after this command, so the
    /// next poll must pull the config block again.
    pub fn changes_config(&self) -> bool {
        self.endpoint() == Endpoint::Config
    }

    /// Short name for logs and error messages.
    pub fn action(&self) -> &'static str {
        match self {
            Self::SetNetwork { .. } => "set network",
            Self::SetRates(_) => "set rates",
            Self::SetVolts { .. } => "set volts",
            Self::CalibrateFlow { .. } => "calibrate flow",
            Self::CalibrateTank { .. } => "calibrate tank",
            Self::MapSensor { .. } => "map sensor",
            Self::SubmitForm { .. } => "submit form",
            Self::OpenValve { .. } => "open valve",
            Self::Heat { .. } => "heat",
        }
    }

    /// Check operator input that the device would otherwise silently
    /// misinterpret.
    pub fn validate(&self) -> Result<(), CoreError> {
        let problem = match self {
            Self::SetNetwork { ssid, .. } if ssid.trim().is_empty() => Some("SSID is empty"),
            Self::SetRates(rates) if rates.is_empty() => Some("no rate constants given"),
            Self::SetVolts { volts } if !volts.is_finite() || *volts <= 0.0 => {
                Some("volts must be a positive number")
            }
            Self::CalibrateFlow { flow, .. } if !flow.is_finite() || *flow < 0.0 => {
                Some("flow must be a non-negative number")
            }
            Self::CalibrateTank { volume, .. } if !volume.is_finite() || *volume < 0.0 => {
                Some("volume must be a non-negative number")
            }
            Self::SubmitForm { fields } if fields.is_empty() => Some("form has no fields"),
            Self::OpenValve { secs, .. } if !secs.is_finite() || *secs <= 0.0 => {
                Some("pulse length must be positive")
            }
            _ => None,
        };

        problem.map_or(Ok(()), |message| {
            Err(CoreError::ValidationFailed {
                message: format!("{}: {message}", self.action()),
            })
        })
    }

    /// Build the flat key/value payload the device expects.
    pub fn to_payload(&self) -> FormPayload {
        match self {
            Self::SetNetwork { ssid, password } => FormPayload::new()
                .with("ssid", ssid.as_str())
                .with("pwd", password.expose_secret()),
            Self::SetRates(rates) => {
                let mut payload = FormPayload::new();
                for (key, value) in rates.entries() {
                    payload.insert(key, value);
                }
                payload
            }
            Self::SetVolts { volts } => FormPayload::new().with("vN", *volts),
            Self::CalibrateFlow { valve, rate, flow } => FormPayload::new()
                .with("valve", *valve)
                .with("rate", row_number(rate.row()))
                .with("flow", *flow),
            Self::CalibrateTank {
                tank,
                level,
                volume,
            } => FormPayload::new()
                .with("tank", *tank)
                .with("level", row_number(level.row()))
                .with("volume", *volume),
            Self::MapSensor {
                sensor_id,
                temp_index,
            } => FormPayload::new()
                .with("sid", *sensor_id)
                .with("tid", FieldValue::Number(index_number(*temp_index))),
            Self::SubmitForm { fields } => {
                FormPayload::from_raw_pairs(fields.iter().map(|(k, v)| (k.clone(), v.as_str())))
            }
            Self::OpenValve { valve, secs } => {
                FormPayload::new().with("open", *valve).with("secs", *secs)
            }
            Self::Heat { on } => FormPayload::new().with("on", *on),
        }
    }
}

fn row_number(row: usize) -> u32 {
    u32::try_from(row).unwrap_or(u32::MAX)
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn index_number(index: usize) -> f64 {
    index as f64
}
