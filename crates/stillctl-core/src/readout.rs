// ── Readout projection ──
//
// Pure mapping from the latest telemetry onto display strings. Front ends
// render these as-is and never format raw readings themselves.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::model::{FlowMeter, SensorRole, TelemetrySnapshot};

/// Shown for any reading that is missing or not physically meaningful.
pub const PLACEHOLDER: &str = "--";

const DEFAULT_FLOW_DIVISOR: f64 = 20.0;

/// How raw flow-meter counts become displayed values.
///
/// Device generations disagree on whether the firmware pre-scales counts,
/// so this is chosen per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowScaling {
    /// Divide each count by a fixed per-unit factor.
    Divide(f64),
    /// Show counts unchanged.
    Raw,
}

impl FlowScaling {
    /// `0` (or anything non-positive) selects raw counts.
    pub fn from_divisor(divisor: f64) -> Self {
        if divisor > 0.0 && divisor.is_finite() {
            Self::Divide(divisor)
        } else {
            Self::Raw
        }
    }

    pub fn apply(self, count: f64) -> f64 {
        match self {
            Self::Divide(divisor) => count / divisor,
            Self::Raw => count,
        }
    }
}

impl Default for FlowScaling {
    fn default() -> Self {
        Self::Divide(DEFAULT_FLOW_DIVISOR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemperatureReadout {
    pub role: SensorRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReadout {
    pub meter: FlowMeter,
    pub text: String,
}

/// Every display field, already formatted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayFields {
    /// One entry per [`SensorRole`], in position order.
    pub temperatures: Vec<TemperatureReadout>,
    /// One entry per [`FlowMeter`].
    pub flows: Vec<FlowReadout>,
    pub steam_power: String,
    pub heads_power: String,
    pub volts: String,
}

impl DisplayFields {
    pub fn temperature(&self, role: SensorRole) -> &str {
        self.temperatures
            .iter()
            .find(|r| r.role == role)
            .map_or(PLACEHOLDER, |r| r.text.as_str())
    }

    pub fn flow(&self, meter: FlowMeter) -> &str {
        self.flows
            .iter()
            .find(|r| r.meter == meter)
            .map_or(PLACEHOLDER, |r| r.text.as_str())
    }
}

/// Round half away from zero to one decimal place.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => format!("{:.1} °C", round_tenths(v)),
        _ => PLACEHOLDER.to_owned(),
    }
}

fn format_with_unit(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| PLACEHOLDER.to_owned(), |v| format!("{v} {unit}"))
}

/// Project a telemetry snapshot onto display fields.
pub fn project(telemetry: &TelemetrySnapshot, scaling: FlowScaling) -> DisplayFields {
    let temperatures = SensorRole::iter()
        .map(|role| TemperatureReadout {
            role,
            text: format_temperature(telemetry.temperatures.get(role)),
        })
        .collect();

    let flows = FlowMeter::iter()
        .map(|meter| FlowReadout {
            meter,
            text: format_with_unit(
                telemetry.flow(meter.index()).map(|c| scaling.apply(c)),
                "M",
            ),
        })
        .collect();

    DisplayFields {
        temperatures,
        flows,
        steam_power: format_with_unit(telemetry.steam_power, "W"),
        heads_power: format_with_unit(telemetry.heads_power, "W"),
        volts: telemetry
            .volts
            .map_or_else(|| PLACEHOLDER.to_owned(), |v| v.to_string()),
    }
}

// ── Sensor selector ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorOption {
    /// Position in the device's temperature array.
    pub index: usize,
    pub label: String,
}

/// The list of sensors currently reporting a value, with the operator's
/// selection carried across rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SensorSelector {
    options: Vec<SensorOption>,
    selected: Option<usize>,
}

impl SensorSelector {
    /// Rebuild the option list from the reported temperatures. The
    /// selection is kept if its index is still listed, otherwise cleared.
    pub fn rebuild(&mut self, temperatures: &[Option<f64>]) {
        self.options = temperatures
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                value.map(|v| SensorOption {
                    index,
                    label: format!("#{index} - {v} °C"),
                })
            })
            .collect();

        if let Some(selected) = self.selected {
            if !self.contains(selected) {
                self.selected = None;
            }
        }
    }

    /// Select the sensor at `index`. Returns `false` (and leaves the
    /// selection alone) if no such option is listed.
    pub fn select(&mut self, index: usize) -> bool {
        if self.contains(index) {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn options(&self) -> &[SensorOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn contains(&self, index: usize) -> bool {
        self.options.iter().any(|o| o.index == index)
    }
}
