// ── Config and telemetry snapshots ──
//
// Domain forms of the two halves of a `/data` response. The wire model is
// split once, on arrival; nothing past this point sees `DataResponse`.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use stillctl_api::{DataResponse, WireConfig};

use super::sensor::SensorArray;

/// Device-defined rate constants. Field names follow the firmware's keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSettings {
    #[serde(rename = "fR", skip_serializing_if = "Option::is_none")]
    pub fr: Option<f64>,
    #[serde(rename = "sR", skip_serializing_if = "Option::is_none")]
    pub sr: Option<f64>,
    #[serde(rename = "sD", skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    #[serde(rename = "hR", skip_serializing_if = "Option::is_none")]
    pub hr: Option<f64>,
    #[serde(rename = "hD", skip_serializing_if = "Option::is_none")]
    pub hd: Option<f64>,
    #[serde(rename = "vR", skip_serializing_if = "Option::is_none")]
    pub vr: Option<f64>,
    #[serde(rename = "mS", skip_serializing_if = "Option::is_none")]
    pub ms: Option<f64>,
    #[serde(rename = "mF", skip_serializing_if = "Option::is_none")]
    pub mf: Option<f64>,
    #[serde(rename = "sF", skip_serializing_if = "Option::is_none")]
    pub sf: Option<f64>,
}

impl RateSettings {
    /// `(wire key, value)` for every constant that is set, in firmware order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        [
            ("fR", self.fr),
            ("sR", self.sr),
            ("sD", self.sd),
            ("hR", self.hr),
            ("hD", self.hd),
            ("vR", self.vr),
            ("mS", self.ms),
            ("mF", self.mf),
            ("sF", self.sf),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// The most recent full configuration reported by the device.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    pub ssid: Option<String>,
    pub password: Option<SecretString>,
    pub rates: RateSettings,
    pub high_flow_rates: Vec<Option<f64>>,
    pub low_flow_rates: Vec<Option<f64>>,
    pub tank_full: Vec<Option<f64>>,
    /// Declared poll interval in seconds, as reported.
    pub poll_secs: Option<f64>,
}

impl ConfigSnapshot {
    /// The declared poll interval. Missing, zero, negative or absurd values
    /// count as "not declared".
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Number of valves the device exposes, per the high-rate calibration.
    pub fn valve_count(&self) -> usize {
        self.high_flow_rates.len()
    }

    pub fn tank_count(&self) -> usize {
        self.tank_full.len()
    }
}

impl From<WireConfig> for ConfigSnapshot {
    fn from(wire: WireConfig) -> Self {
        Self {
            ssid: wire.ssid,
            password: wire.pwd.map(SecretString::from),
            rates: RateSettings {
                fr: wire.fr,
                sr: wire.sr,
                sd: wire.sd,
                hr: wire.hr,
                hd: wire.hd,
                vr: wire.vr,
                ms: wire.ms,
                mf: wire.mf,
                sf: wire.sf,
            },
            high_flow_rates: wire.hfr,
            low_flow_rates: wire.lfr,
            tank_full: wire.tf,
            poll_secs: wire.poll,
        }
    }
}

/// Latest live readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub temperatures: SensorArray<f64>,
    /// Temperatures exactly as reported, for the sensor selector.
    pub raw_temperatures: Vec<Option<f64>>,
    pub steam_power: Option<f64>,
    pub heads_power: Option<f64>,
    pub flows: Vec<Option<f64>>,
    pub tank_now: Vec<Option<f64>>,
    pub volts: Option<f64>,
}

impl TelemetrySnapshot {
    /// Raw count of the flow meter at `index`, `None` when not reported.
    pub fn flow(&self, index: usize) -> Option<f64> {
        self.flows.get(index).copied().flatten()
    }
}

/// Split a `/data` response into its telemetry and optional config parts.
pub fn split(response: DataResponse) -> (TelemetrySnapshot, Option<ConfigSnapshot>) {
    let telemetry = TelemetrySnapshot {
        temperatures: SensorArray::from_slice(&response.temp),
        raw_temperatures: response.temp,
        steam_power: response.steam,
        heads_power: response.heads,
        flows: response.flows,
        tank_now: response.tn,
        volts: response.volts,
    };
    (telemetry, response.cfg.map(ConfigSnapshot::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SensorRole;
    use secrecy::ExposeSecret;

    #[test]
    fn poll_interval_rejects_zero_and_missing() {
        let mut cfg = ConfigSnapshot::default();
        assert_eq!(cfg.poll_interval(), None);
        cfg.poll_secs = Some(0.0);
        assert_eq!(cfg.poll_interval(), None);
        cfg.poll_secs = Some(-3.0);
        assert_eq!(cfg.poll_interval(), None);
        cfg.poll_secs = Some(2.5);
        assert_eq!(cfg.poll_interval(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn split_keeps_config_when_present() {
        let response = DataResponse {
            temp: vec![Some(75.2), Some(-1.0)],
            tn: vec![Some(5.0)],
            cfg: Some(WireConfig {
                ssid: Some("still".into()),
                pwd: Some("hunter2".into()),
                fr: Some(1.5),
                poll: Some(10.0),
                ..WireConfig::default()
            }),
            ..DataResponse::default()
        };

        let (telemetry, cfg) = split(response);
        assert_eq!(telemetry.temperatures.get(SensorRole::Head), Some(75.2));
        assert_eq!(telemetry.tank_now, vec![Some(5.0)]);

        let cfg = cfg.unwrap();
        assert_eq!(cfg.rates.fr, Some(1.5));
        assert_eq!(cfg.password.unwrap().expose_secret(), "hunter2");
        assert_eq!(cfg.poll_secs, Some(10.0));
    }

    #[test]
    fn rate_entries_skip_unset() {
        let rates = RateSettings {
            sr: Some(3.0),
            vr: Some(0.5),
            ..RateSettings::default()
        };
        assert_eq!(rates.entries(), vec![("sR", 3.0), ("vR", 0.5)]);
        assert!(RateSettings::default().is_empty());
    }
}
