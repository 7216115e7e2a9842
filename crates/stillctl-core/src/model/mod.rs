// ── Domain model ──
//
// Typed forms of what the controller reports. Built from wire models
// in `stillctl-api`; consumers of this crate only ever see these.

pub mod sensor;
pub mod snapshot;

pub use sensor::{FlowMeter, SENSOR_SLOTS, SensorArray, SensorRole};
pub use snapshot::{ConfigSnapshot, RateSettings, TelemetrySnapshot, split};
