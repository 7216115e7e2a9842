//! State-synchronization engine between `stillctl-api` and front ends.
//!
//! This crate owns everything with state in a still/brew control panel:
//!
//! - **[`SyncEngine`]**: the single owner of poll state, the config cache and
//!   the latest telemetry. [`start()`](SyncEngine::start) spawns the poll
//!   loop; [`poll_once()`](SyncEngine::poll_once) drives a single cycle for
//!   one-shot CLI use. Every settled poll publishes an [`EngineSnapshot`]
//!   on a `tokio::sync::watch` channel.
//!
//! - **Poll scheduling** ([`poll`]): `NeedsConfig` / `SteadyState`, with a
//!   generation counter so a config re-arm is never lost to a fetch that was
//!   already in flight.
//!
//! - **Config cache and lookups** ([`cache`], [`lookup`]): the last full
//!   config block and the 2-row flow and tank tables derived from it.
//!
//! - **Readouts** ([`readout`]): pure projection of telemetry onto display
//!   strings, plus the live-sensor selector.
//!
//! - **[`Command`]**: typed operator actions, posted device-ward only. Their
//!   effects show up on the next poll.
//!
//! The core never reads config files; front ends build an [`EngineConfig`].

pub mod cache;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod model;
pub mod poll;
pub mod readout;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, Endpoint};
pub use config::{DEFAULT_DEVICE_URL, EngineConfig};
pub use engine::SyncEngine;
pub use error::CoreError;
pub use lookup::{LookupTable, RateClass, TankLevel};
pub use poll::{DEFAULT_POLL_INTERVAL, LinkIndicator, PollOutcome, PollPhase};
pub use readout::{DisplayFields, FlowScaling, PLACEHOLDER, SensorOption, SensorSelector};
pub use state::EngineSnapshot;

pub use model::{
    ConfigSnapshot, FlowMeter, RateSettings, SENSOR_SLOTS, SensorArray, SensorRole,
    TelemetrySnapshot,
};

// Wire-level types front ends need without depending on the API crate.
pub use stillctl_api::{Ack, SubmitEncoding};
