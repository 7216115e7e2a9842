// ── Engine state ──
//
// Everything the engine owns behind one lock: poll state, config cache
// with its lookup tables, latest telemetry and the projected readout.
// All mutation happens here, synchronously, between network round-trips.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use stillctl_api::DataResponse;

use crate::cache::ConfigCache;
use crate::lookup::{RateClass, TankLevel};
use crate::model::{ConfigSnapshot, TelemetrySnapshot, split};
use crate::poll::{FetchTicket, LinkIndicator, PollOutcome, PollPhase, PollState};
use crate::readout::{DisplayFields, FlowScaling, SensorSelector, project};

/// Point-in-time view of the engine, published after every settled poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    pub display: DisplayFields,
    pub indicator: LinkIndicator,
    pub phase: PollPhase,
    pub poll_interval_ms: u64,
    pub has_config: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub selector: SensorSelector,
}

#[derive(Debug)]
pub struct EngineState {
    poll: PollState,
    cache: ConfigCache,
    telemetry: Option<TelemetrySnapshot>,
    display: DisplayFields,
    selector: SensorSelector,
    flow_scaling: FlowScaling,
    updated_at: Option<DateTime<Utc>>,
}

impl EngineState {
    pub fn new(poll: PollState, flow_scaling: FlowScaling) -> Self {
        Self {
            poll,
            cache: ConfigCache::new(),
            telemetry: None,
            display: project(&TelemetrySnapshot::default(), flow_scaling),
            selector: SensorSelector::default(),
            flow_scaling,
            updated_at: None,
        }
    }

    pub fn poll(&self) -> &PollState {
        &self.poll
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        self.poll.begin_fetch()
    }

    pub fn rearm(&mut self) {
        self.poll.rearm();
        debug!("config fetch re-armed");
    }

    /// Apply a decoded `/data` response.
    ///
    /// A config block, when present, replaces the cache and drives the poll
    /// state. Telemetry always updates the tank current row, the selector and
    /// the readout.
    pub fn apply_response(&mut self, ticket: FetchTicket, response: DataResponse) {
        let (telemetry, config) = split(response);

        if let Some(cfg) = config {
            let declared = cfg.poll_interval();
            self.cache.replace(cfg);
            let before = self.poll.interval();
            self.poll.config_received(ticket, declared);
            if self.poll.interval() != before {
                info!(
                    interval_ms = self.poll.interval().as_millis(),
                    "poll interval changed by device"
                );
            }
        } else {
            self.poll.telemetry_received();
        }

        self.cache.update_tank_levels(telemetry.tank_now.clone());
        self.selector.rebuild(&telemetry.raw_temperatures);
        self.display = project(&telemetry, self.flow_scaling);
        self.telemetry = Some(telemetry);
        self.updated_at = Some(Utc::now());
    }

    /// Record a failed fetch. Nothing but the outcome changes.
    pub fn apply_failure(&mut self, outcome: PollOutcome) {
        self.poll.fetch_failed(outcome);
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn config(&self) -> Option<&ConfigSnapshot> {
        self.cache.snapshot()
    }

    pub fn telemetry(&self) -> Option<&TelemetrySnapshot> {
        self.telemetry.as_ref()
    }

    pub fn display(&self) -> &DisplayFields {
        &self.display
    }

    pub fn flow_lookup(&self, rate: RateClass, valve: usize) -> Option<f64> {
        self.cache.flow_table().get(rate.row(), valve)
    }

    pub fn tank_lookup(&self, level: TankLevel, tank: usize) -> Option<f64> {
        self.cache.tank_table().get(level.row(), tank)
    }

    pub fn select_sensor(&mut self, index: usize) -> bool {
        self.selector.select(index)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            display: self.display.clone(),
            indicator: self.poll.last_outcome().indicator(),
            phase: self.poll.phase(),
            poll_interval_ms: u64::try_from(self.poll.interval().as_millis())
                .unwrap_or(u64::MAX),
            has_config: self.cache.is_populated(),
            updated_at: self.updated_at,
            selector: self.selector.clone(),
        }
    }
}

/// Classify a failed `/data` fetch.
pub(crate) fn failure_outcome(err: &stillctl_api::Error) -> PollOutcome {
    if err.is_malformed() {
        PollOutcome::Malformed
    } else {
        PollOutcome::TransportFailed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::{FlowMeter, SensorRole};
    use crate::readout::PLACEHOLDER;
    use stillctl_api::WireConfig;

    fn state() -> EngineState {
        EngineState::new(PollState::default(), FlowScaling::default())
    }

    fn telemetry(temp: &[f64], flows: &[f64], tn: &[f64]) -> DataResponse {
        DataResponse {
            temp: temp.iter().copied().map(Some).collect(),
            flows: flows.iter().copied().map(Some).collect(),
            tn: tn.iter().copied().map(Some).collect(),
            ..DataResponse::default()
        }
    }

    fn with_config(mut response: DataResponse, poll: Option<f64>) -> DataResponse {
        response.cfg = Some(WireConfig {
            hfr: vec![Some(10.0), Some(20.0)],
            lfr: vec![Some(1.0), Some(2.0)],
            tf: vec![Some(50.0), Some(80.0)],
            poll,
            ..WireConfig::default()
        });
        response
    }

    #[test]
    fn config_response_reaches_steady_state() {
        let mut s = state();
        let ticket = s.begin_fetch();
        assert!(ticket.want_config);

        s.apply_response(ticket, with_config(telemetry(&[70.0], &[], &[]), Some(10.0)));

        assert_eq!(s.poll().phase(), PollPhase::SteadyState);
        assert_eq!(s.poll().interval().as_millis(), 10_000);
        assert_eq!(s.flow_lookup(RateClass::Low, 1), Some(2.0));
        assert_eq!(s.tank_lookup(TankLevel::Full, 0), Some(50.0));
        assert_eq!(s.snapshot().indicator, LinkIndicator::Healthy);
    }

    #[test]
    fn telemetry_only_response_keeps_needing_config() {
        let mut s = state();
        let ticket = s.begin_fetch();
        s.apply_response(ticket, telemetry(&[70.0], &[], &[]));

        assert_eq!(s.poll().phase(), PollPhase::NeedsConfig);
        assert!(s.config().is_none());
        assert_eq!(s.flow_lookup(RateClass::High, 0), None);
    }

    #[test]
    fn failure_leaves_state_untouched() {
        let mut s = EngineState::new(PollState::new(Duration::from_secs(4)), FlowScaling::default());
        let ticket = s.begin_fetch();
        s.apply_response(ticket, with_config(telemetry(&[70.0], &[], &[]), None));
        let before = s.snapshot();

        s.apply_failure(PollOutcome::TransportFailed);
        let after = s.snapshot();

        assert_eq!(after.poll_interval_ms, before.poll_interval_ms);
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.display, before.display);
        assert_eq!(after.indicator, LinkIndicator::Alert);
        assert_eq!(s.tank_lookup(TankLevel::Full, 1), Some(80.0));

        s.apply_failure(PollOutcome::Malformed);
        assert_eq!(s.snapshot().indicator, LinkIndicator::Degraded);
    }

    #[test]
    fn tank_current_row_tracks_latest_tick() {
        let mut s = state();
        let ticket = s.begin_fetch();
        s.apply_response(ticket, with_config(telemetry(&[], &[], &[1.0, 2.0]), None));

        for tn in [[3.0, 4.0], [5.0, 6.0], [7.0, 8.0]] {
            let ticket = s.begin_fetch();
            s.apply_response(ticket, telemetry(&[], &[], &tn));
        }

        assert_eq!(s.tank_lookup(TankLevel::Current, 0), Some(7.0));
        assert_eq!(s.tank_lookup(TankLevel::Current, 1), Some(8.0));
        assert_eq!(s.tank_lookup(TankLevel::Full, 0), Some(50.0));
    }

    #[test]
    fn telemetry_projects_scenario() {
        let mut s = state();
        let ticket = s.begin_fetch();
        s.apply_response(
            ticket,
            DataResponse {
                temp: vec![Some(75.2), Some(-1.0), Some(60.0)],
                flows: vec![Some(100.0), Some(40.0)],
                tn: vec![Some(5.0), Some(8.0)],
                ..DataResponse::default()
            },
        );

        let display = s.display();
        assert_eq!(display.flow(FlowMeter::Still), "5 M");
        assert_eq!(display.flow(FlowMeter::Water), "2 M");
        assert_eq!(display.temperature(SensorRole::Plate), PLACEHOLDER);
        assert_eq!(s.tank_lookup(TankLevel::Current, 1), Some(8.0));
    }

    #[test]
    fn rearm_while_in_flight_is_not_lost() {
        let mut s = state();
        let first = s.begin_fetch();
        s.apply_response(first, with_config(telemetry(&[], &[], &[]), None));

        s.rearm();
        let in_flight = s.begin_fetch();
        s.rearm();
        s.apply_response(in_flight, with_config(telemetry(&[], &[], &[]), None));

        assert!(s.poll().needs_config());
    }

    #[test]
    fn selector_survives_ticks() {
        let mut s = state();
        let ticket = s.begin_fetch();
        s.apply_response(ticket, telemetry(&[70.0, 71.0], &[], &[]));
        assert!(s.select_sensor(1));

        let ticket = s.begin_fetch();
        s.apply_response(ticket, telemetry(&[70.5, 71.5, 72.0], &[], &[]));
        assert_eq!(s.snapshot().selector.selected(), Some(1));
    }
}
