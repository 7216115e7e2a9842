// ── Poll scheduling state ──
//
// The poll loop has two logical states, distinguished only by whether the
// next fetch asks for the config block. A generation counter orders
// re-arms against fetches already in flight: a config response only clears
// the flag if nothing re-armed it after that fetch was issued.

use std::time::Duration;

use serde::Serialize;

/// Interval used until the device declares its own.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Which kind of fetch the loop will issue next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    NeedsConfig,
    SteadyState,
}

/// How the most recent fetch settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// No fetch has settled yet.
    #[default]
    Pending,
    Ok,
    TransportFailed,
    Malformed,
}

impl PollOutcome {
    pub fn indicator(self) -> LinkIndicator {
        match self {
            Self::Pending => LinkIndicator::Unknown,
            Self::Ok => LinkIndicator::Healthy,
            Self::TransportFailed => LinkIndicator::Alert,
            Self::Malformed => LinkIndicator::Degraded,
        }
    }
}

/// Title colour signal for a front end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkIndicator {
    #[default]
    Unknown,
    Healthy,
    /// Device unreachable or answering with an HTTP error (red).
    Alert,
    /// Device reachable but its answer could not be decoded (blue).
    Degraded,
}

/// Issued by [`PollState::begin_fetch`] and handed back when the fetch
/// settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub want_config: bool,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct PollState {
    interval: Duration,
    needs_config: bool,
    generation: u64,
    last_outcome: PollOutcome,
}

impl PollState {
    /// Start in `NeedsConfig` with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            needs_config: true,
            generation: 0,
            last_outcome: PollOutcome::Pending,
        }
    }

    pub fn phase(&self) -> PollPhase {
        if self.needs_config {
            PollPhase::NeedsConfig
        } else {
            PollPhase::SteadyState
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn needs_config(&self) -> bool {
        self.needs_config
    }

    pub fn last_outcome(&self) -> PollOutcome {
        self.last_outcome
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            want_config: self.needs_config,
            generation: self.generation,
        }
    }

    /// Force the next fetch to request the config block.
    pub fn rearm(&mut self) {
        self.needs_config = true;
        self.generation = self.generation.wrapping_add(1);
    }

    /// A response carrying a config block arrived for `ticket`.
    ///
    /// The declared interval, when present, always takes effect. The flag
    /// only clears if the state was not re-armed while the fetch was in
    /// flight.
    pub fn config_received(&mut self, ticket: FetchTicket, declared: Option<Duration>) {
        if let Some(interval) = declared {
            self.interval = interval;
        }
        if ticket.generation == self.generation {
            self.needs_config = false;
        }
        self.last_outcome = PollOutcome::Ok;
    }

    /// A response without a config block decoded cleanly.
    pub fn telemetry_received(&mut self) {
        self.last_outcome = PollOutcome::Ok;
    }

    /// The fetch failed. Interval and flag are left as they were.
    pub fn fetch_failed(&mut self, outcome: PollOutcome) {
        self.last_outcome = outcome;
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
