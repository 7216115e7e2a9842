// ── Config cache ──
//
// Holds the last config block the device reported together with the two
// lookup tables derived from it. Replacement is whole-snapshot: a new
// block never merges into the old one.

use tracing::debug;

use crate::lookup::{LookupTable, TankLevel, build_flow_table, build_tank_table};
use crate::model::ConfigSnapshot;

#[derive(Debug, Default)]
pub struct ConfigCache {
    snapshot: Option<ConfigSnapshot>,
    flow: LookupTable,
    tank: LookupTable,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly received config block and rebuild the static rows of
    /// both tables. The tank table's current row survives the rebuild.
    pub fn replace(&mut self, snapshot: ConfigSnapshot) {
        let current = self.tank.row(TankLevel::Current.row()).to_vec();

        self.flow = build_flow_table(&snapshot);
        self.tank = build_tank_table(&snapshot);
        self.tank.set_row(TankLevel::Current.row(), current);

        debug!(
            valves = snapshot.valve_count(),
            tanks = snapshot.tank_count(),
            "config cache replaced"
        );
        self.snapshot = Some(snapshot);
    }

    /// Replace the tank table's current row. Runs on every telemetry tick,
    /// with or without a cached config.
    pub fn update_tank_levels(&mut self, tank_now: Vec<Option<f64>>) {
        self.tank.set_row(TankLevel::Current.row(), tank_now);
    }

    pub fn snapshot(&self) -> Option<&ConfigSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_populated(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn flow_table(&self) -> &LookupTable {
        &self.flow
    }

    pub fn tank_table(&self) -> &LookupTable {
        &self.tank
    }
}
