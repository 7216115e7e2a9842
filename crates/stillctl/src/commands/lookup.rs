//! Calibration lookups. A single poll fetches config and telemetry together.

use serde::Serialize;

use stillctl_core::{RateClass, SyncEngine, TankLevel};

use crate::cli::{GlobalOpts, LookupArgs, LookupCommand};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct LookupResult {
    table: &'static str,
    row: String,
    index: usize,
    value: f64,
}

pub async fn handle(engine: &SyncEngine, args: LookupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    engine.poll_once().await?;

    let result = match args.command {
        LookupCommand::Flow { rate, valve } => {
            let rate = RateClass::from(rate);
            let value = engine
                .flow_lookup(rate, valve)
                .ok_or_else(|| CliError::NotFound {
                    table: format!("Flow table ({rate})"),
                    what: "valve".into(),
                    index: valve,
                })?;
            LookupResult {
                table: "flow",
                row: rate.to_string(),
                index: valve,
                value,
            }
        }
        LookupCommand::Tank { level, tank } => {
            let level = TankLevel::from(level);
            let value = engine
                .tank_lookup(level, tank)
                .ok_or_else(|| CliError::NotFound {
                    table: format!("Tank table ({level})"),
                    what: "tank".into(),
                    index: tank,
                })?;
            LookupResult {
                table: "tank",
                row: level.to_string(),
                index: tank,
                value,
            }
        }
    };

    let out = output::render_single(
        &global.output,
        &result,
        |r| format!("{} {} #{}: {}", r.table, r.row, r.index, r.value),
        |r| r.value.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
