//! One-shot readout and sensor listing.

use chrono::Utc;
use tabled::Tabled;

use stillctl_core::{EngineSnapshot, PollPhase, SensorOption, SensorRole, SyncEngine};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Reading")]
    label: String,
}

impl From<&SensorOption> for SensorRow {
    fn from(o: &SensorOption) -> Self {
        Self {
            index: o.index,
            position: SensorRole::from_index(o.index)
                .map_or_else(|| "-".into(), |r| r.label().to_owned()),
            label: o.label.clone(),
        }
    }
}

// ── Detail view ──────────────────────────────────────────────────────

/// Multi-line panel for a snapshot, used by `status` and `watch`.
pub fn detail(snapshot: &EngineSnapshot, color: bool) -> String {
    let display = &snapshot.display;
    let mut lines = vec![format!(
        "Link:      {}",
        output::paint_indicator(snapshot.indicator, color)
    )];

    for t in &display.temperatures {
        lines.push(format!("{:<10} {}", format!("{}:", t.role.label()), t.text));
    }
    for f in &display.flows {
        lines.push(format!(
            "{:<10} {}",
            format!("{} flow:", f.meter.label()),
            f.text
        ));
    }
    lines.push(format!("Steam:     {}", display.steam_power));
    lines.push(format!("Heads:     {}", display.heads_power));
    lines.push(format!("Volts:     {}", display.volts));

    let phase = match snapshot.phase {
        PollPhase::NeedsConfig => "config pending",
        PollPhase::SteadyState => "steady",
    };
    lines.push(format!(
        "Polling:   every {} ({phase})",
        humantime::format_duration(std::time::Duration::from_millis(snapshot.poll_interval_ms))
    ));
    lines.push(format!("Updated:   {}", updated_label(snapshot)));

    lines.join("\n")
}

fn updated_label(snapshot: &EngineSnapshot) -> String {
    let Some(at) = snapshot.updated_at else {
        return "never".into();
    };
    let age = (Utc::now() - at).to_std().unwrap_or_default();
    // Second granularity keeps the label stable between redraws.
    let age = std::time::Duration::from_secs(age.as_secs());
    format!(
        "{} ({} ago)",
        at.with_timezone(&chrono::Local).format("%H:%M:%S"),
        humantime::format_duration(age)
    )
}

fn plain(snapshot: &EngineSnapshot) -> String {
    let display = &snapshot.display;
    display
        .temperatures
        .iter()
        .map(|t| t.text.clone())
        .chain(display.flows.iter().map(|f| f.text.clone()))
        .chain([
            display.steam_power.clone(),
            display.heads_power.clone(),
            display.volts.clone(),
        ])
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a snapshot in the selected output format.
pub fn render(snapshot: &EngineSnapshot, global: &GlobalOpts) -> String {
    let color = output::should_color(&global.color);
    output::render_single(&global.output, snapshot, |s| detail(s, color), plain)
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn handle(engine: &SyncEngine, global: &GlobalOpts) -> Result<(), CliError> {
    engine.poll_once().await?;
    output::print_output(&render(&engine.snapshot(), global), global.quiet);
    Ok(())
}

pub async fn handle_sensors(engine: &SyncEngine, global: &GlobalOpts) -> Result<(), CliError> {
    engine.poll_once().await?;
    let snapshot = engine.snapshot();
    let out = output::render_list(
        &global.output,
        snapshot.selector.options(),
        |o| SensorRow::from(o),
        |o| o.index.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
