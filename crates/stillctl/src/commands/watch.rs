//! Live readout driven by the engine's poll loop.

use std::sync::Arc;

use stillctl_core::{LinkIndicator, SyncEngine};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::status;

pub async fn handle(engine: &SyncEngine, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut updates = engine.subscribe();
    engine.start().await;

    let interactive = matches!(global.output, OutputFormat::Table)
        && output::should_color(&global.color);
    let mut seen = 0u32;

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break Ok(());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break Err(CliError::Internal("engine stopped publishing".into()));
                }
                let snapshot = Arc::clone(&updates.borrow_and_update());
                // Re-arm publishes too; only settled polls are worth a frame.
                if snapshot.updated_at.is_none() && snapshot.indicator == LinkIndicator::Unknown {
                    continue;
                }

                let frame = status::render(&snapshot, global);
                if interactive {
                    // Clear screen, cursor home.
                    output::print_output(&format!("\u{1b}[2J\u{1b}[H{frame}"), global.quiet);
                } else {
                    output::print_output(&frame, global.quiet);
                }

                seen += 1;
                if args.count.is_some_and(|n| seen >= n) {
                    break Ok(());
                }
            }
        }
    };

    engine.stop().await;
    result
}
