//! Device operation log.

use serde_json::json;

use stillctl_core::SyncEngine;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(engine: &SyncEngine, global: &GlobalOpts) -> Result<(), CliError> {
    let log = engine.fetch_log().await?;

    // The log is free text; only structured formats get wrapped.
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => log.trim_end().to_owned(),
        _ => output::render_single(
            &global.output,
            &json!({ "log": log }),
            |_| String::new(),
            |_| String::new(),
        ),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
