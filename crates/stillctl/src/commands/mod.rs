//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod log;
pub mod lookup;
pub mod status;
pub mod watch;

use stillctl_core::SyncEngine;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    engine: &SyncEngine,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(engine, args, global).await,
        Command::Status => status::handle(engine, global).await,
        Command::Sensors => status::handle_sensors(engine, global).await,
        Command::Lookup(args) => lookup::handle(engine, args, global).await,
        Command::Log => log::handle(engine, global).await,
        cmd @ (Command::Valve(_)
        | Command::Heat(_)
        | Command::Calibrate(_)
        | Command::Volts { .. }
        | Command::MapSensor { .. }
        | Command::Network(_)
        | Command::Rates(_)
        | Command::Submit { .. }) => control::handle(engine, cmd, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions need no device".into(),
        )),
    }
}
