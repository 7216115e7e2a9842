//! Handlers for commands that post to the device (`/cfg` and `/run`).

use secrecy::SecretString;
use serde::Serialize;

use stillctl_core::{Ack, Command as CoreCommand, RateClass, RateSettings, SyncEngine, TankLevel};

use crate::cli::{
    CalibrateCommand, Command, GlobalOpts, LevelArg, NetworkArgs, RateArg, RatesArgs, Switch,
    ValveCommand,
};
use crate::error::CliError;
use crate::output;

impl From<RateArg> for RateClass {
    fn from(arg: RateArg) -> Self {
        match arg {
            RateArg::High => Self::High,
            RateArg::Low => Self::Low,
        }
    }
}

impl From<LevelArg> for TankLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Full => Self::Full,
            LevelArg::Current => Self::Current,
        }
    }
}

/// What the device said about one submission.
#[derive(Debug, Serialize)]
struct Receipt {
    action: &'static str,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

pub async fn handle(engine: &SyncEngine, cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let command = to_core_command(cmd)?;
    let action = command.action();

    tracing::debug!(action, "submitting");
    let ack: Ack = engine.dispatch(command).await?;

    let receipt = Receipt {
        action,
        accepted: ack.is_ok(),
        status: ack.status,
    };
    let out = output::render_single(
        &global.output,
        &receipt,
        |r| match r.status {
            Some(ref s) => format!("{}: sent (device says '{s}')", r.action),
            None => format!("{}: sent", r.action),
        },
        |r| r.accepted.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Translate parsed CLI arguments into a core command.
fn to_core_command(cmd: Command) -> Result<CoreCommand, CliError> {
    let command = match cmd {
        Command::Valve(args) => match args.command {
            ValveCommand::Open { valve, secs } => CoreCommand::OpenValve { valve, secs },
        },
        Command::Heat(args) => CoreCommand::Heat {
            on: matches!(args.state, Switch::On),
        },
        Command::Calibrate(args) => match args.command {
            CalibrateCommand::Flow { valve, rate, flow } => CoreCommand::CalibrateFlow {
                valve,
                rate: rate.into(),
                flow,
            },
            CalibrateCommand::Tank {
                tank,
                level,
                volume,
            } => CoreCommand::CalibrateTank {
                tank,
                level: level.into(),
                volume,
            },
        },
        Command::Volts { volts } => CoreCommand::SetVolts { volts },
        Command::MapSensor {
            sensor_id,
            temp_index,
        } => CoreCommand::MapSensor {
            sensor_id,
            temp_index,
        },
        Command::Network(args) => network_command(args)?,
        Command::Rates(args) => CoreCommand::SetRates(rate_settings(&args)),
        Command::Submit { fields } => CoreCommand::SubmitForm {
            fields: parse_fields(&fields)?,
        },
        other => {
            return Err(CliError::Internal(format!(
                "{other:?} is not a device submission"
            )));
        }
    };
    Ok(command)
}

fn network_command(args: NetworkArgs) -> Result<CoreCommand, CliError> {
    let password = match args.password {
        Some(p) => p,
        None => rpassword::prompt_password(format!("Password for '{}': ", args.ssid))
            .map_err(|e| CliError::Prompt(e.to_string()))?,
    };
    Ok(CoreCommand::SetNetwork {
        ssid: args.ssid,
        password: SecretString::from(password),
    })
}

fn rate_settings(args: &RatesArgs) -> RateSettings {
    RateSettings {
        fr: args.fr,
        sr: args.sr,
        sd: args.sd,
        hr: args.hr,
        hd: args.hd,
        vr: args.vr,
        ms: args.ms,
        mf: args.mf,
        sf: args.sf,
    }
}

/// Split `name=value` arguments. The value may itself contain `=`.
fn parse_fields(raw: &[String]) -> Result<Vec<(String, String)>, CliError> {
    raw.iter()
        .map(|arg| {
            let (name, value) = arg.split_once('=').ok_or_else(|| CliError::Validation {
                field: "submit".into(),
                reason: format!("expected NAME=VALUE, got '{arg}'"),
            })?;
            if name.is_empty() {
                return Err(CliError::Validation {
                    field: "submit".into(),
                    reason: format!("missing field name in '{arg}'"),
                });
            }
            Ok((name.to_owned(), value.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn fields_split_on_first_equals() {
        let fields = parse_fields(&["t1=12".into(), "expr=a=b".into(), "t1=13".into()]).unwrap();
        assert_eq!(
            fields,
            vec![
                ("t1".to_owned(), "12".to_owned()),
                ("expr".to_owned(), "a=b".to_owned()),
                ("t1".to_owned(), "13".to_owned()),
            ]
        );
    }

    #[test]
    fn field_without_equals_is_rejected() {
        let err = parse_fields(&["oops".into()]).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
        assert!(parse_fields(&["=5".into()]).is_err());
    }

    #[test]
    fn heat_switch_maps_to_run_command() {
        let cmd = to_core_command(Command::Heat(crate::cli::HeatArgs { state: Switch::Off }))
            .unwrap();
        assert!(matches!(cmd, CoreCommand::Heat { on: false }));
        assert!(!cmd.changes_config());
    }

    #[test]
    fn calibration_args_map_to_config_command() {
        let cmd = to_core_command(Command::Calibrate(crate::cli::CalibrateArgs {
            command: CalibrateCommand::Tank {
                tank: 2,
                level: LevelArg::Full,
                volume: 25.0,
            },
        }))
        .unwrap();
        assert!(matches!(
            cmd,
            CoreCommand::CalibrateTank {
                tank: 2,
                level: TankLevel::Full,
                ..
            }
        ));
        assert!(cmd.changes_config());
    }
}
