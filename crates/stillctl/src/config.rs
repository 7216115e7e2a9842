//! Profile selection and CLI flag overrides on top of `stillctl-config`.
//!
//! Core never sees these types -- it receives a pre-built `EngineConfig`.

use std::time::Duration;

use stillctl_config::{Config, ConfigError, Profile};
use stillctl_core::{EngineConfig, FlowScaling, SubmitEncoding};

use crate::cli::{EncodingArg, GlobalOpts};
use crate::error::CliError;

/// Determine the active profile name: `--profile` flag, then the config's
/// `default_profile`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| cfg.default_profile_name().to_owned())
}

/// Build an `EngineConfig` from the config file, the active profile and
/// CLI flag overrides.
pub fn build_engine_config(global: &GlobalOpts) -> Result<EngineConfig, CliError> {
    let cfg = stillctl_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let base = match stillctl_config::resolve_engine_config(&cfg, &profile_name) {
        Ok(config) => config,
        // An explicit --device needs no profile on disk.
        Err(ConfigError::ProfileNotFound { .. }) if global.device.is_some() => {
            stillctl_config::profile_to_engine_config(&Profile::default(), &cfg.defaults)?
        }
        Err(ConfigError::ProfileNotFound { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&cfg),
            });
        }
        Err(e) => return Err(e.into()),
    };

    apply_overrides(base, global)
}

/// Layer global flags over a resolved config.
pub fn apply_overrides(
    mut config: EngineConfig,
    global: &GlobalOpts,
) -> Result<EngineConfig, CliError> {
    if let Some(ref device) = global.device {
        config.device_url = device.parse().map_err(|_| CliError::Validation {
            field: "device".into(),
            reason: format!("invalid URL: {device}"),
        })?;
    }

    if let Some(secs) = global.timeout {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    if global.raw_flows {
        config.flow_scaling = FlowScaling::Raw;
    }

    if let Some(encoding) = global.encoding {
        config.encoding = match encoding {
            EncodingArg::Form => SubmitEncoding::Form,
            EncodingArg::Json => SubmitEncoding::Json,
        };
    }

    Ok(config)
}

/// Sorted, comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
