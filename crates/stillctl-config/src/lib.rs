//! Configuration for the stillctl CLI.
//!
//! TOML profiles on disk, environment overrides, and translation to
//! `stillctl_core::EngineConfig`. The CLI layers its global flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stillctl_core::{DEFAULT_DEVICE_URL, EngineConfig, FlowScaling, SubmitEncoding};

/// Environment prefix for overrides, e.g. `STILLCTL_DEFAULTS__TIMEOUT=5`.
pub const ENV_PREFIX: &str = "STILLCTL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Global defaults, overridden per profile.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when the caller did not pick one.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds. `0` disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll interval in seconds until the device declares one.
    #[serde(default = "default_poll_secs")]
    pub default_poll_secs: u64,

    /// Divisor for raw flow counts. `0` shows counts unscaled.
    #[serde(default = "default_flow_divisor")]
    pub flow_divisor: f64,

    /// Submission encoding: "form" or "json".
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            default_poll_secs: default_poll_secs(),
            flow_divisor: default_flow_divisor(),
            encoding: default_encoding(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_poll_secs() -> u64 {
    10
}
fn default_flow_divisor() -> f64 {
    20.0
}
fn default_encoding() -> String {
    "form".into()
}

/// A named device profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Device base URL (e.g., "http://192.168.4.1").
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_poll_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_divisor: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            device: default_device(),
            timeout: None,
            default_poll_secs: None,
            flow_divisor: None,
            encoding: None,
        }
    }
}

fn default_device() -> String {
    DEFAULT_DEVICE_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "stillctl", "stillctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("stillctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, then apply environment overrides. A missing
/// file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Resolution ──────────────────────────────────────────────────────

/// Parse a submission encoding name.
pub fn parse_encoding(value: &str) -> Result<SubmitEncoding, ConfigError> {
    match value {
        "form" => Ok(SubmitEncoding::Form),
        "json" => Ok(SubmitEncoding::Json),
        other => Err(ConfigError::Validation {
            field: "encoding".into(),
            reason: format!("expected 'form' or 'json', got '{other}'"),
        }),
    }
}

/// Build an `EngineConfig` from a profile and the global defaults, with no
/// CLI flag overrides.
pub fn profile_to_engine_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<EngineConfig, ConfigError> {
    let device_url: url::Url = profile
        .device
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "device".into(),
            reason: format!("invalid URL: {}", profile.device),
        })?;

    let timeout_secs = profile.timeout.unwrap_or(defaults.timeout);
    let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

    let poll_secs = profile.default_poll_secs.unwrap_or(defaults.default_poll_secs);
    if poll_secs == 0 {
        return Err(ConfigError::Validation {
            field: "default_poll_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    let divisor = profile.flow_divisor.unwrap_or(defaults.flow_divisor);
    if divisor < 0.0 || !divisor.is_finite() {
        return Err(ConfigError::Validation {
            field: "flow_divisor".into(),
            reason: format!("must be 0 (raw) or positive, got {divisor}"),
        });
    }

    let encoding = parse_encoding(profile.encoding.as_deref().unwrap_or(&defaults.encoding))?;

    Ok(EngineConfig {
        device_url,
        timeout,
        default_poll_interval: Duration::from_secs(poll_secs),
        flow_scaling: FlowScaling::from_divisor(divisor),
        encoding,
    })
}

/// Resolve the named profile (or an implicit default one) to an
/// `EngineConfig`.
///
/// The implicit profile only exists for the configured default name, so a
/// fresh install works against the access-point address without a file.
pub fn resolve_engine_config(cfg: &Config, profile_name: &str) -> Result<EngineConfig, ConfigError> {
    match cfg.profiles.get(profile_name) {
        Some(profile) => profile_to_engine_config(profile, &cfg.defaults),
        None if profile_name == cfg.default_profile_name() => {
            profile_to_engine_config(&Profile::default(), &cfg.defaults)
        }
        None => Err(ConfigError::ProfileNotFound {
            name: profile_name.into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile_name(), "default");
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn file_profiles_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "shed"

[defaults]
flow_divisor = 10.0

[profiles.shed]
device = "http://10.0.0.7"
encoding = "json"
timeout = 0

[profiles.old]
device = "http://10.0.0.8"
flow_divisor = 0.0
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile_name(), "shed");

        let shed = resolve_engine_config(&cfg, "shed").unwrap();
        assert_eq!(shed.device_url.as_str(), "http://10.0.0.7/");
        assert_eq!(shed.encoding, SubmitEncoding::Json);
        assert_eq!(shed.timeout, None);
        assert_eq!(shed.flow_scaling, FlowScaling::Divide(10.0));
        assert_eq!(shed.default_poll_interval, Duration::from_secs(10));

        let old = resolve_engine_config(&cfg, "old").unwrap();
        assert_eq!(old.flow_scaling, FlowScaling::Raw);
        assert_eq!(old.encoding, SubmitEncoding::Form);
        assert_eq!(old.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn implicit_default_profile() {
        let cfg = Config::default();
        let engine = resolve_engine_config(&cfg, "default").unwrap();
        assert_eq!(engine, EngineConfig::default());

        assert!(matches!(
            resolve_engine_config(&cfg, "nope"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let defaults = Defaults::default();
        let bad_url = Profile {
            device: "not a url".into(),
            ..Profile::default()
        };
        assert!(matches!(
            profile_to_engine_config(&bad_url, &defaults),
            Err(ConfigError::Validation { ref field, .. }) if field == "device"
        ));

        let bad_encoding = Profile {
            encoding: Some("xml".into()),
            ..Profile::default()
        };
        assert!(profile_to_engine_config(&bad_encoding, &defaults).is_err());

        let bad_divisor = Profile {
            flow_divisor: Some(-2.0),
            ..Profile::default()
        };
        assert!(profile_to_engine_config(&bad_divisor, &defaults).is_err());
    }

    #[test]
    fn display_keys_in_older_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\noutput = \"json\"\ncolor = \"never\"\ntimeout = 12\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.defaults.timeout, 12);

        let written = toml::to_string_pretty(&cfg).unwrap();
        assert!(!written.contains("output"));
        assert!(!written.contains("color"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                device: "http://still.local".into(),
                default_poll_secs: Some(5),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
