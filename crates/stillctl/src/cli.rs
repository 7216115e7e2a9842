//! Clap derive structures for the `stillctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stillctl -- control panel for still/brew controllers
#[derive(Debug, Parser)]
#[command(
    name = "stillctl",
    version,
    about = "Monitor and drive a still/brew controller from the command line",
    long_about = "Polls a still/brew controller for live temperatures, flows and tank levels,\n\
        and sends calibration, configuration and run commands to it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "STILLCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device URL (overrides profile)
    #[arg(long, short = 'd', env = "STILLCTL_DEVICE", global = true)]
    pub device: Option<String>,

    /// Request timeout in seconds, 0 to wait forever (overrides profile)
    #[arg(long, env = "STILLCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Show raw flow-meter counts instead of scaled values
    #[arg(long, global = true)]
    pub raw_flows: bool,

    /// Submission encoding for this device generation (overrides profile)
    #[arg(long, env = "STILLCTL_ENCODING", global = true)]
    pub encoding: Option<EncodingArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STILLCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EncodingArg {
    /// application/x-www-form-urlencoded
    Form,
    /// JSON object body
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Live readout, refreshed at the device's poll interval
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Poll once and print the readout
    #[command(alias = "st")]
    Status,

    /// List sensors currently reporting a temperature
    Sensors,

    /// Pulse a valve open
    Valve(ValveArgs),

    /// Switch heating on or off
    Heat(HeatArgs),

    /// Flow and tank calibration
    #[command(alias = "cal")]
    Calibrate(CalibrateArgs),

    /// Set the current mains voltage baseline
    Volts {
        /// Measured voltage
        volts: f64,
    },

    /// Bind a physical sensor to a temperature position
    MapSensor {
        /// Physical sensor id as reported by the device
        sensor_id: u32,

        /// Temperature position (0 = head ... 7 = ferment 2)
        temp_index: usize,
    },

    /// Change the device's WiFi network
    Network(NetworkArgs),

    /// Set device rate constants
    Rates(RatesArgs),

    /// Submit raw settings fields (name=value)
    Submit {
        /// Fields as name=value; repeat a name to send a list
        #[arg(required = true, value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },

    /// Query calibration lookup tables
    Lookup(LookupArgs),

    /// Show the device operation log
    Log,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

// ── Run commands ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ValveArgs {
    #[command(subcommand)]
    pub command: ValveCommand,
}

#[derive(Debug, Subcommand)]
pub enum ValveCommand {
    /// Open a valve for a number of seconds
    Open {
        /// Valve number
        valve: u32,

        /// Seconds to keep it open
        #[arg(long, short = 's')]
        secs: f64,
    },
}

#[derive(Debug, Args)]
pub struct HeatArgs {
    /// Desired heater state
    pub state: Switch,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

// ── Calibration ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CalibrateArgs {
    #[command(subcommand)]
    pub command: CalibrateCommand,
}

#[derive(Debug, Subcommand)]
pub enum CalibrateCommand {
    /// Record a flow calibration point for a valve
    Flow {
        /// Valve number
        #[arg(long)]
        valve: u32,

        /// Rate class the point belongs to
        #[arg(long, value_enum)]
        rate: RateArg,

        /// Measured flow
        #[arg(long)]
        flow: f64,
    },

    /// Record a tank calibration point
    Tank {
        /// Tank number
        #[arg(long)]
        tank: u32,

        /// Which level the volume refers to
        #[arg(long, value_enum)]
        level: LevelArg,

        /// Measured volume
        #[arg(long)]
        volume: f64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RateArg {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelArg {
    Full,
    Current,
}

// ── Configuration commands ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NetworkArgs {
    /// Network name
    pub ssid: String,

    /// Network password (prompted when omitted)
    #[arg(long, env = "STILLCTL_WIFI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Rate constants use the firmware's own key names; unset ones are not sent.
#[derive(Debug, Args)]
pub struct RatesArgs {
    #[arg(long = "fR")]
    pub fr: Option<f64>,
    #[arg(long = "sR")]
    pub sr: Option<f64>,
    #[arg(long = "sD")]
    pub sd: Option<f64>,
    #[arg(long = "hR")]
    pub hr: Option<f64>,
    #[arg(long = "hD")]
    pub hd: Option<f64>,
    #[arg(long = "vR")]
    pub vr: Option<f64>,
    #[arg(long = "mS")]
    pub ms: Option<f64>,
    #[arg(long = "mF")]
    pub mf: Option<f64>,
    #[arg(long = "sF")]
    pub sf: Option<f64>,
}

// ── Lookup ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LookupArgs {
    #[command(subcommand)]
    pub command: LookupCommand,
}

#[derive(Debug, Subcommand)]
pub enum LookupCommand {
    /// Flow calibration for a valve and rate class
    Flow {
        #[arg(long, value_enum)]
        rate: RateArg,

        #[arg(long)]
        valve: usize,
    },

    /// Tank calibration or current level for a tank
    Tank {
        #[arg(long, value_enum)]
        level: LevelArg,

        #[arg(long)]
        tank: usize,
    },
}

// ── Config & completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles (* marks the default)
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
