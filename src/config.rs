use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

use gridcal_core::{AllDayPolicy, SyncOptions, ThrottleOptions};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Engine defaults applied to every sheet.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Sheet bindings, keyed by the name passed to `--sheet`.
    #[serde(default)]
    pub sheets: BTreeMap<String, SheetBinding>,
}

#[derive(Debug, Deserialize)]
pub struct SyncSettings {
    /// Reference time zone all event times are interpreted in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub all_day: AllDayPolicy,

    /// Email invites to guests on event creation.
    #[serde(default)]
    pub send_invites: bool,

    /// Skip rows with no start and no end instead of flagging them.
    #[serde(default)]
    pub skip_blank_rows: bool,

    /// Pause after each store mutation, in milliseconds.
    #[serde(default = "default_throttle_pause_ms")]
    pub throttle_pause_ms: u64,

    /// Wall-clock ceiling before mid-run id checkpoints, in seconds.
    #[serde(default = "default_max_run_time_secs")]
    pub max_run_time_secs: u64,
}

/// One grid-file/calendar-file pair to reconcile.
#[derive(Debug, Deserialize)]
pub struct SheetBinding {
    /// Path to the grid file (JSON 2D cell array). `~` expands.
    pub grid: String,

    /// Path to the calendar file (JSON array of event records). `~` expands.
    pub calendar: String,

    /// Identity of the backing calendar, used to catch two sheets bound
    /// to the same calendar.
    #[serde(default)]
    pub calendar_id: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_throttle_pause_ms() -> u64 {
    200
}

fn default_max_run_time_secs() -> u64 {
    345
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            timezone: default_timezone(),
            all_day: AllDayPolicy::default(),
            send_invites: false,
            skip_blank_rows: false,
            throttle_pause_ms: default_throttle_pause_ms(),
            max_run_time_secs: default_max_run_time_secs(),
        }
    }
}

impl SyncSettings {
    /// Resolve into the engine's per-run options.
    pub fn to_options(&self) -> Result<SyncOptions> {
        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown timezone '{}' in config", self.timezone))?;

        Ok(SyncOptions {
            timezone,
            all_day: self.all_day,
            send_invites: self.send_invites,
            skip_blank_rows: self.skip_blank_rows,
            throttle: ThrottleOptions {
                pause_per_mutation: Duration::from_millis(self.throttle_pause_ms),
                max_run_time: Duration::from_secs(self.max_run_time_secs),
            },
        })
    }
}

/// Get the config directory path (~/.config/gridcal)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("gridcal");
    Ok(config_dir)
}

/// Get the config file path (~/.config/gridcal/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from ~/.config/gridcal/config.toml
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with at least one sheet binding:\n\n\
            [sync]\n\
            timezone = \"America/New_York\"\n\n\
            [sheets.team]\n\
            grid = \"~/gridcal/team.grid.json\"\n\
            calendar = \"~/gridcal/team.calendar.json\"\n\
            calendar_id = \"team@example.com\"\n\n\
            Then run `gridcal-cli pull` or `gridcal-cli push`.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}
