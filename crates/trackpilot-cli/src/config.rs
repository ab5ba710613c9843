//! User configuration – reads/writes `~/.trackpilot/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use trackpilot_perception::SensorArrayConfig;

/// Persisted user configuration stored in `~/.trackpilot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Simulator install root; track assets live under `content/tracks`.
    #[serde(default)]
    pub sim_root: String,

    /// Track folder name, e.g. `"ks_nurburgring"`.
    #[serde(default)]
    pub track: String,

    /// Layout sub-folder; empty for single-layout tracks.
    #[serde(default)]
    pub layout: String,

    /// JSON-lines telemetry capture to drive the loop from.
    #[serde(default)]
    pub telemetry_replay: String,

    /// Start the capture over when it runs out.
    #[serde(default)]
    pub replay_loop: bool,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Log a perception summary every N ticks.
    #[serde(default = "default_log_every_ticks")]
    pub log_every_ticks: u64,

    /// Also publish every frame's overlay to the headless sim display.
    #[serde(default)]
    pub sim_display: bool,

    #[serde(default = "default_min_sensor_distance")]
    pub min_sensor_distance: f64,

    #[serde(default = "default_min_sensor_count")]
    pub min_sensor_count: u32,

    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f64,

    #[serde(default = "default_speed_divisor")]
    pub speed_divisor: f64,

    #[serde(default = "default_frame_correction_deg")]
    pub frame_correction_deg: f64,
}

fn default_tick_interval_ms() -> u64 {
    50
}
fn default_log_every_ticks() -> u64 {
    20
}
fn default_min_sensor_distance() -> f64 {
    10.0
}
fn default_min_sensor_count() -> u32 {
    5
}
fn default_fov_degrees() -> f64 {
    90.0
}
fn default_speed_divisor() -> f64 {
    50.0
}
fn default_frame_correction_deg() -> f64 {
    90.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sim_root: String::new(),
            track: String::new(),
            layout: String::new(),
            telemetry_replay: String::new(),
            replay_loop: false,
            tick_interval_ms: default_tick_interval_ms(),
            log_every_ticks: default_log_every_ticks(),
            sim_display: false,
            min_sensor_distance: default_min_sensor_distance(),
            min_sensor_count: default_min_sensor_count(),
            fov_degrees: default_fov_degrees(),
            speed_divisor: default_speed_divisor(),
            frame_correction_deg: default_frame_correction_deg(),
        }
    }
}

impl Config {
    /// Sensor fan parameters.  Not validated here; the pipeline rejects bad
    /// values at session start.
    pub fn sensor_config(&self) -> SensorArrayConfig {
        SensorArrayConfig::new(self.min_sensor_distance, self.min_sensor_count, self.fov_degrees)
            .with_speed_divisor(self.speed_divisor)
            .with_frame_correction_deg(self.frame_correction_deg)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Return the path to `~/.trackpilot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".trackpilot").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `TRACKPILOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TRACKPILOT_SIM_ROOT` | `sim_root` |
/// | `TRACKPILOT_TRACK` | `track` |
/// | `TRACKPILOT_LAYOUT` | `layout` |
/// | `TRACKPILOT_REPLAY` | `telemetry_replay` |
/// | `TRACKPILOT_TICK_MS` | `tick_interval_ms` (ignored unless it parses) |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("TRACKPILOT_SIM_ROOT") {
        cfg.sim_root = v;
    }
    if let Ok(v) = std::env::var("TRACKPILOT_TRACK") {
        cfg.track = v;
    }
    if let Ok(v) = std::env::var("TRACKPILOT_LAYOUT") {
        cfg.layout = v;
    }
    if let Ok(v) = std::env::var("TRACKPILOT_REPLAY") {
        cfg.telemetry_replay = v;
    }
    if let Ok(v) = std::env::var("TRACKPILOT_TICK_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.tick_interval_ms = ms;
    }
}

/// Save the config to disk, creating `~/.trackpilot/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
