use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vehicle pose and speed as read from the simulator each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehicleState {
    /// World position (simulation units).
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Heading in radians, `(-π, π]`.
    pub heading_rad: f64,
    /// Speed in km/h, never negative.
    pub speed_kmh: f64,
}

impl VehicleState {
    pub fn new(x: f64, y: f64, z: f64, heading_rad: f64, speed_kmh: f64) -> Self {
        Self {
            x,
            y,
            z,
            heading_rad,
            speed_kmh,
        }
    }
}

/// One full telemetry read.
///
/// Only [`TelemetrySnapshot::vehicle`] feeds perception; everything else is
/// carried through untouched for the display overlay.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySnapshot {
    pub vehicle: VehicleState,
    /// Track name, e.g. `"ks_nurburgring"`.
    pub track: String,
    /// Track layout; empty when the track has a single layout.
    pub layout: String,
    pub car_model: String,
    /// Steering wheel position, `[-1, 1]`.
    pub steer_angle: f64,
    /// Slip per wheel: front-left, front-right, rear-left, rear-right.
    pub wheel_slip: [f64; 4],
    pub wheels_off_track: u8,
    /// Damage: front, rear, left, right, highest.
    pub car_damage: [f64; 5],
    /// Last lap time in milliseconds.
    pub last_lap_ms: i64,
    /// Best lap time in milliseconds.
    pub best_lap_ms: i64,
    /// Ratio of the lap completed along the track spline, `0..=1`.
    pub track_completion: f64,
    /// Delta to the reference lap at this point (negative is better).
    pub performance_meter: f64,
    pub auto_shifter_on: bool,
}

/// Render a lap time given in milliseconds as `M:SS.mmm`.
///
/// Non-positive values (no lap set yet) render as `-:--.---`.
pub fn format_lap_time(ms: i64) -> String {
    if ms <= 0 {
        return "-:--.---".to_string();
    }
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{minutes}:{seconds:02}.{millis:03}")
}

/// Raster-space point where a sensor ray ends.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Endpoint {
    pub x: f64,
    pub z: f64,
}

/// A single ray of the sensor fan, recreated every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Ray angle relative to the heading, frame correction included (radians).
    pub angle_offset: f64,
    pub endpoint: Endpoint,
    /// `true` when the endpoint lands on drivable surface.
    pub triggered: bool,
}

/// The per-tick steering-correction signal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateSignal {
    /// Ray length used this tick (world units).
    pub sensor_distance: f64,
    /// Mean bearing of the triggered sensors in degrees; 0 is straight ahead.
    pub mean_angle_deg: f64,
}

/// Everything produced by one tick, as handed to displays and actuators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionFrame {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub sensors: Vec<Sensor>,
    pub signal: AggregateSignal,
    pub telemetry: TelemetrySnapshot,
}

impl PerceptionFrame {
    /// Frame stamped with the current wall-clock time.
    pub fn new(
        tick: u64,
        sensors: Vec<Sensor>,
        signal: AggregateSignal,
        telemetry: TelemetrySnapshot,
    ) -> Self {
        Self {
            tick,
            timestamp: Utc::now(),
            sensors,
            signal,
            telemetry,
        }
    }

    /// Number of sensors that landed on track.
    pub fn triggered_count(&self) -> usize {
        self.sensors.iter().filter(|s| s.triggered).count()
    }
}

/// Workspace error type covering configuration, asset, telemetry and output
/// failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PilotError {
    #[error("Invalid sensor array config: {0}")]
    InvalidSensorConfig(String),

    #[error("Track config error in {field}: {details}")]
    TrackConfig { field: String, details: String },

    #[error("Track raster error: {0}")]
    Raster(String),

    #[error("Telemetry unavailable: {0}")]
    TelemetryUnavailable(String),

    #[error("Control input {channel}={value} outside [{min}, {max}]")]
    ControlOutOfRange {
        channel: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Output sink {sink} failed: {details}")]
    Sink { sink: String, details: String },

    #[error("I/O error: {0}")]
    Io(String),
}
