//! Sensor Array Generator.
//!
//! Produces the fan of virtual distance sensors for one tick: a single ray
//! length shared by every sensor, and an odd number of bearings spread
//! evenly across the field of view.
//!
//! Ray length grows with speed so the fan looks further ahead on the
//! straights:
//!
//! ```text
//! sensor_distance = max(min_distance * speed / speed_divisor, min_distance)
//! sensor_count    = max(next_odd(ceil(min_count * sensor_distance / 25)), min_count)
//! ```
//!
//! Every bearing is shifted by the frame correction because heading zero in
//! the simulator points along the raster's vertical axis rather than its
//! horizontal one.
//!
//! # Example
//!
//! ```rust
//! use trackpilot_perception::sensor_array::{generate, SensorArrayConfig};
//! use trackpilot_types::VehicleState;
//!
//! let config = SensorArrayConfig::new(10.0, 5, 90.0);
//! let fan = generate(&VehicleState::new(0.0, 0.0, 0.0, 0.0, 50.0), &config).unwrap();
//! assert_eq!(fan.sensor_distance, 10.0);
//! assert_eq!(fan.angles.len(), 5);
//! ```

use trackpilot_types::{PilotError, VehicleState};

/// Ray length, in world units, per step of sensor density growth.
const DISTANCE_PER_DENSITY_STEP: f64 = 25.0;

/// Most sensors a fan may hold, whatever the speed.  Odd, so the centre
/// sensor still sits on the heading.
pub const MAX_SENSOR_COUNT: usize = 361;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Shape of the sensor fan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorArrayConfig {
    /// Ray length at or below `speed_divisor` km/h (world units, > 0).
    pub min_sensor_distance: f64,
    /// Fewest sensors in the fan.  Even values are bumped to the next odd.
    pub min_sensor_count: u32,
    /// Total field of view in degrees, `(0, 360]`.
    pub fov_degrees: f64,
    /// Speed (km/h) at which the ray starts growing past its minimum.
    pub speed_divisor: f64,
    /// Constant added to every bearing to line heading zero up with the
    /// raster axes (degrees).  `0` disables the correction.
    pub frame_correction_deg: f64,
}

impl Default for SensorArrayConfig {
    fn default() -> Self {
        Self {
            min_sensor_distance: 10.0,
            min_sensor_count: 5,
            fov_degrees: 90.0,
            speed_divisor: 50.0,
            frame_correction_deg: 90.0,
        }
    }
}

impl SensorArrayConfig {
    /// Config with the given fan shape and the default speed divisor and
    /// frame correction.
    pub fn new(min_sensor_distance: f64, min_sensor_count: u32, fov_degrees: f64) -> Self {
        Self {
            min_sensor_distance,
            min_sensor_count,
            fov_degrees,
            ..Self::default()
        }
    }

    pub fn with_speed_divisor(mut self, speed_divisor: f64) -> Self {
        self.speed_divisor = speed_divisor;
        self
    }

    pub fn with_frame_correction_deg(mut self, frame_correction_deg: f64) -> Self {
        self.frame_correction_deg = frame_correction_deg;
        self
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::InvalidSensorConfig`] describing the first
    /// invalid field.
    pub fn validate(&self) -> Result<(), PilotError> {
        if !(self.min_sensor_distance.is_finite() && self.min_sensor_distance > 0.0) {
            return Err(PilotError::InvalidSensorConfig(format!(
                "min_sensor_distance must be > 0, got {}",
                self.min_sensor_distance
            )));
        }
        if self.min_sensor_count == 0 || self.min_sensor_count as usize > MAX_SENSOR_COUNT {
            return Err(PilotError::InvalidSensorConfig(format!(
                "min_sensor_count must be in [1, {MAX_SENSOR_COUNT}], got {}",
                self.min_sensor_count
            )));
        }
        if !(self.fov_degrees.is_finite() && self.fov_degrees > 0.0 && self.fov_degrees <= 360.0) {
            return Err(PilotError::InvalidSensorConfig(format!(
                "fov_degrees must be in (0, 360], got {}",
                self.fov_degrees
            )));
        }
        if !(self.speed_divisor.is_finite() && self.speed_divisor > 0.0) {
            return Err(PilotError::InvalidSensorConfig(format!(
                "speed_divisor must be > 0, got {}",
                self.speed_divisor
            )));
        }
        if !self.frame_correction_deg.is_finite() {
            return Err(PilotError::InvalidSensorConfig(format!(
                "frame_correction_deg must be finite, got {}",
                self.frame_correction_deg
            )));
        }
        Ok(())
    }

    /// `min_sensor_count` rounded up to an odd number.
    pub fn odd_min_count(&self) -> usize {
        next_odd(self.min_sensor_count as usize)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fan generation
// ────────────────────────────────────────────────────────────────────────────

/// The geometry of one tick's sensor fan.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFan {
    /// Ray length shared by every sensor (world units).
    pub sensor_distance: f64,
    /// Bearings relative to the heading, frame correction included, in
    /// radians, ordered from one edge of the field of view to the other.
    pub angles: Vec<f64>,
}

/// Build the sensor fan for `state`.
///
/// # Errors
///
/// Returns [`PilotError::InvalidSensorConfig`] if `config` fails
/// [`SensorArrayConfig::validate`].
pub fn generate(state: &VehicleState, config: &SensorArrayConfig) -> Result<SensorFan, PilotError> {
    config.validate()?;

    let sensor_distance = sensor_distance(state.speed_kmh, config);
    let count = sensor_count(sensor_distance, config);
    let correction = config.frame_correction_deg.to_radians();

    let angles = if count == 1 {
        vec![correction]
    } else {
        // Index around the centre sensor so it sits exactly on the heading.
        let mid = (count / 2) as f64;
        let step = config.fov_degrees.to_radians() / (count - 1) as f64;
        (0..count)
            .map(|i| (i as f64 - mid) * step + correction)
            .collect()
    };

    Ok(SensorFan {
        sensor_distance,
        angles,
    })
}

/// Ray length for the given speed.  Never below `min_sensor_distance`;
/// negative or non-finite speeds are treated as standing still.
pub fn sensor_distance(speed_kmh: f64, config: &SensorArrayConfig) -> f64 {
    let speed = if speed_kmh.is_finite() { speed_kmh.max(0.0) } else { 0.0 };
    (config.min_sensor_distance * speed / config.speed_divisor).max(config.min_sensor_distance)
}

/// Number of sensors for a fan of the given ray length.  Always odd and
/// never above [`MAX_SENSOR_COUNT`].
pub fn sensor_count(sensor_distance: f64, config: &SensorArrayConfig) -> usize {
    let density = (config.min_sensor_count as f64 * sensor_distance / DISTANCE_PER_DENSITY_STEP).ceil();
    let grown = if density.is_nan() || density <= 0.0 {
        1
    } else if density >= MAX_SENSOR_COUNT as f64 {
        MAX_SENSOR_COUNT
    } else {
        next_odd(density as usize).min(MAX_SENSOR_COUNT)
    };
    grown.max(config.odd_min_count()).min(MAX_SENSOR_COUNT)
}

fn next_odd(n: usize) -> usize {
    n / 2 * 2 + 1
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn at_speed(speed_kmh: f64) -> VehicleState {
        VehicleState::new(0.0, 0.0, 0.0, 0.0, speed_kmh)
    }

    #[test]
    fn slow_vehicle_uses_the_floor() {
        let config = SensorArrayConfig::new(10.0, 5, 90.0);
        let fan = generate(&at_speed(50.0), &config).unwrap();
        assert!((fan.sensor_distance - 10.0).abs() < 1e-12);
        assert_eq!(fan.angles.len(), 5);
    }

    #[test]
    fn distance_grows_with_speed() {
        let config = SensorArrayConfig::new(10.0, 5, 90.0);
        let fan = generate(&at_speed(200.0), &config).unwrap();
        // 10 * 200 / 50 = 40 → ceil(5 * 40 / 25) = 8 → 9 sensors.
        assert!((fan.sensor_distance - 40.0).abs() < 1e-12);
        assert_eq!(fan.angles.len(), 9);
    }

    #[test]
    fn divisor_is_configurable() {
        let config = SensorArrayConfig::new(10.0, 5, 90.0).with_speed_divisor(20.0);
        let fan = generate(&at_speed(50.0), &config).unwrap();
        assert!((fan.sensor_distance - 25.0).abs() < 1e-12);
        assert_eq!(fan.angles.len(), 5);
    }

    #[test]
    fn distance_is_monotonic_in_speed() {
        let config = SensorArrayConfig::default();
        let mut previous = sensor_distance(0.0, &config);
        for step in 1..=80 {
            let d = sensor_distance(step as f64 * 5.0, &config);
            assert!(d >= previous, "distance shrank at {} km/h", step * 5);
            assert!(d >= config.min_sensor_distance);
            previous = d;
        }
    }

    #[test]
    fn negative_or_nan_speed_uses_the_floor() {
        let config = SensorArrayConfig::default();
        assert_eq!(sensor_distance(-30.0, &config), 10.0);
        assert_eq!(sensor_distance(f64::NAN, &config), 10.0);
        assert_eq!(sensor_distance(f64::INFINITY, &config), 10.0);
    }

    #[test]
    fn count_is_always_odd_and_at_least_min() {
        for min_count in 1..=8u32 {
            for speed in [0.0, 37.0, 50.0, 120.0, 333.0] {
                let config = SensorArrayConfig::new(7.5, min_count, 120.0);
                let fan = generate(&at_speed(speed), &config).unwrap();
                let n = fan.angles.len();
                assert_eq!(n % 2, 1, "even count {n} for min_count={min_count} speed={speed}");
                assert!(n >= min_count as usize);
            }
        }
    }

    #[test]
    fn even_min_count_is_bumped_to_odd() {
        let config = SensorArrayConfig::new(1.0, 4, 90.0);
        assert_eq!(config.odd_min_count(), 5);
        let fan = generate(&at_speed(0.0), &config).unwrap();
        assert_eq!(fan.angles.len(), 5);
    }

    #[test]
    fn fan_is_symmetric_about_the_heading() {
        let config = SensorArrayConfig::new(10.0, 7, 100.0);
        let fan = generate(&at_speed(0.0), &config).unwrap();
        let correction = 90f64.to_radians();
        let n = fan.angles.len();
        assert_eq!(fan.angles[n / 2] - correction, 0.0);
        for i in 0..n / 2 {
            let left = fan.angles[i] - correction;
            let right = fan.angles[n - 1 - i] - correction;
            assert!((left + right).abs() < 1e-12);
        }
    }

    #[test]
    fn fan_spans_the_full_field_of_view() {
        let config = SensorArrayConfig::new(10.0, 5, 90.0);
        let fan = generate(&at_speed(0.0), &config).unwrap();
        let degrees: Vec<f64> = fan.angles.iter().map(|a| a.to_degrees()).collect();
        let expected = [45.0, 67.5, 90.0, 112.5, 135.0];
        for (got, want) in degrees.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn zero_correction_centres_on_zero() {
        let config = SensorArrayConfig::new(10.0, 3, 60.0).with_frame_correction_deg(0.0);
        let fan = generate(&at_speed(0.0), &config).unwrap();
        assert_eq!(fan.angles[1], 0.0);
        assert!((fan.angles[0].to_degrees() + 30.0).abs() < 1e-9);
    }

    #[test]
    fn long_rays_add_sensors_beyond_the_minimum() {
        // ceil(1 * 100 / 25) = 4 → 5 sensors.
        let config = SensorArrayConfig::new(100.0, 1, 90.0);
        let fan = generate(&at_speed(0.0), &config).unwrap();
        assert_eq!(fan.angles.len(), 5);
    }

    #[test]
    fn single_sensor_points_straight_ahead() {
        let config = SensorArrayConfig::new(10.0, 1, 90.0);
        let fan = generate(&at_speed(0.0), &config).unwrap();
        assert_eq!(fan.angles, vec![90f64.to_radians()]);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let base = SensorArrayConfig::default();
        let bad = [
            SensorArrayConfig { min_sensor_distance: 0.0, ..base },
            SensorArrayConfig { min_sensor_count: 0, ..base },
            SensorArrayConfig { min_sensor_count: MAX_SENSOR_COUNT as u32 + 1, ..base },
            SensorArrayConfig { fov_degrees: 0.0, ..base },
            SensorArrayConfig { fov_degrees: 361.0, ..base },
            SensorArrayConfig { speed_divisor: 0.0, ..base },
            SensorArrayConfig { frame_correction_deg: f64::NAN, ..base },
        ];
        for config in bad {
            assert!(
                matches!(generate(&at_speed(10.0), &config), Err(PilotError::InvalidSensorConfig(_))),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn extreme_speeds_are_capped() {
        let config = SensorArrayConfig::default();
        for speed in [1e9, 1e300, f64::MAX] {
            let fan = generate(&at_speed(speed), &config).unwrap();
            assert_eq!(fan.angles.len(), MAX_SENSOR_COUNT, "speed {speed}");
            assert!(fan.sensor_distance >= config.min_sensor_distance);
        }
        assert_eq!(sensor_count(f64::INFINITY, &config), MAX_SENSOR_COUNT);
    }

    #[test]
    fn count_never_shrinks_as_speed_rises_into_the_cap() {
        let config = SensorArrayConfig::default();
        let mut previous = 0;
        for exp in 0..=12 {
            let n = sensor_count(sensor_distance(10f64.powi(exp), &config), &config);
            assert!(n >= previous && n <= MAX_SENSOR_COUNT);
            assert_eq!(n % 2, 1);
            previous = n;
        }
    }

    #[test]
    fn full_circle_fov_is_valid() {
        let config = SensorArrayConfig::new(10.0, 5, 360.0);
        assert!(generate(&at_speed(0.0), &config).is_ok());
    }
}
