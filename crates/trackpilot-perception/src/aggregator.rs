//! Steering-correction Aggregator.
//!
//! Reduces the triggered/untriggered sensor readings of a tick to a single
//! mean bearing in degrees, where `0` is straight ahead, negative is one side
//! and positive the other.
//!
//! When no sensor is on track the mean is undefined.  Rather than letting a
//! NaN reach the display or the actuator, the aggregator holds the last
//! valid value until sensors trigger again.
//!
//! # Example
//!
//! ```rust
//! use trackpilot_perception::aggregator::Aggregator;
//! use trackpilot_types::{Endpoint, Sensor};
//!
//! let sensor = |deg: f64, triggered| Sensor {
//!     angle_offset: deg.to_radians(),
//!     endpoint: Endpoint::default(),
//!     triggered,
//! };
//!
//! let mut agg = Aggregator::new(90.0);
//! let mean = agg.aggregate(&[sensor(80.0, true), sensor(100.0, true), sensor(120.0, true)]);
//! assert!((mean - 10.0).abs() < 1e-9);
//!
//! // Nothing on track: the previous value is held.
//! let held = agg.aggregate(&[sensor(80.0, false)]);
//! assert!((held - 10.0).abs() < 1e-9);
//! ```

use tracing::debug;
use trackpilot_types::Sensor;

/// Mean bearing of the triggered sensors in degrees with the frame correction
/// removed, or `None` when no sensor triggered (or the mean is not finite).
pub fn mean_triggered_angle_deg(sensors: &[Sensor], frame_correction_deg: f64) -> Option<f64> {
    let (sum, count) = sensors
        .iter()
        .filter(|s| s.triggered)
        .fold((0.0_f64, 0_usize), |(sum, n), s| (sum + s.angle_offset, n + 1));
    if count == 0 {
        return None;
    }
    let mean = (sum / count as f64).to_degrees() - frame_correction_deg;
    mean.is_finite().then_some(mean)
}

/// Stateless form of [`Aggregator::aggregate`].
///
/// Returns `(mean_angle_deg, updated_prior)`.  With no triggered sensors both
/// are `prior_angle_deg`.
pub fn aggregate(sensors: &[Sensor], prior_angle_deg: f64, frame_correction_deg: f64) -> (f64, f64) {
    match mean_triggered_angle_deg(sensors, frame_correction_deg) {
        Some(mean) => (mean, mean),
        None => (prior_angle_deg, prior_angle_deg),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregator
// ────────────────────────────────────────────────────────────────────────────

/// Owns the one piece of perception state that survives between ticks: the
/// last valid mean bearing.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregator {
    frame_correction_deg: f64,
    previous_mean_deg: f64,
}

impl Aggregator {
    /// Create an aggregator for fans built with `frame_correction_deg`.
    /// The held value starts at `0` (straight ahead).
    pub fn new(frame_correction_deg: f64) -> Self {
        Self::with_prior(frame_correction_deg, 0.0)
    }

    /// Create an aggregator whose held value starts at `prior_angle_deg`.
    pub fn with_prior(frame_correction_deg: f64, prior_angle_deg: f64) -> Self {
        Self {
            frame_correction_deg,
            previous_mean_deg: prior_angle_deg,
        }
    }

    /// The value that would be emitted if the next tick triggers nothing.
    pub fn previous_mean_deg(&self) -> f64 {
        self.previous_mean_deg
    }

    pub fn frame_correction_deg(&self) -> f64 {
        self.frame_correction_deg
    }

    /// Reduce one tick's sensors to a mean bearing in degrees.
    ///
    /// The held value is only overwritten when at least one sensor
    /// triggered.
    pub fn aggregate(&mut self, sensors: &[Sensor]) -> f64 {
        match mean_triggered_angle_deg(sensors, self.frame_correction_deg) {
            Some(mean) => {
                self.previous_mean_deg = mean;
                mean
            }
            None => {
                debug!(held = self.previous_mean_deg, "no sensors on track; holding last mean angle");
                self.previous_mean_deg
            }
        }
    }

    /// Forget the held value, e.g. at the start of a new session.
    pub fn reset(&mut self) {
        self.previous_mean_deg = 0.0;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
