//! World-to-raster Map Transform.
//!
//! The simulator reports positions in its own world units; the track raster
//! is addressed in pixels.  A [`MapTransform`] is the fixed affine mapping
//! between the two, read once per session from the track's parameter file.
//!
//! Only the horizontal plane matters: world `x` maps to raster columns and
//! world `z` maps to raster rows.  The vertical `y` axis is ignored.
//!
//! # Example
//!
//! ```rust
//! use trackpilot_perception::transform::MapTransform;
//!
//! let tf = MapTransform::new(0.5, 100.0, 200.0, 800.0, 600.0).unwrap();
//! let (px, pz) = tf.world_to_pixel(10.0, -20.0);
//! assert!((px - 105.0).abs() < 1e-9);
//! assert!((pz - 190.0).abs() < 1e-9);
//! ```

use trackpilot_types::{Endpoint, PilotError, VehicleState};

// ────────────────────────────────────────────────────────────────────────────
// MapTransform
// ────────────────────────────────────────────────────────────────────────────

/// Immutable world-to-pixel mapping for one track session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapTransform {
    /// World units to pixels.  Always `> 0`.
    pub scale_factor: f64,
    /// Pixel-space translation along the raster's horizontal axis.
    pub x_offset: f64,
    /// Pixel-space translation along the raster's vertical axis.
    pub z_offset: f64,
    /// Raster width in pixels.
    pub width: f64,
    /// Raster height in pixels.
    pub height: f64,
}

impl MapTransform {
    /// Build a transform, rejecting a non-positive scale or negative bounds.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::TrackConfig`] naming the offending field.
    pub fn new(
        scale_factor: f64,
        x_offset: f64,
        z_offset: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, PilotError> {
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(invalid("scale_factor", format!("must be > 0, got {scale_factor}")));
        }
        for (field, value) in [("x_offset", x_offset), ("z_offset", z_offset)] {
            if !value.is_finite() {
                return Err(invalid(field, format!("must be finite, got {value}")));
            }
        }
        for (field, value) in [("width", width), ("height", height)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, format!("must be >= 0, got {value}")));
            }
        }
        Ok(Self {
            scale_factor,
            x_offset,
            z_offset,
            width,
            height,
        })
    }

    /// Map a world `(x, z)` position to raster pixel coordinates.
    pub fn world_to_pixel(&self, x: f64, z: f64) -> (f64, f64) {
        (
            self.x_offset + x * self.scale_factor,
            self.z_offset + z * self.scale_factor,
        )
    }

    /// Raster-space endpoint of a ray of length `distance` cast from the
    /// vehicle at bearing `heading + angle_offset`.
    ///
    /// The vehicle position enters unscaled; only the ray itself is scaled
    /// into pixels.  This matches how the track rasters shipped with the
    /// simulator were calibrated.
    pub fn ray_endpoint(&self, state: &VehicleState, distance: f64, angle_offset: f64) -> Endpoint {
        let bearing = state.heading_rad + angle_offset;
        Endpoint {
            x: self.x_offset + state.x + distance * bearing.cos() * self.scale_factor,
            z: self.z_offset + state.z + distance * bearing.sin() * self.scale_factor,
        }
    }
}

fn invalid(field: &str, details: String) -> PilotError {
    PilotError::TrackConfig {
        field: field.to_string(),
        details,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn unit() -> MapTransform {
        MapTransform::new(1.0, 0.0, 0.0, 100.0, 100.0).unwrap()
    }

    #[test]
    fn rejects_non_positive_scale() {
        assert!(MapTransform::new(0.0, 0.0, 0.0, 10.0, 10.0).is_err());
        assert!(MapTransform::new(-1.0, 0.0, 0.0, 10.0, 10.0).is_err());
        assert!(MapTransform::new(f64::NAN, 0.0, 0.0, 10.0, 10.0).is_err());
    }

    #[test]
    fn rejects_negative_bounds() {
        let err = MapTransform::new(1.0, 0.0, 0.0, -5.0, 10.0).unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn negative_offsets_are_allowed() {
        let tf = MapTransform::new(2.0, -50.0, -25.0, 10.0, 10.0).unwrap();
        let (px, pz) = tf.world_to_pixel(30.0, 20.0);
        assert!((px - 10.0).abs() < 1e-9);
        assert!((pz - 15.0).abs() < 1e-9);
    }

    #[test]
    fn ray_endpoint_along_zero_bearing_moves_in_x() {
        let tf = unit();
        let state = VehicleState::new(10.0, 0.0, 20.0, 0.0, 0.0);
        let ep = tf.ray_endpoint(&state, 5.0, 0.0);
        assert!((ep.x - 15.0).abs() < 1e-9);
        assert!((ep.z - 20.0).abs() < 1e-9);
    }

    #[test]
    fn ray_endpoint_combines_heading_and_offset() {
        let tf = MapTransform::new(2.0, 1.0, 1.0, 100.0, 100.0).unwrap();
        let state = VehicleState::new(0.0, 0.0, 0.0, -FRAC_PI_2, 0.0);
        // heading -90° + offset 180° → bearing +90°, pointing along +z.
        let ep = tf.ray_endpoint(&state, 3.0, PI);
        assert!((ep.x - 1.0).abs() < 1e-9, "x={}", ep.x);
        assert!((ep.z - 7.0).abs() < 1e-9, "z={}", ep.z);
    }

    #[test]
    fn ray_endpoint_ignores_vertical_axis() {
        let tf = unit();
        let low = tf.ray_endpoint(&VehicleState::new(1.0, 0.0, 1.0, 0.3, 0.0), 4.0, 0.2);
        let high = tf.ray_endpoint(&VehicleState::new(1.0, 500.0, 1.0, 0.3, 0.0), 4.0, 0.2);
        assert_eq!(low, high);
    }
}
