//! Generic `Display` trait for surfaces that visualise the perception loop.
//!
//! A display draws three things every tick over the track raster: the
//! vehicle marker, one dot per sensor (on or off track), and a column of
//! numeric readouts.  [`Overlay::build`] computes all of it from a
//! [`PerceptionFrame`] so display drivers only have to draw.

use trackpilot_perception::MapTransform;
use trackpilot_types::{PerceptionFrame, PilotError, VehicleState};

/// One labelled numeric readout.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub label: &'static str,
    pub value: String,
}

impl Readout {
    fn new(label: &'static str, value: impl ToString) -> Self {
        Self {
            label,
            value: value.to_string(),
        }
    }
}

/// The vehicle's position and orientation on the raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleMarker {
    pub x: f64,
    pub z: f64,
    /// Rotation to apply to an upward-pointing marker sprite (degrees).
    pub rotation_deg: f64,
}

impl VehicleMarker {
    pub fn from_state(transform: &MapTransform, state: &VehicleState) -> Self {
        let (x, z) = transform.world_to_pixel(state.x, state.z);
        Self {
            x,
            z,
            rotation_deg: (-state.heading_rad).to_degrees() + 180.0,
        }
    }
}

/// A sensor endpoint to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorDot {
    pub x: f64,
    pub z: f64,
    pub on_track: bool,
}

/// Everything a display draws for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub marker: VehicleMarker,
    pub dots: Vec<SensorDot>,
    pub readouts: Vec<Readout>,
}

impl Overlay {
    pub fn build(transform: &MapTransform, frame: &PerceptionFrame) -> Self {
        let dots = frame
            .sensors
            .iter()
            .map(|s| SensorDot {
                x: s.endpoint.x,
                z: s.endpoint.z,
                on_track: s.triggered,
            })
            .collect();
        Self {
            marker: VehicleMarker::from_state(transform, &frame.telemetry.vehicle),
            dots,
            readouts: readouts_for(frame),
        }
    }
}

/// Readouts shown next to the map, top to bottom.
pub fn readouts_for(frame: &PerceptionFrame) -> Vec<Readout> {
    let t = &frame.telemetry;
    vec![
        Readout::new("sensor_distance", format!("{:.2}", frame.signal.sensor_distance)),
        Readout::new("sensor_mean_angle", format!("{:.2}", frame.signal.mean_angle_deg)),
        Readout::new("performance_meter", format!("{:.3}", t.performance_meter)),
        Readout::new("speed", format!("{:.1}", t.vehicle.speed_kmh)),
        Readout::new("steer_angle", format!("{:.3}", t.steer_angle)),
        Readout::new("track_completion", format!("{:.3}", t.track_completion)),
        Readout::new("wheel_slip_FL", format!("{:.3}", t.wheel_slip[0])),
        Readout::new("wheel_slip_FR", format!("{:.3}", t.wheel_slip[1])),
        Readout::new("wheel_slip_RL", format!("{:.3}", t.wheel_slip[2])),
        Readout::new("wheel_slip_RR", format!("{:.3}", t.wheel_slip[3])),
        Readout::new("wheels_offtrack", t.wheels_off_track),
    ]
}

/// A rendering surface.
pub trait Display: Send {
    /// Stable identifier, e.g. `"minimap"`.
    fn id(&self) -> &str;

    /// Draw `overlay` for `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Sink`] if the surface cannot be drawn to.
    fn render(&mut self, frame: &PerceptionFrame, overlay: &Overlay) -> Result<(), PilotError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use trackpilot_types::{AggregateSignal, Endpoint, Sensor, TelemetrySnapshot};

    fn frame() -> PerceptionFrame {
        let telemetry = TelemetrySnapshot {
            vehicle: VehicleState::new(10.0, 0.0, -4.0, FRAC_PI_2, 132.0),
            wheel_slip: [0.1, 0.2, 0.3, 0.4],
            wheels_off_track: 2,
            ..TelemetrySnapshot::default()
        };
        let sensors = vec![
            Sensor {
                angle_offset: 1.0,
                endpoint: Endpoint { x: 5.0, z: 6.0 },
                triggered: true,
            },
            Sensor {
                angle_offset: 2.0,
                endpoint: Endpoint { x: 7.0, z: 8.0 },
                triggered: false,
            },
        ];
        let signal = AggregateSignal {
            sensor_distance: 26.4,
            mean_angle_deg: -3.25,
        };
        PerceptionFrame::new(3, sensors, signal, telemetry)
    }

    #[test]
    fn marker_uses_scaled_position_and_flipped_heading() {
        let tf = MapTransform::new(2.0, 100.0, 50.0, 400.0, 400.0).unwrap();
        let m = VehicleMarker::from_state(&tf, &frame().telemetry.vehicle);
        assert!((m.x - 120.0).abs() < 1e-9);
        assert!((m.z - 42.0).abs() < 1e-9);
        assert!((m.rotation_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn overlay_has_one_dot_per_sensor() {
        let tf = MapTransform::new(1.0, 0.0, 0.0, 100.0, 100.0).unwrap();
        let overlay = Overlay::build(&tf, &frame());
        assert_eq!(overlay.dots.len(), 2);
        assert!(overlay.dots[0].on_track);
        assert!(!overlay.dots[1].on_track);
        assert_eq!((overlay.dots[1].x, overlay.dots[1].z), (7.0, 8.0));
    }

    #[test]
    fn readouts_lead_with_the_signal() {
        let readouts = readouts_for(&frame());
        assert_eq!(readouts.len(), 11);
        assert_eq!(readouts[0], Readout::new("sensor_distance", "26.40"));
        assert_eq!(readouts[1], Readout::new("sensor_mean_angle", "-3.25"));
        assert_eq!(readouts[3].value, "132.0");
        assert_eq!(readouts[9], Readout::new("wheel_slip_RR", "0.400"));
        assert_eq!(readouts[10], Readout::new("wheels_offtrack", "2"));
    }
}
