//! Occupancy Sampler.
//!
//! Projects each sensor ray's endpoint into raster space through the
//! [`MapTransform`] and asks the [`TrackRaster`] whether that pixel is on
//! track.  Sampling never fails: a lookup that cannot be answered marks the
//! sensor as off track and the tick carries on.

use tracing::trace;
use trackpilot_types::{Endpoint, Sensor, VehicleState};

use crate::raster::{TrackRaster, is_on_track};
use crate::sensor_array::SensorFan;
use crate::transform::MapTransform;

/// Project one ray and test its endpoint.
///
/// Pure: identical inputs always give identical output.
pub fn sample_track(
    state: &VehicleState,
    transform: &MapTransform,
    raster: &dyn TrackRaster,
    sensor_distance: f64,
    angle_offset: f64,
) -> (Endpoint, bool) {
    let endpoint = transform.ray_endpoint(state, sensor_distance, angle_offset);
    let on_track = is_on_track(raster, endpoint.x, endpoint.z);
    (endpoint, on_track)
}

/// Sample every bearing of `fan`, preserving its order.
pub fn sample_fan(
    state: &VehicleState,
    transform: &MapTransform,
    raster: &dyn TrackRaster,
    fan: &SensorFan,
) -> Vec<Sensor> {
    let sensors: Vec<Sensor> = fan
        .angles
        .iter()
        .map(|&angle_offset| {
            let (endpoint, triggered) =
                sample_track(state, transform, raster, fan.sensor_distance, angle_offset);
            Sensor {
                angle_offset,
                endpoint,
                triggered,
            }
        })
        .collect();
    trace!(
        total = sensors.len(),
        triggered = sensors.iter().filter(|s| s.triggered).count(),
        "sampled sensor fan"
    );
    sensors
}
