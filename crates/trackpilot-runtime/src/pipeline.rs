//! One tick of perception: generate the fan, sample it, aggregate.
//!
//! [`PerceptionPipeline`] owns the per-session pieces (transform, raster,
//! sensor configuration) and the [`Aggregator`] whose held angle must
//! survive from one tick to the next.

use trackpilot_perception::{
    Aggregator, MapTransform, SensorArrayConfig, TrackRaster, TrackSession, sampler, sensor_array,
};
use trackpilot_types::{AggregateSignal, PilotError, Sensor, VehicleState};

/// Perception state for one track session.
pub struct PerceptionPipeline {
    transform: MapTransform,
    raster: Box<dyn TrackRaster>,
    config: SensorArrayConfig,
    aggregator: Aggregator,
}

impl PerceptionPipeline {
    /// # Errors
    ///
    /// Returns [`PilotError::InvalidSensorConfig`] if `config` is invalid.
    pub fn new(
        transform: MapTransform,
        raster: Box<dyn TrackRaster>,
        config: SensorArrayConfig,
    ) -> Result<Self, PilotError> {
        config.validate()?;
        Ok(Self {
            transform,
            raster,
            aggregator: Aggregator::new(config.frame_correction_deg),
            config,
        })
    }

    /// Build a pipeline over a loaded [`TrackSession`].
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::InvalidSensorConfig`] if `config` is invalid.
    pub fn from_session(session: TrackSession, config: SensorArrayConfig) -> Result<Self, PilotError> {
        Self::new(session.transform, Box::new(session.raster), config)
    }

    /// Generate and sample the fan for `state`.  Returns the ray length and
    /// the sampled sensors in fan order.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::InvalidSensorConfig`] if the configuration is
    /// rejected by the generator.
    pub fn sample(&self, state: &VehicleState) -> Result<(f64, Vec<Sensor>), PilotError> {
        let fan = sensor_array::generate(state, &self.config)?;
        let sensors = sampler::sample_fan(state, &self.transform, self.raster.as_ref(), &fan);
        Ok((fan.sensor_distance, sensors))
    }

    /// Reduce sampled sensors to the tick's signal, updating the held angle.
    pub fn aggregate(&mut self, sensor_distance: f64, sensors: &[Sensor]) -> AggregateSignal {
        AggregateSignal {
            sensor_distance,
            mean_angle_deg: self.aggregator.aggregate(sensors),
        }
    }

    /// [`sample`](Self::sample) followed by [`aggregate`](Self::aggregate).
    ///
    /// # Errors
    ///
    /// See [`sample`](Self::sample).
    pub fn run(&mut self, state: &VehicleState) -> Result<(Vec<Sensor>, AggregateSignal), PilotError> {
        let (distance, sensors) = self.sample(state)?;
        let signal = self.aggregate(distance, &sensors);
        Ok((sensors, signal))
    }

    pub fn transform(&self) -> &MapTransform {
        &self.transform
    }

    pub fn config(&self) -> &SensorArrayConfig {
        &self.config
    }

    /// Angle currently held by the aggregator.
    pub fn previous_mean_deg(&self) -> f64 {
        self.aggregator.previous_mean_deg()
    }

    /// Forget the held angle, e.g. after the car is reset to the pits.
    pub fn reset(&mut self) {
        self.aggregator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use trackpilot_perception::RasterError;

    /// On track for every pixel with `x < boundary`.
    struct HalfPlane {
        boundary: u32,
    }

    impl TrackRaster for HalfPlane {
        fn width(&self) -> u32 {
            1000
        }
        fn height(&self) -> u32 {
            1000
        }
        fn alpha_at(&self, x: u32, _y: u32) -> Result<u8, RasterError> {
            Ok(if x < self.boundary { 255 } else { 0 })
        }
    }

    fn pipeline(boundary: u32) -> PerceptionPipeline {
        let tf = MapTransform::new(1.0, 500.0, 500.0, 1000.0, 1000.0).unwrap();
        PerceptionPipeline::new(tf, Box::new(HalfPlane { boundary }), SensorArrayConfig::default())
            .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let tf = MapTransform::new(1.0, 0.0, 0.0, 10.0, 10.0).unwrap();
        let cfg = SensorArrayConfig::new(0.0, 5, 90.0);
        let result = PerceptionPipeline::new(tf, Box::new(HalfPlane { boundary: 0 }), cfg);
        assert!(matches!(result, Err(PilotError::InvalidSensorConfig(_))));
    }

    #[test]
    fn fully_paved_track_centres_the_signal() {
        let mut p = pipeline(1000);
        let (sensors, signal) = p.run(&VehicleState::new(0.0, 0.0, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(sensors.len(), 5);
        assert!(sensors.iter().all(|s| s.triggered));
        assert!((signal.sensor_distance - 10.0).abs() < 1e-9);
        assert!(signal.mean_angle_deg.abs() < 1e-9);
    }

    #[test]
    fn signal_leans_towards_the_paved_side() {
        // Heading +x; only rays ending at x < 500 + 5 are on track.
        let mut p = pipeline(505);
        let (_, signal) = p.run(&VehicleState::new(0.0, 0.0, 0.0, 0.0, 0.0)).unwrap();
        assert!(signal.mean_angle_deg.abs() > 1.0);
        assert!((p.previous_mean_deg() - signal.mean_angle_deg).abs() < 1e-12);
    }

    #[test]
    fn holds_previous_angle_when_nothing_is_on_track() {
        let mut p = pipeline(505);
        let (_, first) = p.run(&VehicleState::new(0.0, 0.0, 0.0, 0.0, 0.0)).unwrap();

        // Drive far off to the right: every ray ends on gravel.
        let (sensors, second) = p
            .run(&VehicleState::new(300.0, 0.0, 0.0, FRAC_PI_2, 0.0))
            .unwrap();
        assert!(sensors.iter().all(|s| !s.triggered));
        assert_eq!(second.mean_angle_deg, first.mean_angle_deg);

        p.reset();
        assert_eq!(p.previous_mean_deg(), 0.0);
    }

    /// Gravel for `505 <= x < 1000`, tarmac everywhere else, including
    /// coordinates the bounds check should never let through.
    struct Stripe;

    impl TrackRaster for Stripe {
        fn width(&self) -> u32 {
            1000
        }
        fn height(&self) -> u32 {
            1000
        }
        fn alpha_at(&self, x: u32, _y: u32) -> Result<u8, RasterError> {
            Ok(if (505..1000).contains(&x) { 0 } else { 255 })
        }
    }

    #[test]
    fn endpoints_outside_the_raster_hold_the_prior() {
        let tf = MapTransform::new(1.0, 500.0, 500.0, 1000.0, 1000.0).unwrap();
        let mut p =
            PerceptionPipeline::new(tf, Box::new(Stripe), SensorArrayConfig::default()).unwrap();
        let (_, first) = p.run(&VehicleState::new(0.0, 0.0, 0.0, 0.0, 0.0)).unwrap();
        let prior = first.mean_angle_deg;
        assert!(prior.abs() > 1.0);

        for x in [1e4, -1e4] {
            let (sensors, signal) = p.run(&VehicleState::new(x, 0.0, 0.0, 0.0, 0.0)).unwrap();
            for s in &sensors {
                let inside = (0.0..1000.0).contains(&s.endpoint.x.trunc())
                    && (0.0..1000.0).contains(&s.endpoint.z.trunc());
                assert!(!inside, "endpoint {:?} is inside the raster", s.endpoint);
                assert!(!s.triggered);
            }
            assert_eq!(signal.mean_angle_deg, prior);
            assert_eq!(p.previous_mean_deg(), prior);
        }
    }
}
