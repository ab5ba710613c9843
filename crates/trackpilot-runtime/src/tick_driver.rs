//! [`TickDriver`] – the fixed-interval perception loop.
//!
//! Each tick walks `Idle → Sampling → Aggregating → Published → Idle`:
//!
//! 1. **Sampling** – pull one [`TelemetrySnapshot`] from the
//!    [`TelemetrySource`], generate the sensor fan and sample it against the
//!    track raster.
//! 2. **Aggregating** – reduce the sensors to an [`AggregateSignal`],
//!    updating the held angle.
//! 3. **Published** – wrap everything in a [`PerceptionFrame`] and hand it
//!    to every [`PerceptionSink`].
//!
//! Nothing that happens inside a tick stops the loop.  When telemetry is
//! unavailable the tick is abandoned before publishing and the previous
//! signal stays current; a failing sink is logged and the remaining sinks
//! still receive the frame.
//!
//! A snapshot whose track or layout differs from the previous one starts a
//! new session: the held angle is cleared before the fan is sampled, so a
//! hold-last signal never leaks from one track to the next.
//!
//! [`TickDriver::run`] drives ticks from a [`tokio::time::interval`].  A
//! tick that overruns the interval causes the missed firings to be skipped
//! rather than queued, so at most one tick is ever in flight.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::{Arc, atomic::AtomicBool};
//! use std::time::Duration;
//! use trackpilot_perception::{SensorArrayConfig, TrackAssets, TrackSession};
//! use trackpilot_runtime::{FixedSource, LogSink, PerceptionPipeline, TickDriver};
//! use trackpilot_types::TelemetrySnapshot;
//!
//! # async fn demo() -> Result<(), trackpilot_types::PilotError> {
//! let session = TrackSession::load(&TrackAssets::resolve("/sim", "monza", ""))?;
//! let pipeline = PerceptionPipeline::from_session(session, SensorArrayConfig::default())?;
//! let mut driver = TickDriver::new(
//!     pipeline,
//!     Box::new(FixedSource::new(TelemetrySnapshot::default())),
//!     Duration::from_millis(50),
//! )
//! .with_sink(Box::new(LogSink::new(20)));
//!
//! let shutdown = Arc::new(AtomicBool::new(false));
//! driver.run(shutdown).await;
//! # Ok(())
//! # }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, trace, warn};
use trackpilot_types::{AggregateSignal, PerceptionFrame, PilotError, Sensor, TelemetrySnapshot};

use crate::pipeline::PerceptionPipeline;
use crate::sink::PerceptionSink;
use crate::source::TelemetrySource;

/// Shortest interval the driver will schedule; a zero interval is raised to
/// this.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

// ─────────────────────────────────────────────────────────────────────────────
// State & reports
// ─────────────────────────────────────────────────────────────────────────────

/// Where the driver is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for the next scheduled tick.
    Idle,
    Sampling,
    Aggregating,
    Published,
}

/// Outcome of one [`TickDriver::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    /// A fresh signal was computed and handed to the sinks.
    Published {
        signal: AggregateSignal,
        /// Sinks that returned an error for this frame.
        sink_failures: usize,
    },
    /// No fresh signal could be produced; `signal` is the previous one.
    CarriedForward {
        signal: AggregateSignal,
        reason: PilotError,
    },
}

impl TickReport {
    /// The signal that is current after this tick.
    pub fn signal(&self) -> AggregateSignal {
        match self {
            TickReport::Published { signal, .. } | TickReport::CarriedForward { signal, .. } => {
                *signal
            }
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, TickReport::Published { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TickDriver
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the pipeline, its telemetry source and the publish sinks.
pub struct TickDriver {
    pipeline: PerceptionPipeline,
    source: Box<dyn TelemetrySource>,
    sinks: Vec<Box<dyn PerceptionSink>>,
    interval: Duration,
    state: DriverState,
    last_signal: AggregateSignal,
    ticks: u64,
    published: u64,
    /// `(track, layout)` of the last snapshot received.
    session: Option<(String, String)>,
}

impl TickDriver {
    /// `interval` below [`MIN_TICK_INTERVAL`] is raised to it.
    pub fn new(
        pipeline: PerceptionPipeline,
        source: Box<dyn TelemetrySource>,
        interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            source,
            sinks: Vec::new(),
            interval: interval.max(MIN_TICK_INTERVAL),
            state: DriverState::Idle,
            last_signal: AggregateSignal::default(),
            ticks: 0,
            published: 0,
            session: None,
        }
    }

    /// Register a sink.  Sinks receive frames in registration order.
    pub fn with_sink(mut self, sink: Box<dyn PerceptionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn PerceptionSink>) {
        self.sinks.push(sink);
    }

    /// Names of the registered sinks, in publish order.
    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.sinks.iter().map(|s| s.name())
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The most recent signal, fresh or carried forward.
    pub fn last_signal(&self) -> AggregateSignal {
        self.last_signal
    }

    /// Ticks attempted so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that reached the sinks.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pipeline(&self) -> &PerceptionPipeline {
        &self.pipeline
    }

    /// Run one complete tick.  Never fails; see [`TickReport`].
    #[instrument(skip_all, fields(tick = self.ticks + 1))]
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        self.enter(DriverState::Sampling);

        let snapshot = match self.source.snapshot() {
            Ok(snapshot) => snapshot,
            Err(reason) => {
                warn!(
                    tick = self.ticks,
                    source = self.source.id(),
                    error = %reason,
                    "telemetry unavailable; keeping previous signal"
                );
                return self.carry_forward(reason);
            }
        };
        self.track_session(&snapshot);
        let (sensor_distance, sensors) = match self.pipeline.sample(&snapshot.vehicle) {
            Ok(sampled) => sampled,
            Err(reason) => {
                warn!(tick = self.ticks, error = %reason, "sampling failed; keeping previous signal");
                return self.carry_forward(reason);
            }
        };

        self.enter(DriverState::Aggregating);
        let signal = self.pipeline.aggregate(sensor_distance, &sensors);
        self.last_signal = signal;

        self.enter(DriverState::Published);
        let sink_failures = self.publish(sensors, signal, snapshot);
        self.published += 1;

        self.enter(DriverState::Idle);
        TickReport::Published {
            signal,
            sink_failures,
        }
    }

    /// Tick every `interval` until `shutdown` is set.
    ///
    /// The flag is checked between ticks only; a tick in progress always
    /// completes.
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_ms = self.interval.as_millis() as u64,
            sinks = self.sinks.len(),
            "tick driver started"
        );

        while !shutdown.load(Ordering::SeqCst) {
            timer.tick().await;
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
            let started = Instant::now();
            self.tick();
            let elapsed = started.elapsed();
            if elapsed > self.interval {
                warn!(
                    tick = self.ticks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    interval_ms = self.interval.as_millis() as u64,
                    "tick overran its interval; skipping missed firings"
                );
            }
        }

        info!(ticks = self.ticks, published = self.published, "tick driver stopped");
    }

    fn enter(&mut self, next: DriverState) {
        trace!(tick = self.ticks, from = ?self.state, to = ?next, "driver state");
        self.state = next;
    }

    fn track_session(&mut self, snapshot: &TelemetrySnapshot) {
        let current = (snapshot.track.as_str(), snapshot.layout.as_str());
        match &self.session {
            Some((track, layout)) if (track.as_str(), layout.as_str()) == current => return,
            Some((track, layout)) => {
                info!(
                    tick = self.ticks,
                    from_track = %track,
                    from_layout = %layout,
                    track = %snapshot.track,
                    layout = %snapshot.layout,
                    "track session changed; clearing held angle"
                );
                self.pipeline.reset();
            }
            None => {}
        }
        self.session = Some((snapshot.track.clone(), snapshot.layout.clone()));
    }

    fn carry_forward(&mut self, reason: PilotError) -> TickReport {
        self.enter(DriverState::Idle);
        TickReport::CarriedForward {
            signal: self.last_signal,
            reason,
        }
    }

    fn publish(
        &mut self,
        sensors: Vec<Sensor>,
        signal: AggregateSignal,
        snapshot: TelemetrySnapshot,
    ) -> usize {
        let frame = PerceptionFrame::new(self.ticks, sensors, signal, snapshot);
        let mut failures = 0;
        for sink in &mut self.sinks {
            if let Err(e) = sink.publish(&frame) {
                warn!(tick = frame.tick, sink = sink.name(), error = %e, "sink rejected frame");
                failures += 1;
            }
        }
        failures
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
