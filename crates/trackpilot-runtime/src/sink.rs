//! Consumers of finished [`PerceptionFrame`]s.
//!
//! The tick driver publishes every frame to each registered
//! [`PerceptionSink`] in registration order.  A failing sink is logged and
//! skipped; it never stops the loop or the other sinks.

use tracing::info;
use trackpilot_hal::{ControlInput, Display, Gamepad, Overlay};
use trackpilot_perception::MapTransform;
use trackpilot_types::{PerceptionFrame, PilotError, format_lap_time};

/// Receives one frame per successful tick.
pub trait PerceptionSink: Send {
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Returns [`PilotError::Sink`] (or the device's own error) when the
    /// frame cannot be delivered.
    fn publish(&mut self, frame: &PerceptionFrame) -> Result<(), PilotError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Display
// ────────────────────────────────────────────────────────────────────────────

/// Builds the [`Overlay`] for each frame and hands it to a [`Display`].
pub struct DisplaySink<D: Display> {
    display: D,
    transform: MapTransform,
}

impl<D: Display> DisplaySink<D> {
    pub fn new(display: D, transform: MapTransform) -> Self {
        Self { display, transform }
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}

impl<D: Display> PerceptionSink for DisplaySink<D> {
    fn name(&self) -> &str {
        self.display.id()
    }

    fn publish(&mut self, frame: &PerceptionFrame) -> Result<(), PilotError> {
        let overlay = Overlay::build(&self.transform, frame);
        self.display.render(frame, &overlay)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Log
// ────────────────────────────────────────────────────────────────────────────

/// Writes a one-line summary of every `every`-th frame to the log.
#[derive(Debug)]
pub struct LogSink {
    every: u64,
    logged: u64,
}

impl LogSink {
    /// `every == 0` is treated as `1`.
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            logged: 0,
        }
    }

    /// Frames written to the log so far.
    pub fn logged(&self) -> u64 {
        self.logged
    }
}

impl PerceptionSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn publish(&mut self, frame: &PerceptionFrame) -> Result<(), PilotError> {
        if frame.tick % self.every != 0 {
            return Ok(());
        }
        let t = &frame.telemetry;
        info!(
            tick = frame.tick,
            speed_kmh = t.vehicle.speed_kmh,
            sensor_distance = frame.signal.sensor_distance,
            mean_angle_deg = frame.signal.mean_angle_deg,
            sensors = frame.sensors.len(),
            on_track = frame.triggered_count(),
            last_lap = %format_lap_time(t.last_lap_ms),
            best_lap = %format_lap_time(t.best_lap_ms),
            "perception"
        );
        self.logged += 1;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gamepad
// ────────────────────────────────────────────────────────────────────────────

/// Maps a frame to controller input.
pub type ControlPolicy = Box<dyn FnMut(&PerceptionFrame) -> Result<ControlInput, PilotError> + Send>;

/// Feeds each frame through a [`ControlPolicy`] and applies the result to a
/// [`Gamepad`].  The default policy holds the controller at neutral.
pub struct GamepadSink<G: Gamepad> {
    gamepad: G,
    policy: ControlPolicy,
}

impl<G: Gamepad> GamepadSink<G> {
    pub fn new(gamepad: G) -> Self {
        Self {
            gamepad,
            policy: Box::new(|_| Ok(ControlInput::neutral())),
        }
    }

    pub fn with_policy(mut self, policy: ControlPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn gamepad(&self) -> &G {
        &self.gamepad
    }
}

impl<G: Gamepad> PerceptionSink for GamepadSink<G> {
    fn name(&self) -> &str {
        self.gamepad.id()
    }

    fn publish(&mut self, frame: &PerceptionFrame) -> Result<(), PilotError> {
        let input = (self.policy)(frame)?;
        self.gamepad.apply(input)
    }
}
