//! Generic `Gamepad` trait for virtual controllers that drive the simulator.
//!
//! Inputs are range-checked when a [`ControlInput`] is built, so a driver
//! never sees a steering value outside `[-1, 1]` or a pedal outside `[0, 1]`.

use trackpilot_types::PilotError;

/// A validated steering / throttle / brake triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInput {
    steer: f64,
    throttle: f64,
    brake: f64,
}

impl ControlInput {
    /// Build an input, rejecting anything out of range.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::ControlOutOfRange`] when `steer` is outside
    /// `[-1, 1]`, `throttle` or `brake` is outside `[0, 1]`, or any value is
    /// not finite.
    pub fn new(steer: f64, throttle: f64, brake: f64) -> Result<Self, PilotError> {
        check("steer", steer, -1.0, 1.0)?;
        check("throttle", throttle, 0.0, 1.0)?;
        check("brake", brake, 0.0, 1.0)?;
        Ok(Self {
            steer,
            throttle,
            brake,
        })
    }

    /// Wheel centred, pedals released.
    pub fn neutral() -> Self {
        Self {
            steer: 0.0,
            throttle: 0.0,
            brake: 0.0,
        }
    }

    pub fn steer(&self) -> f64 {
        self.steer
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn brake(&self) -> f64 {
        self.brake
    }
}

impl Default for ControlInput {
    fn default() -> Self {
        Self::neutral()
    }
}

fn check(channel: &str, value: f64, min: f64, max: f64) -> Result<(), PilotError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PilotError::ControlOutOfRange {
            channel: channel.to_string(),
            value,
            min,
            max,
        })
    }
}

/// A virtual controller the simulator reads its inputs from.
pub trait Gamepad: Send {
    /// Stable identifier, e.g. `"x360_virtual"`.
    fn id(&self) -> &str;

    /// Push `input` to the device and submit it.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Sink`] if the device rejects the update.
    fn apply(&mut self, input: ControlInput) -> Result<(), PilotError>;

    /// The most recently applied input.
    fn current(&self) -> ControlInput;
}
