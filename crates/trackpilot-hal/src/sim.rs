//! In-process stand-ins for the output devices.
//!
//! [`SimGamepad`] and [`SimDisplay`] record what they are sent instead of
//! driving real devices, so the whole perception loop can run headless in
//! tests and CI.
//!
//! # Example
//!
//! ```rust
//! use trackpilot_hal::gamepad::{ControlInput, Gamepad};
//! use trackpilot_hal::sim::SimGamepad;
//!
//! let mut pad = SimGamepad::new("pad0");
//! pad.apply(ControlInput::new(-0.25, 0.8, 0.0).unwrap()).unwrap();
//! assert_eq!(pad.current().steer(), -0.25);
//! assert_eq!(pad.updates(), 1);
//! ```

use tracing::trace;
use trackpilot_types::{PerceptionFrame, PilotError};

use crate::display::{Display, Overlay};
use crate::gamepad::{ControlInput, Gamepad};

// ────────────────────────────────────────────────────────────────────────────
// Stub gamepad
// ────────────────────────────────────────────────────────────────────────────

/// A simulated controller that records the most recent input.  Always
/// succeeds.
#[derive(Debug)]
pub struct SimGamepad {
    id: String,
    current: ControlInput,
    updates: u64,
}

impl SimGamepad {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            current: ControlInput::neutral(),
            updates: 0,
        }
    }

    /// Number of inputs applied so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl Gamepad for SimGamepad {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, input: ControlInput) -> Result<(), PilotError> {
        trace!(
            gamepad = %self.id,
            steer = input.steer(),
            throttle = input.throttle(),
            brake = input.brake(),
            "sim gamepad input"
        );
        self.current = input;
        self.updates += 1;
        Ok(())
    }

    fn current(&self) -> ControlInput {
        self.current
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub display
// ────────────────────────────────────────────────────────────────────────────

/// A simulated display that keeps the last frame and overlay it was asked to
/// draw.  Always succeeds.
#[derive(Debug, Default)]
pub struct SimDisplay {
    id: String,
    last: Option<(PerceptionFrame, Overlay)>,
    frames_rendered: u64,
}

impl SimDisplay {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn last_frame(&self) -> Option<&PerceptionFrame> {
        self.last.as_ref().map(|(frame, _)| frame)
    }

    pub fn last_overlay(&self) -> Option<&Overlay> {
        self.last.as_ref().map(|(_, overlay)| overlay)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl Display for SimDisplay {
    fn id(&self) -> &str {
        &self.id
    }

    fn render(&mut self, frame: &PerceptionFrame, overlay: &Overlay) -> Result<(), PilotError> {
        trace!(display = %self.id, tick = frame.tick, dots = overlay.dots.len(), "sim display frame");
        self.last = Some((frame.clone(), overlay.clone()));
        self.frames_rendered += 1;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use trackpilot_perception::MapTransform;
    use trackpilot_types::{AggregateSignal, TelemetrySnapshot};

    #[test]
    fn sim_gamepad_starts_neutral() {
        let pad = SimGamepad::new("pad");
        assert_eq!(pad.id(), "pad");
        assert_eq!(pad.current(), ControlInput::neutral());
        assert_eq!(pad.updates(), 0);
    }

    #[test]
    fn sim_gamepad_records_inputs() {
        let mut pad = SimGamepad::new("pad");
        pad.apply(ControlInput::new(0.5, 1.0, 0.0).unwrap()).unwrap();
        pad.apply(ControlInput::new(-0.5, 0.0, 0.7).unwrap()).unwrap();
        assert_eq!(pad.updates(), 2);
        assert_eq!(pad.current().brake(), 0.7);
    }

    #[test]
    fn sim_display_keeps_last_frame() {
        let tf = MapTransform::new(1.0, 0.0, 0.0, 10.0, 10.0).unwrap();
        let mut display = SimDisplay::new("minimap");
        assert!(display.last_frame().is_none());

        for tick in 1..=3 {
            let frame = PerceptionFrame::new(
                tick,
                Vec::new(),
                AggregateSignal::default(),
                TelemetrySnapshot::default(),
            );
            let overlay = Overlay::build(&tf, &frame);
            display.render(&frame, &overlay).unwrap();
        }

        assert_eq!(display.frames_rendered(), 3);
        assert_eq!(display.last_frame().map(|f| f.tick), Some(3));
        assert_eq!(display.last_overlay().map(|o| o.readouts.len()), Some(11));
    }
}
