//! `trackpilot-hal` – output devices fed by the perception loop.
//!
//! # Modules
//!
//! - [`gamepad`] – [`ControlInput`][gamepad::ControlInput], the range-checked
//!   steer/throttle/brake triple, and the [`Gamepad`][gamepad::Gamepad]
//!   trait for virtual controller drivers.
//! - [`display`] – the [`Display`][display::Display] trait for rendering
//!   surfaces and the [`Overlay`][display::Overlay] they draw.
//! - [`sim`] – in-process stand-ins for both, for headless runs and tests.

pub mod display;
pub mod gamepad;
pub mod sim;

pub use display::{Display, Overlay, Readout, SensorDot, VehicleMarker};
pub use gamepad::{ControlInput, Gamepad};
pub use sim::{SimDisplay, SimGamepad};
