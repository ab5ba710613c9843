//! `trackpilot-runtime` – the perception loop.
//!
//! # Modules
//!
//! - [`source`] – [`TelemetrySource`][source::TelemetrySource] and its
//!   replay / fixed implementations.
//! - [`pipeline`] – [`PerceptionPipeline`][pipeline::PerceptionPipeline]:
//!   generate, sample and aggregate the sensor fan for one vehicle state.
//! - [`sink`] – [`PerceptionSink`][sink::PerceptionSink] and the display,
//!   log and gamepad sinks.
//! - [`tick_driver`] – [`TickDriver`][tick_driver::TickDriver]: the
//!   fixed-interval state machine tying the above together.
//! - [`observability`] – [`init_tracing`][observability::init_tracing]:
//!   installs the global `tracing` subscriber with optional OTLP export.

pub mod observability;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod tick_driver;

pub use pipeline::PerceptionPipeline;
pub use sink::{ControlPolicy, DisplaySink, GamepadSink, LogSink, PerceptionSink};
pub use source::{FixedSource, ReplaySource, TelemetrySource};
pub use tick_driver::{DriverState, TickDriver, TickReport};
