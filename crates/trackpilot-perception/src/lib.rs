//! `trackpilot-perception` – virtual sensor array and track-boundary
//! perception.
//!
//! Turns a vehicle pose into a steering-correction signal by casting a fan of
//! rays against a raster of the track surface.
//!
//! # Modules
//!
//! - [`transform`] – [`MapTransform`][transform::MapTransform]: affine
//!   mapping from simulation coordinates into raster pixels.
//! - [`raster`] – [`TrackRaster`][raster::TrackRaster]: the pixel-access
//!   capability, plus the image-backed [`AlphaMask`][raster::AlphaMask].
//! - [`sensor_array`] – [`generate`][sensor_array::generate]: speed-driven
//!   fan geometry (ray length and bearings).
//! - [`sampler`] – [`sample_track`][sampler::sample_track]: projects one ray
//!   endpoint and tests it against the raster.
//! - [`aggregator`] – [`Aggregator`][aggregator::Aggregator]: reduces the
//!   triggered sensors to a single mean bearing with hold-last fallback.
//! - [`track`] – loads the track parameter file and raster image for a
//!   session.

pub mod aggregator;
pub mod raster;
pub mod sampler;
pub mod sensor_array;
pub mod track;
pub mod transform;

pub use aggregator::Aggregator;
pub use raster::{AlphaMask, RasterError, TrackRaster};
pub use sensor_array::{MAX_SENSOR_COUNT, SensorArrayConfig, SensorFan};
pub use track::{TrackAssets, TrackParameters, TrackSession};
pub use transform::MapTransform;
