//! Track Boundary Raster.
//!
//! A track raster is a 2-D bitmap whose alpha channel marks drivable
//! surface: a pixel with alpha exactly `255` is on track, anything else
//! (partially transparent, fully transparent, or outside the bitmap) is not.
//!
//! Pixel access goes through the [`TrackRaster`] trait so the sampling code
//! does not care whether the pixels come from a decoded PNG, a memory-mapped
//! file or a synthetic test pattern.

use std::path::Path;

use image::RgbaImage;
use thiserror::Error;
use tracing::debug;
use trackpilot_types::PilotError;

/// Alpha value that marks a pixel as drivable surface.
pub const ON_TRACK_ALPHA: u8 = 255;

/// Failure to read a single pixel.  Never escapes the sampler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("pixel ({x}, {y}) outside {width}x{height} raster")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("pixel ({x}, {y}) unreadable: {reason}")]
    Unreadable { x: u32, y: u32, reason: String },
}

/// Read-only pixel access to a track raster.
pub trait TrackRaster: Send + Sync {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Alpha channel of the pixel at column `x`, row `y`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] if the pixel lies outside the raster or
    /// cannot be read.
    fn alpha_at(&self, x: u32, y: u32) -> Result<u8, RasterError>;
}

// ────────────────────────────────────────────────────────────────────────────
// AlphaMask
// ────────────────────────────────────────────────────────────────────────────

/// A [`TrackRaster`] backed by a decoded RGBA image.
#[derive(Debug, Clone)]
pub struct AlphaMask {
    pixels: RgbaImage,
}

impl AlphaMask {
    /// Wrap an already decoded RGBA image.
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Decode a raster image from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Raster`] when the file is missing, cannot be
    /// decoded, or has no alpha channel to read the track mask from.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PilotError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| {
            PilotError::Raster(format!("failed to load track raster {}: {e}", path.display()))
        })?;
        if !img.color().has_alpha() {
            return Err(PilotError::Raster(format!(
                "track raster {} has no alpha channel",
                path.display()
            )));
        }
        let pixels = img.into_rgba8();
        debug!(
            path = %path.display(),
            width = pixels.width(),
            height = pixels.height(),
            "loaded track raster"
        );
        Ok(Self { pixels })
    }
}

impl TrackRaster for AlphaMask {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn alpha_at(&self, x: u32, y: u32) -> Result<u8, RasterError> {
        self.pixels
            .get_pixel_checked(x, y)
            .map(|p| p.0[3])
            .ok_or(RasterError::OutOfBounds {
                x,
                y,
                width: self.pixels.width(),
                height: self.pixels.height(),
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// On-track test
// ────────────────────────────────────────────────────────────────────────────

/// `true` when raster coordinate `(px, pz)` lands on drivable surface.
///
/// Coordinates are truncated toward zero to pixel indices.  Anything outside
/// `[0, width) × [0, height)`, any non-finite coordinate and any pixel read
/// failure count as off track.
pub fn is_on_track(raster: &dyn TrackRaster, px: f64, pz: f64) -> bool {
    if !(px.is_finite() && pz.is_finite()) {
        return false;
    }
    let (ix, iz) = (px.trunc() as i64, pz.trunc() as i64);
    if ix < 0 || iz < 0 || ix >= i64::from(raster.width()) || iz >= i64::from(raster.height()) {
        return false;
    }
    match raster.alpha_at(ix as u32, iz as u32) {
        Ok(alpha) => alpha == ON_TRACK_ALPHA,
        Err(e) => {
            debug!(error = %e, "pixel lookup failed; treating sensor as off track");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 4×3 raster: opaque everywhere except column 3, which is half
    /// transparent, and pixel (0, 2), which is fully transparent.
    fn mask() -> AlphaMask {
        AlphaMask::from_image(RgbaImage::from_fn(4, 3, |x, y| match (x, y) {
            (3, _) => Rgba([0, 0, 0, 128]),
            (0, 2) => Rgba([0, 0, 0, 0]),
            _ => Rgba([10, 20, 30, 255]),
        }))
    }

    struct BrokenRaster;

    impl TrackRaster for BrokenRaster {
        fn width(&self) -> u32 {
            10
        }
        fn height(&self) -> u32 {
            10
        }
        fn alpha_at(&self, x: u32, y: u32) -> Result<u8, RasterError> {
            Err(RasterError::Unreadable {
                x,
                y,
                reason: "corrupt scanline".to_string(),
            })
        }
    }

    #[test]
    fn alpha_mask_reports_dimensions() {
        let m = mask();
        assert_eq!(m.width(), 4);
        assert_eq!(m.height(), 3);
    }

    #[test]
    fn alpha_at_out_of_bounds_is_error() {
        let m = mask();
        assert!(matches!(
            m.alpha_at(4, 0),
            Err(RasterError::OutOfBounds { width: 4, height: 3, .. })
        ));
    }

    #[test]
    fn opaque_pixel_is_on_track() {
        assert!(is_on_track(&mask(), 1.7, 1.2));
    }

    #[test]
    fn transparent_and_partial_pixels_are_off_track() {
        let m = mask();
        assert!(!is_on_track(&m, 0.5, 2.5));
        assert!(!is_on_track(&m, 3.0, 0.0));
    }

    #[test]
    fn one_past_the_edge_is_off_track() {
        let m = mask();
        assert!(!is_on_track(&m, 4.0, 3.0));
        assert!(!is_on_track(&m, 4.0, 0.0));
        assert!(!is_on_track(&m, 0.0, 3.0));
        assert!(!is_on_track(&m, -1.0, 0.0));
    }

    #[test]
    fn small_negative_coordinates_truncate_to_zero() {
        // -0.5 truncates to column 0, which is inside the raster.
        assert!(is_on_track(&mask(), -0.5, 0.0));
    }

    #[test]
    fn non_finite_coordinates_are_off_track() {
        let m = mask();
        assert!(!is_on_track(&m, f64::NAN, 0.0));
        assert!(!is_on_track(&m, 0.0, f64::INFINITY));
    }

    #[test]
    fn read_failure_is_off_track() {
        assert!(!is_on_track(&BrokenRaster, 1.0, 1.0));
    }

    #[test]
    fn open_missing_file_is_raster_error() {
        let err = AlphaMask::open("/definitely/not/here/map.png").unwrap_err();
        assert!(matches!(err, PilotError::Raster(_)));
    }

    #[test]
    fn open_rejects_image_without_alpha() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("map.png");
        image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]))
            .save(&path)
            .expect("save png");
        let err = AlphaMask::open(&path).unwrap_err();
        assert!(err.to_string().contains("alpha"));
    }

    #[test]
    fn open_round_trips_alpha_channel() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("map.png");
        RgbaImage::from_fn(3, 2, |x, _| Rgba([0, 0, 0, if x == 1 { 255 } else { 0 }]))
            .save(&path)
            .expect("save png");
        let m = AlphaMask::open(&path).expect("open");
        assert_eq!(m.alpha_at(1, 1), Ok(255));
        assert_eq!(m.alpha_at(0, 1), Ok(0));
    }
}
