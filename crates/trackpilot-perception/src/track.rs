//! Track asset loading.
//!
//! Each simulator track ships a raster of its drivable surface and a small
//! INI-style parameter file describing how world coordinates map onto that
//! raster:
//!
//! ```text
//! <sim_root>/content/tracks/<track>[/<layout>]/map.png
//! <sim_root>/content/tracks/<track>[/<layout>]/data/map.ini
//! ```
//!
//! ```ini
//! [PARAMETERS]
//! WIDTH=1024.5
//! HEIGHT=768
//! SCALE_FACTOR=0.5
//! X_OFFSET=412.3
//! Z_OFFSET=301.9
//! ```
//!
//! Both files are read once at session start.  Anything missing or
//! malformed fails here, never mid-tick.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use trackpilot_types::PilotError;

use crate::raster::AlphaMask;
use crate::transform::MapTransform;

const PARAMETERS_SECTION: &str = "PARAMETERS";

// ────────────────────────────────────────────────────────────────────────────
// Parameter file
// ────────────────────────────────────────────────────────────────────────────

/// A typed value from the parameter file.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Digits only, with an optional leading sign.
    Int(i64),
    /// Digits with exactly one decimal point, with an optional leading sign.
    Float(f64),
    /// Anything else is kept verbatim.
    Text(String),
}

impl ParamValue {
    fn infer(raw: &str) -> Self {
        let unsigned = raw.strip_prefix(['-', '+']).unwrap_or(raw);
        let digits = unsigned.chars().filter(char::is_ascii_digit).count();
        let dots = unsigned.chars().filter(|&c| c == '.').count();
        let well_formed = digits > 0 && digits + dots == unsigned.len();

        if well_formed && dots == 0 {
            if let Ok(v) = raw.parse::<i64>() {
                return Self::Int(v);
            }
        }
        if well_formed && dots == 1 {
            if let Ok(v) = raw.parse::<f64>() {
                return Self::Float(v);
            }
        }
        Self::Text(raw.to_string())
    }

    /// Numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

/// Contents of the `[PARAMETERS]` section of a track parameter file.
///
/// Keys are case-insensitive and stored lower-cased.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackParameters {
    values: BTreeMap<String, ParamValue>,
}

impl TrackParameters {
    /// Parse parameter file text.
    ///
    /// Sections other than `[PARAMETERS]` are skipped, as are blank lines
    /// and `;` / `#` comments.  Keys and values may be separated by `=` or
    /// `:`.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::TrackConfig`] for a line inside `[PARAMETERS]`
    /// that is neither a section header nor a key/value pair.
    pub fn parse(text: &str) -> Result<Self, PilotError> {
        let mut values = BTreeMap::new();
        let mut in_parameters = false;

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_parameters = section.trim().eq_ignore_ascii_case(PARAMETERS_SECTION);
                continue;
            }
            if !in_parameters {
                continue;
            }
            let Some((key, value)) = line.split_once(['=', ':']) else {
                return Err(PilotError::TrackConfig {
                    field: format!("line {}", idx + 1),
                    details: format!("expected `key = value`, found `{line}`"),
                });
            };
            values.insert(
                key.trim().to_ascii_lowercase(),
                ParamValue::infer(value.trim()),
            );
        }

        Ok(Self { values })
    }

    /// Read and parse a parameter file.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Io`] when the file cannot be read, or the
    /// errors of [`TrackParameters::parse`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PilotError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PilotError::Io(format!("failed to read track parameters {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(&key.to_ascii_lowercase())
    }

    /// A required numeric parameter.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::TrackConfig`] if `key` is absent or not a
    /// number.
    pub fn number(&self, key: &str) -> Result<f64, PilotError> {
        match self.get(key) {
            Some(value) => value.as_f64().ok_or_else(|| PilotError::TrackConfig {
                field: key.to_string(),
                details: format!("expected a number, found {value:?}"),
            }),
            None => Err(PilotError::TrackConfig {
                field: key.to_string(),
                details: "missing".to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl MapTransform {
    /// Build the transform from a parsed parameter file.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::TrackConfig`] naming the first missing,
    /// non-numeric or out-of-range field.
    pub fn from_parameters(params: &TrackParameters) -> Result<Self, PilotError> {
        Self::new(
            params.number("scale_factor")?,
            params.number("x_offset")?,
            params.number("z_offset")?,
            params.number("width")?,
            params.number("height")?,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Asset resolution and session loading
// ────────────────────────────────────────────────────────────────────────────

/// Locations of one track layout's assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackAssets {
    pub track_dir: PathBuf,
    pub raster_path: PathBuf,
    pub parameters_path: PathBuf,
}

impl TrackAssets {
    /// Resolve asset paths for `track` (and `layout`, when non-empty) under
    /// the simulator install at `sim_root`.
    pub fn resolve(sim_root: impl AsRef<Path>, track: &str, layout: &str) -> Self {
        let mut track_dir = sim_root.as_ref().join("content").join("tracks").join(track);
        if !layout.is_empty() {
            track_dir.push(layout);
        }
        Self {
            raster_path: track_dir.join("map.png"),
            parameters_path: track_dir.join("data").join("map.ini"),
            track_dir,
        }
    }
}

/// Everything perception needs that stays fixed for a session.
#[derive(Debug, Clone)]
pub struct TrackSession {
    pub transform: MapTransform,
    pub raster: AlphaMask,
    pub parameters: TrackParameters,
}

impl TrackSession {
    /// Load the parameter file and raster for `assets`.
    ///
    /// # Errors
    ///
    /// Fails fast with [`PilotError::Io`] / [`PilotError::TrackConfig`] for
    /// the parameter file and [`PilotError::Raster`] for the image.
    pub fn load(assets: &TrackAssets) -> Result<Self, PilotError> {
        let parameters = TrackParameters::load(&assets.parameters_path)?;
        let transform = MapTransform::from_parameters(&parameters)?;
        let raster = AlphaMask::open(&assets.raster_path)?;
        info!(
            track_dir = %assets.track_dir.display(),
            scale_factor = transform.scale_factor,
            width = transform.width,
            height = transform.height,
            "track session loaded"
        );
        Ok(Self {
            transform,
            raster,
            parameters,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
