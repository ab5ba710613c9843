//! Telemetry sources feeding the tick driver.
//!
//! A [`TelemetrySource`] hands out one [`TelemetrySnapshot`] per tick.  Live
//! simulator readers implement the trait directly; [`ReplaySource`] plays
//! back a recorded session and [`FixedSource`] repeats a single snapshot.
//!
//! # Replay format
//!
//! One JSON-encoded [`TelemetrySnapshot`] per line.  Blank lines are
//! skipped; missing fields take their defaults.
//!
//! ```text
//! {"vehicle":{"x":12.5,"y":0.0,"z":-40.1,"heading_rad":1.2,"speed_kmh":96.0},"track":"monza"}
//! {"vehicle":{"x":13.1,"y":0.0,"z":-39.6,"heading_rad":1.2,"speed_kmh":97.4},"track":"monza"}
//! ```

use std::io::BufRead;
use std::path::Path;

use tracing::{debug, info};
use trackpilot_types::{PilotError, TelemetrySnapshot};

/// Produces the latest simulator state once per tick.
pub trait TelemetrySource: Send {
    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    /// Read the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::TelemetryUnavailable`] when no snapshot can be
    /// produced this tick.  The driver keeps running and tries again on the
    /// next tick.
    fn snapshot(&mut self) -> Result<TelemetrySnapshot, PilotError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Replay
// ────────────────────────────────────────────────────────────────────────────

/// Plays back a JSON-lines recording, one line per tick.
///
/// Lines are decoded lazily, so a corrupt line costs a single tick rather
/// than the whole recording.
#[derive(Debug)]
pub struct ReplaySource {
    id: String,
    lines: Vec<String>,
    cursor: usize,
    looping: bool,
}

impl ReplaySource {
    /// Load a recording from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Io`] if the file cannot be read.
    pub fn open<P: AsRef<Path>>(path: P, looping: bool) -> Result<Self, PilotError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| PilotError::Io(format!("failed to open replay {}: {e}", path.display())))?;
        let source = Self::from_reader(std::io::BufReader::new(file), looping)
            .map_err(|e| PilotError::Io(format!("failed to read replay {}: {e}", path.display())))?;
        info!(
            path = %path.display(),
            frames = source.len(),
            looping,
            "telemetry replay loaded"
        );
        Ok(source.with_id(path.display().to_string()))
    }

    /// Load a recording from any buffered reader.
    pub fn from_reader<R: BufRead>(reader: R, looping: bool) -> std::io::Result<Self> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(Self {
            id: "replay".to_string(),
            lines,
            cursor: 0,
            looping,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl TelemetrySource for ReplaySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn snapshot(&mut self) -> Result<TelemetrySnapshot, PilotError> {
        if self.cursor >= self.lines.len() {
            if !self.looping || self.lines.is_empty() {
                return Err(PilotError::TelemetryUnavailable(format!(
                    "replay {} exhausted after {} frames",
                    self.id,
                    self.lines.len()
                )));
            }
            debug!(replay = %self.id, "replay wrapped to start");
            self.cursor = 0;
        }
        let line_no = self.cursor + 1;
        let line = &self.lines[self.cursor];
        self.cursor += 1;
        serde_json::from_str(line).map_err(|e| {
            PilotError::TelemetryUnavailable(format!("replay {} frame {line_no}: {e}", self.id))
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixed
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same snapshot every tick.
#[derive(Debug, Clone)]
pub struct FixedSource {
    snapshot: TelemetrySnapshot,
}

impl FixedSource {
    pub fn new(snapshot: TelemetrySnapshot) -> Self {
        Self { snapshot }
    }
}

impl TelemetrySource for FixedSource {
    fn id(&self) -> &str {
        "fixed"
    }

    fn snapshot(&mut self) -> Result<TelemetrySnapshot, PilotError> {
        Ok(self.snapshot.clone())
    }
}
