//! Editor configuration.

use crate::error::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default slide width in slide units.
pub const DEFAULT_SLIDE_WIDTH: f64 = 1920.0;
/// Default slide height in slide units.
pub const DEFAULT_SLIDE_HEIGHT: f64 = 1080.0;
/// Smallest width/height a resize may produce, in slide units.
pub const DEFAULT_MIN_COMPONENT_SIZE: f64 = 50.0;
/// Rotation snaps to a right angle when within this many degrees.
pub const DEFAULT_ROTATION_SNAP_THRESHOLD: f64 = 5.0;
/// Distance (slide units) within which a line endpoint snaps to an anchor.
pub const DEFAULT_LINE_SNAP_TOLERANCE: f64 = 15.0;
/// Handle hit tolerance in screen pixels.
pub const DEFAULT_HANDLE_HIT_TOLERANCE: f64 = 10.0;
/// Maximum number of history snapshots kept per slide.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Tunables for the interaction core.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "min_component_size": 20, "sync_enabled": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of the slide coordinate space.
    pub slide_width: f64,
    /// Height of the slide coordinate space.
    pub slide_height: f64,
    /// Minimum size on each axis enforced while resizing.
    pub min_component_size: f64,
    /// Snap window around 0/90/180/270 degrees.
    pub rotation_snap_threshold: f64,
    /// Snap radius for line endpoints.
    pub line_snap_tolerance: f64,
    /// Handle hit radius in screen pixels (divided by the viewport scale).
    pub handle_hit_tolerance: f64,
    /// History depth per slide.
    pub max_history: usize,
    /// Whether line endpoints snap to component anchors.
    pub snapping_enabled: bool,
    /// Whether committed edits are forwarded to the collaboration adapter.
    pub sync_enabled: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            slide_width: DEFAULT_SLIDE_WIDTH,
            slide_height: DEFAULT_SLIDE_HEIGHT,
            min_component_size: DEFAULT_MIN_COMPONENT_SIZE,
            rotation_snap_threshold: DEFAULT_ROTATION_SNAP_THRESHOLD,
            line_snap_tolerance: DEFAULT_LINE_SNAP_TOLERANCE,
            handle_hit_tolerance: DEFAULT_HANDLE_HIT_TOLERANCE,
            max_history: DEFAULT_MAX_HISTORY,
            snapping_enabled: true,
            sync_enabled: false,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EditorError::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> EditorResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            EditorError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values the geometry code cannot work with.
    pub fn validate(&self) -> EditorResult<()> {
        if self.slide_width <= 0.0 || self.slide_height <= 0.0 {
            return Err(EditorError::Config(format!(
                "Slide size must be positive, got {}x{}",
                self.slide_width, self.slide_height
            )));
        }
        if self.min_component_size <= 0.0 {
            return Err(EditorError::Config(format!(
                "min_component_size must be positive, got {}",
                self.min_component_size
            )));
        }
        if self.rotation_snap_threshold < 0.0
            || self.line_snap_tolerance < 0.0
            || self.handle_hit_tolerance < 0.0
        {
            return Err(EditorError::Config("Tolerances must not be negative".to_string()));
        }
        Ok(())
    }

    /// Slide size as a kurbo `Size`.
    pub fn slide_size(&self) -> kurbo::Size {
        kurbo::Size::new(self.slide_width, self.slide_height)
    }
}
