//! Build settings shared by every part in a run

use std::path::Path;

use hf_cad::{Axis, FaceSelector};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Dimensions of the container system and kernel-facing knobs
///
/// Defaults match a 42 mm grid bin system with 7 mm height units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Footprint of one grid cell (mm)
    pub grid_pitch: f64,
    /// Height of one height unit (mm)
    pub height_unit: f64,
    /// Padding between the container edge and the hole area (mm)
    pub structural_padding: f64,
    /// Container wall thickness (mm)
    pub wall_thickness: f64,
    /// Height of the stacking lip (mm)
    pub lip_height: f64,
    /// Pointy-to-flat size ratio of a regular hexagon
    pub hex_ratio: f64,
    /// Segments used to approximate circles
    pub circle_segments: u32,
    /// Face the holes are cut into
    pub working_face: FaceSelector,
    /// Face finished by lip removal
    pub top_face: FaceSelector,
    /// Tessellation tolerance for mesh export
    pub export_tolerance: f64,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            grid_pitch: 42.0,
            height_unit: 7.0,
            structural_padding: 2.95,
            wall_thickness: 0.95,
            lip_height: 3.8,
            hex_ratio: 1.1547,
            circle_segments: 64,
            working_face: FaceSelector::Nth {
                axis: Axis::Z,
                index: -2,
            },
            top_face: FaceSelector::Max(Axis::Z),
            export_tolerance: 0.01,
        }
    }
}

impl BuildSettings {
    /// Parse settings from RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Load settings from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Serialize settings to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
