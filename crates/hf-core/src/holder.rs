//! Holder configuration

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::container::ContainerSpec;
use crate::error::ConfigError;
use crate::export::file_stem;
use crate::hole::HoleSpec;
use crate::layout::{PerAxis, PlanarAxis};
use crate::settings::BuildSettings;
use crate::size_policy::{SizeBounds, SizePolicy};

/// Space withheld from one side of the grid along an axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservedBand {
    pub axis: PlanarAxis,
    /// Width of the band (mm)
    pub size: f64,
}

/// Cut away the upper rim above the working face and round the new edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LipRemoval {
    /// Height kept above the working face (mm)
    pub upper_size: f64,
    /// Fillet radius of the new rim edges (mm)
    pub fillet: f64,
}

impl Default for LipRemoval {
    fn default() -> Self {
        Self {
            upper_size: 2.0,
            fillet: 0.3,
        }
    }
}

/// A multi-hole holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    pub name: String,
    pub version: Version,
    pub container: ContainerSpec,
    pub hole: HoleSpec,
    /// Number of holes along X and Y
    pub hole_count: PerAxis<u32>,
    /// Depth of every hole below the working face (mm)
    pub hole_depth: f64,
    /// Padding added to the structural padding on each axis (mm)
    #[serde(default)]
    pub padding: PerAxis<f64>,
    #[serde(default)]
    pub reserved_band: Option<ReservedBand>,
    /// Chamfer of the hole rims; zero skips chamfering
    #[serde(default)]
    pub chamfer: f64,
    /// Replace the stacking lip with a low rounded rim
    #[serde(default)]
    pub lip_removal: Option<LipRemoval>,
    #[serde(default)]
    pub size_policy: SizePolicy,
    /// Largest shape the size policy may grow holes to
    #[serde(default)]
    pub limit: Option<HoleSpec>,
}

impl Holder {
    /// Create a holder with plain defaults for everything but the essentials
    pub fn new(
        name: impl Into<String>,
        version: Version,
        container: ContainerSpec,
        hole: HoleSpec,
        hole_count: PerAxis<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            container,
            hole,
            hole_count,
            hole_depth: 15.0,
            padding: PerAxis::default(),
            reserved_band: None,
            chamfer: 0.0,
            lip_removal: None,
            size_policy: SizePolicy::Identity,
            limit: None,
        }
    }

    pub fn with_hole_depth(mut self, depth: f64) -> Self {
        self.hole_depth = depth;
        self
    }

    pub fn with_padding(mut self, x: f64, y: f64) -> Self {
        self.padding = PerAxis::new(x, y);
        self
    }

    pub fn with_reserved_band(mut self, axis: PlanarAxis, size: f64) -> Self {
        self.reserved_band = Some(ReservedBand { axis, size });
        self
    }

    pub fn with_chamfer(mut self, chamfer: f64) -> Self {
        self.chamfer = chamfer;
        self
    }

    pub fn with_lip_removal(mut self, lip: LipRemoval) -> Self {
        self.lip_removal = Some(lip);
        self
    }

    pub fn with_size_policy(mut self, policy: SizePolicy, limit: Option<HoleSpec>) -> Self {
        self.size_policy = policy;
        self.limit = limit;
        self
    }

    /// Check every parameter before any geometry is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.container.validate()?;
        self.hole.validate()?;
        if let Some(limit) = &self.limit {
            limit.validate()?;
        }

        if self.hole_count.x == 0 {
            return Err(ConfigError::ZeroCount {
                field: "hole_count.x",
            });
        }
        if self.hole_count.y == 0 {
            return Err(ConfigError::ZeroCount {
                field: "hole_count.y",
            });
        }
        if !(self.hole_depth.is_finite() && self.hole_depth > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "hole_depth",
                value: self.hole_depth,
            });
        }

        non_negative("chamfer", self.chamfer)?;
        non_negative("padding.x", self.padding.x)?;
        non_negative("padding.y", self.padding.y)?;
        if let Some(band) = &self.reserved_band {
            non_negative("reserved_band.size", band.size)?;
        }
        if let Some(lip) = &self.lip_removal {
            non_negative("lip_removal.upper_size", lip.upper_size)?;
            non_negative("lip_removal.fillet", lip.fillet)?;
        }

        if let SizePolicy::MarginGrowth(growth) = &self.size_policy {
            if growth.increase_copies == 0 {
                return Err(ConfigError::ZeroCount {
                    field: "increase_copies",
                });
            }
            if growth.increase_loop_after == 0 {
                return Err(ConfigError::ZeroCount {
                    field: "increase_loop_after",
                });
            }
        }
        Ok(())
    }

    /// Absolute size bounds for this holder's holes
    pub fn size_bounds(&self, settings: &BuildSettings) -> SizeBounds {
        self.size_policy.bounds_for(self.limit.as_ref(), settings)
    }

    /// Output file name without extension
    pub fn file_stem(&self) -> String {
        file_stem(&self.name, &self.version, false)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
