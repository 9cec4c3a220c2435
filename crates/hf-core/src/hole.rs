//! Hole shapes cut into holders

use glam::DVec2;
use hf_cad::{BooleanType, CadKernel, CadResult, Solid, Wire2D, Workplane};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::holder::Holder;
use crate::layout::{GridCell, PlanarAxis};
use crate::settings::BuildSettings;
use crate::size_policy::{SizeBounds, SizePolicy};

/// How a hexagon's X footprint is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HexFootprint {
    /// Corner to corner along X
    #[default]
    Pointy,
    /// Flat to flat on both axes
    Square,
}

/// Shape of the holes in a holder
///
/// All dimensions are in millimeters and must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HoleSpec {
    Circle {
        diameter: f64,
    },
    Rect {
        width: f64,
        depth: f64,
    },
    /// Two overlapping rectangles cut as one opening
    RectDouble {
        first_width: f64,
        first_depth: f64,
        second_width: f64,
        second_depth: f64,
    },
    /// Regular hexagon with a corner on +X
    Hexagon {
        flat_to_flat: f64,
        #[serde(default)]
        footprint: HexFootprint,
    },
}

impl HoleSpec {
    pub fn circle(diameter: f64) -> Result<Self, ConfigError> {
        Self::Circle { diameter }.validated()
    }

    pub fn rect(width: f64, depth: f64) -> Result<Self, ConfigError> {
        Self::Rect { width, depth }.validated()
    }

    pub fn rect_double(
        first_width: f64,
        first_depth: f64,
        second_width: f64,
        second_depth: f64,
    ) -> Result<Self, ConfigError> {
        Self::RectDouble {
            first_width,
            first_depth,
            second_width,
            second_depth,
        }
        .validated()
    }

    pub fn hexagon(flat_to_flat: f64, footprint: HexFootprint) -> Result<Self, ConfigError> {
        Self::Hexagon {
            flat_to_flat,
            footprint,
        }
        .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Named dimensions of the shape
    pub fn dimensions(&self) -> Vec<(&'static str, f64)> {
        match *self {
            HoleSpec::Circle { diameter } => vec![("diameter", diameter)],
            HoleSpec::Rect { width, depth } => vec![("width", width), ("depth", depth)],
            HoleSpec::RectDouble {
                first_width,
                first_depth,
                second_width,
                second_depth,
            } => vec![
                ("first_width", first_width),
                ("first_depth", first_depth),
                ("second_width", second_width),
                ("second_depth", second_depth),
            ],
            HoleSpec::Hexagon { flat_to_flat, .. } => vec![("flat_to_flat", flat_to_flat)],
        }
    }

    /// Check that every dimension is positive and finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.dimensions() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }

    /// Extent of the shape along an axis, used for spacing
    pub fn footprint_along(&self, axis: PlanarAxis, settings: &BuildSettings) -> f64 {
        match (*self, axis) {
            (HoleSpec::Circle { diameter }, _) => diameter,
            (HoleSpec::Rect { width, .. }, PlanarAxis::X) => width,
            (HoleSpec::Rect { depth, .. }, PlanarAxis::Y) => depth,
            (
                HoleSpec::RectDouble {
                    first_width,
                    second_width,
                    ..
                },
                PlanarAxis::X,
            ) => first_width.max(second_width),
            (
                HoleSpec::RectDouble {
                    first_depth,
                    second_depth,
                    ..
                },
                PlanarAxis::Y,
            ) => first_depth.max(second_depth),
            (
                HoleSpec::Hexagon {
                    flat_to_flat,
                    footprint: HexFootprint::Pointy,
                },
                PlanarAxis::X,
            ) => flat_to_flat * settings.hex_ratio,
            (HoleSpec::Hexagon { flat_to_flat, .. }, _) => flat_to_flat,
        }
    }

    /// Largest footprint over both axes
    pub fn max_footprint(&self, settings: &BuildSettings) -> f64 {
        PlanarAxis::ALL
            .iter()
            .map(|axis| self.footprint_along(*axis, settings))
            .fold(0.0, f64::max)
    }

    fn map_dimensions(&self, f: impl Fn(f64) -> f64) -> Result<Self, ConfigError> {
        let mapped = match *self {
            HoleSpec::Circle { diameter } => HoleSpec::Circle {
                diameter: f(diameter),
            },
            HoleSpec::Rect { width, depth } => HoleSpec::Rect {
                width: f(width),
                depth: f(depth),
            },
            HoleSpec::RectDouble {
                first_width,
                first_depth,
                second_width,
                second_depth,
            } => HoleSpec::RectDouble {
                first_width: f(first_width),
                first_depth: f(first_depth),
                second_width: f(second_width),
                second_depth: f(second_depth),
            },
            HoleSpec::Hexagon {
                flat_to_flat,
                footprint,
            } => HoleSpec::Hexagon {
                flat_to_flat: f(flat_to_flat),
                footprint,
            },
        };
        mapped.validated()
    }

    /// Grow every dimension by `delta`
    pub fn offset(&self, delta: f64) -> Result<Self, ConfigError> {
        self.map_dimensions(|v| v + delta)
    }

    /// Multiply every dimension by `factor`
    pub fn scaled(&self, factor: f64) -> Result<Self, ConfigError> {
        self.map_dimensions(|v| v * factor)
    }

    /// Divide every dimension by `divisor`
    pub fn divided(&self, divisor: f64) -> Result<Self, ConfigError> {
        if divisor == 0.0 {
            return Err(ConfigError::DivisionByZero);
        }
        self.map_dimensions(|v| v / divisor)
    }

    /// Cut dimensions for a grid cell
    pub fn resolve(
        &self,
        policy: &SizePolicy,
        cell: &GridCell,
        bounds: SizeBounds,
        settings: &BuildSettings,
    ) -> ResolvedHole {
        let size = |nominal: f64| policy.resolve(nominal, cell, bounds);
        match *self {
            HoleSpec::Circle { diameter } => ResolvedHole::Circle {
                diameter: size(diameter),
            },
            HoleSpec::Rect { width, depth } => ResolvedHole::Rect {
                width: size(width),
                depth: size(depth),
            },
            HoleSpec::RectDouble {
                first_width,
                first_depth,
                second_width,
                second_depth,
            } => ResolvedHole::RectDouble {
                first_width: size(first_width),
                first_depth: size(first_depth),
                second_width: size(second_width),
                second_depth: size(second_depth),
            },
            HoleSpec::Hexagon { flat_to_flat, .. } => ResolvedHole::Hexagon {
                circumscribed_diameter: size(flat_to_flat * settings.hex_ratio),
            },
        }
    }

    /// Resolve the shape through the holder's size policy and cut it at `plane`
    pub fn cut(
        &self,
        kernel: &dyn CadKernel,
        target: &Solid,
        plane: &Workplane,
        holder: &Holder,
        cell: &GridCell,
        settings: &BuildSettings,
    ) -> CadResult<(Solid, ResolvedHole)> {
        let bounds = holder.size_bounds(settings);
        let resolved = self.resolve(&holder.size_policy, cell, bounds, settings);
        let solid = resolved.cut(kernel, target, plane, holder.hole_depth, settings)?;
        Ok((solid, resolved))
    }
}

/// A hole shape with the dimensions actually cut
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResolvedHole {
    Circle {
        diameter: f64,
    },
    Rect {
        width: f64,
        depth: f64,
    },
    RectDouble {
        first_width: f64,
        first_depth: f64,
        second_width: f64,
        second_depth: f64,
    },
    Hexagon {
        circumscribed_diameter: f64,
    },
}

impl ResolvedHole {
    /// Leading dimension, for logs and reports
    pub fn size(&self) -> f64 {
        match *self {
            ResolvedHole::Circle { diameter } => diameter,
            ResolvedHole::Rect { width, .. } => width,
            ResolvedHole::RectDouble { first_width, .. } => first_width,
            ResolvedHole::Hexagon {
                circumscribed_diameter,
            } => circumscribed_diameter,
        }
    }

    /// Outlines centered on the plane origin; a compound shape has two
    pub fn profiles(&self, settings: &BuildSettings) -> Vec<Wire2D> {
        match *self {
            ResolvedHole::Circle { diameter } => vec![Wire2D::circle(
                DVec2::ZERO,
                diameter / 2.0,
                settings.circle_segments,
            )],
            ResolvedHole::Rect { width, depth } => {
                vec![Wire2D::rectangle(DVec2::ZERO, width, depth)]
            }
            ResolvedHole::RectDouble {
                first_width,
                first_depth,
                second_width,
                second_depth,
            } => vec![
                Wire2D::rectangle(DVec2::ZERO, first_width, first_depth),
                Wire2D::rectangle(DVec2::ZERO, second_width, second_depth),
            ],
            ResolvedHole::Hexagon {
                circumscribed_diameter,
            } => vec![Wire2D::regular_polygon(
                DVec2::ZERO,
                circumscribed_diameter,
                6,
            )],
        }
    }

    /// Cut the hole into `target`, `depth` below the plane
    ///
    /// Compound shapes cut each outline from the same target and intersect
    /// the results.
    pub fn cut(
        &self,
        kernel: &dyn CadKernel,
        target: &Solid,
        plane: &Workplane,
        depth: f64,
        settings: &BuildSettings,
    ) -> CadResult<Solid> {
        let mut cuts = self
            .profiles(settings)
            .into_iter()
            .map(|profile| kernel.cut_blind(target, plane, &profile, -depth));

        let Some(first) = cuts.next() else {
            return Ok(target.clone());
        };
        let mut result = first?;
        for cut in cuts {
            result = kernel.boolean(&result, &cut?, BooleanType::Intersect)?;
        }
        Ok(result)
    }
}
