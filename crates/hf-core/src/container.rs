//! Containers the holes are cut into

use glam::{DVec2, DVec3};
use hf_cad::{BooleanType, CadKernel, CadResult, Solid, Wire2D, Workplane};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layout::{PerAxis, PlanarAxis};
use crate::settings::BuildSettings;

/// Size of a grid bin container
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Grid cells along X and Y
    pub cells: PerAxis<u32>,
    /// Height in height units
    pub cell_height: f64,
    /// Filled share of the container height, in (0, 1)
    pub fill_ratio: f64,
}

impl ContainerSpec {
    pub fn new(cells_x: u32, cells_y: u32, cell_height: f64, fill_ratio: f64) -> Self {
        Self {
            cells: PerAxis::new(cells_x, cells_y),
            cell_height,
            fill_ratio,
        }
    }

    /// Container filled up to `fill_mm` millimeters
    pub fn from_fill_depth(
        cells_x: u32,
        cells_y: u32,
        cell_height: f64,
        fill_mm: f64,
        settings: &BuildSettings,
    ) -> Result<Self, ConfigError> {
        if !(cell_height.is_finite() && cell_height > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "cell_height",
                value: cell_height,
            });
        }
        let spec = Self::new(
            cells_x,
            cells_y,
            cell_height,
            fill_mm / (settings.height_unit * cell_height),
        );
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cells.x == 0 {
            return Err(ConfigError::ZeroCount { field: "cells.x" });
        }
        if self.cells.y == 0 {
            return Err(ConfigError::ZeroCount { field: "cells.y" });
        }
        if !(self.cell_height.is_finite() && self.cell_height > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "cell_height",
                value: self.cell_height,
            });
        }
        if !(self.fill_ratio > 0.0 && self.fill_ratio < 1.0) {
            return Err(ConfigError::FillRatio(self.fill_ratio));
        }
        Ok(())
    }

    /// Outer footprint in millimeters
    pub fn footprint(&self, settings: &BuildSettings) -> DVec2 {
        let size = |axis| settings.grid_pitch * f64::from(self.cells.get(axis));
        DVec2::new(size(PlanarAxis::X), size(PlanarAxis::Y))
    }

    /// Body height in millimeters, without the stacking lip
    pub fn body_height(&self, settings: &BuildSettings) -> f64 {
        settings.height_unit * self.cell_height
    }

    /// Height of the filled floor in millimeters
    pub fn fill_height(&self, settings: &BuildSettings) -> f64 {
        self.body_height(settings) * self.fill_ratio
    }
}

/// A container solid and its measurements
#[derive(Debug, Clone)]
pub struct Container {
    pub solid: Solid,
    /// Total height, lip included
    pub height: f64,
    pub footprint: DVec2,
    /// Height of the working face
    pub fill_height: f64,
}

/// Source of container solids
pub trait ContainerProvider {
    /// Build a container, with a stacking lip when `lip_enabled`
    fn make_box(
        &self,
        kernel: &dyn CadKernel,
        spec: &ContainerSpec,
        lip_enabled: bool,
    ) -> CadResult<Container>;
}

/// Grid bins built from kernel boxes: a filled floor, thin walls and an
/// optional lip that raises the walls
#[derive(Debug, Clone, Default)]
pub struct GridBinProvider {
    settings: BuildSettings,
}

impl GridBinProvider {
    pub fn new(settings: &BuildSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }
}

impl ContainerProvider for GridBinProvider {
    fn make_box(
        &self,
        kernel: &dyn CadKernel,
        spec: &ContainerSpec,
        lip_enabled: bool,
    ) -> CadResult<Container> {
        let settings = &self.settings;
        let footprint = spec.footprint(settings);
        let lip = if lip_enabled { settings.lip_height } else { 0.0 };
        let height = spec.body_height(settings) + lip;
        let fill_height = spec.fill_height(settings);

        let shell = kernel.create_box(
            DVec3::new(0.0, 0.0, height / 2.0),
            footprint.extend(height),
        )?;
        let cavity = kernel.extrude(
            &Wire2D::rectangle(
                DVec2::ZERO,
                footprint.x - 2.0 * settings.wall_thickness,
                footprint.y - 2.0 * settings.wall_thickness,
            ),
            &Workplane::xy().offset(fill_height),
            height - fill_height,
        )?;
        let solid = kernel.boolean(&shell, &cavity, BooleanType::Subtract)?;

        tracing::debug!(
            "Container {}x{} cells, height {:.2} mm, fill {:.2} mm, lip {}",
            spec.cells.x,
            spec.cells.y,
            height,
            fill_height,
            lip_enabled
        );

        Ok(Container {
            solid,
            height,
            footprint,
            fill_height,
        })
    }
}
