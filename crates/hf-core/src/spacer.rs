//! Ring shaped parts: washers, screwdriver bit spacers and bend radius gauges

use glam::DVec2;
use hf_cad::{
    Axis, BooleanType, CadKernel, EdgeFilter, EdgeId, FaceSelector, Solid, Wire2D, Workplane,
    select_edges, select_faces,
};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::export::file_stem;
use crate::settings::BuildSettings;

/// Most bits a spacer can wrap before it no longer fits around the center
pub const MAX_BITS: u32 = 3;

/// Bits that fit in a full turn
const BITS_PER_TURN: u32 = 6;

/// Arc segments of the wedge that trims a bit spacer
const WEDGE_SEGMENTS: u32 = 100;

/// Raised rim around the outside of a washer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flange {
    /// Radial width beyond the outer diameter (mm)
    pub width: f64,
    /// Height above the washer face (mm)
    pub height: f64,
    /// Fillet of the flange top
    pub top_fillet: f64,
    /// Fillet where the washer face meets the flange
    pub root_fillet: f64,
}

impl Default for Flange {
    fn default() -> Self {
        Self {
            width: 2.0,
            height: 2.0,
            top_fillet: 0.5,
            root_fillet: 1.0,
        }
    }
}

/// A flat ring, optionally trimmed to a wedge covering some bits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spacer {
    pub name: String,
    pub version: Version,
    pub outer_diameter: f64,
    /// Zero leaves the ring solid
    #[serde(default)]
    pub inner_diameter: f64,
    pub thickness: f64,
    /// Number of bits the spacer wraps, `None` for a full ring
    #[serde(default)]
    pub bits: Option<u32>,
    /// Replace dots in the file name with one dot leaders
    #[serde(default)]
    pub dot_leader: bool,
    #[serde(default)]
    pub flange: Option<Flange>,
}

impl Spacer {
    /// Plain washer
    pub fn washer(outer_diameter: f64, inner_diameter: f64, thickness: f64) -> Self {
        Self {
            name: format!("washer {}mm thick", thickness),
            version: Version::new(1, 1, 0),
            outer_diameter,
            inner_diameter,
            thickness,
            bits: None,
            dot_leader: false,
            flange: None,
        }
    }

    /// Washer with a raised outer rim, as used on towel roll holders
    pub fn flanged_washer(outer_diameter: f64, inner_diameter: f64, thickness: f64) -> Self {
        Self {
            flange: Some(Flange::default()),
            ..Self::washer(outer_diameter, inner_diameter, thickness)
        }
    }

    /// Spacer that shortens the bit holder of a 20 mm screwdriver shaft
    pub fn bit_spacer(thickness: f64, bits: u32) -> Self {
        Self {
            name: format!("ltt screwdriver bit spacer for {:.1}mm bits", 20.0 - thickness),
            version: Version::new(1, 0, 0),
            outer_diameter: 22.0,
            inner_diameter: 12.4,
            thickness,
            bits: Some(bits),
            dot_leader: false,
            flange: None,
        }
    }

    /// Disc for checking the bend radius of cables and tubes
    pub fn bend_gauge(diameter: f64, thickness: f64) -> Self {
        Self {
            name: format!("bend radius gauge {:.3} mm", diameter / 2.0),
            version: Version::new(1, 0, 0),
            outer_diameter: diameter,
            inner_diameter: (diameter - 10.0).max(0.0),
            thickness,
            bits: None,
            dot_leader: true,
            flange: None,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (field, value) in [
            ("outer_diameter", self.outer_diameter),
            ("thickness", self.thickness),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if !(self.inner_diameter.is_finite() && self.inner_diameter >= 0.0) {
            return Err(ConfigError::Negative {
                field: "inner_diameter",
                value: self.inner_diameter,
            });
        }
        if self.inner_diameter >= self.outer_diameter {
            return Err(ConfigError::NonPositive {
                field: "ring width",
                value: (self.outer_diameter - self.inner_diameter) / 2.0,
            });
        }
        if let Some(flange) = &self.flange {
            for (field, value) in [
                ("flange.width", flange.width),
                ("flange.height", flange.height),
            ] {
                if !(value.is_finite() && value > 0.0) {
                    return Err(ConfigError::NonPositive { field, value });
                }
            }
            for (field, value) in [
                ("flange.top_fillet", flange.top_fillet),
                ("flange.root_fillet", flange.root_fillet),
            ] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ConfigError::Negative { field, value });
                }
            }
        }
        match self.bits {
            Some(0) => Err(ConfigError::ZeroCount { field: "bits" }),
            Some(bits) if bits > MAX_BITS => Err(ConfigError::TooManyBits {
                bits,
                max: MAX_BITS,
            }),
            _ => Ok(()),
        }
    }

    /// Share of a full turn the wedge covers
    pub fn wedge_fraction(&self) -> Option<f64> {
        self.bits
            .map(|bits| (f64::from(bits) / f64::from(BITS_PER_TURN)).clamp(0.0, 1.0))
    }

    /// Output file name without extension
    pub fn file_stem(&self) -> String {
        file_stem(&self.name, &self.version, self.dot_leader)
    }

    pub fn build(&self, kernel: &dyn CadKernel, settings: &BuildSettings) -> Result<Solid> {
        self.validate()?;
        let plane = Workplane::xy();
        let segments = settings.circle_segments;

        let disc = Wire2D::circle(DVec2::ZERO, self.outer_diameter / 2.0, segments);
        let mut ring = kernel.extrude(&disc, &plane, self.thickness)?;
        if self.inner_diameter > 0.0 {
            let bore = Wire2D::circle(DVec2::ZERO, self.inner_diameter / 2.0, segments);
            let core = kernel.extrude(&bore, &plane, self.thickness)?;
            ring = kernel.boolean(&ring, &core, BooleanType::Subtract)?;
        }

        if let Some(flange) = &self.flange {
            ring = self.add_flange(kernel, settings, ring, flange)?;
        }

        if let Some(fraction) = self.wedge_fraction() {
            let sector = Wire2D::sector(self.outer_diameter * 10.0, fraction, WEDGE_SEGMENTS);
            let wedge = kernel.extrude(&sector, &plane, self.thickness * 10.0)?;
            ring = kernel.boolean(&ring, &wedge, BooleanType::Intersect)?;
        }

        tracing::debug!(
            "Spacer {}: {} x {} mm, {:.3} mm thick",
            self.name,
            self.outer_diameter,
            self.inner_diameter,
            self.thickness
        );
        Ok(ring)
    }

    fn add_flange(
        &self,
        kernel: &dyn CadKernel,
        settings: &BuildSettings,
        ring: Solid,
        flange: &Flange,
    ) -> Result<Solid> {
        let segments = settings.circle_segments;
        let outer_radius = self.outer_diameter / 2.0;
        let plane = Workplane::xy();

        let rim = Wire2D::circle(DVec2::ZERO, outer_radius + flange.width, segments);
        let rim = kernel.extrude(&rim, &plane, self.thickness + flange.height)?;
        let inside = Wire2D::circle(DVec2::ZERO, outer_radius, segments);
        let inside = kernel.extrude(&inside, &plane, self.thickness + flange.height)?;
        let rim = kernel.boolean(&rim, &inside, BooleanType::Subtract)?;
        let mut solid = kernel.boolean(&ring, &rim, BooleanType::Union)?;

        if flange.top_fillet > 0.0 {
            let top = select_faces(kernel, &solid, FaceSelector::Max(Axis::Z))?;
            let edges = select_edges(kernel, &solid, &top, EdgeFilter::All)?;
            let ids: Vec<EdgeId> = edges.iter().map(|e| e.id).collect();
            solid = kernel.fillet(&solid, &ids, flange.top_fillet)?;
        }

        if flange.root_fillet > 0.0 {
            // the washer face is the middle layer, its outer boundary meets the flange
            let face = FaceSelector::Nth {
                axis: Axis::Z,
                index: 1,
            };
            let faces = select_faces(kernel, &solid, face)?;
            let split = (outer_radius + self.inner_diameter / 2.0) / 2.0;
            let ids: Vec<EdgeId> = select_edges(kernel, &solid, &faces, EdgeFilter::All)?
                .iter()
                .filter(|e| e.midpoint.truncate().length() > split)
                .map(|e| e.id)
                .collect();
            if !ids.is_empty() {
                solid = kernel.fillet(&solid, &ids, flange.root_fillet)?;
            }
        }
        Ok(solid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use glam::DVec3;
    use hf_cad::PreviewKernel;

    #[test]
    fn test_bit_spacer_is_a_half_ring() {
        let settings = BuildSettings::default();
        let kernel = PreviewKernel::new();
        let spacer = Spacer::bit_spacer(2.0, 3);
        assert_eq!(spacer.name, "ltt screwdriver bit spacer for 18.0mm bits");
        assert_eq!(spacer.wedge_fraction(), Some(0.5));

        let solid = spacer.build(&kernel, &settings).unwrap();
        assert!(kernel.contains(&solid, DVec3::new(8.0, 0.0, 1.0)).unwrap());
        assert!(kernel.contains(&solid, DVec3::new(1.0, 8.0, 1.0)).unwrap());
        assert!(!kernel.contains(&solid, DVec3::new(-8.0, 0.0, 1.0)).unwrap());
        assert!(!kernel.contains(&solid, DVec3::new(0.0, 0.0, 1.0)).unwrap());
    }

    #[test]
    fn test_too_many_bits() {
        let settings = BuildSettings::default();
        let kernel = PreviewKernel::new();
        let spacer = Spacer::bit_spacer(2.0, 4);
        assert_eq!(
            spacer.validate(),
            Err(ConfigError::TooManyBits { bits: 4, max: 3 })
        );
        assert!(matches!(
            spacer.build(&kernel, &settings),
            Err(Error::Config(ConfigError::TooManyBits { .. }))
        ));
        assert!(Spacer::bit_spacer(2.0, 0).validate().is_err());
    }

    #[test]
    fn test_bend_gauge() {
        let settings = BuildSettings::default();
        let kernel = PreviewKernel::new();

        let gauge = Spacer::bend_gauge(25.0, 15.0);
        assert_eq!(gauge.name, "bend radius gauge 12.500 mm");
        assert_eq!(gauge.inner_diameter, 15.0);
        assert_eq!(
            gauge.file_stem(),
            "bend radius gauge 12\u{2024}500 mm v1\u{2024}0\u{2024}0"
        );

        let small = Spacer::bend_gauge(6.0, 15.0);
        assert_eq!(small.inner_diameter, 0.0);
        let disc = small.build(&kernel, &settings).unwrap();
        assert!(kernel.contains(&disc, DVec3::new(0.0, 0.0, 7.0)).unwrap());
    }

    #[test]
    fn test_washer() {
        let settings = BuildSettings::default();
        let kernel = PreviewKernel::new();
        let washer = Spacer::washer(50.0, 35.0, 2.0);
        assert_eq!(washer.name, "washer 2mm thick");
        assert_eq!(washer.file_stem(), "washer 2mm thick v1.1.0");

        let solid = washer.build(&kernel, &settings).unwrap();
        assert!(kernel.contains(&solid, DVec3::new(-21.0, 0.0, 1.0)).unwrap());
        assert!(!kernel.contains(&solid, DVec3::new(10.0, 0.0, 1.0)).unwrap());

        let inverted = Spacer::washer(20.0, 30.0, 2.0);
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_flanged_washer() {
        let settings = BuildSettings {
            circle_segments: 24,
            ..BuildSettings::default()
        };
        let kernel = PreviewKernel::new();
        let washer = Spacer::flanged_washer(50.4, 45.4, 3.8);
        assert_eq!(washer.file_stem(), "washer 3.8mm thick v1.1.0");

        let solid = washer.build(&kernel, &settings).unwrap();
        // washer body, flange above it, open center
        assert!(kernel.contains(&solid, DVec3::new(24.0, 0.0, 1.0)).unwrap());
        assert!(!kernel.contains(&solid, DVec3::new(24.0, 0.0, 4.5)).unwrap());
        assert!(kernel.contains(&solid, DVec3::new(26.0, 0.0, 5.0)).unwrap());
        assert!(!kernel.contains(&solid, DVec3::new(0.0, 0.0, 1.0)).unwrap());

        let finishes = kernel.finishes(&solid).unwrap();
        assert_eq!(finishes.len(), 2);
        assert_eq!(finishes[0].size, 0.5);
        assert!(finishes[0].edges.iter().all(|e| (e.start.z - 5.8).abs() < 1e-6));
        assert_eq!(finishes[1].size, 1.0);
        assert_eq!(finishes[1].edges.len(), 24);
        assert!(finishes[1].edges.iter().all(|e| (e.start.z - 3.8).abs() < 1e-6));

        let bad = Spacer {
            flange: Some(Flange {
                width: 0.0,
                ..Flange::default()
            }),
            ..washer
        };
        assert!(bad.validate().is_err());
    }
}
