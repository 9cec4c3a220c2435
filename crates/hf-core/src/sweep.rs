//! Families of spacers generated over a size range

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::spacer::{MAX_BITS, Spacer};

/// Inclusive range of sizes walked in fixed steps (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl SizeRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Every size from `start` up to and including `end`
    pub fn values(&self) -> Result<Vec<f64>, ConfigError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "range.step",
                value: self.step,
            });
        }
        if !(self.start.is_finite() && self.start > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "range.start",
                value: self.start,
            });
        }
        if !self.end.is_finite() || self.end < self.start {
            return Err(ConfigError::NonPositive {
                field: "range length",
                value: self.end - self.start,
            });
        }
        let count = ((self.end - self.start) / self.step + 1e-9).floor() as usize + 1;
        Ok((0..count)
            .map(|i| self.start + i as f64 * self.step)
            .collect())
    }
}

/// A spacer produced by a sweep, with the subdirectory it is written to
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPart {
    pub dir: Option<String>,
    pub spacer: Spacer,
}

/// A family of spacers over a size range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sweep {
    /// Bit spacers at every thickness, for each bit count, one directory per count
    BitSpacers { thickness: SizeRange },
    /// Bend radius gauges at every diameter
    BendGauges { diameter: SizeRange, thickness: f64 },
}

impl Sweep {
    /// Bit spacers from 0.5 to 10 mm thick
    pub fn bit_spacers() -> Self {
        Sweep::BitSpacers {
            thickness: SizeRange::new(0.5, 10.0, 0.5),
        }
    }

    /// Bend gauges from 0.25 to 200 mm diameter, 15 mm thick
    pub fn bend_gauges() -> Self {
        Sweep::BendGauges {
            diameter: SizeRange::new(0.25, 200.0, 0.25),
            thickness: 15.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sweep::BitSpacers { .. } => "bit spacer sweep",
            Sweep::BendGauges { .. } => "bend gauge sweep",
        }
    }

    /// Expand into the spacers to build
    pub fn parts(&self) -> Result<Vec<SweepPart>, ConfigError> {
        match self {
            Sweep::BitSpacers { thickness } => {
                let thicknesses = thickness.values()?;
                Ok((1..=MAX_BITS)
                    .flat_map(|bits| {
                        thicknesses.iter().map(move |t| SweepPart {
                            dir: Some(format!("{} bit", bits)),
                            spacer: Spacer::bit_spacer(*t, bits),
                        })
                    })
                    .collect())
            }
            Sweep::BendGauges {
                diameter,
                thickness,
            } => Ok(diameter
                .values()?
                .into_iter()
                .map(|d| SweepPart {
                    dir: None,
                    spacer: Spacer::bend_gauge(d, *thickness),
                })
                .collect()),
        }
    }
}
