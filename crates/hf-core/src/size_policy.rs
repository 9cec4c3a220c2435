//! Hole size policies
//!
//! A policy maps the nominal size of a hole to the size actually cut at a
//! given grid cell. Printed holes come out slightly smaller than drawn, so
//! the growth policy adds a margin that is larger for small holes.

use serde::{Deserialize, Serialize};

use crate::hole::HoleSpec;
use crate::layout::GridCell;
use crate::settings::BuildSettings;

/// Margin interpolated between a small-hole and a normal-hole value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginBlend {
    /// Margin for sizes at or below `low`
    pub small: f64,
    /// Margin for sizes at or above `high`
    pub normal: f64,
    pub low: f64,
    pub high: f64,
}

impl Default for MarginBlend {
    fn default() -> Self {
        Self {
            small: 0.6,
            normal: 0.4,
            low: 1.6,
            high: 2.25,
        }
    }
}

impl MarginBlend {
    /// Margin for a hole of the given size
    pub fn margin(&self, size: f64) -> f64 {
        if self.high <= self.low {
            return if size < self.low {
                self.small
            } else {
                self.normal
            };
        }
        let t = ((size - self.low) / (self.high - self.low)).clamp(0.0, 1.0);
        self.normal * t + self.small * (1.0 - t)
    }
}

/// Absolute bounds on a resolved size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min: f64,
    pub max: f64,
}

impl SizeBounds {
    pub const UNBOUNDED: SizeBounds = SizeBounds {
        min: 0.0,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds allowing sizes up to a limit footprint plus its margin
    pub fn from_limit(footprint: f64, margin: f64) -> Self {
        Self::new(0.0, footprint + margin)
    }

    /// Clamp a value, yielding `min` when the bounds are inverted
    pub fn clamp(&self, value: f64) -> f64 {
        value.min(self.max).max(self.min)
    }
}

/// Bounded linear growth of hole size across a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginGrowth {
    /// Added to the running base every `increase_copies` holes
    pub increase_amount: f64,
    /// Holes between increases; zero never increases
    pub increase_copies: u32,
    /// Holes between resets of the base; zero never resets
    pub increase_loop_after: u32,
    pub min_size: f64,
    pub max_size: f64,
    #[serde(default)]
    pub blend: MarginBlend,
}

impl MarginGrowth {
    /// Running base and resolved size at `loop_index`, before the absolute clamp
    fn iterate(&self, nominal: f64, loop_index: u32) -> (f64, f64) {
        let mut base = nominal;
        let mut current = nominal;
        let mut size = nominal;

        for j in 0..=loop_index {
            if j.checked_rem(self.increase_loop_after) == Some(0) {
                base = nominal;
            }
            current = base;

            let clamped = base.min(self.max_size).max(self.min_size);
            size = clamped + self.blend.margin(clamped);

            if j.checked_rem(self.increase_copies) == Some(0) {
                base += self.increase_amount;
            }
        }
        (current, size)
    }

    /// Running base used for the hole at `loop_index`
    pub fn base_at(&self, nominal: f64, loop_index: u32) -> f64 {
        self.iterate(nominal, loop_index).0
    }

    /// Size cut for the hole at `loop_index`
    pub fn resolve(&self, nominal: f64, loop_index: u32, bounds: SizeBounds) -> f64 {
        bounds.clamp(self.iterate(nominal, loop_index).1)
    }
}

/// How nominal hole sizes turn into cut sizes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SizePolicy {
    /// Cut the nominal size
    #[default]
    Identity,
    /// Add a margin and grow across the grid
    MarginGrowth(MarginGrowth),
}

impl SizePolicy {
    /// Size cut for a nominal size at a grid cell
    pub fn resolve(&self, nominal: f64, cell: &GridCell, bounds: SizeBounds) -> f64 {
        match self {
            SizePolicy::Identity => nominal,
            SizePolicy::MarginGrowth(growth) => growth.resolve(nominal, cell.loop_index, bounds),
        }
    }

    /// Absolute bounds derived from an optional limit shape
    pub fn bounds_for(&self, limit: Option<&HoleSpec>, settings: &BuildSettings) -> SizeBounds {
        match (self, limit) {
            (SizePolicy::MarginGrowth(growth), Some(limit)) => {
                SizeBounds::from_limit(limit.max_footprint(settings), growth.blend.normal)
            }
            _ => SizeBounds::UNBOUNDED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn drill_growth() -> MarginGrowth {
        MarginGrowth {
            increase_amount: 0.5,
            increase_copies: 1,
            increase_loop_after: 20,
            min_size: 0.5,
            max_size: 10.0,
            blend: MarginBlend::default(),
        }
    }

    #[test]
    fn test_margin_blend_endpoints() {
        let blend = MarginBlend::default();
        assert_relative_eq!(blend.margin(0.5), 0.6);
        assert_relative_eq!(blend.margin(1.6), 0.6);
        assert_relative_eq!(blend.margin(2.25), 0.4);
        assert_relative_eq!(blend.margin(10.0), 0.4);
        assert_relative_eq!(blend.margin(1.925), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_margin_blend_is_continuous() {
        let blend = MarginBlend::default();
        let eps = 1e-7;
        for edge in [1.6, 2.25] {
            let below = (edge - eps) + blend.margin(edge - eps);
            let above = (edge + eps) + blend.margin(edge + eps);
            assert!((above - below).abs() < 10.0 * eps);
        }
    }

    #[test]
    fn test_degenerate_band_steps() {
        let blend = MarginBlend {
            low: 2.0,
            high: 2.0,
            ..MarginBlend::default()
        };
        assert_eq!(blend.margin(1.99), 0.6);
        assert_eq!(blend.margin(2.0), 0.4);
    }

    #[test]
    fn test_growth_sequence() {
        let growth = drill_growth();
        let bounds = SizeBounds::from_limit(10.0, 0.4);
        let sizes: Vec<f64> = (0..20).map(|k| growth.resolve(0.5, k, bounds)).collect();

        assert_relative_eq!(sizes[0], 1.1);
        assert_relative_eq!(sizes[19], 10.4);
        for pair in sizes.windows(2) {
            assert!(pair[1] > pair[0], "{:?}", pair);
        }
        // the base restarts after 20 holes
        assert_relative_eq!(growth.resolve(0.5, 20, bounds), 1.1);
    }

    #[test]
    fn test_base_resets_every_loop() {
        let growth = MarginGrowth {
            increase_loop_after: 7,
            ..drill_growth()
        };
        let mut previous = f64::MIN;
        for k in 0..20 {
            let base = growth.base_at(0.5, k);
            if k % 7 == 0 {
                assert_eq!(base, 0.5);
            } else {
                assert!(base >= previous);
                assert_relative_eq!(base, 0.5 + 0.5 * f64::from(k % 7));
            }
            previous = base;
        }
    }

    #[test]
    fn test_zero_periods_never_fire() {
        let frozen = MarginGrowth {
            increase_copies: 0,
            ..drill_growth()
        };
        assert_eq!(frozen.base_at(3.0, 15), 3.0);

        let endless = MarginGrowth {
            increase_loop_after: 0,
            ..drill_growth()
        };
        assert_relative_eq!(endless.base_at(0.5, 30), 15.5);
        // growth clamp keeps the cut at max plus margin
        assert_relative_eq!(endless.resolve(0.5, 30, SizeBounds::UNBOUNDED), 10.4);
    }

    #[test]
    fn test_inverted_bounds_yield_min() {
        let growth = MarginGrowth {
            min_size: 5.0,
            max_size: 2.0,
            increase_amount: 0.0,
            ..drill_growth()
        };
        assert_relative_eq!(growth.resolve(3.0, 0, SizeBounds::UNBOUNDED), 5.4);
        assert_eq!(SizeBounds::new(4.0, 1.0).clamp(2.0), 4.0);
    }

    #[test]
    fn test_absolute_bounds_clamp_result() {
        let growth = drill_growth();
        let tight = SizeBounds::new(0.0, 3.0);
        assert_relative_eq!(growth.resolve(0.5, 19, tight), 3.0);
    }

    #[test]
    fn test_identity_ignores_cell() {
        let cell = GridCell {
            ix: 3,
            iy: 2,
            loop_index: 13,
            position: glam::DVec2::ZERO,
        };
        assert_eq!(
            SizePolicy::Identity.resolve(14.4, &cell, SizeBounds::new(0.0, 1.0)),
            14.4
        );
    }
}
