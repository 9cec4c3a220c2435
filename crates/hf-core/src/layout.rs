//! Grid placement of holes inside a padded container
//!
//! Along each axis the holes are spread evenly between the padded edges of
//! the container. A reserved band takes space away from one side of an axis,
//! pushing the grid towards the other side.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::holder::Holder;
use crate::settings::BuildSettings;

/// In-plane axis of the working face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanarAxis {
    X,
    Y,
}

impl PlanarAxis {
    pub const ALL: [PlanarAxis; 2] = [PlanarAxis::X, PlanarAxis::Y];
}

/// A value per in-plane axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerAxis<T> {
    pub x: T,
    pub y: T,
}

impl<T: Copy> PerAxis<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Same value on both axes
    pub fn splat(value: T) -> Self {
        Self { x: value, y: value }
    }

    pub fn get(&self, axis: PlanarAxis) -> T {
        match axis {
            PlanarAxis::X => self.x,
            PlanarAxis::Y => self.y,
        }
    }
}

/// Placement of holes along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLayout {
    /// Position of the first hole center
    pub start: f64,
    /// Distance between adjacent hole centers
    pub pitch: f64,
    /// Number of holes
    pub count: u32,
}

impl AxisLayout {
    /// Lay out `count` holes of footprint `footprint` across `size`
    ///
    /// `padding` is the full padding on each side and `band` the reserved
    /// band (zero when the axis has none). A single hole is centered.
    pub fn new(size: f64, padding: f64, footprint: f64, count: u32, band: f64) -> Self {
        let span = size - 2.0 * padding - band / 2.0 - footprint;
        if count <= 1 {
            return Self {
                start: 0.0,
                pitch: span,
                count,
            };
        }

        Self {
            start: -(size - band) / 2.0 + footprint / 2.0 + padding,
            pitch: span / f64::from(count - 1),
            count,
        }
    }

    /// Center of the hole at `index`
    pub fn position(&self, index: u32) -> f64 {
        self.start + f64::from(index) * self.pitch
    }

    /// Center of the last hole
    pub fn last(&self) -> f64 {
        self.position(self.count.saturating_sub(1))
    }
}

/// One hole position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub ix: u32,
    pub iy: u32,
    /// Row-major sequence number, `iy * count_x + ix`
    pub loop_index: u32,
    /// Hole center on the working face
    pub position: DVec2,
}

/// Placement of an N x M grid of holes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub x: AxisLayout,
    pub y: AxisLayout,
}

impl GridLayout {
    pub fn new(x: AxisLayout, y: AxisLayout) -> Self {
        Self { x, y }
    }

    /// Compute the layout of a holder's holes on its container
    pub fn for_holder(holder: &Holder, settings: &BuildSettings) -> Self {
        let axis = |axis: PlanarAxis| {
            let size = settings.grid_pitch * f64::from(holder.container.cells.get(axis));
            let padding = settings.structural_padding + holder.padding.get(axis);
            let footprint = holder.hole.footprint_along(axis, settings);
            let band = holder
                .reserved_band
                .filter(|band| band.axis == axis)
                .map_or(0.0, |band| band.size);
            AxisLayout::new(size, padding, footprint, holder.hole_count.get(axis), band)
        };
        Self::new(axis(PlanarAxis::X), axis(PlanarAxis::Y))
    }

    pub fn axis(&self, axis: PlanarAxis) -> &AxisLayout {
        match axis {
            PlanarAxis::X => &self.x,
            PlanarAxis::Y => &self.y,
        }
    }

    pub fn start(&self, axis: PlanarAxis) -> f64 {
        self.axis(axis).start
    }

    pub fn pitch(&self, axis: PlanarAxis) -> f64 {
        self.axis(axis).pitch
    }

    /// Number of holes in the grid
    pub fn len(&self) -> usize {
        self.x.count as usize * self.y.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.y.count).flat_map(move |iy| {
            (0..self.x.count).map(move |ix| GridCell {
                ix,
                iy,
                loop_index: iy * self.x.count + ix,
                position: DVec2::new(self.x.position(ix), self.y.position(iy)),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mirror_symmetry() {
        let cases = [
            (84.0, 8.95, 0.5, 5, 0.0),
            (168.0, 8.95, 0.5, 4, 12.0),
            (84.0, 4.95, 14.4, 4, 0.0),
            (42.0, 3.25, 15.6, 2, 0.0),
            (126.0, 2.95, 11.547, 7, 30.0),
        ];
        for (size, padding, footprint, count, band) in cases {
            let layout = AxisLayout::new(size, padding, footprint, count, band);
            assert_relative_eq!(
                layout.last(),
                size / 2.0 - padding - footprint / 2.0,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_single_hole_is_centered() {
        for (size, padding, footprint) in [(42.0, 2.95, 10.0), (84.0, 20.0, 1.0), (10.0, 0.0, 30.0)]
        {
            let layout = AxisLayout::new(size, padding, footprint, 1, 12.0);
            assert_eq!(layout.start, 0.0);
            assert_eq!(layout.position(0), 0.0);
        }
    }

    #[test]
    fn test_reserved_band_shifts_start() {
        let plain = AxisLayout::new(84.0, 4.0, 6.0, 3, 0.0);
        let banded = AxisLayout::new(84.0, 4.0, 6.0, 3, 12.0);
        assert_relative_eq!(banded.start - plain.start, 6.0);
        assert_relative_eq!(banded.last(), plain.last());
    }

    #[test]
    fn test_cells_row_major() {
        let layout = GridLayout::new(
            AxisLayout::new(84.0, 3.0, 2.0, 3, 0.0),
            AxisLayout::new(42.0, 3.0, 2.0, 2, 0.0),
        );
        let cells: Vec<GridCell> = layout.cells().collect();
        assert_eq!(cells.len(), layout.len());
        assert_eq!(cells.len(), 6);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.loop_index as usize, i);
            assert_eq!(cell.loop_index, cell.iy * 3 + cell.ix);
        }
        assert_eq!((cells[3].ix, cells[3].iy), (0, 1));
        assert_relative_eq!(cells[5].position.x, layout.x.last());
        assert_relative_eq!(cells[5].position.y, layout.y.last());
    }
}
