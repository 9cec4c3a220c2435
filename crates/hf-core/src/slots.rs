//! Holders with freely placed rectangular slots
//!
//! Slots are cut in groups. Each group is compared against a snapshot of
//! the working face taken before its cuts, so a group only chamfers the rim
//! it introduced.

use glam::DVec2;
use hf_cad::EdgeInfo;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::container::ContainerSpec;
use crate::error::ConfigError;
use crate::export::file_stem;
use crate::holder::LipRemoval;
use crate::layout::PerAxis;

/// Distance within which an edge counts as lying on a slot side (mm)
const SIDE_TOLERANCE: f64 = 1e-6;

/// One side of a slot rim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    MinX,
    MaxX,
    MinY,
    MaxY,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::MinY, Side::MaxY, Side::MinX, Side::MaxX];
}

/// Chamfer size per rim side; zero leaves a side sharp
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideChamfers {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl SideChamfers {
    pub fn uniform(size: f64) -> Self {
        Self::per_axis(size, size)
    }

    /// `x` on the sides facing along X, `y` on the sides facing along Y
    pub fn per_axis(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::MinX => self.min_x,
            Side::MaxX => self.max_x,
            Side::MinY => self.min_y,
            Side::MaxY => self.max_y,
        }
    }

    pub fn largest(&self) -> f64 {
        Side::ALL.iter().map(|s| self.get(*s)).fold(0.0, f64::max)
    }

    /// Chamfer passes: each distinct non-zero size with the sides it applies to
    pub fn passes(&self) -> Vec<(f64, Vec<Side>)> {
        let mut passes: Vec<(f64, Vec<Side>)> = Vec::new();
        for side in Side::ALL {
            let size = self.get(side);
            if size <= 0.0 {
                continue;
            }
            match passes.iter_mut().find(|(s, _)| *s == size) {
                Some((_, sides)) => sides.push(side),
                None => passes.push((size, vec![side])),
            }
        }
        passes
    }
}

/// A rectangular slot cut straight down from the working face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// Center relative to the container center (mm)
    pub center: PerAxis<f64>,
    /// Extent along X and Y (mm)
    pub size: PerAxis<f64>,
    /// Depth below the working face (mm)
    pub depth: f64,
}

impl Slot {
    pub fn new(x: f64, y: f64, width: f64, length: f64, depth: f64) -> Self {
        Self {
            center: PerAxis::new(x, y),
            size: PerAxis::new(width, length),
            depth,
        }
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.center.x, self.center.y)
    }

    /// Side of this slot's rim an edge lies on
    ///
    /// `reach` widens the match outward, for rims already moved by a chamfer.
    pub fn side_of(&self, edge: &EdgeInfo, reach: f64) -> Option<Side> {
        if !edge.is_straight() {
            return None;
        }
        let dir = (edge.end - edge.start).truncate();
        let mid = edge.midpoint.truncate() - self.center();
        let half = DVec2::new(self.size.x, self.size.y) / 2.0;
        let slack = reach + SIDE_TOLERANCE;

        if dir.x.abs() <= SIDE_TOLERANCE {
            let on_side = (mid.x.abs() - half.x).abs() <= slack;
            if on_side && mid.y.abs() <= half.y + slack {
                return Some(if mid.x < 0.0 { Side::MinX } else { Side::MaxX });
            }
        } else if dir.y.abs() <= SIDE_TOLERANCE {
            let on_side = (mid.y.abs() - half.y).abs() <= slack;
            if on_side && mid.x.abs() <= half.x + slack {
                return Some(if mid.y < 0.0 { Side::MinY } else { Side::MaxY });
            }
        }
        None
    }
}

/// Slots cut together and chamfered against one edge snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotGroup {
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub chamfer: SideChamfers,
}

impl SlotGroup {
    pub fn new(slots: Vec<Slot>, chamfer: SideChamfers) -> Self {
        Self { slots, chamfer }
    }

    /// Side of any slot in the group the edge belongs to
    pub fn side_of(&self, edge: &EdgeInfo) -> Option<Side> {
        let reach = self.chamfer.largest();
        self.slots.iter().find_map(|slot| slot.side_of(edge, reach))
    }
}

/// A holder whose cuts are placed by hand rather than on a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotHolder {
    pub name: String,
    pub version: Version,
    pub container: ContainerSpec,
    /// Cut in order
    pub groups: Vec<SlotGroup>,
    #[serde(default)]
    pub lip_removal: Option<LipRemoval>,
}

impl SlotHolder {
    pub fn new(name: impl Into<String>, version: Version, container: ContainerSpec) -> Self {
        Self {
            name: name.into(),
            version,
            container,
            groups: Vec::new(),
            lip_removal: None,
        }
    }

    pub fn with_group(mut self, slots: Vec<Slot>, chamfer: SideChamfers) -> Self {
        self.groups.push(SlotGroup::new(slots, chamfer));
        self
    }

    pub fn with_lip_removal(mut self, lip: LipRemoval) -> Self {
        self.lip_removal = Some(lip);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.container.validate()?;
        if self.groups.is_empty() {
            return Err(ConfigError::ZeroCount { field: "groups" });
        }
        for group in &self.groups {
            if group.slots.is_empty() {
                return Err(ConfigError::ZeroCount { field: "slots" });
            }
            for slot in &group.slots {
                for (field, value) in [
                    ("slot.size.x", slot.size.x),
                    ("slot.size.y", slot.size.y),
                    ("slot.depth", slot.depth),
                ] {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(ConfigError::NonPositive { field, value });
                    }
                }
            }
            for side in Side::ALL {
                let size = group.chamfer.get(side);
                if !(size.is_finite() && size >= 0.0) {
                    return Err(ConfigError::Negative {
                        field: "chamfer",
                        value: size,
                    });
                }
            }
        }
        if let Some(lip) = &self.lip_removal {
            for (field, value) in [
                ("lip_removal.upper_size", lip.upper_size),
                ("lip_removal.fillet", lip.fillet),
            ] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ConfigError::Negative { field, value });
                }
            }
        }
        Ok(())
    }

    /// Output file name without extension
    pub fn file_stem(&self) -> String {
        file_stem(&self.name, &self.version, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use hf_cad::EdgeId;
    use uuid::Uuid;

    fn edge(start: (f64, f64), end: (f64, f64)) -> EdgeInfo {
        EdgeInfo::line(
            EdgeId::new(Uuid::nil(), 0),
            DVec3::new(start.0, start.1, 10.0),
            DVec3::new(end.0, end.1, 10.0),
        )
    }

    #[test]
    fn test_side_classification() {
        let slot = Slot::new(10.0, 0.0, 2.0, 20.0, 5.0);
        assert_eq!(slot.side_of(&edge((9.0, -10.0), (9.0, 10.0)), 0.0), Some(Side::MinX));
        assert_eq!(slot.side_of(&edge((11.0, 4.0), (11.0, 2.0)), 0.0), Some(Side::MaxX));
        assert_eq!(slot.side_of(&edge((9.0, -10.0), (11.0, -10.0)), 0.0), Some(Side::MinY));
        assert_eq!(slot.side_of(&edge((9.0, 10.0), (11.0, 10.0)), 0.0), Some(Side::MaxY));

        // a rim moved outward by a chamfer still matches within reach
        let moved = edge((8.0, -10.0), (8.0, 10.0));
        assert_eq!(slot.side_of(&moved, 0.0), None);
        assert_eq!(slot.side_of(&moved, 1.0), Some(Side::MinX));

        assert_eq!(slot.side_of(&edge((0.0, 0.0), (1.0, 1.0)), 1.0), None);
        assert_eq!(slot.side_of(&edge((-9.0, -10.0), (-9.0, 10.0)), 0.0), None);
    }

    #[test]
    fn test_chamfer_passes_group_equal_sizes() {
        assert_eq!(
            SideChamfers::uniform(3.0).passes(),
            vec![(3.0, Side::ALL.to_vec())]
        );
        assert_eq!(
            SideChamfers::per_axis(1.0, 2.5).passes(),
            vec![
                (2.5, vec![Side::MinY, Side::MaxY]),
                (1.0, vec![Side::MinX, Side::MaxX]),
            ]
        );
        let one_side = SideChamfers {
            max_x: 0.5,
            ..SideChamfers::default()
        };
        assert_eq!(one_side.passes(), vec![(0.5, vec![Side::MaxX])]);
        assert!(SideChamfers::default().passes().is_empty());
    }

    #[test]
    fn test_invalid_slot_holders() {
        let container = ContainerSpec::new(1, 1, 5.0, 0.5);
        let empty = SlotHolder::new("empty", Version::new(1, 0, 0), container);
        assert_eq!(
            empty.validate(),
            Err(ConfigError::ZeroCount { field: "groups" })
        );

        let flat = empty
            .clone()
            .with_group(vec![Slot::new(0.0, 0.0, 2.0, 2.0, 0.0)], SideChamfers::default());
        assert!(matches!(
            flat.validate(),
            Err(ConfigError::NonPositive {
                field: "slot.depth",
                ..
            })
        ));

        let bad_chamfer = empty.clone().with_group(
            vec![Slot::new(0.0, 0.0, 2.0, 2.0, 3.0)],
            SideChamfers::per_axis(-1.0, 0.0),
        );
        assert!(bad_chamfer.validate().is_err());

        let good = empty.with_group(
            vec![Slot::new(0.0, 0.0, 2.0, 2.0, 3.0)],
            SideChamfers::uniform(0.5),
        );
        assert!(good.validate().is_ok());
        assert_eq!(good.file_stem(), "empty v1.0.0");
    }

    #[test]
    fn test_slot_holder_ron() {
        let text = r#"(
            name: "cards",
            version: "1.0.0",
            container: (cells: (x: 1, y: 2), cell_height: 5.0, fill_ratio: 0.7),
            groups: [
                (
                    slots: [(center: (x: 5.0, y: 0.0), size: (x: 2.5, y: 60.0), depth: 20.0)],
                    chamfer: (min_y: 2.5, max_y: 2.5),
                ),
            ],
        )"#;
        let holder: SlotHolder = ron::from_str(text).unwrap();
        assert_eq!(holder.groups[0].chamfer, SideChamfers::per_axis(0.0, 2.5));
        assert!(holder.lip_removal.is_none());
        assert!(holder.validate().is_ok());
    }
}
