//! Face and edge selection
//!
//! Selectors follow the string selectors of common B-rep scripting tools:
//! `>Z` picks the faces furthest along +Z, `>Z[-2]` picks the second-highest
//! layer of faces parallel to the XY plane.

use std::collections::HashSet;
use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::traits::{CadError, CadKernel, CadResult, EdgeId, EdgeInfo, FaceInfo, Solid};

/// Distance along the axis within which face centers share a layer
const CLUSTER_TOLERANCE: f64 = 1e-4;

/// Maximum deviation of |normal . axis| from one for a face to count as parallel
const PARALLEL_TOLERANCE: f64 = 1e-6;

/// A world axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector along the axis
    pub fn unit(self) -> DVec3 {
        match self {
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
        }
    }

    fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

/// Selects faces of a solid by their position along an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceSelector {
    /// Faces whose centers lie furthest along the axis (`>Z`)
    Max(Axis),
    /// Faces parallel to the axis' normal plane, grouped into layers by
    /// position and ordered ascending; the index counts from the end when
    /// negative (`>Z[-2]`)
    Nth { axis: Axis, index: i32 },
}

impl fmt::Display for FaceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceSelector::Max(axis) => write!(f, ">{}", axis.letter()),
            FaceSelector::Nth { axis, index } => write!(f, ">{}[{}]", axis.letter(), index),
        }
    }
}

impl FaceSelector {
    /// Apply the selector to a list of faces
    pub fn select(&self, faces: &[FaceInfo]) -> Vec<FaceInfo> {
        match *self {
            FaceSelector::Max(axis) => {
                let dir = axis.unit();
                let Some(max) = faces
                    .iter()
                    .map(|f| f.center.dot(dir))
                    .reduce(f64::max)
                else {
                    return Vec::new();
                };
                faces
                    .iter()
                    .filter(|f| f.center.dot(dir) >= max - CLUSTER_TOLERANCE)
                    .cloned()
                    .collect()
            }
            FaceSelector::Nth { axis, index } => {
                let dir = axis.unit();
                let mut parallel: Vec<&FaceInfo> = faces
                    .iter()
                    .filter(|f| (f.normal.dot(dir).abs() - 1.0).abs() <= PARALLEL_TOLERANCE)
                    .collect();
                parallel.sort_by(|a, b| a.center.dot(dir).total_cmp(&b.center.dot(dir)));

                let mut layers: Vec<Vec<&FaceInfo>> = Vec::new();
                let mut layer_key = f64::NEG_INFINITY;
                for face in parallel {
                    let key = face.center.dot(dir);
                    if key - layer_key > CLUSTER_TOLERANCE {
                        layer_key = key;
                        layers.push(vec![face]);
                    } else if let Some(layer) = layers.last_mut() {
                        layer.push(face);
                    }
                }

                let count = layers.len() as i64;
                let position = if index < 0 {
                    count + i64::from(index)
                } else {
                    i64::from(index)
                };
                if position < 0 || position >= count {
                    return Vec::new();
                }
                layers
                    .swap_remove(position as usize)
                    .into_iter()
                    .cloned()
                    .collect()
            }
        }
    }
}

/// Which edges of the selected faces to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeFilter {
    /// Every boundary edge
    #[default]
    All,
    /// Straight line edges only
    Straight,
}

/// Select faces of `solid`, failing when nothing matches
pub fn select_faces(
    kernel: &dyn CadKernel,
    solid: &Solid,
    selector: FaceSelector,
) -> CadResult<Vec<FaceInfo>> {
    let faces = kernel.get_faces(solid)?;
    let selected = selector.select(&faces);
    if selected.is_empty() {
        return Err(CadError::FaceNotFound(selector.to_string()));
    }
    tracing::trace!(
        "Selector {} matched {} of {} faces",
        selector,
        selected.len(),
        faces.len()
    );
    Ok(selected)
}

/// Collect the boundary edges of `faces`, each edge once
pub fn select_edges(
    kernel: &dyn CadKernel,
    solid: &Solid,
    faces: &[FaceInfo],
    filter: EdgeFilter,
) -> CadResult<Vec<EdgeInfo>> {
    let mut seen: HashSet<EdgeId> = HashSet::new();
    let mut edges = Vec::new();
    for face in faces {
        for edge in kernel.get_face_edges(solid, face.id)? {
            if filter == EdgeFilter::Straight && !edge.is_straight() {
                continue;
            }
            if seen.insert(edge.id) {
                edges.push(edge);
            }
        }
    }
    Ok(edges)
}
