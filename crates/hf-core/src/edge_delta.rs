//! Edge snapshots and the edges a cut introduced
//!
//! Kernels renumber edges whenever a solid changes, so edges are matched by
//! a quantized geometric signature rather than by id.

use std::collections::BTreeMap;

use glam::DVec3;
use hf_cad::{
    CadKernel, CadResult, EdgeFilter, EdgeId, EdgeInfo, FaceSelector, Solid, select_edges,
    select_faces,
};

/// Coordinate precision of edge signatures (multiply by this, then round)
const SIGNATURE_PRECISION: f64 = 10000.0;

/// Direction-independent geometric identity of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeSignature {
    ends: [[i64; 3]; 2],
    midpoint: [i64; 3],
}

impl EdgeSignature {
    pub fn of(edge: &EdgeInfo) -> Self {
        let a = quantize(edge.start);
        let b = quantize(edge.end);
        Self {
            ends: if a <= b { [a, b] } else { [b, a] },
            midpoint: quantize(edge.midpoint),
        }
    }
}

fn quantize(p: DVec3) -> [i64; 3] {
    [
        (p.x * SIGNATURE_PRECISION).round() as i64,
        (p.y * SIGNATURE_PRECISION).round() as i64,
        (p.z * SIGNATURE_PRECISION).round() as i64,
    ]
}

/// A set of edges keyed by signature
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: BTreeMap<EdgeSignature, EdgeInfo>,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boundary edges of the faces matched by `selector`
    pub fn snapshot(
        kernel: &dyn CadKernel,
        solid: &Solid,
        selector: FaceSelector,
    ) -> CadResult<Self> {
        let faces = select_faces(kernel, solid, selector)?;
        let edges = select_edges(kernel, solid, &faces, EdgeFilter::All)?;
        Ok(edges.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, edge: &EdgeInfo) -> bool {
        self.edges.contains_key(&EdgeSignature::of(edge))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EdgeInfo> {
        self.edges.values()
    }

    /// Kernel ids of the edges, in signature order
    pub fn ids(&self) -> Vec<EdgeId> {
        self.edges.values().map(|e| e.id).collect()
    }

    /// Keep only straight edges
    pub fn straight(&self) -> Self {
        self.iter().filter(|e| e.is_straight()).cloned().collect()
    }
}

impl FromIterator<EdgeInfo> for EdgeSet {
    fn from_iter<I: IntoIterator<Item = EdgeInfo>>(iter: I) -> Self {
        Self {
            edges: iter
                .into_iter()
                .map(|edge| (EdgeSignature::of(&edge), edge))
                .collect(),
        }
    }
}

/// Edges of `after` with no match in `before`
///
/// The returned edges carry the ids of the solid `after` was taken from.
pub fn new_edges(before: &EdgeSet, after: &EdgeSet) -> EdgeSet {
    EdgeSet {
        edges: after
            .edges
            .iter()
            .filter(|(signature, _)| !before.edges.contains_key(signature))
            .map(|(signature, edge)| (*signature, edge.clone()))
            .collect(),
    }
}
