//! 2.5D Preview Kernel
//!
//! A lightweight kernel for solids built from prisms extruded along Z. Solids
//! are kept as boolean trees and evaluated on demand by point membership.
//! Only horizontal faces are reported, which is enough to lay out and inspect
//! holders: top and fill surfaces, hole floors, cut outlines.
//!
//! Fillets and chamfers are recorded against the edges they were applied to
//! but do not alter the evaluated shape.
//!
//! Tessellation produces a triangle soup: horizontal faces are split into
//! trapezoids along X and every wall piece between two face levels becomes
//! a quad. Adjacent pieces may meet at T-junctions.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use glam::{DVec2, DVec3};
use parking_lot::Mutex;
use uuid::Uuid;

use super::traits::{
    BooleanType, CadError, CadKernel, CadResult, EdgeId, EdgeInfo, FaceId, FaceInfo, Solid,
    StepExportOptions, TessellatedMesh, Wire2D, Workplane,
};

/// Offset of membership samples from an edge or a face level
const NUDGE: f64 = 1e-6;

/// Face levels closer than this are merged
const LEVEL_TOLERANCE: f64 = 1e-9;

/// Shortest segment piece kept after splitting
const MIN_PIECE: f64 = 1e-9;

/// Quantization used to identify edges by their endpoints
const KEY_PRECISION: f64 = 10000.0;

/// Kind of finishing operation applied to a set of edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishKind {
    Fillet,
    Chamfer,
}

/// A fillet or chamfer recorded by the preview kernel
#[derive(Debug, Clone, PartialEq)]
pub struct FinishRecord {
    pub kind: FinishKind,
    /// Fillet radius or chamfer distance
    pub size: f64,
    /// The edges the operation was applied to
    pub edges: Vec<EdgeInfo>,
}

#[derive(Debug)]
struct Prism {
    outline: Vec<DVec2>,
    z_min: f64,
    z_max: f64,
}

impl Prism {
    fn contains(&self, p: DVec3) -> bool {
        p.z > self.z_min && p.z < self.z_max && polygon_contains(&self.outline, p.truncate())
    }

    fn spans(&self, level: f64) -> bool {
        level >= self.z_min - LEVEL_TOLERANCE && level <= self.z_max + LEVEL_TOLERANCE
    }

    fn segments(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let n = self.outline.len();
        (0..n).map(move |i| (self.outline[i], self.outline[(i + 1) % n]))
    }
}

#[derive(Debug)]
enum Node {
    Prism(Prism),
    Boolean {
        op: BooleanType,
        a: Arc<Node>,
        b: Arc<Node>,
    },
    Finish {
        base: Arc<Node>,
        record: FinishRecord,
    },
}

impl Node {
    fn contains(&self, p: DVec3) -> bool {
        match self {
            Node::Prism(prism) => prism.contains(p),
            Node::Boolean { op, a, b } => match op {
                BooleanType::Union => a.contains(p) || b.contains(p),
                BooleanType::Subtract => a.contains(p) && !b.contains(p),
                BooleanType::Intersect => a.contains(p) && b.contains(p),
            },
            Node::Finish { base, .. } => base.contains(p),
        }
    }

    fn collect_prisms<'a>(&'a self, out: &mut Vec<&'a Prism>) {
        match self {
            Node::Prism(prism) => out.push(prism),
            Node::Boolean { a, b, .. } => {
                a.collect_prisms(out);
                b.collect_prisms(out);
            }
            Node::Finish { base, .. } => base.collect_prisms(out),
        }
    }

    fn collect_finishes(&self, out: &mut Vec<FinishRecord>) {
        match self {
            Node::Prism(_) => {}
            Node::Boolean { a, b, .. } => {
                a.collect_finishes(out);
                b.collect_finishes(out);
            }
            Node::Finish { base, record } => {
                base.collect_finishes(out);
                out.push(record.clone());
            }
        }
    }
}

/// Undirected, quantized identity of a horizontal segment
type SegmentKey = ([i64; 3], [i64; 3]);

fn segment_key(a: DVec3, b: DVec3) -> SegmentKey {
    let qa = quantize(a);
    let qb = quantize(b);
    if qa <= qb { (qa, qb) } else { (qb, qa) }
}

fn quantize(p: DVec3) -> [i64; 3] {
    [
        (p.x * KEY_PRECISION).round() as i64,
        (p.y * KEY_PRECISION).round() as i64,
        (p.z * KEY_PRECISION).round() as i64,
    ]
}

#[derive(Debug)]
struct TopoFace {
    normal: DVec3,
    level: f64,
    edges: Vec<usize>,
}

#[derive(Debug, Default)]
struct Topology {
    faces: Vec<TopoFace>,
    edges: Vec<(DVec3, DVec3)>,
    keys: HashMap<SegmentKey, usize>,
}

impl Topology {
    fn intern(&mut self, a: DVec3, b: DVec3) -> usize {
        let key = segment_key(a, b);
        if let Some(index) = self.keys.get(&key) {
            return *index;
        }
        let index = self.edges.len();
        self.edges.push((a, b));
        self.keys.insert(key, index);
        index
    }

    fn evaluate(node: &Node) -> Self {
        let mut prisms = Vec::new();
        node.collect_prisms(&mut prisms);

        let mut topology = Topology::default();
        let mut up_faces = Vec::new();
        let mut down_faces = Vec::new();

        for level in face_levels(&prisms).into_iter().rev() {
            let spanning = prisms.iter().copied().filter(|p| p.spans(level));
            let candidates = unique_segments(spanning, level);

            let mut up_edges = Vec::new();
            let mut down_edges = Vec::new();
            let mut seen_pieces = HashSet::new();

            for (a, b) in split_segments(&candidates) {
                if !seen_pieces.insert(segment_key(a.extend(level), b.extend(level))) {
                    continue;
                }
                let mid = (a + b) * 0.5;
                let side = (b - a).perp().normalize() * NUDGE;
                let left = mid + side;
                let right = mid - side;

                let below = |s: DVec2| node.contains(s.extend(level - NUDGE));
                let above = |s: DVec2| node.contains(s.extend(level + NUDGE));
                let up = |s: DVec2| below(s) && !above(s);
                let down = |s: DVec2| !below(s) && above(s);

                if up(left) != up(right) {
                    up_edges.push(topology.intern(a.extend(level), b.extend(level)));
                }
                if down(left) != down(right) {
                    down_edges.push(topology.intern(a.extend(level), b.extend(level)));
                }
            }

            if !up_edges.is_empty() {
                up_faces.push(TopoFace {
                    normal: DVec3::Z,
                    level,
                    edges: up_edges,
                });
            }
            if !down_edges.is_empty() {
                down_faces.push(TopoFace {
                    normal: DVec3::NEG_Z,
                    level,
                    edges: down_edges,
                });
            }
        }

        topology.faces = up_faces;
        topology.faces.append(&mut down_faces);
        topology
    }

    fn edge_info(&self, solid_id: Uuid, index: usize) -> EdgeInfo {
        let (start, end) = self.edges[index];
        EdgeInfo::line(EdgeId::new(solid_id, index as u32), start, end)
    }

    fn face_info(&self, solid_id: Uuid, index: usize) -> FaceInfo {
        let face = &self.faces[index];
        let sum: DVec3 = face
            .edges
            .iter()
            .map(|e| (self.edges[*e].0 + self.edges[*e].1) * 0.5)
            .sum();
        let center = sum / face.edges.len().max(1) as f64;
        FaceInfo::new(FaceId::new(solid_id, index as u32), center, face.normal, 0.0)
    }

    /// Sorted signatures of every face edge, tagged with the face direction
    fn signature(&self) -> Vec<(bool, SegmentKey)> {
        let mut signature: Vec<(bool, SegmentKey)> = self
            .faces
            .iter()
            .flat_map(|face| {
                let up = face.normal.z > 0.0;
                face.edges.iter().map(move |e| {
                    let (a, b) = self.edges[*e];
                    (up, segment_key(a, b))
                })
            })
            .collect();
        signature.sort();
        signature.dedup();
        signature
    }
}

/// Distinct Z levels of prism caps, ascending
fn face_levels(prisms: &[&Prism]) -> Vec<f64> {
    let mut levels: Vec<f64> = prisms.iter().flat_map(|p| [p.z_min, p.z_max]).collect();
    levels.sort_by(|a, b| a.total_cmp(b));
    levels.dedup_by(|a, b| (*a - *b).abs() <= LEVEL_TOLERANCE);
    levels
}

/// Outline segments of `prisms`, each distinct segment once
fn unique_segments<'a>(
    prisms: impl Iterator<Item = &'a Prism>,
    level: f64,
) -> Vec<(DVec2, DVec2)> {
    let mut seen = HashSet::new();
    prisms
        .flat_map(|p| p.segments())
        .filter(|(a, b)| seen.insert(segment_key(a.extend(level), b.extend(level))))
        .collect()
}

/// Triangle soup with one normal per corner
#[derive(Default)]
struct MeshBuilder {
    mesh: TessellatedMesh,
}

impl MeshBuilder {
    fn triangle(&mut self, corners: [DVec3; 3], normal: DVec3) {
        let area = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .length();
        if area <= MIN_PIECE * MIN_PIECE {
            return;
        }
        for corner in corners {
            self.mesh.indices.push(self.mesh.vertices.len() as u32);
            self.mesh.vertices.push(corner.as_vec3().to_array());
            self.mesh.normals.push(normal.as_vec3().to_array());
        }
    }

    /// Two triangles, corners counter-clockwise seen from the normal side
    fn quad(&mut self, [a, b, c, d]: [DVec3; 4], normal: DVec3) {
        self.triangle([a, b, c], normal);
        self.triangle([a, c, d], normal);
    }
}

/// Split the region bounded by `boundary` into X-aligned trapezoids
///
/// The boundary pieces must not cross. Each trapezoid is returned counter-
/// clockwise and kept only when `inside` holds at its center.
fn trapezoids(boundary: &[(DVec2, DVec2)], inside: impl Fn(DVec2) -> bool) -> Vec<[DVec2; 4]> {
    let mut xs: Vec<f64> = boundary.iter().flat_map(|(a, b)| [a.x, b.x]).collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.dedup_by(|a, b| (*a - *b).abs() <= MIN_PIECE);

    let mut out = Vec::new();
    for strip in xs.windows(2) {
        let (x0, x1) = (strip[0], strip[1]);
        let mid = (x0 + x1) * 0.5;
        // (y at mid, y at x0, y at x1) of every piece spanning the strip
        let mut crossing: Vec<(f64, f64, f64)> = boundary
            .iter()
            .filter(|(a, b)| a.x.min(b.x) < mid && a.x.max(b.x) > mid)
            .map(|&(a, b)| {
                let y_at = |x: f64| a.y + (x - a.x) / (b.x - a.x) * (b.y - a.y);
                (y_at(mid), y_at(x0), y_at(x1))
            })
            .collect();
        crossing.sort_by(|a, b| a.0.total_cmp(&b.0));

        for pair in crossing.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if inside(DVec2::new(mid, (lo.0 + hi.0) * 0.5)) {
                out.push([
                    DVec2::new(x0, lo.1),
                    DVec2::new(x1, lo.2),
                    DVec2::new(x1, hi.2),
                    DVec2::new(x0, hi.1),
                ]);
            }
        }
    }
    out
}

/// Triangulate the boundary of an evaluated tree
fn tessellate_node(node: &Node, topology: &Topology) -> TessellatedMesh {
    let mut builder = MeshBuilder::default();

    for face in &topology.faces {
        let level = face.level;
        let up = face.normal.z > 0.0;
        let boundary: Vec<(DVec2, DVec2)> = face
            .edges
            .iter()
            .map(|e| {
                let (a, b) = topology.edges[*e];
                (a.truncate(), b.truncate())
            })
            .collect();
        let inside = |s: DVec2| {
            let below = node.contains(s.extend(level - NUDGE));
            let above = node.contains(s.extend(level + NUDGE));
            if up { below && !above } else { !below && above }
        };
        for [p0, p1, p2, p3] in trapezoids(&boundary, inside) {
            if up {
                builder.quad([p0, p1, p2, p3].map(|p| p.extend(level)), DVec3::Z);
            } else {
                builder.quad([p3, p2, p1, p0].map(|p| p.extend(level)), DVec3::NEG_Z);
            }
        }
    }

    let mut prisms = Vec::new();
    node.collect_prisms(&mut prisms);
    for slab in face_levels(&prisms).windows(2) {
        let (lo, hi) = (slab[0], slab[1]);
        let z = (lo + hi) * 0.5;
        let outlines = unique_segments(
            prisms
                .iter()
                .copied()
                .filter(|p| p.z_min <= lo + LEVEL_TOLERANCE && p.z_max >= hi - LEVEL_TOLERANCE),
            z,
        );

        let mut seen = HashSet::new();
        for (a, b) in split_segments(&outlines) {
            if !seen.insert(segment_key(a.extend(z), b.extend(z))) {
                continue;
            }
            let mid = (a + b) * 0.5;
            let side = (b - a).perp().normalize() * NUDGE;
            let left = node.contains((mid + side).extend(z));
            let right = node.contains((mid - side).extend(z));
            if left == right {
                continue;
            }
            // material on the left of a -> b
            let (a, b) = if left { (a, b) } else { (b, a) };
            let d = (b - a).normalize();
            builder.quad(
                [a.extend(lo), b.extend(lo), b.extend(hi), a.extend(hi)],
                DVec3::new(d.y, -d.x, 0.0),
            );
        }
    }

    builder.mesh
}

/// Split every segment at its crossings and overlaps with the others
fn split_segments(segments: &[(DVec2, DVec2)]) -> Vec<(DVec2, DVec2)> {
    let mut pieces = Vec::new();
    for (i, &(p0, p1)) in segments.iter().enumerate() {
        let d = p1 - p0;
        let len_sq = d.length_squared();
        if len_sq <= MIN_PIECE * MIN_PIECE {
            continue;
        }

        let mut params = vec![0.0, 1.0];
        for (j, &(q0, q1)) in segments.iter().enumerate() {
            if i == j {
                continue;
            }
            let e = q1 - q0;
            let w = q0 - p0;
            let denom = d.perp_dot(e);
            if denom.abs() > 1e-12 * len_sq.sqrt() * e.length() {
                let t = w.perp_dot(e) / denom;
                let u = w.perp_dot(d) / denom;
                if t > 0.0 && t < 1.0 && (-1e-12..=1.0 + 1e-12).contains(&u) {
                    params.push(t);
                }
            } else if w.perp_dot(d).abs() <= 1e-9 * len_sq.sqrt() {
                for q in [q0, q1] {
                    let t = (q - p0).dot(d) / len_sq;
                    if t > 0.0 && t < 1.0 {
                        params.push(t);
                    }
                }
            }
        }

        params.sort_by(|a, b| a.total_cmp(b));
        for pair in params.windows(2) {
            let a = p0 + d * pair[0];
            let b = p0 + d * pair[1];
            if a.distance(b) > MIN_PIECE {
                pieces.push((a, b));
            }
        }
    }
    pieces
}

/// Even-odd point in polygon test
fn polygon_contains(outline: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let n = outline.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = outline[i];
        let b = outline[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// 2.5D kernel evaluating boolean trees of Z-aligned prisms
#[derive(Default)]
pub struct PreviewKernel {
    /// Storage for solid trees (keyed by UUID)
    solids: Mutex<HashMap<Uuid, Arc<Node>>>,
    /// Lazily evaluated boundaries
    topologies: Mutex<HashMap<Uuid, Arc<Topology>>>,
}

impl PreviewKernel {
    /// Create a new preview kernel
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return a Solid reference
    fn store_solid(&self, node: Node) -> CadResult<Solid> {
        let id = Uuid::new_v4();
        self.solids.lock().insert(id, Arc::new(node));
        Ok(Solid::new(id).with_kernel_data())
    }

    fn get_node(&self, solid: &Solid) -> CadResult<Arc<Node>> {
        self.solids
            .lock()
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))
    }

    fn topology(&self, solid: &Solid) -> CadResult<Arc<Topology>> {
        if let Some(topology) = self.topologies.lock().get(&solid.id) {
            return Ok(topology.clone());
        }
        let node = self.get_node(solid)?;
        let topology = Arc::new(Topology::evaluate(&node));
        self.topologies.lock().insert(solid.id, topology.clone());
        Ok(topology)
    }

    /// Check whether a point lies strictly inside a solid
    pub fn contains(&self, solid: &Solid, point: DVec3) -> CadResult<bool> {
        Ok(self.get_node(solid)?.contains(point))
    }

    /// Check whether two solids have the same horizontal boundary
    pub fn same_shape(&self, a: &Solid, b: &Solid) -> CadResult<bool> {
        Ok(self.topology(a)?.signature() == self.topology(b)?.signature())
    }

    /// Fillets and chamfers applied to a solid and its operands, oldest first
    pub fn finishes(&self, solid: &Solid) -> CadResult<Vec<FinishRecord>> {
        let mut records = Vec::new();
        self.get_node(solid)?.collect_finishes(&mut records);
        Ok(records)
    }

    fn finish(
        &self,
        solid: &Solid,
        edges: &[EdgeId],
        size: f64,
        kind: FinishKind,
    ) -> CadResult<Solid> {
        if !(size.is_finite() && size > 0.0) {
            return Err(CadError::OperationFailed(format!(
                "{:?} size must be positive, got {}",
                kind, size
            )));
        }
        if edges.is_empty() {
            return Err(CadError::OperationFailed(format!(
                "{:?} needs at least one edge",
                kind
            )));
        }

        let topology = self.topology(solid)?;
        let infos = edges
            .iter()
            .map(|id| {
                if id.solid_id != solid.id || id.index as usize >= topology.edges.len() {
                    return Err(CadError::EdgeNotFound(*id));
                }
                Ok(topology.edge_info(solid.id, id.index as usize))
            })
            .collect::<CadResult<Vec<_>>>()?;

        let base = self.get_node(solid)?;
        self.store_solid(Node::Finish {
            base,
            record: FinishRecord {
                kind,
                size,
                edges: infos,
            },
        })
    }
}

impl CadKernel for PreviewKernel {
    fn name(&self) -> &str {
        "preview"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extrude(&self, profile: &Wire2D, plane: &Workplane, distance: f64) -> CadResult<Solid> {
        if profile.points.len() < 3 {
            return Err(CadError::InvalidProfile(
                "Profile must have at least 3 points".into(),
            ));
        }
        if !profile.closed {
            return Err(CadError::InvalidProfile("Profile must be closed".into()));
        }
        if !distance.is_finite() || distance.abs() <= LEVEL_TOLERANCE {
            return Err(CadError::InvalidProfile(format!(
                "Extrusion distance must be non-zero, got {}",
                distance
            )));
        }
        if (plane.normal.z.abs() - 1.0).abs() > 1e-9 {
            return Err(CadError::OperationFailed(
                "Preview kernel only extrudes along Z".into(),
            ));
        }

        let outline: Vec<DVec2> = profile
            .points
            .iter()
            .map(|p| plane.to_world(*p).truncate())
            .collect();
        let z0 = plane.origin.z;
        let z1 = z0 + plane.normal.z * distance;

        self.store_solid(Node::Prism(Prism {
            outline,
            z_min: z0.min(z1),
            z_max: z0.max(z1),
        }))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let a = self.get_node(a)?;
        let b = self.get_node(b)?;
        self.store_solid(Node::Boolean { op, a, b })
    }

    fn create_box(&self, center: DVec3, size: DVec3) -> CadResult<Solid> {
        if size.min_element() <= 0.0 || !size.is_finite() {
            return Err(CadError::InvalidProfile(format!(
                "Box size must be positive, got {:?}",
                size
            )));
        }
        let footprint = Wire2D::rectangle(center.truncate(), size.x, size.y);
        self.store_solid(Node::Prism(Prism {
            outline: footprint.points,
            z_min: center.z - size.z / 2.0,
            z_max: center.z + size.z / 2.0,
        }))
    }

    fn tessellate(&self, solid: &Solid, _tolerance: f64) -> CadResult<TessellatedMesh> {
        let node = self.get_node(solid)?;
        let topology = self.topology(solid)?;
        let mesh = tessellate_node(&node, &topology);
        if mesh.is_empty() {
            return Err(CadError::TessellationFailed(format!(
                "Solid {} has no boundary",
                solid.id
            )));
        }
        Ok(mesh)
    }

    fn get_edges(&self, solid: &Solid) -> CadResult<Vec<EdgeInfo>> {
        let topology = self.topology(solid)?;
        Ok((0..topology.edges.len())
            .map(|i| topology.edge_info(solid.id, i))
            .collect())
    }

    fn get_faces(&self, solid: &Solid) -> CadResult<Vec<FaceInfo>> {
        let topology = self.topology(solid)?;
        Ok((0..topology.faces.len())
            .map(|i| topology.face_info(solid.id, i))
            .collect())
    }

    fn get_face_edges(&self, solid: &Solid, face: FaceId) -> CadResult<Vec<EdgeInfo>> {
        let topology = self.topology(solid)?;
        let found = topology
            .faces
            .get(face.index as usize)
            .filter(|_| face.solid_id == solid.id)
            .ok_or_else(|| CadError::FaceNotFound(format!("#{}", face.index)))?;
        Ok(found
            .edges
            .iter()
            .map(|e| topology.edge_info(solid.id, *e))
            .collect())
    }

    fn fillet(&self, solid: &Solid, edges: &[EdgeId], radius: f64) -> CadResult<Solid> {
        self.finish(solid, edges, radius, FinishKind::Fillet)
    }

    fn chamfer(&self, solid: &Solid, edges: &[EdgeId], distance: f64) -> CadResult<Solid> {
        self.finish(solid, edges, distance, FinishKind::Chamfer)
    }

    fn export_step(
        &self,
        _solid: &Solid,
        _path: &Path,
        _options: &StepExportOptions,
    ) -> CadResult<()> {
        Err(CadError::StepExport(
            "Preview kernel has no STEP writer".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::select::{Axis, FaceSelector, select_faces};

    fn bin(kernel: &PreviewKernel) -> Solid {
        // 20x10x10 block with a 16x6 pocket from z=4 up
        let block = kernel
            .create_box(DVec3::new(0.0, 0.0, 5.0), DVec3::new(20.0, 10.0, 10.0))
            .unwrap();
        let pocket = kernel
            .extrude(
                &Wire2D::rectangle(DVec2::ZERO, 16.0, 6.0),
                &Workplane::xy().offset(4.0),
                6.0,
            )
            .unwrap();
        kernel
            .boolean(&block, &pocket, BooleanType::Subtract)
            .unwrap()
    }

    #[test]
    fn test_box_faces_and_edges() {
        let kernel = PreviewKernel::new();
        let solid = kernel
            .create_box(DVec3::new(0.0, 0.0, 1.0), DVec3::new(4.0, 2.0, 2.0))
            .unwrap();

        let faces = kernel.get_faces(&solid).unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].normal, DVec3::Z);
        assert!((faces[0].center.z - 2.0).abs() < 1e-12);
        assert_eq!(faces[1].normal, DVec3::NEG_Z);

        assert_eq!(kernel.get_edges(&solid).unwrap().len(), 8);
        let top = kernel.get_face_edges(&solid, faces[0].id).unwrap();
        assert_eq!(top.len(), 4);
        assert!(top.iter().all(|e| e.is_straight()));
    }

    #[test]
    fn test_membership_follows_booleans() {
        let kernel = PreviewKernel::new();
        let solid = bin(&kernel);
        assert!(kernel.contains(&solid, DVec3::new(0.0, 0.0, 2.0)).unwrap());
        assert!(!kernel.contains(&solid, DVec3::new(0.0, 0.0, 6.0)).unwrap());
        assert!(kernel.contains(&solid, DVec3::new(9.0, 0.0, 6.0)).unwrap());
        assert!(!kernel.contains(&solid, DVec3::new(11.0, 0.0, 2.0)).unwrap());
    }

    #[test]
    fn test_pocket_floor_is_second_highest_layer() {
        let kernel = PreviewKernel::new();
        let solid = bin(&kernel);

        let floor = select_faces(
            &kernel,
            &solid,
            FaceSelector::Nth {
                axis: Axis::Z,
                index: -2,
            },
        )
        .unwrap();
        assert_eq!(floor.len(), 1);
        assert!((floor[0].center.z - 4.0).abs() < 1e-12);
        assert_eq!(kernel.get_face_edges(&solid, floor[0].id).unwrap().len(), 4);

        let top = select_faces(&kernel, &solid, FaceSelector::Max(Axis::Z)).unwrap();
        assert_eq!(top.len(), 1);
        // outer rim plus pocket outline
        assert_eq!(kernel.get_face_edges(&solid, top[0].id).unwrap().len(), 8);
    }

    #[test]
    fn test_crossing_cuts_split_edges() {
        let kernel = PreviewKernel::new();
        let block = kernel
            .create_box(DVec3::new(0.0, 0.0, -5.0), DVec3::new(30.0, 30.0, 10.0))
            .unwrap();
        let plane = Workplane::xy();
        let wide = kernel
            .cut_blind(&block, &plane, &Wire2D::rectangle(DVec2::ZERO, 10.0, 2.0), -3.0)
            .unwrap();
        let cross = kernel
            .cut_blind(&wide, &plane, &Wire2D::rectangle(DVec2::ZERO, 2.0, 10.0), -3.0)
            .unwrap();

        let top = select_faces(&kernel, &cross, FaceSelector::Max(Axis::Z)).unwrap();
        let edges = kernel.get_face_edges(&cross, top[0].id).unwrap();
        // 4 outer edges plus the 12 sides of the plus-shaped opening
        assert_eq!(edges.len(), 16);
    }

    #[test]
    fn test_same_shape_ignores_construction_order() {
        let kernel = PreviewKernel::new();
        let a = kernel
            .create_box(DVec3::ZERO, DVec3::new(4.0, 4.0, 2.0))
            .unwrap();
        let b = kernel
            .extrude(
                &Wire2D::rectangle(DVec2::ZERO, 4.0, 4.0),
                &Workplane::xy().offset(1.0),
                -2.0,
            )
            .unwrap();
        let c = kernel
            .create_box(DVec3::ZERO, DVec3::new(4.0, 3.0, 2.0))
            .unwrap();
        assert!(kernel.same_shape(&a, &b).unwrap());
        assert!(!kernel.same_shape(&a, &c).unwrap());
    }

    #[test]
    fn test_finish_records_edges() {
        let kernel = PreviewKernel::new();
        let solid = bin(&kernel);
        let edges = kernel.get_edges(&solid).unwrap();
        let ids: Vec<EdgeId> = edges.iter().take(2).map(|e| e.id).collect();

        let filleted = kernel.fillet(&solid, &ids, 0.3).unwrap();
        let records = kernel.finishes(&filleted).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, FinishKind::Fillet);
        assert_eq!(records[0].edges.len(), 2);
        assert!(kernel.same_shape(&solid, &filleted).unwrap());
    }

    #[test]
    fn test_finish_rejects_bad_input() {
        let kernel = PreviewKernel::new();
        let solid = bin(&kernel);
        let other = bin(&kernel);
        let foreign = kernel.get_edges(&other).unwrap()[0].id;

        assert!(matches!(
            kernel.chamfer(&solid, &[], 1.0),
            Err(CadError::OperationFailed(_))
        ));
        assert!(matches!(
            kernel.chamfer(&solid, &[foreign], 1.0),
            Err(CadError::EdgeNotFound(_))
        ));
        let own = kernel.get_edges(&solid).unwrap()[0].id;
        assert!(kernel.chamfer(&solid, &[own], 0.0).is_err());
    }

    /// Enclosed volume by the divergence theorem
    fn mesh_volume(mesh: &TessellatedMesh) -> f64 {
        mesh.indices
            .chunks(3)
            .map(|t| {
                let v = |i: u32| glam::Vec3::from(mesh.vertices[i as usize]).as_dvec3();
                v(t[0]).dot(v(t[1]).cross(v(t[2]))) / 6.0
            })
            .sum()
    }

    #[test]
    fn test_tessellate_box() {
        let kernel = PreviewKernel::new();
        let solid = kernel
            .create_box(DVec3::new(0.0, 0.0, 1.0), DVec3::new(4.0, 2.0, 2.0))
            .unwrap();
        let mesh = kernel.tessellate(&solid, 0.01).unwrap();

        // two triangles per side
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        assert!((mesh_volume(&mesh) - 16.0).abs() < 1e-4);
    }

    #[test]
    fn test_tessellate_follows_booleans() {
        let kernel = PreviewKernel::new();
        let solid = bin(&kernel);
        let mesh = kernel.tessellate(&solid, 0.01).unwrap();
        assert!((mesh_volume(&mesh) - (2000.0 - 16.0 * 6.0 * 6.0)).abs() < 1e-2);

        let empty = kernel
            .boolean(&solid, &solid, BooleanType::Subtract)
            .unwrap();
        assert!(matches!(
            kernel.tessellate(&empty, 0.01),
            Err(CadError::TessellationFailed(_))
        ));
    }

    #[test]
    fn test_unknown_solid() {
        let kernel = PreviewKernel::new();
        let ghost = Solid::new(Uuid::new_v4());
        assert!(matches!(
            kernel.get_faces(&ghost),
            Err(CadError::SolidNotFound(_))
        ));
    }
}
