//! CAD Kernel trait definitions
//!
//! These traits define the interface that all CAD kernels must implement.

use std::path::Path;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Chord-to-midpoint deviation below which an edge counts as a straight line
const STRAIGHT_TOLERANCE: f64 = 1e-6;

/// Unique identifier for an edge within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    /// ID of the solid this edge belongs to
    pub solid_id: Uuid,
    /// Index of the edge within the solid
    pub index: u32,
}

impl EdgeId {
    /// Create a new edge ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

/// Unique identifier for a face within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId {
    /// ID of the solid this face belongs to
    pub solid_id: Uuid,
    /// Index of the face within the solid
    pub index: u32,
}

impl FaceId {
    /// Create a new face ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

/// Information about an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Start point of the edge
    pub start: DVec3,
    /// End point of the edge
    pub end: DVec3,
    /// Point at the middle of the edge's parameter range
    pub midpoint: DVec3,
    /// Length of the edge chord
    pub length: f64,
}

impl EdgeInfo {
    /// Create edge info for a straight segment
    pub fn line(id: EdgeId, start: DVec3, end: DVec3) -> Self {
        let midpoint = (start + end) * 0.5;
        let length = (end - start).length();
        Self {
            id,
            start,
            end,
            midpoint,
            length,
        }
    }

    /// Check if the edge is a straight line
    ///
    /// Curved edges bulge away from their chord, and closed curves have a
    /// zero-length chord.
    pub fn is_straight(&self) -> bool {
        let chord = (self.end - self.start).length();
        if chord <= STRAIGHT_TOLERANCE {
            return false;
        }
        let chord_mid = (self.start + self.end) * 0.5;
        chord_mid.distance(self.midpoint) <= STRAIGHT_TOLERANCE * chord.max(1.0)
    }
}

/// Information about a face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceInfo {
    /// Unique identifier for this face
    pub id: FaceId,
    /// Center point of the face
    pub center: DVec3,
    /// Normal vector of the face
    pub normal: DVec3,
    /// Approximate area of the face (zero when the kernel does not compute it)
    pub area: f64,
}

impl FaceInfo {
    /// Create a new face info
    pub fn new(id: FaceId, center: DVec3, normal: DVec3, area: f64) -> Self {
        Self {
            id,
            center,
            normal: normal.normalize(),
            area,
        }
    }
}

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),

    #[error("No face matches selector {0}")]
    FaceNotFound(String),

    #[error("Edge {} not found on solid {}", .0.index, .0.solid_id)]
    EdgeNotFound(EdgeId),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("STEP export failed: {0}")]
    StepExport(String),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// A tessellated mesh output from the CAD kernel
#[derive(Debug, Clone, Default)]
pub struct TessellatedMesh {
    /// Vertex positions (3 floats per vertex)
    pub vertices: Vec<[f32; 3]>,
    /// Vertex normals (3 floats per vertex)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (3 indices per triangle)
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    /// Create an empty tessellated mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A 2D wire (closed loop of edges) for extrusion profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire2D {
    /// Points defining the wire (in order)
    pub points: Vec<DVec2>,
    /// Whether the wire is closed
    pub closed: bool,
}

impl Wire2D {
    /// Create a new wire from points
    pub fn new(points: Vec<DVec2>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Create a rectangle wire
    pub fn rectangle(center: DVec2, width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(
            vec![
                center + DVec2::new(-hw, -hh),
                center + DVec2::new(hw, -hh),
                center + DVec2::new(hw, hh),
                center + DVec2::new(-hw, hh),
            ],
            true,
        )
    }

    /// Create a circle wire (approximated with segments)
    pub fn circle(center: DVec2, radius: f64, segments: u32) -> Self {
        let segments = segments.max(3);
        let points = (0..segments)
            .map(|i| {
                let angle = (f64::from(i) / f64::from(segments)) * std::f64::consts::TAU;
                center + DVec2::new(angle.cos() * radius, angle.sin() * radius)
            })
            .collect();
        Self::new(points, true)
    }

    /// Create a regular polygon inscribed in a circle of the given diameter
    ///
    /// The first vertex lies on the +X axis, so a hexagon's pointy extent
    /// runs along X and its flat extent along Y.
    pub fn regular_polygon(center: DVec2, circumscribed_diameter: f64, sides: u32) -> Self {
        let sides = sides.max(3);
        let radius = circumscribed_diameter / 2.0;
        let points = (0..sides)
            .map(|i| {
                let angle = (f64::from(i) / f64::from(sides)) * std::f64::consts::TAU;
                center + DVec2::new(angle.cos() * radius, angle.sin() * radius)
            })
            .collect();
        Self::new(points, true)
    }

    /// Create a circular sector ("pizza slice") symmetric about +X with its tip at the origin
    ///
    /// `fraction` is the share of a full turn; one or more yields a full circle.
    pub fn sector(radius: f64, fraction: f64, segments: u32) -> Self {
        let segments = segments.max(3);
        if fraction >= 1.0 {
            return Self::circle(DVec2::ZERO, radius, segments);
        }

        let half = fraction * std::f64::consts::TAU / 2.0;
        let mut points: Vec<DVec2> = (0..=segments)
            .map(|i| {
                let angle = -half + 2.0 * half * (f64::from(i) / f64::from(segments));
                DVec2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        points.push(DVec2::ZERO);
        Self::new(points, true)
    }

    /// Return a copy moved by `offset`
    pub fn translated(&self, offset: DVec2) -> Self {
        Self::new(
            self.points.iter().map(|p| *p + offset).collect(),
            self.closed,
        )
    }

    /// Iterate over the wire's segments as point pairs
    pub fn segments(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let n = self.points.len();
        let count = if self.closed { n } else { n.saturating_sub(1) };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }
}

/// A sketch plane in 3D: an origin, a normal and an in-plane X direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workplane {
    /// Origin of the plane
    pub origin: DVec3,
    /// Unit normal of the plane
    pub normal: DVec3,
    /// Unit X direction inside the plane
    pub x_dir: DVec3,
}

impl Workplane {
    /// Create a workplane, orthogonalizing `x_dir` against the normal
    pub fn new(origin: DVec3, normal: DVec3, x_dir: DVec3) -> Self {
        let normal = normal.normalize();
        let x_dir = (x_dir - normal * x_dir.dot(normal)).normalize();
        Self {
            origin,
            normal,
            x_dir,
        }
    }

    /// The global XY plane
    pub fn xy() -> Self {
        Self::new(DVec3::ZERO, DVec3::Z, DVec3::X)
    }

    /// Workplane on a planar face, origin at the global origin projected onto the face
    pub fn on_face(face: &FaceInfo) -> Self {
        let normal = face.normal.normalize();
        let origin = normal * face.center.dot(normal);
        let x_dir = if normal.x.abs() < 0.9 {
            DVec3::X
        } else {
            DVec3::Y
        };
        Self::new(origin, normal, x_dir)
    }

    /// Y direction inside the plane
    pub fn y_dir(&self) -> DVec3 {
        self.normal.cross(self.x_dir)
    }

    /// Convert plane-local coordinates to world coordinates
    pub fn to_world(&self, local: DVec2) -> DVec3 {
        self.origin + self.x_dir * local.x + self.y_dir() * local.y
    }

    /// Copy of this plane with its origin moved to a plane-local position
    pub fn at(&self, local: DVec2) -> Self {
        Self {
            origin: self.to_world(local),
            ..*self
        }
    }

    /// Copy of this plane shifted along its normal
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.normal * distance,
            ..*self
        }
    }
}

/// A 3D solid body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Solid {
    /// Unique identifier
    pub id: Uuid,
    /// Internal marker for kernel data (actual data stored in kernel)
    #[serde(skip)]
    has_kernel_data: bool,
}

impl Clone for Solid {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            has_kernel_data: self.has_kernel_data,
        }
    }
}

impl Solid {
    /// Create a new solid with the given ID
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            has_kernel_data: false,
        }
    }

    /// Mark that this solid has kernel data
    pub fn with_kernel_data(mut self) -> Self {
        self.has_kernel_data = true;
        self
    }

    /// Check if this solid has kernel data
    pub fn has_kernel_data(&self) -> bool {
        self.has_kernel_data
    }
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (add)
    Union,
    /// Subtraction (cut)
    Subtract,
    /// Intersection (common)
    Intersect,
}

/// Options for STEP file export
#[derive(Debug, Clone, Default)]
pub struct StepExportOptions {
    /// Application name in STEP header
    pub author: Option<String>,
    /// Organization name in STEP header
    pub organization: Option<String>,
}

/// The main CAD kernel trait
///
/// Implementations of this trait provide the actual geometry operations.
/// Every call is blocking and returns a fully realized solid.
pub trait CadKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Extrude a 2D profile drawn on `plane` along the plane normal
    ///
    /// A negative `distance` extrudes against the normal.
    fn extrude(&self, profile: &Wire2D, plane: &Workplane, distance: f64) -> CadResult<Solid>;

    /// Perform a boolean operation on two solids
    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid>;

    /// Cut a profile drawn on `plane` out of `solid`, to a signed depth along the plane normal
    fn cut_blind(
        &self,
        solid: &Solid,
        plane: &Workplane,
        profile: &Wire2D,
        depth: f64,
    ) -> CadResult<Solid> {
        let tool = self.extrude(profile, plane, depth)?;
        self.boolean(solid, &tool, BooleanType::Subtract)
    }

    /// Create a box primitive
    fn create_box(&self, center: DVec3, size: DVec3) -> CadResult<Solid>;

    /// Tessellate a solid into triangles
    ///
    /// # Arguments
    /// * `solid` - The solid to tessellate
    /// * `tolerance` - The tessellation tolerance (lower = more triangles)
    fn tessellate(&self, solid: &Solid, tolerance: f64) -> CadResult<TessellatedMesh>;

    // ========== Edge/Face Query Methods ==========

    /// Get all edges of a solid with their geometric information
    fn get_edges(&self, solid: &Solid) -> CadResult<Vec<EdgeInfo>>;

    /// Get all faces of a solid with their geometric information
    fn get_faces(&self, solid: &Solid) -> CadResult<Vec<FaceInfo>>;

    /// Get the boundary edges of one face, with ids valid for `solid`
    fn get_face_edges(&self, solid: &Solid, face: FaceId) -> CadResult<Vec<EdgeInfo>>;

    // ========== Fillet/Chamfer Methods ==========

    /// Apply fillet (rounded edge) to selected edges
    fn fillet(&self, solid: &Solid, edges: &[EdgeId], radius: f64) -> CadResult<Solid>;

    /// Apply chamfer (beveled edge) to selected edges
    fn chamfer(&self, solid: &Solid, edges: &[EdgeId], distance: f64) -> CadResult<Solid>;

    // ========== STEP File I/O Methods ==========

    /// Export a solid to a STEP file
    fn export_step(&self, solid: &Solid, path: &Path, options: &StepExportOptions)
    -> CadResult<()>;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> CadResult<T> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn extrude(&self, _profile: &Wire2D, _plane: &Workplane, _distance: f64) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn boolean(&self, _a: &Solid, _b: &Solid, _op: BooleanType) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn create_box(&self, _center: DVec3, _size: DVec3) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn tessellate(&self, _solid: &Solid, _tolerance: f64) -> CadResult<TessellatedMesh> {
        Self::unavailable()
    }

    fn get_edges(&self, _solid: &Solid) -> CadResult<Vec<EdgeInfo>> {
        Self::unavailable()
    }

    fn get_faces(&self, _solid: &Solid) -> CadResult<Vec<FaceInfo>> {
        Self::unavailable()
    }

    fn get_face_edges(&self, _solid: &Solid, _face: FaceId) -> CadResult<Vec<EdgeInfo>> {
        Self::unavailable()
    }

    fn fillet(&self, _solid: &Solid, _edges: &[EdgeId], _radius: f64) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn chamfer(&self, _solid: &Solid, _edges: &[EdgeId], _distance: f64) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn export_step(
        &self,
        _solid: &Solid,
        _path: &Path,
        _options: &StepExportOptions,
    ) -> CadResult<()> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available for STEP export".into(),
        ))
    }
}

/// Get the default CAD kernel
///
/// No B-rep backend is bundled; callers that need real geometry pass their
/// own `CadKernel` implementation.
pub fn default_kernel() -> Box<dyn CadKernel> {
    Box::new(NullKernel)
}
