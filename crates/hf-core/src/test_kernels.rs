//! Kernels for pipeline tests

use std::path::Path;

use glam::DVec3;
use hf_cad::{
    BooleanType, CadError, CadKernel, CadResult, EdgeId, EdgeInfo, FaceId, FaceInfo,
    PreviewKernel, Solid, StepExportOptions, TessellatedMesh, Wire2D, Workplane,
};

/// Preview kernel that rejects large chamfers, tessellates every solid as a
/// unit cube and writes stub STEP files
pub struct TestKernel {
    pub inner: PreviewKernel,
    max_chamfer: f64,
}

impl TestKernel {
    pub fn new() -> Self {
        Self::with_max_chamfer(f64::INFINITY)
    }

    pub fn with_max_chamfer(max_chamfer: f64) -> Self {
        Self {
            inner: PreviewKernel::new(),
            max_chamfer,
        }
    }
}

fn unit_cube() -> TessellatedMesh {
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, // bottom
        4, 5, 6, 4, 6, 7, // top
        0, 1, 5, 0, 5, 4, // front
        2, 3, 7, 2, 7, 6, // back
        1, 2, 6, 1, 6, 5, // right
        3, 0, 4, 3, 4, 7, // left
    ];
    TessellatedMesh {
        normals: vec![[0.0, 0.0, 1.0]; vertices.len()],
        vertices,
        indices,
    }
}

impl CadKernel for TestKernel {
    fn name(&self) -> &str {
        "test"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extrude(&self, profile: &Wire2D, plane: &Workplane, distance: f64) -> CadResult<Solid> {
        self.inner.extrude(profile, plane, distance)
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        self.inner.boolean(a, b, op)
    }

    fn create_box(&self, center: DVec3, size: DVec3) -> CadResult<Solid> {
        self.inner.create_box(center, size)
    }

    fn tessellate(&self, solid: &Solid, _tolerance: f64) -> CadResult<TessellatedMesh> {
        self.inner.get_faces(solid)?;
        Ok(unit_cube())
    }

    fn get_edges(&self, solid: &Solid) -> CadResult<Vec<EdgeInfo>> {
        self.inner.get_edges(solid)
    }

    fn get_faces(&self, solid: &Solid) -> CadResult<Vec<FaceInfo>> {
        self.inner.get_faces(solid)
    }

    fn get_face_edges(&self, solid: &Solid, face: FaceId) -> CadResult<Vec<EdgeInfo>> {
        self.inner.get_face_edges(solid, face)
    }

    fn fillet(&self, solid: &Solid, edges: &[EdgeId], radius: f64) -> CadResult<Solid> {
        self.inner.fillet(solid, edges, radius)
    }

    fn chamfer(&self, solid: &Solid, edges: &[EdgeId], distance: f64) -> CadResult<Solid> {
        if distance > self.max_chamfer {
            return Err(CadError::OperationFailed(format!(
                "Chamfer {} exceeds local edge length",
                distance
            )));
        }
        self.inner.chamfer(solid, edges, distance)
    }

    fn export_step(
        &self,
        solid: &Solid,
        path: &Path,
        _options: &StepExportOptions,
    ) -> CadResult<()> {
        self.inner.get_faces(solid)?;
        std::fs::write(path, "ISO-10303-21;\nEND-ISO-10303-21;\n")
            .map_err(|e| CadError::FileIo(e.to_string()))
    }
}
