//! CAD Kernel Abstraction
//!
//! This crate provides:
//! - Abstract CAD kernel traits for the geometry operations part generators need
//! - Face and edge selection helpers mirroring common B-rep selector strings
//! - A null kernel and a 2.5D preview kernel for layout previews and tests

pub mod kernel;

// Re-exports for convenience
pub use kernel::{
    Axis, BooleanType, CadError, CadKernel, CadResult, EdgeFilter, EdgeId, EdgeInfo, FaceId,
    FaceInfo, FaceSelector, FinishKind, FinishRecord, NullKernel, PreviewKernel, Solid,
    StepExportOptions, TessellatedMesh, Wire2D, Workplane, default_kernel, select_edges,
    select_faces,
};
