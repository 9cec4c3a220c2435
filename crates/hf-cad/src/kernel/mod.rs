//! CAD kernel interface and bundled backends

mod preview;
mod select;
mod traits;

pub use preview::{FinishKind, FinishRecord, PreviewKernel};
pub use select::{Axis, EdgeFilter, FaceSelector, select_edges, select_faces};
pub use traits::{
    BooleanType, CadError, CadKernel, CadResult, EdgeId, EdgeInfo, FaceId, FaceInfo, NullKernel,
    Solid, StepExportOptions, TessellatedMesh, Wire2D, Workplane, default_kernel,
};
