//! STEP and STL export of finished parts

use std::path::{Path, PathBuf};

use glam::Vec3;
use hf_cad::{CadKernel, Solid, StepExportOptions, TessellatedMesh};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    Step,
    Stl,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Step => "step",
            ExportFormat::Stl => "stl",
        }
    }
}

/// Where and how parts are written
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
    /// Tessellation tolerance for mesh formats
    pub tolerance: f64,
}

impl ExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            formats: vec![ExportFormat::Step],
            tolerance: 0.01,
        }
    }

    /// Same options writing into a subdirectory of the output directory
    pub fn in_subdir(&self, dir: &str) -> Self {
        Self {
            output_dir: self.output_dir.join(dir),
            ..self.clone()
        }
    }
}

/// File name of a part without extension: `{name} v{major.minor.patch}`
///
/// Path separators in the name are replaced. With `dot_leader`, dots become
/// U+2024 so decimal sizes in names do not read as extensions.
pub fn file_stem(name: &str, version: &Version, dot_leader: bool) -> String {
    let stem = format!(
        "{} v{}.{}.{}",
        name.replace(['/', '\\'], "_"),
        version.major,
        version.minor,
        version.patch
    );
    if dot_leader {
        stem.replace('.', "\u{2024}")
    } else {
        stem
    }
}

/// Write a solid in every requested format, returning the written paths
pub fn export_solid(
    kernel: &dyn CadKernel,
    solid: &Solid,
    stem: &str,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(&options.output_dir).map_err(|e| ExportError::Io(e.to_string()))?;

    let mut written = Vec::new();
    for format in &options.formats {
        let path = options
            .output_dir
            .join(format!("{}.{}", stem, format.extension()));
        match format {
            ExportFormat::Step => {
                let step_options = StepExportOptions {
                    author: Some("holdfast".into()),
                    organization: None,
                };
                kernel
                    .export_step(solid, &path, &step_options)
                    .map_err(|e| ExportError::Step(e.to_string()))?;
            }
            ExportFormat::Stl => {
                let mesh = kernel
                    .tessellate(solid, options.tolerance)
                    .map_err(|e| ExportError::Tessellation(e.to_string()))?;
                write_stl(&mesh, &path)?;
            }
        }
        tracing::info!("Exported {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Write a tessellated mesh as binary STL
pub fn write_stl(mesh: &TessellatedMesh, path: &Path) -> Result<(), ExportError> {
    if mesh.is_empty() || mesh.triangle_count() == 0 {
        return Err(ExportError::EmptyMesh);
    }

    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    for chunk in mesh.indices.chunks(3) {
        if chunk.len() != 3 {
            continue;
        }
        let corner = |i: u32| {
            mesh.vertices
                .get(i as usize)
                .copied()
                .ok_or_else(|| ExportError::Stl(format!("Vertex index {} out of range", i)))
        };
        let v0 = corner(chunk[0])?;
        let v1 = corner(chunk[1])?;
        let v2 = corner(chunk[2])?;

        // Calculate normal from vertices
        let cross = (Vec3::from(v1) - Vec3::from(v0)).cross(Vec3::from(v2) - Vec3::from(v0));
        let normal = if cross.length() > 0.0 {
            cross.normalize()
        } else {
            Vec3::Z
        };

        triangles.push(stl_io::Triangle {
            normal: stl_io::Normal::new(normal.to_array()),
            vertices: [
                stl_io::Vertex::new(v0),
                stl_io::Vertex::new(v1),
                stl_io::Vertex::new(v2),
            ],
        });
    }

    let mut file = std::fs::File::create(path).map_err(|e| ExportError::Io(e.to_string()))?;
    stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| ExportError::Stl(e.to_string()))?;
    Ok(())
}
