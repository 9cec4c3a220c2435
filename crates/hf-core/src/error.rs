//! Error types for building and exporting parts

use hf_cad::CadError;
use thiserror::Error;

/// Invalid parameters, detected before any kernel call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },

    #[error("Fill ratio must lie in (0, 1), got {0}")]
    FillRatio(f64),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Too many bits: {bits} (at most {max} fit around the center)")]
    TooManyBits { bits: u32, max: u32 },

    #[error("Nothing to combine for {0}")]
    EmptyComposition(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Failures while writing output files
#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("STEP export failed: {0}")]
    Step(String),

    #[error("Tessellation failed: {0}")]
    Tessellation(String),

    #[error("Mesh is empty")]
    EmptyMesh,

    #[error("STL write failed: {0}")]
    Stl(String),
}

/// Top-level error for a part build
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kernel error: {0}")]
    Kernel(#[from] CadError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl Error {
    /// Short name of the error class, for logs
    pub fn class(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::Kernel(_) => "kernel",
            Error::Export(_) => "export",
        }
    }
}

/// Result type for part builds
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_class() {
        let err: Error = ConfigError::DivisionByZero.into();
        assert_eq!(err.class(), "configuration");

        let err: Error = CadError::BooleanFailed("empty result".into()).into();
        assert_eq!(err.class(), "kernel");
        assert!(err.to_string().contains("empty result"));

        let err: Error = ExportError::EmptyMesh.into();
        assert_eq!(err.class(), "export");
    }
}
