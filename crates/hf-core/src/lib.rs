//! Holdfast Core Library
//!
//! This crate provides:
//! - Hole shapes, size policies and grid layout for multi-hole holders
//! - The holder build pipeline and boolean composition of built holders
//! - Holders with hand placed slot groups
//! - Spacer, washer and bend gauge generators, and sweeps over their sizes
//! - Batch files, presets and STEP/STL export

pub mod algebra;
pub mod batch;
pub mod builder;
pub mod container;
pub mod edge_delta;
pub mod error;
pub mod export;
pub mod hole;
pub mod holder;
pub mod layout;
pub mod presets;
pub mod settings;
pub mod size_policy;
pub mod slots;
pub mod spacer;
pub mod sweep;

#[cfg(test)]
mod test_kernels;

pub use algebra::{intersect_all, intersect_solids, union_all};
pub use batch::{Batch, BatchEntry, BatchOutcome, BatchReport, BuiltPart, run_batch};
pub use builder::{BuildStage, BuiltHolder, BuiltSlotHolder, HolderBuilder, PlacedHole};
pub use container::{Container, ContainerProvider, ContainerSpec, GridBinProvider};
pub use edge_delta::{EdgeSet, EdgeSignature, new_edges};
pub use error::{ConfigError, Error, ExportError, Result};
pub use export::{ExportFormat, ExportOptions, export_solid, file_stem};
pub use hole::{HexFootprint, HoleSpec, ResolvedHole};
pub use holder::{Holder, LipRemoval, ReservedBand};
pub use layout::{AxisLayout, GridCell, GridLayout, PerAxis, PlanarAxis};
pub use settings::BuildSettings;
pub use size_policy::{MarginBlend, MarginGrowth, SizeBounds, SizePolicy};
pub use slots::{Side, SideChamfers, Slot, SlotGroup, SlotHolder};
pub use spacer::{Flange, Spacer};
pub use sweep::{SizeRange, Sweep, SweepPart};
