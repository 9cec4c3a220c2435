//! Batch generation of parts
//!
//! A batch is a list of entries built one after another with shared
//! settings, followed by any spacer sweeps. A failing entry is logged and
//! recorded; the remaining entries still run.

use std::path::{Path, PathBuf};

use hf_cad::{CadKernel, Solid};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::algebra::{intersect_all, union_all};
use crate::builder::HolderBuilder;
use crate::container::ContainerProvider;
use crate::error::{ConfigError, Error, Result};
use crate::export::{ExportOptions, export_solid, file_stem};
use crate::holder::Holder;
use crate::settings::BuildSettings;
use crate::slots::SlotHolder;
use crate::spacer::Spacer;
use crate::sweep::Sweep;

/// One part in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchEntry {
    Holder(Holder),
    /// Holders on congruent containers, intersected into one part
    Intersection {
        name: String,
        version: Version,
        parts: Vec<Holder>,
    },
    /// Holders unioned into one part
    Union {
        name: String,
        version: Version,
        parts: Vec<Holder>,
    },
    Spacer(Spacer),
    SlotHolder(SlotHolder),
}

impl BatchEntry {
    pub fn name(&self) -> &str {
        match self {
            BatchEntry::Holder(holder) => &holder.name,
            BatchEntry::Intersection { name, .. } | BatchEntry::Union { name, .. } => name,
            BatchEntry::Spacer(spacer) => &spacer.name,
            BatchEntry::SlotHolder(holder) => &holder.name,
        }
    }

    /// Output file name without extension
    pub fn file_stem(&self) -> String {
        match self {
            BatchEntry::Holder(holder) => holder.file_stem(),
            BatchEntry::Intersection { name, version, .. }
            | BatchEntry::Union { name, version, .. } => file_stem(name, version, false),
            BatchEntry::Spacer(spacer) => spacer.file_stem(),
            BatchEntry::SlotHolder(holder) => holder.file_stem(),
        }
    }

    fn build(&self, builder: &HolderBuilder<'_>) -> Result<Solid> {
        match self {
            BatchEntry::Holder(holder) => Ok(builder.build(holder)?.solid),
            BatchEntry::Intersection { parts, .. } => intersect_all(builder, parts),
            BatchEntry::Union { parts, .. } => {
                let solids = parts
                    .iter()
                    .map(|holder| builder.build(holder).map(|built| built.solid))
                    .collect::<Result<Vec<_>>>()?;
                union_all(builder.kernel(), &solids)
            }
            BatchEntry::Spacer(spacer) => spacer.build(builder.kernel(), builder.settings()),
            BatchEntry::SlotHolder(holder) => Ok(builder.build_slots(holder)?.solid),
        }
    }
}

/// A batch file: shared settings and the parts to build
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub settings: BuildSettings,
    pub entries: Vec<BatchEntry>,
    /// Spacer families built after the entries
    #[serde(default)]
    pub sweeps: Vec<Sweep>,
}

impl Batch {
    pub fn new(settings: BuildSettings, entries: Vec<BatchEntry>) -> Self {
        Self {
            settings,
            entries,
            sweeps: Vec::new(),
        }
    }

    pub fn with_sweep(mut self, sweep: Sweep) -> Self {
        self.sweeps.push(sweep);
        self
    }

    /// Parse a batch from RON text
    pub fn from_ron(content: &str) -> std::result::Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Load a batch from a RON file
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    pub fn to_ron(&self) -> std::result::Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// A successfully built part
#[derive(Debug, Clone)]
pub struct BuiltPart {
    pub name: String,
    pub stem: String,
    pub solid: Solid,
    /// Files written for this part, empty when nothing was exported
    pub files: Vec<PathBuf>,
}

/// Result of one batch entry
#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub result: Result<BuiltPart>,
}

/// Results of a batch run, in entry order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn built(&self) -> impl Iterator<Item = &BuiltPart> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Build every entry of a batch, exporting each part when `export` is given
pub fn run_batch(
    kernel: &dyn CadKernel,
    provider: &dyn ContainerProvider,
    batch: &Batch,
    export: Option<&ExportOptions>,
) -> BatchReport {
    let builder = HolderBuilder::new(kernel, provider, &batch.settings);
    let mut report = BatchReport::default();

    for entry in &batch.entries {
        report.outcomes.push(run_entry(&builder, entry, export));
    }

    for sweep in &batch.sweeps {
        let parts = match sweep.parts() {
            Ok(parts) => parts,
            Err(err) => {
                let err = Error::from(err);
                tracing::error!("{} failed with a {} error: {}", sweep.name(), err.class(), err);
                report.outcomes.push(BatchOutcome {
                    name: sweep.name().to_string(),
                    result: Err(err),
                });
                continue;
            }
        };
        tracing::info!("Sweeping {} parts for the {}", parts.len(), sweep.name());
        for part in parts {
            let options = match (export, &part.dir) {
                (Some(options), Some(dir)) => Some(options.in_subdir(dir)),
                (options, _) => options.cloned(),
            };
            let entry = BatchEntry::Spacer(part.spacer);
            report
                .outcomes
                .push(run_entry(&builder, &entry, options.as_ref()));
        }
    }

    if !report.is_success() {
        tracing::warn!(
            "{} of {} parts failed",
            report.failure_count(),
            report.outcomes.len()
        );
    }
    report
}

fn run_entry(
    builder: &HolderBuilder<'_>,
    entry: &BatchEntry,
    export: Option<&ExportOptions>,
) -> BatchOutcome {
    let name = entry.name().to_string();
    tracing::info!("Building {}", name);

    let result = build_part(builder, entry, export);
    match &result {
        Ok(part) => tracing::info!("Built {} ({} files)", part.stem, part.files.len()),
        Err(err) => tracing::error!("{} failed with a {} error: {}", name, err.class(), err),
    }
    BatchOutcome { name, result }
}

fn build_part(
    builder: &HolderBuilder<'_>,
    entry: &BatchEntry,
    export: Option<&ExportOptions>,
) -> Result<BuiltPart> {
    let solid = entry.build(builder)?;
    let stem = entry.file_stem();
    let files = match export {
        Some(options) => export_solid(builder.kernel(), &solid, &stem, options)?,
        None => Vec::new(),
    };
    Ok(BuiltPart {
        name: entry.name().to_string(),
        stem,
        solid,
        files,
    })
}
