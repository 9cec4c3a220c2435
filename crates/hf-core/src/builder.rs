//! Holder build pipeline
//!
//! A build walks through fixed stages:
//!
//! ```text
//! ContainerAcquired -> HolesCut -> Chamfered -> (LipRemoved) -> Finished
//! ```
//!
//! Each stage turns the working solid into a new one. A kernel failure ends
//! the build of that holder; nothing is retried. Slot holders pass through
//! `HolesCut` and `Chamfered` once per slot group.

use std::fmt;

use glam::DVec2;
use hf_cad::{CadKernel, EdgeId, Solid, Wire2D, Workplane, select_faces};

use crate::container::{Container, ContainerProvider};
use crate::edge_delta::{EdgeSet, new_edges};
use crate::error::Result;
use crate::hole::ResolvedHole;
use crate::holder::{Holder, LipRemoval};
use crate::layout::{GridCell, GridLayout};
use crate::settings::BuildSettings;
use crate::slots::SlotHolder;

/// Stage reached by a holder build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    ContainerAcquired,
    HolesCut,
    Chamfered,
    LipRemoved,
    Finished,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::ContainerAcquired => "container acquired",
            BuildStage::HolesCut => "holes cut",
            BuildStage::Chamfered => "chamfered",
            BuildStage::LipRemoved => "lip removed",
            BuildStage::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// A hole as it was cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedHole {
    pub cell: GridCell,
    pub resolved: ResolvedHole,
}

/// Result of a holder build
#[derive(Debug, Clone)]
pub struct BuiltHolder {
    pub solid: Solid,
    pub holder: Holder,
    pub holes: Vec<PlacedHole>,
    /// Stages passed through, in order
    pub stages: Vec<BuildStage>,
    /// Number of hole rim edges chamfered
    pub chamfered_edges: usize,
    /// Number of rim edges filleted by lip removal
    pub filleted_edges: usize,
}

impl BuiltHolder {
    pub fn stage(&self) -> BuildStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(BuildStage::ContainerAcquired)
    }
}

/// Result of a slot holder build
#[derive(Debug, Clone)]
pub struct BuiltSlotHolder {
    pub solid: Solid,
    pub stages: Vec<BuildStage>,
    /// Rim edges chamfered, per slot group
    pub chamfered_edges: Vec<usize>,
    pub filleted_edges: usize,
}

/// Builds holders with one kernel and container provider
pub struct HolderBuilder<'a> {
    kernel: &'a dyn CadKernel,
    provider: &'a dyn ContainerProvider,
    settings: &'a BuildSettings,
}

struct Progress<'h> {
    name: &'h str,
    solid: Solid,
    stages: Vec<BuildStage>,
}

impl Progress<'_> {
    fn advance(&mut self, solid: Solid, stage: BuildStage) {
        tracing::debug!("{}: {}", self.name, stage);
        self.solid = solid;
        self.stages.push(stage);
    }
}

impl<'a> HolderBuilder<'a> {
    pub fn new(
        kernel: &'a dyn CadKernel,
        provider: &'a dyn ContainerProvider,
        settings: &'a BuildSettings,
    ) -> Self {
        Self {
            kernel,
            provider,
            settings,
        }
    }

    pub fn kernel(&self) -> &'a dyn CadKernel {
        self.kernel
    }

    pub fn settings(&self) -> &'a BuildSettings {
        self.settings
    }

    /// Build one holder
    pub fn build(&self, holder: &Holder) -> Result<BuiltHolder> {
        holder.validate()?;
        let kernel = self.kernel;
        let settings = self.settings;

        let container = self
            .provider
            .make_box(kernel, &holder.container, holder.lip_removal.is_none())?;
        let mut progress = Progress {
            name: &holder.name,
            solid: container.solid.clone(),
            stages: Vec::new(),
        };
        progress.advance(container.solid.clone(), BuildStage::ContainerAcquired);

        let layout = GridLayout::for_holder(holder, settings);
        let working = select_faces(kernel, &progress.solid, settings.working_face)?;
        let plane = working
            .first()
            .map(Workplane::on_face)
            .unwrap_or_else(Workplane::xy);
        let before = EdgeSet::snapshot(kernel, &progress.solid, settings.working_face)?;

        let mut holes = Vec::with_capacity(layout.len());
        let mut solid = progress.solid.clone();
        for cell in layout.cells() {
            let (cut, resolved) =
                holder
                    .hole
                    .cut(kernel, &solid, &plane.at(cell.position), holder, &cell, settings)?;
            tracing::trace!(
                "{}: hole {} at ({:.3}, {:.3}) size {:.3}",
                holder.name,
                cell.loop_index,
                cell.position.x,
                cell.position.y,
                resolved.size()
            );
            solid = cut;
            holes.push(PlacedHole { cell, resolved });
        }
        progress.advance(solid, BuildStage::HolesCut);

        let mut chamfered_edges = 0;
        if holder.chamfer > 0.0 {
            let after = EdgeSet::snapshot(kernel, &progress.solid, settings.working_face)?;
            let delta = new_edges(&before, &after);
            let chamfered = kernel.chamfer(&progress.solid, &delta.ids(), holder.chamfer)?;
            chamfered_edges = delta.len();
            progress.advance(chamfered, BuildStage::Chamfered);
        }

        let mut filleted_edges = 0;
        if let Some(lip) = holder.lip_removal {
            let (trimmed, filleted) = self.remove_lip(&progress.solid, &container, &plane, lip)?;
            filleted_edges = filleted;
            progress.advance(trimmed, BuildStage::LipRemoved);
        }

        let solid = progress.solid.clone();
        progress.advance(solid, BuildStage::Finished);
        tracing::debug!(
            "{}: {} holes, {} chamfered edges, {} filleted edges",
            holder.name,
            holes.len(),
            chamfered_edges,
            filleted_edges
        );

        Ok(BuiltHolder {
            solid: progress.solid,
            holder: holder.clone(),
            holes,
            stages: progress.stages,
            chamfered_edges,
            filleted_edges,
        })
    }

    /// Build a holder with hand placed slots
    ///
    /// Every group is cut, then its new rim edges are chamfered side by side,
    /// one kernel pass per distinct chamfer size.
    pub fn build_slots(&self, holder: &SlotHolder) -> Result<BuiltSlotHolder> {
        holder.validate()?;
        let kernel = self.kernel;
        let working_face = self.settings.working_face;

        let container = self
            .provider
            .make_box(kernel, &holder.container, holder.lip_removal.is_none())?;
        let mut progress = Progress {
            name: &holder.name,
            solid: container.solid.clone(),
            stages: Vec::new(),
        };
        progress.advance(container.solid.clone(), BuildStage::ContainerAcquired);

        let working = select_faces(kernel, &progress.solid, working_face)?;
        let plane = working
            .first()
            .map(Workplane::on_face)
            .unwrap_or_else(Workplane::xy);

        let mut chamfered_edges = Vec::with_capacity(holder.groups.len());
        for (index, group) in holder.groups.iter().enumerate() {
            let before = EdgeSet::snapshot(kernel, &progress.solid, working_face)?;
            let mut solid = progress.solid.clone();
            for slot in &group.slots {
                let outline = Wire2D::rectangle(DVec2::ZERO, slot.size.x, slot.size.y);
                solid = kernel.cut_blind(&solid, &plane.at(slot.center()), &outline, -slot.depth)?;
            }
            progress.advance(solid, BuildStage::HolesCut);

            let mut chamfered = 0;
            for (size, sides) in group.chamfer.passes() {
                let after = EdgeSet::snapshot(kernel, &progress.solid, working_face)?;
                let rim: Vec<EdgeId> = new_edges(&before, &after)
                    .iter()
                    .filter(|edge| group.side_of(edge).is_some_and(|side| sides.contains(&side)))
                    .map(|edge| edge.id)
                    .collect();
                if rim.is_empty() {
                    tracing::warn!(
                        "{}: group {} has no rim edges on {:?}",
                        holder.name,
                        index,
                        sides
                    );
                    continue;
                }
                let solid = kernel.chamfer(&progress.solid, &rim, size)?;
                chamfered += rim.len();
                progress.advance(solid, BuildStage::Chamfered);
            }
            tracing::debug!(
                "{}: group {} cut {} slots, chamfered {} edges",
                holder.name,
                index,
                group.slots.len(),
                chamfered
            );
            chamfered_edges.push(chamfered);
        }

        let mut filleted_edges = 0;
        if let Some(lip) = holder.lip_removal {
            let (trimmed, filleted) = self.remove_lip(&progress.solid, &container, &plane, lip)?;
            filleted_edges = filleted;
            progress.advance(trimmed, BuildStage::LipRemoved);
        }

        let solid = progress.solid.clone();
        progress.advance(solid, BuildStage::Finished);

        Ok(BuiltSlotHolder {
            solid: progress.solid,
            stages: progress.stages,
            chamfered_edges,
            filleted_edges,
        })
    }

    /// Cut everything `upper_size` above the working face and round the new rim
    fn remove_lip(
        &self,
        solid: &Solid,
        container: &Container,
        plane: &Workplane,
        lip: LipRemoval,
    ) -> Result<(Solid, usize)> {
        let kernel = self.kernel;
        let top = self.settings.top_face;

        let before = EdgeSet::snapshot(kernel, solid, top)?;
        let oversized = Wire2D::rectangle(
            DVec2::ZERO,
            container.footprint.x * 2.0,
            container.footprint.y * 2.0,
        );
        let trimmed = kernel.cut_blind(
            solid,
            &plane.offset(lip.upper_size),
            &oversized,
            container.height,
        )?;

        if lip.fillet <= 0.0 {
            return Ok((trimmed, 0));
        }
        let after = EdgeSet::snapshot(kernel, &trimmed, top)?;
        let rim = new_edges(&before, &after).straight();
        let filleted = kernel.fillet(&trimmed, &rim.ids(), lip.fillet)?;
        Ok((filleted, rim.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerSpec, GridBinProvider};
    use crate::error::{ConfigError, Error};
    use crate::hole::HoleSpec;
    use crate::layout::PerAxis;
    use crate::size_policy::{MarginBlend, MarginGrowth, SizePolicy};
    use crate::slots::{SideChamfers, Slot};
    use crate::test_kernels::TestKernel;
    use approx::assert_relative_eq;
    use glam::DVec3;
    use hf_cad::{BooleanType, CadError, FinishKind, PreviewKernel};
    use semver::Version;

    fn settings() -> BuildSettings {
        BuildSettings {
            circle_segments: 16,
            ..BuildSettings::default()
        }
    }

    fn drill_holder(settings: &BuildSettings) -> Holder {
        Holder::new(
            "drill bit holder",
            Version::new(1, 0, 0),
            ContainerSpec::from_fill_depth(2, 4, 7.0, 18.0, settings).unwrap(),
            HoleSpec::circle(0.5).unwrap(),
            PerAxis::new(5, 4),
        )
        .with_padding(6.0, 6.0)
        .with_chamfer(2.0)
        .with_lip_removal(LipRemoval::default())
        .with_size_policy(
            SizePolicy::MarginGrowth(MarginGrowth {
                increase_amount: 0.5,
                increase_copies: 1,
                increase_loop_after: 20,
                min_size: 0.5,
                max_size: 10.0,
                blend: MarginBlend::default(),
            }),
            Some(HoleSpec::circle(10.0).unwrap()),
        )
    }

    #[test]
    fn test_growing_circle_grid() {
        let settings = settings();
        let kernel = PreviewKernel::new();
        let provider = GridBinProvider::new(&settings);
        let builder = HolderBuilder::new(&kernel, &provider, &settings);

        let built = builder.build(&drill_holder(&settings)).unwrap();
        assert_eq!(built.holes.len(), 20);

        let sizes: Vec<f64> = built.holes.iter().map(|h| h.resolved.size()).collect();
        assert_relative_eq!(sizes[0], 1.1);
        assert_relative_eq!(sizes[19], 10.4);
        for pair in sizes.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        for (i, hole) in built.holes.iter().enumerate() {
            assert_eq!(hole.cell.loop_index as usize, i);
        }

        assert_eq!(
            built.stages,
            vec![
                BuildStage::ContainerAcquired,
                BuildStage::HolesCut,
                BuildStage::Chamfered,
                BuildStage::LipRemoved,
                BuildStage::Finished,
            ]
        );
        assert_eq!(built.chamfered_edges, 20 * 16);
        assert_eq!(built.filleted_edges, 8);

        let finishes = kernel.finishes(&built.solid).unwrap();
        assert_eq!(finishes.len(), 2);
        assert_eq!(finishes[0].kind, FinishKind::Chamfer);
        assert_relative_eq!(finishes[0].size, 2.0);
        assert!(
            finishes[0]
                .edges
                .iter()
                .all(|e| (e.start.z - 18.0).abs() < 1e-6)
        );
        assert_eq!(finishes[1].kind, FinishKind::Fillet);
        assert!(
            finishes[1]
                .edges
                .iter()
                .all(|e| (e.start.z - 20.0).abs() < 1e-6)
        );

        // holes are open, the rim is gone above 20 mm
        let first = built.holes[0].cell.position;
        assert!(!kernel.contains(&built.solid, first.extend(17.0)).unwrap());
        assert!(kernel.contains(&built.solid, DVec3::new(0.0, 0.0, 2.0)).unwrap());
        assert!(!kernel.contains(&built.solid, DVec3::new(41.8, 0.0, 25.0)).unwrap());
    }

    #[test]
    fn test_compound_rect_equals_intersected_cuts() {
        let settings = settings();
        let kernel = PreviewKernel::new();
        let provider = GridBinProvider::new(&settings);
        let builder = HolderBuilder::new(&kernel, &provider, &settings);

        let holder = Holder::new(
            "connector",
            Version::new(1, 0, 0),
            ContainerSpec::from_fill_depth(1, 1, 7.0, 18.0, &settings).unwrap(),
            HoleSpec::rect_double(17.3, 7.8, 6.1, 11.9).unwrap(),
            PerAxis::splat(1),
        );
        let built = builder.build(&holder).unwrap();
        assert_eq!(
            built.stages,
            vec![
                BuildStage::ContainerAcquired,
                BuildStage::HolesCut,
                BuildStage::Finished
            ]
        );

        let container = provider.make_box(&kernel, &holder.container, true).unwrap();
        let plane = Workplane::xy().offset(container.fill_height);
        let wide = kernel
            .cut_blind(
                &container.solid,
                &plane,
                &Wire2D::rectangle(DVec2::ZERO, 17.3, 7.8),
                -15.0,
            )
            .unwrap();
        let tall = kernel
            .cut_blind(
                &container.solid,
                &plane,
                &Wire2D::rectangle(DVec2::ZERO, 6.1, 11.9),
                -15.0,
            )
            .unwrap();
        let expected = kernel
            .boolean(&wide, &tall, BooleanType::Intersect)
            .unwrap();

        assert!(kernel.same_shape(&built.solid, &expected).unwrap());
        let z = container.fill_height - 1.0;
        assert!(!kernel.contains(&built.solid, DVec3::new(8.0, 0.0, z)).unwrap());
        assert!(!kernel.contains(&built.solid, DVec3::new(0.0, 5.5, z)).unwrap());
        assert!(kernel.contains(&built.solid, DVec3::new(8.0, 5.0, z)).unwrap());
    }

    #[test]
    fn test_slot_groups_chamfer_their_own_rims() {
        let settings = settings();
        let kernel = PreviewKernel::new();
        let provider = GridBinProvider::new(&settings);
        let builder = HolderBuilder::new(&kernel, &provider, &settings);

        let holder = SlotHolder::new(
            "slots",
            Version::new(1, 0, 0),
            ContainerSpec::from_fill_depth(1, 1, 5.0, 25.0, &settings).unwrap(),
        )
        .with_group(
            vec![Slot::new(-8.0, 0.0, 6.0, 20.0, 10.0)],
            SideChamfers::uniform(1.0),
        )
        .with_group(
            vec![
                Slot::new(5.0, 0.0, 2.0, 20.0, 8.0),
                Slot::new(12.0, 0.0, 2.0, 20.0, 8.0),
            ],
            SideChamfers::per_axis(0.5, 1.5),
        )
        .with_lip_removal(LipRemoval::default());

        let built = builder.build_slots(&holder).unwrap();
        assert_eq!(
            built.stages,
            vec![
                BuildStage::ContainerAcquired,
                BuildStage::HolesCut,
                BuildStage::Chamfered,
                BuildStage::HolesCut,
                BuildStage::Chamfered,
                BuildStage::Chamfered,
                BuildStage::LipRemoved,
                BuildStage::Finished,
            ]
        );
        assert_eq!(built.chamfered_edges, vec![4, 8]);
        assert_eq!(built.filleted_edges, 8);

        let finishes = kernel.finishes(&built.solid).unwrap();
        let sizes: Vec<f64> = finishes.iter().map(|f| f.size).collect();
        assert_eq!(sizes, vec![1.0, 1.5, 0.5, 0.3]);
        // the second group's Y sides run along X, its X sides along Y
        assert!(
            finishes[1]
                .edges
                .iter()
                .all(|e| (e.start.y - e.end.y).abs() < 1e-9 && (e.start.z - 25.0).abs() < 1e-6)
        );
        assert!(
            finishes[2]
                .edges
                .iter()
                .all(|e| (e.start.x - e.end.x).abs() < 1e-9 && e.start.x > 0.0)
        );

        assert!(!kernel.contains(&built.solid, DVec3::new(-8.0, 0.0, 16.0)).unwrap());
        assert!(kernel.contains(&built.solid, DVec3::new(-8.0, 0.0, 14.0)).unwrap());
        assert!(!kernel.contains(&built.solid, DVec3::new(12.0, 9.0, 18.0)).unwrap());
        assert!(kernel.contains(&built.solid, DVec3::new(12.0, 9.0, 16.0)).unwrap());
    }

    #[test]
    fn test_invalid_holder_fails_before_kernel() {
        let settings = settings();
        let kernel = hf_cad::NullKernel;
        let provider = GridBinProvider::new(&settings);
        let builder = HolderBuilder::new(&kernel, &provider, &settings);

        let holder = Holder {
            hole_count: PerAxis::new(0, 1),
            ..drill_holder(&settings)
        };
        assert!(matches!(
            builder.build(&holder),
            Err(Error::Config(ConfigError::ZeroCount { .. }))
        ));

        // a valid holder reaches the kernel and fails there
        assert!(matches!(
            builder.build(&drill_holder(&settings)),
            Err(Error::Kernel(CadError::KernelNotAvailable(_)))
        ));
    }

    #[test]
    fn test_oversized_chamfer_is_a_kernel_error() {
        let settings = settings();
        let kernel = TestKernel::with_max_chamfer(1.0);
        let provider = GridBinProvider::new(&settings);
        let builder = HolderBuilder::new(&kernel, &provider, &settings);

        let gentle = drill_holder(&settings).with_chamfer(0.5);
        assert!(builder.build(&gentle).is_ok());

        let harsh = drill_holder(&settings).with_chamfer(2.0);
        assert!(matches!(
            builder.build(&harsh),
            Err(Error::Kernel(CadError::OperationFailed(_)))
        ));
    }
}
