//! Shipped holder configurations

use semver::Version;

use crate::batch::{Batch, BatchEntry};
use crate::container::ContainerSpec;
use crate::error::ConfigError;
use crate::hole::HoleSpec;
use crate::holder::{Holder, LipRemoval};
use crate::layout::{PerAxis, PlanarAxis};
use crate::settings::BuildSettings;
use crate::size_policy::{MarginBlend, MarginGrowth, SizePolicy};
use crate::slots::{SideChamfers, Slot, SlotHolder};
use crate::spacer::Spacer;

const FILL_MM: f64 = 18.0;
const CELL_HEIGHT: f64 = 7.0;
const HOLE_DEPTH: f64 = 15.0;

fn container(
    cells_x: u32,
    cells_y: u32,
    settings: &BuildSettings,
) -> Result<ContainerSpec, ConfigError> {
    ContainerSpec::from_fill_depth(cells_x, cells_y, CELL_HEIGHT, FILL_MM, settings)
}

/// Holder for same-sized cylinders on a 2x1 bin, cut at their nominal size
fn cylinder_holder(
    name: &str,
    version: Version,
    diameter: f64,
    chamfer: f64,
    padding: (f64, f64),
    settings: &BuildSettings,
) -> Result<Holder, ConfigError> {
    let holder = Holder::new(
        name,
        version,
        container(2, 1, settings)?,
        HoleSpec::circle(diameter)?,
        PerAxis::new(4, 2),
    )
    .with_hole_depth(HOLE_DEPTH)
    .with_padding(padding.0, padding.1)
    .with_chamfer(chamfer)
    .with_lip_removal(LipRemoval::default());
    holder.validate()?;
    Ok(holder)
}

/// Drill bits from 0.5 mm to 10 mm, growing half a millimeter per hole
pub fn drill_bit_holder(settings: &BuildSettings) -> Result<Holder, ConfigError> {
    let holder = Holder::new(
        "drill bit holder",
        Version::new(1, 0, 0),
        container(2, 2, settings)?,
        HoleSpec::circle(0.5)?,
        PerAxis::new(5, 4),
    )
    .with_hole_depth(HOLE_DEPTH)
    .with_padding(6.0, 6.0)
    .with_reserved_band(PlanarAxis::Y, 12.0)
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
        Some(HoleSpec::circle(10.0)?),
    );
    holder.validate()?;
    Ok(holder)
}

pub fn aa_battery_holder(settings: &BuildSettings) -> Result<Holder, ConfigError> {
    cylinder_holder(
        "aa battery holder",
        Version::new(1, 0, 2),
        14.4,
        2.35,
        (2.0, 1.0),
        settings,
    )
}

pub fn aaa_battery_holder(settings: &BuildSettings) -> Result<Holder, ConfigError> {
    cylinder_holder(
        "aaa battery holder",
        Version::new(1, 0, 0),
        10.225,
        4.5,
        (3.5, 3.0),
        settings,
    )
}

pub fn chapstick_holder(settings: &BuildSettings) -> Result<Holder, ConfigError> {
    cylinder_holder(
        "chapstick holder",
        Version::new(1, 0, 1),
        15.6,
        1.7,
        (0.5, 0.3),
        settings,
    )
}

/// Wallet holder for a compact air duster: a wallet pocket first, then
/// SD card and card slots with lighter chamfers on their long sides
pub fn wallet_holder(settings: &BuildSettings) -> Result<SlotHolder, ConfigError> {
    let sd_depth = 12.5;
    let holder = SlotHolder::new(
        "wallet holder",
        Version::new(1, 0, 0),
        ContainerSpec::from_fill_depth(1, 3, 5.0, 25.0, settings)?,
    )
    .with_group(
        vec![Slot::new(-11.0, 0.0, 11.0, 104.0, 20.0)],
        SideChamfers::uniform(3.0),
    )
    .with_group(
        vec![
            Slot::new(6.75, 47.5, 2.5, 24.4, sd_depth),
            Slot::new(15.25, 47.5, 2.5, 24.4, sd_depth),
            Slot::new(15.25, -13.1, 2.5, 92.4, 20.0),
            Slot::new(6.75, -13.1, 2.5, 92.4, 20.0),
        ],
        SideChamfers::per_axis(1.0, 2.5),
    )
    .with_lip_removal(LipRemoval {
        upper_size: 1.25,
        fillet: 0.3,
    });
    holder.validate()?;
    Ok(holder)
}

/// Flanged washer for a towel roll holder
pub fn towel_roll_washer() -> Spacer {
    Spacer::flanged_washer(50.4, 45.4, 3.8)
}

/// Every shipped holder
pub fn all(settings: &BuildSettings) -> Result<Vec<Holder>, ConfigError> {
    Ok(vec![
        drill_bit_holder(settings)?,
        aa_battery_holder(settings)?,
        aaa_battery_holder(settings)?,
        chapstick_holder(settings)?,
    ])
}

/// Batch of every shipped part
pub fn batch(settings: BuildSettings) -> Result<Batch, ConfigError> {
    let mut entries: Vec<BatchEntry> = all(&settings)?
        .into_iter()
        .map(BatchEntry::Holder)
        .collect();
    entries.push(BatchEntry::SlotHolder(wallet_holder(&settings)?));
    entries.push(BatchEntry::Spacer(towel_roll_washer()));
    Ok(Batch::new(settings, entries))
}
