//! Boolean composition of built holders
//!
//! Folds run left to right with the first solid as the seed. The kernel's
//! union and intersection are treated as commutative and associative, so
//! the order of the inputs does not change the result beyond floating point
//! noise in the kernel.

use hf_cad::{BooleanType, CadKernel, Solid};

use crate::builder::HolderBuilder;
use crate::error::{ConfigError, Result};
use crate::holder::Holder;

fn fold(kernel: &dyn CadKernel, solids: &[Solid], op: BooleanType, what: &str) -> Result<Solid> {
    let (seed, rest) = solids
        .split_first()
        .ok_or_else(|| ConfigError::EmptyComposition(what.to_string()))?;

    let mut result = seed.clone();
    for solid in rest {
        result = kernel.boolean(&result, solid, op)?;
    }
    Ok(result)
}

/// Build every holder and intersect the results
///
/// The result keeps the cut-outs of all holders, which lets one part combine
/// several hole patterns on congruent containers.
pub fn intersect_all(builder: &HolderBuilder<'_>, holders: &[Holder]) -> Result<Solid> {
    if holders.is_empty() {
        return Err(ConfigError::EmptyComposition("intersection".into()).into());
    }
    let solids = holders
        .iter()
        .map(|holder| builder.build(holder).map(|built| built.solid))
        .collect::<Result<Vec<_>>>()?;
    intersect_solids(builder.kernel(), &solids)
}

/// Intersect already built solids
pub fn intersect_solids(kernel: &dyn CadKernel, solids: &[Solid]) -> Result<Solid> {
    fold(kernel, solids, BooleanType::Intersect, "intersection")
}

/// Union already built solids
pub fn union_all(kernel: &dyn CadKernel, solids: &[Solid]) -> Result<Solid> {
    fold(kernel, solids, BooleanType::Union, "union")
}
