//! Rejection of negative boxes that land on an instance.

use crate::{common::*, config::SamplerConfig, precise::PreciseBox, sampler::SampledBox};

/// The coordinates compared by the overlap test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlapAxes {
    /// Compares the precise box top against both the candidate top and left.
    ///
    /// This reproduces the test that produced existing box files.
    #[derivative(Default)]
    Reference,
    /// Compares top against top and left against left.
    PerAxis,
}

/// Checks if a candidate box origin falls within `overlap_distance` of the
/// origin of any precise box.
pub fn overlaps_positive(
    precise_boxes: &[PreciseBox],
    candidate: &SampledBox,
    config: &SamplerConfig,
) -> bool {
    let distance = config.overlap_distance;
    let ct = candidate.rect.t();
    let cl = candidate.rect.l();

    precise_boxes.iter().any(|precise| {
        let pt = precise.rect.t();
        let pl = precise.rect.l();

        match config.overlap_axes {
            OverlapAxes::Reference => (pt - ct).abs() <= distance && (pt - cl).abs() <= distance,
            OverlapAxes::PerAxis => (pt - ct).abs() <= distance && (pl - cl).abs() <= distance,
        }
    })
}
