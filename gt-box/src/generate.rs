//! Per-image box set generation.

use crate::{
    common::*,
    config::SamplerConfig,
    mask::{InstanceMask, TightBox},
    overlap::overlaps_positive,
    precise::{precise_box, PreciseBox},
    sampler::{negative_box, positive_box, SampledBox},
};

/// The positive and negative boxes sampled from one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxSet {
    boxes: Vec<SampledBox>,
}

impl BoxSet {
    pub fn boxes(&self) -> &[SampledBox] {
        &self.boxes
    }

    pub fn into_boxes(self) -> Vec<SampledBox> {
        self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn num_positives(&self) -> usize {
        self.boxes
            .iter()
            .filter(|sampled| sampled.class.is_positive())
            .count()
    }
}

/// The reason an image produces no boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoBoxesReason {
    /// The mask carries no instance id.
    NoInstances,
    /// Every attempt of the main sampling rounds failed.
    AllAttemptsFailed,
    /// The remaining quota could not be filled within the retry limit.
    RetriesExhausted,
}

impl fmt::Display for NoBoxesReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoInstances => "no instance found",
            Self::AllAttemptsFailed => "all sampling attempts failed",
            Self::RetriesExhausted => "retry limit reached",
        };
        write!(f, "{}", text)
    }
}

/// The result of box generation for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Boxes(BoxSet),
    NoBoxes(NoBoxesReason),
}

impl Outcome {
    pub fn box_set(&self) -> Option<&BoxSet> {
        match self {
            Self::Boxes(box_set) => Some(box_set),
            Self::NoBoxes(_) => None,
        }
    }
}

/// How a negative draw that yields no box is handled while retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingNegative {
    Fail,
    Retry,
}

/// Samples the box set of an instance mask.
pub fn generate_for_mask<R>(
    rng: &mut R,
    mask: &InstanceMask,
    config: &SamplerConfig,
) -> Result<Outcome>
where
    R: Rng + ?Sized,
{
    let tight_boxes = mask.tight_boxes(config.max_instances);
    generate_boxes(rng, &tight_boxes, config)
}

/// Samples `boxes_per_class` positive boxes and as many negative boxes.
///
/// Instances take turns in rounds. Each round draws a positive box and a
/// negative box per instance, and a failed pair counts as invalid. Once
/// the rounds end, pairs are drawn again until the remainder of the quota
/// and the invalid count are covered.
///
/// Errors are invalid configurations and broken invariants, including a box
/// set of the wrong size.
pub fn generate_boxes<R>(
    rng: &mut R,
    tight_boxes: &[TightBox],
    config: &SamplerConfig,
) -> Result<Outcome>
where
    R: Rng + ?Sized,
{
    config.validate()?;

    let num_instances = tight_boxes.len();
    if num_instances == 0 {
        return Ok(Outcome::NoBoxes(NoBoxesReason::NoInstances));
    }

    let precise_boxes: Vec<PreciseBox> = tight_boxes
        .iter()
        .filter_map(|tight| precise_box(tight, config))
        .collect();
    let num_rounds = config.boxes_per_class / num_instances;
    let remainder = config.boxes_per_class % num_instances;
    let mut boxes = Vec::with_capacity(config.num_boxes());
    let mut num_invalid = 0;

    debug!(
        "{} instances, {} rounds, {} remainder",
        num_instances, num_rounds, remainder
    );

    // main rounds
    for _ in 0..num_rounds {
        for tight in tight_boxes {
            let positive = match positive_box(rng, tight, config)? {
                Some(positive) => positive,
                None => {
                    num_invalid += 1;
                    continue;
                }
            };
            let negative = match sample_negative(
                rng,
                tight,
                &precise_boxes,
                config,
                MissingNegative::Fail,
            )? {
                Some(negative) => negative,
                None => {
                    num_invalid += 1;
                    continue;
                }
            };
            boxes.push(positive);
            boxes.push(negative);
        }
    }

    if num_invalid == num_rounds * num_instances {
        return Ok(Outcome::NoBoxes(NoBoxesReason::AllAttemptsFailed));
    }

    // fill the remainder and the invalid pairs
    let mut num_pending = remainder + num_invalid;
    let mut num_idle_passes = 0;

    while num_pending > 0 {
        let mut accepted = false;

        for tight in tight_boxes {
            if num_pending == 0 {
                break;
            }

            let positive = match positive_box(rng, tight, config)? {
                Some(positive) => positive,
                None => continue,
            };
            let negative = match sample_negative(
                rng,
                tight,
                &precise_boxes,
                config,
                MissingNegative::Retry,
            )? {
                Some(negative) => negative,
                None => continue,
            };
            boxes.push(positive);
            boxes.push(negative);
            num_pending -= 1;
            accepted = true;
        }

        if accepted {
            num_idle_passes = 0;
        } else {
            num_idle_passes += 1;
            if num_idle_passes >= config.max_retries {
                warn!(
                    "gave up after {} passes without a box pair, {} pairs missing",
                    num_idle_passes, num_pending
                );
                return Ok(Outcome::NoBoxes(NoBoxesReason::RetriesExhausted));
            }
        }
    }

    ensure!(
        boxes.len() == config.num_boxes(),
        "number of boxes is not {}, is {}",
        config.num_boxes(),
        boxes.len()
    );

    Ok(Outcome::Boxes(BoxSet { boxes }))
}

/// Draws negative boxes until one does not overlap any precise box.
///
/// Returns `None` after `max_retries` draws, or at the first missing box
/// if `missing` is [MissingNegative::Fail].
fn sample_negative<R>(
    rng: &mut R,
    tight: &TightBox,
    precise_boxes: &[PreciseBox],
    config: &SamplerConfig,
    missing: MissingNegative,
) -> Result<Option<SampledBox>>
where
    R: Rng + ?Sized,
{
    for _ in 0..config.max_retries {
        match negative_box(rng, tight, config)? {
            Some(negative) if !overlaps_positive(precise_boxes, &negative, config) => {
                return Ok(Some(negative));
            }
            Some(_) => {}
            None => {
                if missing == MissingNegative::Fail {
                    return Ok(None);
                }
            }
        }
    }

    debug!(
        "no negative box found for instance {} after {} draws",
        tight.class, config.max_retries
    );
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{overlap::OverlapAxes, sampler::BoxClass};

    fn tight(tlbr: [i64; 4], id: u16) -> TightBox {
        Label::new(TLBR::from_tlbr(tlbr), id)
    }

    /// Yields zero for the first `num_zeros` words, then the middle of the
    /// word range, so that ranged draws return the lower bound and then the
    /// midpoint.
    struct ScriptedRng {
        num_zeros: usize,
        count: usize,
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.count += 1;
            if self.count <= self.num_zeros {
                0
            } else {
                1 << 63
            }
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn no_instances() {
        let config = SamplerConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = generate_boxes(&mut rng, &[], &config).unwrap();
        assert_eq!(outcome, Outcome::NoBoxes(NoBoxesReason::NoInstances));
    }

    #[test]
    fn instances_without_precise_boxes() {
        let config = SamplerConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        let tight_boxes = [tight([0, 0, 10, 10], 1), tight([1010, 2000, 1020, 2040], 2)];
        let outcome = generate_boxes(&mut rng, &tight_boxes, &config).unwrap();
        assert_eq!(outcome, Outcome::NoBoxes(NoBoxesReason::AllAttemptsFailed));
    }

    #[test]
    fn four_instances_fill_the_quota() {
        let config = SamplerConfig::default();
        let tight_boxes = [
            tight([100, 100, 200, 150], 1),
            tight([300, 600, 420, 700], 2),
            tight([500, 1200, 560, 1300], 3),
            tight([700, 1500, 900, 1700], 4),
        ];

        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = generate_boxes(&mut rng, &tight_boxes, &config).unwrap();

            let box_set = match outcome {
                Outcome::Boxes(box_set) => box_set,
                Outcome::NoBoxes(reason) => panic!("unexpected outcome {}", reason),
            };
            assert_eq!(box_set.len(), 256);
            assert_eq!(box_set.num_positives(), 128);

            // pairs are stored as positive then negative
            box_set.boxes().chunks(2).for_each(|pair| {
                assert!(pair[0].class.is_positive());
                assert_eq!(pair[1].class, BoxClass::Negative);
            });
        }
    }

    #[test]
    fn negatives_avoid_positive_origins() {
        let config = SamplerConfig::default();
        let tight_boxes = [
            tight([100, 100, 200, 150], 1),
            tight([120, 400, 300, 500], 2),
            tight([600, 900, 800, 1000], 3),
        ];
        let precise_boxes: Vec<_> = tight_boxes
            .iter()
            .filter_map(|tight| precise_box(tight, &config))
            .collect();

        let mut rng = StdRng::seed_from_u64(3);
        let outcome = generate_boxes(&mut rng, &tight_boxes, &config).unwrap();
        let box_set = outcome.box_set().unwrap();

        box_set
            .boxes()
            .iter()
            .filter(|sampled| !sampled.class.is_positive())
            .for_each(|negative| {
                assert!(!overlaps_positive(&precise_boxes, negative, &config));
            });
    }

    #[test]
    fn quota_with_remainder() {
        let config = SamplerConfig {
            boxes_per_class: 10,
            ..Default::default()
        };
        let tight_boxes = [
            tight([100, 100, 200, 150], 1),
            tight([300, 600, 420, 700], 2),
            tight([500, 1200, 560, 1300], 3),
        ];

        let mut rng = StdRng::seed_from_u64(11);
        let outcome = generate_boxes(&mut rng, &tight_boxes, &config).unwrap();
        let box_set = outcome.box_set().unwrap();
        assert_eq!(box_set.len(), 20);
        assert_eq!(box_set.num_positives(), 10);
    }

    #[test]
    fn impossible_negatives_fail_every_attempt() {
        // negative shifts never leave the overlap zone
        let config = SamplerConfig {
            negative_shift: 0,
            negative_min_offset: 0,
            max_retries: 20,
            ..Default::default()
        };
        let tight_boxes = [tight([100, 100, 200, 150], 1)];

        let mut rng = StdRng::seed_from_u64(0);
        let outcome = generate_boxes(&mut rng, &tight_boxes, &config).unwrap();
        assert_eq!(outcome, Outcome::NoBoxes(NoBoxesReason::AllAttemptsFailed));
    }

    #[test]
    fn stalled_remainder_exhausts_retries() {
        let config = SamplerConfig {
            boxes_per_class: 2,
            max_retries: 3,
            overlap_axes: OverlapAxes::PerAxis,
            ..Default::default()
        };
        // the precise box is [850, 1800, 144, 96]
        let tight_boxes = [tight([872, 1823, 972, 1873], 1)];

        // the first round draws shifts -16 and -448 and succeeds, afterwards
        // shifts are 0 and 16, and every negative box lands at (864, 1816)
        // next to the instance
        let mut rng = ScriptedRng {
            num_zeros: 2,
            count: 0,
        };
        let outcome = generate_boxes(&mut rng, &tight_boxes, &config).unwrap();
        assert_eq!(outcome, Outcome::NoBoxes(NoBoxesReason::RetriesExhausted));

        // the second round, then one pass per retry, each with a positive draw
        // and a full run of negative draws
        assert_eq!(rng.count, 2 + 4 * 4);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SamplerConfig {
            alignment: 0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tight_boxes = [tight([100, 100, 200, 150], 1)];
        assert!(generate_boxes(&mut rng, &tight_boxes, &config).is_err());
        assert!(generate_boxes(&mut rng, &[], &config).is_err());
    }
}
