//! Random positive and negative box generation.
//!
//! A positive box is the precise box of an instance moved by a small random
//! shift. A negative box is moved by a large shift instead, so that it lands
//! away from the instance. Both are snapped to the alignment grid and must fit
//! in the image.

use crate::{
    common::*,
    config::SamplerConfig,
    mask::TightBox,
    precise::{precise_box, PreciseBox},
};
use bbox::{align_down, align_up_strict, snap};

/// The class of a sampled box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxClass {
    Positive { instance_id: u16 },
    Negative,
}

impl BoxClass {
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Positive { .. })
    }

    /// The `(is_positive, instance_id)` pair stored in box files.
    ///
    /// Negative boxes carry the instance id -1.
    pub fn to_record(&self) -> [i64; 2] {
        match *self {
            Self::Positive { instance_id } => [1, instance_id as i64],
            Self::Negative => [0, -1],
        }
    }

    pub fn from_record(record: [i64; 2]) -> Result<Self> {
        let class = match record {
            [1, id] => {
                let instance_id = u16::try_from(id)
                    .map_err(|_| format_err!("invalid instance id {}", id))?;
                Self::Positive { instance_id }
            }
            [0, -1] => Self::Negative,
            [flag, id] => bail!("invalid box label ({}, {})", flag, id),
        };
        Ok(class)
    }
}

impl fmt::Display for BoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive { .. } => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// A grid-aligned box with its class.
pub type SampledBox = Label<TLHW<i64>, BoxClass>;

/// Draws the shift of a positive box, uniform on `[-positive_shift, positive_shift]`.
pub fn positive_shift<R>(rng: &mut R, config: &SamplerConfig) -> i64
where
    R: Rng + ?Sized,
{
    let max = config.positive_shift;
    rng.gen_range(-max..=max)
}

/// Draws the shift of a negative box.
///
/// The shift is uniform on `[-negative_shift, negative_shift]`, except that
/// draws within `negative_min_offset` of zero are pushed away from zero by
/// `negative_min_offset`.
pub fn negative_shift<R>(rng: &mut R, config: &SamplerConfig) -> i64
where
    R: Rng + ?Sized,
{
    let max = config.negative_shift;
    let min = config.negative_min_offset;
    let shift = rng.gen_range(-max..=max);

    if (0..=min).contains(&shift) {
        shift + min
    } else if (-min..0).contains(&shift) {
        shift - min
    } else {
        shift
    }
}

/// Generates a positive box for an instance.
///
/// Returns `Ok(None)` if the instance has no precise box or the shifted box
/// falls out of the image. Errors indicate broken alignment invariants.
pub fn positive_box<R>(
    rng: &mut R,
    tight: &TightBox,
    config: &SamplerConfig,
) -> Result<Option<SampledBox>>
where
    R: Rng + ?Sized,
{
    let shift = positive_shift(rng, config);
    let precise = match precise_box(tight, config) {
        Some(precise) => precise,
        None => return Ok(None),
    };
    place_positive(&precise, shift, config)
}

/// Generates a negative box next to an instance.
///
/// Returns `Ok(None)` if the instance has no precise box or the shifted box
/// falls out of the image. Errors indicate broken alignment invariants.
pub fn negative_box<R>(
    rng: &mut R,
    tight: &TightBox,
    config: &SamplerConfig,
) -> Result<Option<SampledBox>>
where
    R: Rng + ?Sized,
{
    let shift = negative_shift(rng, config);
    let precise = match precise_box(tight, config) {
        Some(precise) => precise,
        None => return Ok(None),
    };
    place_negative(&precise, shift, config)
}

/// Moves a precise box by `shift` on both axes to make a positive box.
///
/// An axis that falls out of the image is moved by `-shift` instead and
/// aligned in the direction of the flipped shift.
pub fn place_positive(
    precise: &PreciseBox,
    shift: i64,
    config: &SamplerConfig,
) -> Result<Option<SampledBox>> {
    let step = config.alignment;
    let size = config.image_size();
    let [t0, l0, h, w] = precise.rect.tlhw();
    let round_up = -shift >= 0;

    let mut t = snap(t0 + shift, step)?;
    let mut l = snap(l0 + shift, step)?;

    if is_outside(t, h, size.h()) {
        let t_flipped = t0 - shift;
        t = if round_up {
            align_up_strict(t_flipped, step)
        } else {
            align_down(t_flipped, step)
        };
    }
    if is_outside(l, w, size.w()) {
        let l_flipped = l0 - shift;
        l = if round_up {
            align_up_strict(l_flipped, step)
        } else {
            align_down(l_flipped, step)
        };
    }

    let sampled = precise.with_origin(t, l).with_class(BoxClass::Positive {
        instance_id: precise.class,
    });
    check_box(sampled, config)
}

/// Moves a precise box by `shift` on both axes to make a negative box.
///
/// An axis that falls out of the image gets a flipped shift: negated if its
/// magnitude is within `flip_threshold`, otherwise negated and halved. The
/// left axis is repaired first and its flipped shift carries over to the top
/// axis.
pub fn place_negative(
    precise: &PreciseBox,
    shift: i64,
    config: &SamplerConfig,
) -> Result<Option<SampledBox>> {
    let step = config.alignment;
    let size = config.image_size();
    let [t0, l0, h, w] = precise.rect.tlhw();

    let mut t = snap(t0 + shift, step)?;
    let mut l = snap(l0 + shift, step)?;
    let mut shift = r64(shift as f64);

    if is_outside(l, w, size.w()) {
        shift = flip_shift(shift, config.flip_threshold);
        l = align_toward(r64(l0 as f64) + shift, step, shift <= r64(0.0));
    }
    if is_outside(t, h, size.h()) {
        shift = flip_shift(shift, config.flip_threshold);
        t = align_toward(r64(t0 as f64) + shift, step, shift <= r64(0.0));
    }

    let sampled = precise
        .with_origin(t, l)
        .with_class(BoxClass::Negative);
    check_box(sampled, config)
}

fn is_outside(origin: i64, extent: i64, bound: i64) -> bool {
    origin < 0 || origin + extent >= bound
}

fn flip_shift(shift: R64, threshold: i64) -> R64 {
    if shift.abs() <= r64(threshold as f64) {
        -shift
    } else {
        -(shift / r64(2.0))
    }
}

/// Aligns a possibly fractional coordinate to the grid.
fn align_toward(value: R64, step: i64, round_up: bool) -> i64 {
    let floor = (value / r64(step as f64)).floor().raw() as i64 * step;
    if round_up {
        floor + step
    } else {
        floor
    }
}

fn check_box(sampled: SampledBox, config: &SamplerConfig) -> Result<Option<SampledBox>> {
    let [t, l, h, w] = sampled.rect.tlhw();

    ensure!(
        h % config.size_multiple == 0 && w % config.size_multiple == 0,
        "the {} box size ({}, {}) is not a multiple of {}",
        sampled.class,
        h,
        w,
        config.size_multiple
    );
    ensure!(
        t % config.alignment == 0 && l % config.alignment == 0,
        "the {} box location ({}, {}) is not a multiple of {}",
        sampled.class,
        t,
        l,
        config.alignment
    );

    if !sampled.rect.is_inside(&config.image_size()) {
        debug!(
            "the {} box at ({}, {}) with size ({}, {}) is out of boundary",
            sampled.class, t, l, h, w
        );
        return Ok(None);
    }

    Ok(Some(sampled))
}
