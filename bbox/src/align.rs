//! Grid alignment of integer coordinates.

use crate::common::*;
use std::fmt::Debug;

/// Computes the remainder of `value` divided by `step`, always in `[0, step)`.
pub fn mod_floor<T>(value: T, step: T) -> T
where
    T: PrimInt + Signed,
{
    let rem = value % step;
    if rem < T::zero() {
        rem + step
    } else {
        rem
    }
}

/// Returns the offset that moves a coordinate onto the nearest multiple of `step`.
///
/// The `remainder` is the coordinate modulo `step`. Remainders up to the half
/// step go down to the lower multiple, larger ones go up. A remainder outside
/// `[0, step)` is an error.
pub fn snap_offset<T>(remainder: T, step: T) -> Result<T>
where
    T: PrimInt + Signed + Debug,
{
    let zero = T::zero();
    let half = step / (T::one() + T::one());

    if remainder >= zero && remainder <= half {
        Ok(-remainder)
    } else if remainder > half && remainder < step {
        Ok(step - remainder)
    } else {
        bail!(
            "invalid remainder {:?}, expect a value in [0, {:?})",
            remainder,
            step
        )
    }
}

/// Moves `value` onto the nearest multiple of `step`.
pub fn snap<T>(value: T, step: T) -> Result<T>
where
    T: PrimInt + Signed + Debug,
{
    Ok(value + snap_offset(mod_floor(value, step), step)?)
}

/// Rounds `value` down to a multiple of `step`.
pub fn align_down<T>(value: T, step: T) -> T
where
    T: PrimInt + Signed,
{
    value - mod_floor(value, step)
}

/// Rounds `value` up to the multiple of `step` just above its floor multiple.
///
/// A value already on the grid moves one full step up.
pub fn align_up_strict<T>(value: T, step: T) -> T
where
    T: PrimInt + Signed,
{
    align_down(value, step) + step
}
