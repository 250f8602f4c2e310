pub use anyhow::{bail, ensure, Result};
pub use num_traits::{Num, NumCast, PrimInt, Signed, ToPrimitive, Zero};
pub use std::ops::Mul;
