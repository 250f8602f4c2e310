//! Integer bounding box types and grid alignment functions.

mod common;

pub mod align;
pub use align::*;

pub use rect::*;
pub mod rect;

pub use tlbr::*;
pub mod tlbr;

pub use tlhw::*;
pub mod tlhw;

pub use hw::*;
pub mod hw;

pub use into_hw::*;
pub mod into_hw;

pub mod prelude {
    pub use crate::rect::{Rect, RectNum};
}
