use super::{HW, TLBR, TLHW};
use crate::common::*;

/// The generic rectangle.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Copy + Num + PartialOrd,
{
    fn tlbr(&self) -> [Self::Type; 4] {
        [self.t(), self.l(), self.b(), self.r()]
    }

    fn tlhw(&self) -> [Self::Type; 4] {
        [self.t(), self.l(), self.h(), self.w()]
    }

    fn hw(&self) -> [Self::Type; 2] {
        [self.h(), self.w()]
    }

    fn to_tlbr(&self) -> TLBR<Self::Type> {
        TLBR {
            t: self.t(),
            l: self.l(),
            b: self.b(),
            r: self.r(),
        }
    }

    fn to_tlhw(&self) -> TLHW<Self::Type> {
        TLHW {
            t: self.t(),
            l: self.l(),
            h: self.h(),
            w: self.w(),
        }
    }

    fn area(&self) -> <Self::Type as Mul<Self::Type>>::Output
    where
        Self::Type: Mul<Self::Type>,
    {
        self.h() * self.w()
    }

    /// Checks if the rectangle lies inside an image of the given size.
    ///
    /// The top-left corner must be non-negative, and the bottom-right corner
    /// must be strictly less than the image height and width.
    fn is_inside(&self, size: &HW<Self::Type>) -> bool {
        let zero = Self::Type::zero();
        self.t() >= zero && self.l() >= zero && self.b() < size.h() && self.r() < size.w()
    }

    /// Checks if both corners and extents are multiples of the grid steps.
    fn is_aligned(&self, origin_step: Self::Type, size_step: Self::Type) -> bool {
        let zero = Self::Type::zero();
        self.t() % origin_step == zero
            && self.l() % origin_step == zero
            && self.h() % size_step == zero
            && self.w() % size_step == zero
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Copy + Num + PartialOrd,
{
}
