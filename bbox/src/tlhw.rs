use super::{Rect, TLBR};
use crate::common::*;

/// Bounding box in TLHW format, the top-left corner and the extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TLHW<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) h: T,
    pub(crate) w: T,
}

impl<T> TLHW<T> {
    pub fn try_cast<V>(self) -> Option<TLHW<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(TLHW {
            t: V::from(self.t)?,
            l: V::from(self.l)?,
            h: V::from(self.h)?,
            w: V::from(self.w)?,
        })
    }
}

impl<T> TLHW<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn from_tlhw(tlhw: [T; 4]) -> Self {
        Self::try_from_tlhw(tlhw).unwrap()
    }

    /// Moves the top-left corner, keeping the extent.
    pub fn with_origin(&self, t: T, l: T) -> Self {
        Self { t, l, ..*self }
    }

    pub fn translate(&self, dt: T, dl: T) -> Self {
        self.with_origin(self.t + dt, self.l + dl)
    }
}

impl<T> Rect for TLHW<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.t + self.h
    }

    fn r(&self) -> Self::Type {
        self.l + self.w
    }

    fn h(&self) -> Self::Type {
        self.h
    }

    fn w(&self) -> Self::Type {
        self.w
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");
        Ok(Self {
            t,
            l,
            h: b - t,
            w: r - l,
        })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let zero = T::zero();
        ensure!(h >= zero && w >= zero, "h and w must be non-negative");
        Ok(Self { t, l, h, w })
    }
}

impl<T> From<TLBR<T>> for TLHW<T>
where
    T: Copy + Num + PartialOrd,
{
    fn from(from: TLBR<T>) -> Self {
        Self::from(&from)
    }
}

impl<T> From<&TLBR<T>> for TLHW<T>
where
    T: Copy + Num + PartialOrd,
{
    fn from(from: &TLBR<T>) -> Self {
        Self {
            t: from.t(),
            l: from.l(),
            h: from.h(),
            w: from.w(),
        }
    }
}
