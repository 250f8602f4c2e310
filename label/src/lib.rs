use bbox::{Rect, TLHW};
use num_traits::Num;

/// A rectangle annotated with a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<R, C> Label<R, C>
where
    R: Rect,
{
    pub fn new(rect: R, class: C) -> Self {
        Self { rect, class }
    }

    /// Replaces the class, keeping the rectangle.
    pub fn with_class<D>(self, class: D) -> Label<R, D> {
        Label {
            rect: self.rect,
            class,
        }
    }
}

impl<T, C> Label<TLHW<T>, C>
where
    T: Copy + Num + PartialOrd,
    C: Copy,
{
    /// Moves the rectangle to a new top-left corner.
    pub fn with_origin(&self, t: T, l: T) -> Self {
        Label {
            rect: self.rect.with_origin(t, l),
            class: self.class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbox::RectNum;

    #[test]
    fn label_with_origin_keeps_class() {
        let label = Label::new(TLHW::from_tlhw([8, 8, 24, 48]), 3u16);
        let moved = label.with_origin(16, 0);
        assert_eq!(moved.rect.tlhw(), [16, 0, 24, 48]);
        assert_eq!(moved.class, 3);

        let relabeled = moved.with_class("car");
        assert_eq!(relabeled.class, "car");
    }
}
