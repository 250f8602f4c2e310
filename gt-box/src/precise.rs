//! Padded and size-normalized boxes around instances.

use crate::{common::*, config::SamplerConfig, mask::TightBox};

/// A padded box whose extents are multiples of the size multiple, labeled
/// by its instance id.
pub type PreciseBox = Label<TLHW<i64>, u16>;

/// Pads a tight box and trims its extents down to multiples of the size multiple.
///
/// The trimmed length is split so that the origin moves by half of it,
/// rounded down. Returns `None` if the result does not fit in the image.
pub fn precise_box(tight: &TightBox, config: &SamplerConfig) -> Option<PreciseBox> {
    let multiple = config.size_multiple;
    let padded = tight.rect.pad(config.padding);
    let [t, l, h, w] = padded.tlhw();

    let h_rem = h % multiple;
    let w_rem = w % multiple;
    let rect = TLHW::from_tlhw([t + h_rem / 2, l + w_rem / 2, h - h_rem, w - w_rem]);

    rect.is_inside(&config.image_size())
        .then(|| Label::new(rect, tight.class))
}
