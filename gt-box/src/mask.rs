//! Instance mask loading and tight box extraction.

use crate::common::*;

/// The pixel extent of one instance, labeled by its instance id.
///
/// The bottom and right sides are the last rows and columns carrying the id.
pub type TightBox = Label<TLBR<i64>, u16>;

/// A per-pixel instance id map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceMask {
    ids: Array2<u16>,
}

impl InstanceMask {
    /// Decodes a mask image and keeps the given channel as instance ids.
    pub fn open<P>(path: P, channel: usize) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("failed to decode mask image '{}'", path.display()))?;
        Self::from_image(image, channel)
            .with_context(|| format!("invalid mask image '{}'", path.display()))
    }

    pub fn from_image(image: DynamicImage, channel: usize) -> Result<Self> {
        let (width, height) = image.dimensions();
        let (samples, num_channels) = native_samples(image)?;
        ensure!(
            channel < num_channels,
            "channel {} is requested, but the image has {} channels",
            channel,
            num_channels
        );

        let pixels = Array3::from_shape_vec(
            (height as usize, width as usize, num_channels),
            samples,
        )?;
        let ids = pixels.index_axis_move(Axis(2), channel);
        Ok(Self { ids })
    }

    pub fn from_ids(ids: Array2<u16>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> ArrayView2<'_, u16> {
        self.ids.view()
    }

    pub fn size(&self) -> HW<i64> {
        let (h, w) = self.ids.dim();
        HW::from_hw([h as i64, w as i64])
    }

    /// Computes the extent of pixels carrying `instance_id`.
    ///
    /// Returns `None` if no pixel has the id.
    pub fn tight_box(&self, instance_id: u16) -> Option<TightBox> {
        let [t, l, b, r] = self
            .ids
            .indexed_iter()
            .filter(|(_, &id)| id == instance_id)
            .fold(None, |extent, ((row, col), _)| {
                Some(expand_extent(extent, row as i64, col as i64))
            })?;

        Some(Label::new(TLBR::from_tlbr([t, l, b, r]), instance_id))
    }

    /// Computes tight boxes of ids `1..=max_instances` in a single scan.
    ///
    /// The boxes are ordered by instance id. Absent ids are skipped.
    pub fn tight_boxes(&self, max_instances: u16) -> Vec<TightBox> {
        let mut extents: Vec<Option<[i64; 4]>> = vec![None; max_instances as usize + 1];

        self.ids
            .indexed_iter()
            .filter(|(_, &id)| id != 0 && id <= max_instances)
            .for_each(|((row, col), &id)| {
                let extent = &mut extents[id as usize];
                *extent = Some(expand_extent(*extent, row as i64, col as i64));
            });

        extents
            .into_iter()
            .enumerate()
            .filter_map(|(id, extent)| {
                let [t, l, b, r] = extent?;
                Some(Label::new(TLBR::from_tlbr([t, l, b, r]), id as u16))
            })
            .collect()
    }
}

fn expand_extent(extent: Option<[i64; 4]>, row: i64, col: i64) -> [i64; 4] {
    match extent {
        Some([t, l, b, r]) => [t.min(row), l.min(col), b.max(row), r.max(col)],
        None => [row, col, row, col],
    }
}

/// Extracts interleaved samples without rescaling the bit depth.
fn native_samples(image: DynamicImage) -> Result<(Vec<u16>, usize)> {
    use image::DynamicImage as D;

    let widen = |raw: Vec<u8>| -> Vec<u16> { raw.into_iter().map(u16::from).collect() };

    let output = match image {
        D::ImageLuma8(buf) => (widen(buf.into_raw()), 1),
        D::ImageLumaA8(buf) => (widen(buf.into_raw()), 2),
        D::ImageRgb8(buf) => (widen(buf.into_raw()), 3),
        D::ImageRgba8(buf) => (widen(buf.into_raw()), 4),
        D::ImageLuma16(buf) => (buf.into_raw(), 1),
        D::ImageLumaA16(buf) => (buf.into_raw(), 2),
        D::ImageRgb16(buf) => (buf.into_raw(), 3),
        D::ImageRgba16(buf) => (buf.into_raw(), 4),
        image => bail!("unsupported pixel format {:?}", image.color()),
    };

    Ok(output)
}
