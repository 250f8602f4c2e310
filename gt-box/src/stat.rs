//! Instance box statistics of a dataset.

use crate::{
    common::*,
    config::SamplerConfig,
    mask::{InstanceMask, TightBox},
    precise::precise_box,
};
use prettytable::{cell, row, Table};

/// Running minimum, maximum and mean of box heights and widths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeStat {
    count: usize,
    min: Option<[i64; 2]>,
    max: Option<[i64; 2]>,
    sum: [i64; 2],
}

impl SizeStat {
    pub fn push(&mut self, [h, w]: [i64; 2]) {
        self.count += 1;
        self.min = Some(match self.min {
            Some([min_h, min_w]) => [min_h.min(h), min_w.min(w)],
            None => [h, w],
        });
        self.max = Some(match self.max {
            Some([max_h, max_w]) => [max_h.max(h), max_w.max(w)],
            None => [h, w],
        });
        self.sum = [self.sum[0] + h, self.sum[1] + w];
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn min(&self) -> Option<[i64; 2]> {
        self.min
    }

    pub fn max(&self) -> Option<[i64; 2]> {
        self.max
    }

    pub fn mean(&self) -> Option<[R64; 2]> {
        (self.count > 0).then(|| {
            let count = r64(self.count as f64);
            [
                r64(self.sum[0] as f64) / count,
                r64(self.sum[1] as f64) / count,
            ]
        })
    }
}

/// Instance statistics over a set of masks.
#[derive(Debug, Clone, Default)]
pub struct DatasetStat {
    pub num_files: usize,
    /// Maps the number of instances in a mask to the number of such masks.
    pub instance_histogram: BTreeMap<usize, usize>,
    pub tight: SizeStat,
    pub precise: SizeStat,
    /// Instances whose padded box does not fit in the image.
    pub num_without_precise: usize,
}

impl DatasetStat {
    pub fn add_tight_boxes(&mut self, tight_boxes: &[TightBox], config: &SamplerConfig) {
        self.num_files += 1;
        *self
            .instance_histogram
            .entry(tight_boxes.len())
            .or_insert(0) += 1;

        tight_boxes.iter().for_each(|tight| {
            self.tight.push(tight.rect.hw());
            match precise_box(tight, config) {
                Some(precise) => self.precise.push(precise.rect.hw()),
                None => self.num_without_precise += 1,
            }
        });
    }

    pub fn add_mask(&mut self, mask: &InstanceMask, config: &SamplerConfig) {
        let tight_boxes = mask.tight_boxes(config.max_instances);
        self.add_tight_boxes(&tight_boxes, config);
    }

    pub fn size_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["kind", "count", "min (h, w)", "max (h, w)", "mean (h, w)"]);

        [("tight", &self.tight), ("precise", &self.precise)]
            .iter()
            .for_each(|(name, stat)| {
                let fmt_hw = |hw: Option<[i64; 2]>| {
                    hw.map(|[h, w]| format!("({}, {})", h, w))
                        .unwrap_or_else(|| "-".into())
                };
                let mean = stat
                    .mean()
                    .map(|[h, w]| format!("({:.1}, {:.1})", h.raw(), w.raw()))
                    .unwrap_or_else(|| "-".into());

                table.add_row(row![
                    name,
                    stat.count(),
                    fmt_hw(stat.min()),
                    fmt_hw(stat.max()),
                    mean
                ]);
            });

        table
    }

    pub fn histogram_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["instances per mask", "masks"]);
        self.instance_histogram
            .iter()
            .for_each(|(num_instances, num_masks)| {
                table.add_row(row![num_instances, num_masks]);
            });
        table
    }
}

/// Scans mask files and collects instance statistics.
pub fn collect<P>(paths: &[P], mask_channel: usize, config: &SamplerConfig) -> Result<DatasetStat>
where
    P: AsRef<Path>,
{
    let mut stat = DatasetStat::default();

    for path in paths {
        let mask = InstanceMask::open(path, mask_channel)?;
        stat.add_mask(&mask, config);
    }

    Ok(stat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn size_stat_accumulates() {
        let mut stat = SizeStat::default();
        assert!(stat.mean().is_none());

        stat.push([10, 40]);
        stat.push([30, 20]);
        stat.push([20, 30]);

        assert_eq!(stat.count(), 3);
        assert_eq!(stat.min(), Some([10, 20]));
        assert_eq!(stat.max(), Some([30, 40]));

        let [mean_h, mean_w] = stat.mean().unwrap();
        assert_abs_diff_eq!(mean_h.raw(), 20.0);
        assert_abs_diff_eq!(mean_w.raw(), 30.0);
    }

    #[test]
    fn dataset_stat_counts_instances() {
        let config = SamplerConfig::default();
        let mut ids = Array2::zeros((1024, 2048));
        ids.slice_mut(ndarray::s![100..=200, 100..=150]).fill(1u16);
        ids.slice_mut(ndarray::s![0..=5, 0..=5]).fill(2u16);
        let mask = InstanceMask::from_ids(ids);

        let mut stat = DatasetStat::default();
        stat.add_mask(&mask, &config);
        stat.add_mask(&InstanceMask::from_ids(Array2::zeros((4, 4))), &config);

        assert_eq!(stat.num_files, 2);
        assert_eq!(stat.instance_histogram.get(&2), Some(&1));
        assert_eq!(stat.instance_histogram.get(&0), Some(&1));
        assert_eq!(stat.tight.count(), 2);
        assert_eq!(stat.precise.count(), 1);
        assert_eq!(stat.num_without_precise, 1);
        assert_eq!(stat.precise.min(), Some([144, 96]));

        assert_eq!(stat.size_table().len(), 3);
        assert_eq!(stat.histogram_table().len(), 3);
    }
}
