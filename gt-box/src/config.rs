//! Box generation configuration format.

use crate::{box_file::OutputFormat, common::*, overlap::OverlapAxes};

/// The environment variable naming the dataset root directory.
pub const DATASET_DIR_ENV: &str = "CITYSCAPES_DATASET";

/// The main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub sampler: SamplerConfig,
    pub run: RunConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config: Self = json5::from_str(&text)?;
        config.sampler.validate()?;
        Ok(config)
    }
}

/// Dataset location and file naming options.
#[derive(Debug, Clone, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct DatasetConfig {
    /// The dataset root. Falls back to the `CITYSCAPES_DATASET` variable if unset.
    pub dir: Option<PathBuf>,
    /// The file name suffix of instance mask images.
    #[derivative(Default(value = "\"mask.png\".into()"))]
    pub mask_suffix: String,
    /// The file name suffix of box files. Defaults to the output format's suffix.
    pub box_suffix: Option<String>,
    /// The mask image channel that carries instance ids.
    #[derivative(Default(value = "1"))]
    pub mask_channel: usize,
    pub format: OutputFormat,
}

impl DatasetConfig {
    /// Resolves the dataset root directory.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }

        let dir = env::var_os(DATASET_DIR_ENV).ok_or_else(|| {
            format_err!(
                "no data path found, set the '{}' environment variable",
                DATASET_DIR_ENV
            )
        })?;
        Ok(dir.into())
    }

    pub fn box_suffix(&self) -> &str {
        self.box_suffix
            .as_deref()
            .unwrap_or_else(|| self.format.default_suffix())
    }
}

/// Box sampling parameters. All lengths are in pixels.
#[derive(Debug, Clone, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct SamplerConfig {
    /// The image height and width that every box must fit in.
    #[derivative(Default(value = "HW_ { h: 1024, w: 2048 }"))]
    pub image_size: HW_<i64>,
    /// Instance ids `1..=max_instances` are looked up in each mask.
    #[derivative(Default(value = "30"))]
    pub max_instances: u16,
    /// The margin added on every side of a tight box.
    #[derivative(Default(value = "32"))]
    pub padding: i64,
    /// Box extents are trimmed to multiples of this value.
    #[derivative(Default(value = "24"))]
    pub size_multiple: i64,
    /// Box origins are snapped to multiples of this value.
    #[derivative(Default(value = "8"))]
    pub alignment: i64,
    /// Maximum displacement of positive boxes.
    #[derivative(Default(value = "16"))]
    pub positive_shift: i64,
    /// Maximum displacement of negative boxes.
    #[derivative(Default(value = "448"))]
    pub negative_shift: i64,
    /// Minimum displacement of negative boxes.
    #[derivative(Default(value = "16"))]
    pub negative_min_offset: i64,
    /// Negative shifts larger than this are halved when flipped.
    #[derivative(Default(value = "40"))]
    pub flip_threshold: i64,
    /// Negative boxes whose origins come this close to a positive box are rejected.
    #[derivative(Default(value = "16"))]
    pub overlap_distance: i64,
    pub overlap_axes: OverlapAxes,
    /// Number of positive boxes, and of negative boxes, per image.
    #[derivative(Default(value = "128"))]
    pub boxes_per_class: usize,
    /// Bound on consecutive failed draws before giving up.
    #[derivative(Default(value = "1000"))]
    pub max_retries: usize,
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        let HW_ { h, w } = self.image_size;
        ensure!(h > 0 && w > 0, "image_size must be positive");
        ensure!(self.max_instances > 0, "max_instances must be positive");
        ensure!(self.padding >= 0, "padding must be non-negative");
        ensure!(self.size_multiple > 0, "size_multiple must be positive");
        ensure!(self.alignment > 0, "alignment must be positive");
        ensure!(
            self.size_multiple % self.alignment == 0,
            "alignment {} does not divide size_multiple {}",
            self.alignment,
            self.size_multiple
        );
        ensure!(
            self.positive_shift >= 0,
            "positive_shift must be non-negative"
        );
        ensure!(
            self.negative_min_offset >= 0 && self.negative_shift >= self.negative_min_offset,
            "negative_shift must be no less than negative_min_offset, and both must be non-negative"
        );
        ensure!(
            self.flip_threshold >= 0,
            "flip_threshold must be non-negative"
        );
        ensure!(
            self.overlap_distance >= 0,
            "overlap_distance must be non-negative"
        );
        ensure!(self.boxes_per_class > 0, "boxes_per_class must be positive");
        ensure!(self.max_retries > 0, "max_retries must be positive");
        Ok(())
    }

    pub fn image_size(&self) -> HW<i64> {
        let HW_ { h, w } = self.image_size;
        HW::from_hw([h.max(0), w.max(0)])
    }

    /// The number of boxes in a complete box set.
    pub fn num_boxes(&self) -> usize {
        self.boxes_per_class * 2
    }
}

/// Batch run options.
#[derive(Debug, Clone, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct RunConfig {
    /// Stop the run at the first failed image. Otherwise the image is skipped.
    #[derivative(Default(value = "true"))]
    pub abort_on_error: bool,
    /// Seed of the random generator. Seeded from OS entropy if unset.
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
