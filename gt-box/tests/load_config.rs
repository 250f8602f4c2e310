use anyhow::{Context, Result};
use gt_box::{Config, OutputFormat, OverlapAxes};
use std::path::Path;

#[test]
fn load_default_config_file() -> Result<()> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("gt-box.json5");
    let config =
        Config::open(&path).with_context(|| format!("failed to parse {}", path.display()))?;

    let defaults = Config::default();
    assert_eq!(config.dataset.mask_suffix, defaults.dataset.mask_suffix);
    assert_eq!(config.dataset.box_suffix(), "box.npy");
    assert_eq!(config.dataset.format, OutputFormat::Npy);
    assert_eq!(config.sampler.image_size, defaults.sampler.image_size);
    assert_eq!(config.sampler.overlap_axes, OverlapAxes::Reference);
    assert_eq!(config.sampler.num_boxes(), 256);
    assert!(config.run.seed.is_none());

    Ok(())
}
