use anyhow::Result;
use gt_box::{
    box_file, driver, BoxClass, Config, InstanceMask, OutputFormat, Outcome, SamplerConfig,
};
use image::{Rgb, RgbImage};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

fn scratch_dir(name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("gt-box-{}-{}", name, std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(dir.join("train").join("city"))?;
    Ok(dir)
}

/// Writes a 1024x2048 mask with instance ids in the green channel.
fn write_mask(path: &Path, rects: &[(u8, [u32; 4])]) -> Result<()> {
    let image = RgbImage::from_fn(2048, 1024, |col, row| {
        let id = rects
            .iter()
            .find(|(_, [t, l, b, r])| (*t..=*b).contains(&row) && (*l..=*r).contains(&col))
            .map(|(id, _)| *id)
            .unwrap_or(0);
        Rgb([7, id, 0])
    });
    image.save(path)?;
    Ok(())
}

fn config_with_seed(seed: u64) -> Config {
    let mut config = Config::default();
    config.run.seed = Some(seed);
    config
}

#[test]
fn single_instance_end_to_end() -> Result<()> {
    let dir = scratch_dir("single")?;
    let mask_path = dir.join("train/city/city_000000_mask.png");
    write_mask(&mask_path, &[(1, [100, 100, 200, 150])])?;

    let config = config_with_seed(1);
    let summary = driver::run(&dir, &config)?;
    assert_eq!(summary.num_files, 1);
    assert_eq!(summary.num_with_boxes, 1);

    let records = box_file::load(dir.join("train/city/city_000000_box.npy"))?;
    assert_eq!(records.len(), 256);

    let ids: HashSet<_> = records.iter().map(|record| record.instance_id).collect();
    assert_eq!(ids, [1, -1].into_iter().collect());
    assert_eq!(records.iter().filter(|r| r.is_positive == 1).count(), 128);

    for record in &records {
        let sampled = record.to_sampled_box()?;
        assert_eq!(record.t % 8, 0);
        assert_eq!(record.l % 8, 0);
        assert_eq!(record.h % 24, 0);
        assert_eq!(record.w % 24, 0);
        assert!(record.t >= 0 && record.l >= 0);
        assert!(record.t + record.h < 1024 && record.l + record.w < 2048);

        if let BoxClass::Positive { instance_id } = sampled.class {
            assert_eq!(instance_id, 1);
            // the precise box is at (78, 77), positives move by at most 16 plus snapping
            assert!((record.t - 78).abs() <= 24 && (record.l - 77).abs() <= 24);
        }
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn four_instances_from_mask() -> Result<()> {
    let dir = scratch_dir("four")?;
    let mask_path = dir.join("train/city/city_000001_mask.png");
    write_mask(
        &mask_path,
        &[
            (1, [100, 100, 200, 150]),
            (2, [300, 600, 420, 700]),
            (3, [500, 1200, 560, 1300]),
            (4, [700, 1500, 900, 1700]),
        ],
    )?;

    let mask = InstanceMask::open(&mask_path, 1)?;
    assert_eq!(mask.tight_boxes(30).len(), 4);

    let config = SamplerConfig::default();
    let mut rng = StdRng::seed_from_u64(5);
    match gt_box::generate_for_mask(&mut rng, &mask, &config)? {
        Outcome::Boxes(box_set) => {
            assert_eq!(box_set.len(), 256);
            assert_eq!(box_set.num_positives(), 128);
        }
        Outcome::NoBoxes(reason) => panic!("unexpected outcome: {}", reason),
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn empty_mask_writes_empty_box_file() -> Result<()> {
    let dir = scratch_dir("empty")?;
    write_mask(&dir.join("train/city/city_000002_mask.png"), &[])?;

    let mut config = config_with_seed(2);
    config.dataset.format = OutputFormat::Json;
    let summary = driver::run(&dir, &config)?;
    assert_eq!(summary.num_without_boxes, 1);

    let box_path = dir.join("train/city/city_000002_box.json");
    assert_eq!(fs::read_to_string(&box_path)?, "null");
    assert!(box_file::load(&box_path)?.is_empty());

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn broken_mask_aborts_or_is_skipped() -> Result<()> {
    let dir = scratch_dir("broken")?;
    write_mask(
        &dir.join("train/city/city_000003_mask.png"),
        &[(2, [300, 600, 420, 700])],
    )?;
    fs::write(dir.join("train/city/city_000004_mask.png"), b"not a png")?;

    let config = config_with_seed(3);
    assert!(driver::run(&dir, &config).is_err());

    let mut config = config_with_seed(3);
    config.run.abort_on_error = false;
    let summary = driver::run(&dir, &config)?;
    assert_eq!(summary.num_files, 2);
    assert_eq!(summary.num_with_boxes, 1);
    assert_eq!(summary.num_failed, 1);
    assert!(dir.join("train/city/city_000003_box.npy").is_file());
    assert!(!dir.join("train/city/city_000004_box.npy").exists());

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn seeded_runs_are_reproducible() -> Result<()> {
    let dir = scratch_dir("seeded")?;
    let mask_path = dir.join("train/city/city_000005_mask.png");
    write_mask(&mask_path, &[(1, [100, 100, 200, 150]), (2, [300, 600, 420, 700])])?;
    let box_path = dir.join("train/city/city_000005_box.npy");

    driver::run(&dir, &config_with_seed(9))?;
    let first = box_file::load(&box_path)?;
    driver::run(&dir, &config_with_seed(9))?;
    let second = box_file::load(&box_path)?;
    assert_eq!(first, second);

    fs::remove_dir_all(&dir)?;
    Ok(())
}
