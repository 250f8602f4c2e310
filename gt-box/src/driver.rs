//! The batch driver that generates box files for a dataset directory.

use crate::{
    box_file::{self, outcome_records},
    common::*,
    config::Config,
    generate::{generate_for_mask, Outcome},
    mask::InstanceMask,
};

/// Counters of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub num_files: usize,
    pub num_with_boxes: usize,
    pub num_without_boxes: usize,
    pub num_failed: usize,
}

/// Lists mask files under `dir` recursively, in sorted order.
pub fn find_mask_files<P>(dir: P, mask_suffix: &str) -> Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    ensure!(
        dir.is_dir(),
        "dataset directory '{}' does not exist",
        dir.display()
    );

    let dir_text = dir
        .to_str()
        .ok_or_else(|| format_err!("non-UTF-8 path '{}'", dir.display()))?;
    let pattern = format!(
        "{}/**/*{}",
        glob::Pattern::escape(dir_text),
        glob::Pattern::escape(mask_suffix)
    );

    let mut paths: Vec<_> = glob::glob(&pattern)?
        .map(|result| result.map_err(Error::from))
        .filter(|result| match result {
            Ok(path) => path.is_file(),
            Err(_) => true,
        })
        .collect::<Result<_>>()?;
    paths.sort();
    Ok(paths)
}

/// Computes the box file path of a mask file by replacing the file name suffix.
pub fn box_file_path<P>(mask_path: P, mask_suffix: &str, box_suffix: &str) -> Result<PathBuf>
where
    P: AsRef<Path>,
{
    let mask_path = mask_path.as_ref();
    let file_name = mask_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format_err!("invalid mask file name '{}'", mask_path.display()))?;
    let stem = file_name.strip_suffix(mask_suffix).ok_or_else(|| {
        format_err!(
            "mask file name '{}' does not end with '{}'",
            file_name,
            mask_suffix
        )
    })?;
    Ok(mask_path.with_file_name(format!("{}{}", stem, box_suffix)))
}

/// Generates and saves the box file of one mask file.
pub fn process_file<R, P>(rng: &mut R, mask_path: P, config: &Config) -> Result<Outcome>
where
    R: Rng + ?Sized,
    P: AsRef<Path>,
{
    let mask_path = mask_path.as_ref();
    let dataset = &config.dataset;
    let sampler = &config.sampler;

    let mask = InstanceMask::open(mask_path, dataset.mask_channel)?;
    if mask.size() != sampler.image_size() {
        warn!(
            "mask '{}' has size {:?}, but boxes are bounded by {:?}",
            mask_path.display(),
            mask.size(),
            sampler.image_size()
        );
    }

    let outcome = generate_for_mask(rng, &mask, sampler)
        .with_context(|| format!("failed to generate boxes for '{}'", mask_path.display()))?;
    if let Outcome::NoBoxes(reason) = &outcome {
        warn!(
            "no usable boxes for '{}': {}",
            mask_path.display(),
            reason
        );
    }

    let box_path = box_file_path(mask_path, &dataset.mask_suffix, dataset.box_suffix())?;
    box_file::save(&box_path, &outcome_records(&outcome), dataset.format)?;
    debug!("write box file to '{}'", box_path.display());

    Ok(outcome)
}

/// Generates box files for every mask file in the dataset directory.
///
/// Failed images stop the run unless `run.abort_on_error` is disabled, in
/// which case they are logged and counted.
pub fn run<P>(dataset_dir: P, config: &Config) -> Result<BatchSummary>
where
    P: AsRef<Path>,
{
    config.sampler.validate()?;

    let dataset_dir = dataset_dir.as_ref();
    let files = find_mask_files(dataset_dir, &config.dataset.mask_suffix)?;
    let mut summary = BatchSummary {
        num_files: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        warn!(
            "no files ending with '{}' found in '{}'",
            config.dataset.mask_suffix,
            dataset_dir.display()
        );
        return Ok(summary);
    }
    info!("found {} mask files", files.len());

    let mut rng = config.run.rng();
    let mut stdout = io::stdout();
    write!(stdout, "Progress: {:>3} %", 0)?;
    stdout.flush()?;

    for (index, path) in files.iter().enumerate() {
        match process_file(&mut rng, path, config) {
            Ok(Outcome::Boxes(_)) => summary.num_with_boxes += 1,
            Ok(Outcome::NoBoxes(_)) => summary.num_without_boxes += 1,
            Err(err) if !config.run.abort_on_error => {
                log::error!("skip '{}': {:#}", path.display(), err);
                summary.num_failed += 1;
            }
            Err(err) => {
                writeln!(stdout)?;
                return Err(err);
            }
        }

        write!(
            stdout,
            "\rProgress: {:>3} %",
            (index + 1) * 100 / files.len()
        )?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    info!(
        "{} files processed, {} with boxes, {} without boxes, {} failed",
        summary.num_files, summary.num_with_boxes, summary.num_without_boxes, summary.num_failed
    );

    Ok(summary)
}
