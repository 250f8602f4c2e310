use anyhow::{Context, Result};
use gt_box::{box_file, driver, stat, Config, OutputFormat};
use prettytable::{cell, row, Table};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Generate positive and negative training boxes from instance masks.
enum Args {
    /// Generate box files for every mask in the dataset directory.
    Generate {
        #[structopt(long)]
        /// configuration file
        config_file: Option<PathBuf>,
        #[structopt(long)]
        /// dataset directory, overriding the CITYSCAPES_DATASET variable
        dataset_dir: Option<PathBuf>,
        #[structopt(long)]
        /// random seed
        seed: Option<u64>,
        #[structopt(long)]
        /// output format, 'npy' or 'json'
        format: Option<OutputFormat>,
        #[structopt(long)]
        /// skip failed images instead of stopping
        keep_going: bool,
    },
    /// Print instance box statistics of the dataset.
    Stat {
        #[structopt(long)]
        /// configuration file
        config_file: Option<PathBuf>,
        #[structopt(long)]
        /// dataset directory, overriding the CITYSCAPES_DATASET variable
        dataset_dir: Option<PathBuf>,
    },
    /// Print the records of a box file.
    Info {
        /// box file
        box_file: PathBuf,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Args::from_args() {
        Args::Generate {
            config_file,
            dataset_dir,
            seed,
            format,
            keep_going,
        } => {
            let mut config = load_config(config_file.as_deref())?;
            if dataset_dir.is_some() {
                config.dataset.dir = dataset_dir;
            }
            if seed.is_some() {
                config.run.seed = seed;
            }
            if let Some(format) = format {
                config.dataset.format = format;
            }
            if keep_going {
                config.run.abort_on_error = false;
            }
            generate(&config)?;
        }
        Args::Stat {
            config_file,
            dataset_dir,
        } => {
            let mut config = load_config(config_file.as_deref())?;
            if dataset_dir.is_some() {
                config.dataset.dir = dataset_dir;
            }
            print_stat(&config)?;
        }
        Args::Info { box_file } => info(box_file)?,
    }

    Ok(())
}

fn load_config(config_file: Option<&Path>) -> Result<Config> {
    let config = match config_file {
        Some(path) => Config::open(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => Config::default(),
    };
    Ok(config)
}

fn generate(config: &Config) -> Result<()> {
    let dataset_dir = config.dataset.resolve_dir()?;
    driver::run(dataset_dir, config)?;
    Ok(())
}

fn print_stat(config: &Config) -> Result<()> {
    let dataset_dir = config.dataset.resolve_dir()?;
    let files = driver::find_mask_files(&dataset_dir, &config.dataset.mask_suffix)?;
    let stat = stat::collect(&files, config.dataset.mask_channel, &config.sampler)?;

    println!("{} mask files", stat.num_files);
    println!(
        "{} instances without a box inside the image",
        stat.num_without_precise
    );
    stat.size_table().printstd();
    stat.histogram_table().printstd();

    Ok(())
}

fn info(box_file: impl AsRef<Path>) -> Result<()> {
    let records = box_file::load(box_file)?;

    if records.is_empty() {
        println!("no boxes");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["index", "class", "t", "l", "h", "w", "instance id"]);

    let mut num_positives = 0;
    for (index, record) in records.iter().enumerate() {
        let class = record.class()?;
        if class.is_positive() {
            num_positives += 1;
        }
        table.add_row(row![
            index,
            class,
            record.t,
            record.l,
            record.h,
            record.w,
            record.instance_id
        ]);
    }
    table.printstd();

    println!(
        "{} boxes, {} positive, {} negative",
        records.len(),
        num_positives,
        records.len() - num_positives
    );

    Ok(())
}
