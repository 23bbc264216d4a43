mod bag;
mod core;
mod decoder;
mod msgs;
mod shared;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::bag::{BagOptions, Compression};
use crate::core::{batch, BatchJob, ConvertOptions};
use crate::decoder::OpenCvOpener;
use crate::msgs::PixelEncoding;
use crate::shared::constants;
use crate::shared::settings::{self, Settings};
use crate::utils::logger;

/// Convert a folder of .mp4 videos into ROS bags of sensor_msgs/Image, one bag per video.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder containing the .mp4 files to convert
    input_folder: PathBuf,

    /// Folder the .bag files are written to (created if missing)
    output_folder: PathBuf,

    /// Assumed frame rate used to timestamp frames [default: 30]
    #[arg(value_parser = settings::parse_frame_rate)]
    frame_rate: Option<f64>,

    /// Topic the images are recorded on [default: /cam0/image_raw]
    #[arg(value_parser = settings::parse_topic)]
    topic: Option<String>,

    /// Pixel encoding of the recorded images [default: bgr8]
    #[arg(long, value_enum)]
    encoding: Option<PixelEncoding>,

    /// frame_id written into every image header [default: empty]
    #[arg(long)]
    frame_id: Option<String>,

    /// Chunk compression [default: none]
    #[arg(long, value_enum)]
    compression: Option<Compression>,

    /// Uncompressed chunk size in bytes before a new chunk is started [default: 786432]
    #[arg(long, value_parser = settings::parse_chunk_threshold)]
    chunk_threshold: Option<usize>,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Settings file (key = value); defaults to ./vid2bag.config when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the debug and error logs [default: current directory]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Exit with status 1 when any file fails to convert
    #[arg(long, default_value_t = false)]
    fail_on_error: bool,
}

fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => Settings::load(path),
        None => {
            let path = Path::new(constants::SETTINGS_FILE);
            if path.is_file() {
                Settings::load(path)
            } else {
                Ok(Settings::default())
            }
        }
    }
}

/// Command line beats the settings file, which beats the built-in defaults.
fn build_job(cli: &Cli, settings: &Settings) -> BatchJob {
    let defaults = ConvertOptions::default();
    let options = ConvertOptions {
        topic: cli
            .topic
            .clone()
            .or_else(|| settings.topic.clone())
            .unwrap_or(defaults.topic),
        frame_rate: cli.frame_rate.or(settings.frame_rate).unwrap_or(defaults.frame_rate),
        encoding: cli.encoding.or(settings.encoding).unwrap_or(defaults.encoding),
        frame_id: cli
            .frame_id
            .clone()
            .or_else(|| settings.frame_id.clone())
            .unwrap_or(defaults.frame_id),
        bag: BagOptions {
            compression: cli
                .compression
                .or(settings.compression)
                .unwrap_or(defaults.bag.compression),
            chunk_threshold: cli
                .chunk_threshold
                .or(settings.chunk_threshold)
                .unwrap_or(defaults.bag.chunk_threshold),
        },
    };

    BatchJob {
        input_dir: cli.input_folder.clone(),
        output_dir: cli.output_folder.clone(),
        options,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Logs
    let log_dir = match &cli.log_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    logger::init(&log_dir);

    // 2. Settings
    let settings = load_settings(cli.config.as_deref())?;
    let job = build_job(&cli, &settings);
    logger::debug(&format!("{:?}", job));

    // 3. Convert
    let opener = OpenCvOpener::new(job.options.encoding);
    let report = batch::run(&job, &opener)?;

    if let Some(path) = &cli.report {
        report.write_json(path)?;
        println!("Report written to {}", path.display());
    }

    if cli.fail_on_error && report.failed() > 0 {
        logger::error(&format!("{} of {} files failed", report.failed(), report.files.len()));
        std::process::exit(1);
    }

    Ok(())
}
