use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::converter::{self, ConvertOptions};
use super::error::ConvertError;
use super::report::{BatchReport, FileReport};
use crate::decoder::SourceOpener;
use crate::shared::constants;
use crate::utils::file_utils;
use crate::utils::logger;
use crate::utils::time_utils::Timer;

/// Input and output folders plus the settings shared by every file.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub options: ConvertOptions,
}

/// Converts every `.mp4` in the input folder into a `.bag` of the same name in
/// the output folder.
///
/// Only configuration problems (bad options, unreadable input folder, output
/// folder that cannot be created) are returned as errors. A file that fails
/// to convert is recorded in the report and the batch moves on.
pub fn run<O: SourceOpener>(job: &BatchJob, opener: &O) -> Result<BatchReport> {
    job.options.validate()?;

    fs::create_dir_all(&job.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", job.output_dir.display()))?;

    let inputs = file_utils::list_files(&job.input_dir, constants::VIDEO_EXTENSION)?;

    let mut report = BatchReport {
        input_dir: job.input_dir.clone(),
        output_dir: job.output_dir.clone(),
        frame_rate: job.options.frame_rate,
        topic: job.options.topic.clone(),
        encoding: job.options.encoding,
        compression: job.options.bag.compression,
        files: Vec::with_capacity(inputs.len()),
    };

    if inputs.is_empty() {
        println!(
            "No .{} files found in {}",
            constants::VIDEO_EXTENSION,
            job.input_dir.display()
        );
        logger::warn(&format!("no input files in {}", job.input_dir.display()));
        return Ok(report);
    }

    logger::info(&format!(
        "batch: {} files, {} -> {}, {} fps, topic {}, encoding {}, compression {}",
        inputs.len(),
        job.input_dir.display(),
        job.output_dir.display(),
        job.options.frame_rate,
        job.options.topic,
        job.options.encoding,
        job.options.bag.compression.as_str()
    ));

    // output path -> the input that owns it
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

    for input in inputs {
        // list_files only returns entries with a file name
        let Some(output) =
            file_utils::output_path_for(&input, &job.output_dir, constants::BAG_EXTENSION)
        else {
            continue;
        };

        println!("Converting {} -> {}", input.display(), output.display());
        let timer = Timer::new();
        let result = match claimed.get(&output) {
            Some(owner) => Err(ConvertError::OutputInUse {
                path: output.clone(),
                claimed_by: owner.clone(),
            }),
            None => {
                claimed.insert(output.clone(), input.clone());
                converter::convert(opener, &input, &output, &job.options)
            }
        };
        let elapsed = timer.elapsed().as_secs_f64();

        match &result {
            Ok(frames) => {
                println!(
                    "Finished writing bag: {} ({} frames, {:.1} frames/s)",
                    output.display(),
                    frames,
                    timer.rate(*frames)
                );
                logger::info(&format!("{} -> {}: {} frames", input.display(), output.display(), frames));
            }
            Err(e) => {
                eprintln!("Error: {}: {}", input.display(), e);
                if e.output_created() {
                    println!(
                        "Finished writing bag: {} (incomplete, {} frames)",
                        output.display(),
                        e.frames_written()
                    );
                }
                logger::error(&format!("{}: {}", input.display(), e));
            }
        }

        report
            .files
            .push(FileReport::from_result(input, output, &result, elapsed));
    }

    println!(
        "Converted {} of {} files ({} frames)",
        report.converted(),
        report.files.len(),
        report.total_frames()
    );
    Ok(report)
}
