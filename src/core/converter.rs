use anyhow::{bail, Result};
use std::io::{Seek, Write};
use std::path::Path;

use super::error::ConvertError;
use crate::bag::{BagOptions, BagWriter};
use crate::decoder::{FrameSource, SourceOpener};
use crate::msgs::{ImageEncoder, PixelEncoding, RosTime};
use crate::shared::constants;
use crate::utils::logger;

/// Per-file conversion settings shared by every file of a batch.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub topic: String,
    pub frame_rate: f64,
    pub encoding: PixelEncoding,
    pub frame_id: String,
    pub bag: BagOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            topic: constants::DEFAULT_TOPIC.to_string(),
            frame_rate: constants::DEFAULT_FRAME_RATE,
            encoding: PixelEncoding::default(),
            frame_id: constants::DEFAULT_FRAME_ID.to_string(),
            bag: BagOptions::default(),
        }
    }
}

impl ConvertOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            bail!("frame rate must be greater than 0, got {}", self.frame_rate);
        }
        if self.topic.trim().is_empty() {
            bail!("topic must not be empty");
        }
        if self.bag.chunk_threshold > constants::MAX_CHUNK_THRESHOLD {
            bail!(
                "chunk threshold {} exceeds the maximum of {} bytes",
                self.bag.chunk_threshold,
                constants::MAX_CHUNK_THRESHOLD
            );
        }
        Ok(())
    }
}

/// Converts one video into a bag of `sensor_msgs/Image` records and returns the
/// number of records written.
///
/// Nothing is created when the video cannot be opened. Once the bag exists it
/// is closed on every path, so a failure part-way leaves a readable bag holding
/// the frames before the fault.
pub fn convert<O: SourceOpener>(
    opener: &O,
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> Result<u64, ConvertError> {
    let source = opener.open(input).map_err(|e| ConvertError::Open {
        path: input.to_path_buf(),
        reason: format!("{:#}", e),
    })?;

    let mut writer = BagWriter::create(output, options.bag).map_err(|source| {
        ConvertError::CreateOutput {
            path: output.to_path_buf(),
            source,
        }
    })?;

    // `source` is consumed and released before the bag is closed
    let written = write_frames(source, &mut writer, input, options);
    logger::debug(&format!(
        "Closing {} with {} records",
        output.display(),
        writer.message_count()
    ));
    let closed = writer.close();

    match (written, closed) {
        (Ok(count), Ok(())) => Ok(count),
        (Ok(count), Err(source)) => Err(ConvertError::Write { frame: count, source }),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                logger::error(&format!(
                    "Closing {} after a failed conversion also failed: {}",
                    output.display(),
                    close_err
                ));
            }
            Err(e)
        }
    }
}

/// Decodes `source` to the end and appends one image per frame, timestamped
/// `index / frame_rate`.
pub fn write_frames<S, W>(
    mut source: S,
    writer: &mut BagWriter<W>,
    input: &Path,
    options: &ConvertOptions,
) -> Result<u64, ConvertError>
where
    S: FrameSource,
    W: Write + Seek,
{
    let encoder = ImageEncoder::new(options.encoding, options.frame_id.clone());
    let mut count: u64 = 0;
    let mut last_stamp: Option<RosTime> = None;

    loop {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                return Err(ConvertError::Decode {
                    frame: count,
                    reason: format!("{:#}", e),
                })
            }
        };

        let stamp = RosTime::from_frame_index(count, options.frame_rate).map_err(|e| {
            ConvertError::Timestamp {
                frame: count,
                reason: format!("{:#}", e),
            }
        })?;
        // nanosecond resolution: rates above 1e9 fps collapse neighbouring stamps
        if last_stamp.map_or(false, |last| stamp <= last) {
            return Err(ConvertError::Timestamp {
                frame: count,
                reason: format!("{} fps gives frame {} the same time as the previous frame", options.frame_rate, count),
            });
        }
        last_stamp = Some(stamp);
        let image = encoder.encode(frame, stamp).map_err(|e| ConvertError::Encode {
            frame: count,
            reason: format!("{:#}", e),
        })?;
        writer
            .write(&options.topic, &image, stamp)
            .map_err(|source| ConvertError::Write { frame: count, source })?;
        count += 1;

        if count % constants::PROGRESS_INTERVAL == 0 {
            println!("Processed {} frames from {}", count, input.display());
            logger::debug(&format!("{}: {} frames written", input.display(), count));
        }
    }

    Ok(count)
}
