use anyhow::{anyhow, bail, Context, Result};
use opencv::{
    core,
    imgproc,
    prelude::*,
    videoio,
};
use std::path::{Path, PathBuf};

use super::{FrameData, FrameSource, SourceOpener};
use crate::msgs::PixelEncoding;
use crate::utils::logger;

/// Sequential OpenCV decoder that emits frames in the requested pixel encoding.
pub struct VideoDecoder {
    capture: videoio::VideoCapture,
    path: PathBuf,
    encoding: PixelEncoding,
    frames_read: u64,
}

impl VideoDecoder {
    pub fn open(path: &Path, encoding: PixelEncoding) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("path is not valid UTF-8: {}", path.display()))?;

        logger::debug(&format!("Opening video with OpenCV: {}", path_str));

        // CAP_ANY lets OpenCV pick the backend (FFmpeg, AVFoundation, GStreamer...)
        let capture = videoio::VideoCapture::from_file(path_str, videoio::CAP_ANY)
            .with_context(|| format!("OpenCV could not create a capture for {}", path_str))?;

        if !capture.is_opened()? {
            bail!("Could not open video {}", path_str);
        }

        // Informational only; timestamps come from the configured frame rate
        let fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        let frame_count = capture.get(videoio::CAP_PROP_FRAME_COUNT).unwrap_or(0.0);
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
        logger::debug(&format!(
            "Opened {}: {}x{}, reported fps {:.3}, ~{} frames",
            path_str, width as u32, height as u32, fps, frame_count as u64
        ));

        Ok(Self {
            capture,
            path: path.to_path_buf(),
            encoding,
            frames_read: 0,
        })
    }

    fn convert(&self, frame: Mat) -> Result<Mat> {
        let code = match self.encoding {
            PixelEncoding::Bgr8 => return Ok(frame),
            PixelEncoding::Rgb8 => imgproc::COLOR_BGR2RGB,
            PixelEncoding::Mono8 => imgproc::COLOR_BGR2GRAY,
        };

        let mut converted = Mat::default();
        #[cfg(target_os = "macos")]
        imgproc::cvt_color(&frame, &mut converted, code, 0, core::AlgorithmHint::ALGO_HINT_DEFAULT)?;

        #[cfg(not(target_os = "macos"))]
        imgproc::cvt_color(&frame, &mut converted, code, 0)?;

        Ok(converted)
    }
}

impl FrameSource for VideoDecoder {
    fn next_frame(&mut self) -> Result<Option<FrameData>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? {
            return Ok(None);
        }
        if frame.empty() {
            return Ok(None);
        }

        let width = frame.cols() as u32;
        let height = frame.rows() as u32;

        // Only 8-bit BGR is color converted. Other layouts keep their native
        // channels and sample size, and the encoder refuses them.
        let (mut converted, channels) = if frame.typ() == core::CV_8UC3 {
            (self.convert(frame)?, self.encoding.channels())
        } else {
            let channels = frame.channels() as u32;
            (frame, channels)
        };
        if !converted.is_continuous() {
            converted = converted.try_clone()?;
        }

        let buffer = converted.data_bytes()?.to_vec();
        self.frames_read += 1;

        Ok(Some(FrameData::new(buffer, width, height, channels)))
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            logger::error(&format!("Failed to release {}: {}", self.path.display(), e));
        } else {
            logger::debug(&format!(
                "Released {} after {} frames",
                self.path.display(),
                self.frames_read
            ));
        }
    }
}

/// Opens inputs with [`VideoDecoder`].
pub struct OpenCvOpener {
    encoding: PixelEncoding,
}

impl OpenCvOpener {
    pub fn new(encoding: PixelEncoding) -> Self {
        Self { encoding }
    }
}

impl SourceOpener for OpenCvOpener {
    type Source = VideoDecoder;

    fn open(&self, path: &Path) -> Result<VideoDecoder> {
        VideoDecoder::open(path, self.encoding)
    }
}
