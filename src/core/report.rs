use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConvertError;
use crate::bag::Compression;
use crate::msgs::PixelEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Converted,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub status: FileStatus,
    pub frames: u64,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn from_result(
        input: PathBuf,
        output: PathBuf,
        result: &Result<u64, ConvertError>,
        elapsed_secs: f64,
    ) -> Self {
        let (status, frames, error) = match result {
            Ok(frames) => (FileStatus::Converted, *frames, None),
            Err(e) => (FileStatus::Failed, e.frames_written(), Some(e.to_string())),
        };
        Self { input, output, status, frames, elapsed_secs, error }
    }
}

/// Outcome of one batch run, one entry per recognized input.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub frame_rate: f64,
    pub topic: String,
    pub encoding: PixelEncoding,
    pub compression: Compression,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.files.iter().filter(|f| f.status == FileStatus::Converted).count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.status == FileStatus::Failed).count()
    }

    pub fn total_frames(&self) -> u64 {
        self.files.iter().map(|f| f.frames).sum()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))
    }
}
