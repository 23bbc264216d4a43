use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single file's conversion stopped. Every variant is local to that file.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("could not open video {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    #[error("bag {} is already the output of {}", .path.display(), .claimed_by.display())]
    OutputInUse { path: PathBuf, claimed_by: PathBuf },

    #[error("could not create bag {}: {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("decoding failed after {frame} frames: {reason}")]
    Decode { frame: u64, reason: String },

    #[error("frame {frame} cannot be timestamped: {reason}")]
    Timestamp { frame: u64, reason: String },

    #[error("frame {frame} does not fit the configured encoding: {reason}")]
    Encode { frame: u64, reason: String },

    #[error("writing bag failed after {frame} frames: {source}")]
    Write {
        frame: u64,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    /// Records already in the bag when the conversion stopped.
    pub fn frames_written(&self) -> u64 {
        match self {
            ConvertError::Open { .. }
            | ConvertError::OutputInUse { .. }
            | ConvertError::CreateOutput { .. } => 0,
            ConvertError::Decode { frame, .. }
            | ConvertError::Timestamp { frame, .. }
            | ConvertError::Encode { frame, .. }
            | ConvertError::Write { frame, .. } => *frame,
        }
    }

    /// Whether an output file was created before the failure.
    pub fn output_created(&self) -> bool {
        !matches!(
            self,
            ConvertError::Open { .. } | ConvertError::OutputInUse { .. } | ConvertError::CreateOutput { .. }
        )
    }
}
