//! Writer for ROS bag files (format version 2.0).
//!
//! A bag starts with a fixed 4096-byte file header record, followed by chunks
//! of connection and message records, each chunk trailed by one index record
//! per connection. Closing the bag appends the connection and chunk info
//! records and rewrites the file header to point at them.

pub mod record;
pub mod writer;

#[cfg(test)]
pub mod reader;

pub use writer::{BagOptions, BagWriter};

use clap::ValueEnum;
use serde::Serialize;

/// Chunk compression understood by `rosbag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Lz4 => "lz4",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        <Self as ValueEnum>::from_str(value.trim(), true)
            .map_err(|_| format!("unknown chunk compression '{}' (expected none or lz4)", value.trim()))
    }
}
