use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::constants;
use crate::bag::Compression;
use crate::msgs::PixelEncoding;
use crate::utils::logger;

/// Values read from a `key = value` settings file. Anything left `None` falls
/// back to the built-in defaults; command-line arguments override both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub frame_rate: Option<f64>,
    pub topic: Option<String>,
    pub encoding: Option<PixelEncoding>,
    pub frame_id: Option<String>,
    pub compression: Option<Compression>,
    pub chunk_threshold: Option<usize>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut settings = Settings::default();

        for (number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                bail!("line {}: expected `key = value`, got '{}'", number + 1, trimmed);
            };
            let key = key.trim();
            let value = value.trim();

            let parsed: Result<(), String> = match key {
                "frame-rate" => parse_frame_rate(value).map(|v| settings.frame_rate = Some(v)),
                "topic" => parse_topic(value).map(|v| settings.topic = Some(v)),
                "encoding" => PixelEncoding::parse(value).map(|v| settings.encoding = Some(v)),
                "frame-id" => {
                    settings.frame_id = Some(value.to_string());
                    Ok(())
                }
                "compression" => Compression::parse(value).map(|v| settings.compression = Some(v)),
                "chunk-threshold" => parse_chunk_threshold(value).map(|v| settings.chunk_threshold = Some(v)),
                _ => {
                    logger::warn(&format!("ignoring unknown settings key '{}'", key));
                    Ok(())
                }
            };

            if let Err(e) = parsed {
                bail!("line {}: {}", number + 1, e);
            }
        }

        Ok(settings)
    }
}

/// Frame rates must be finite and strictly positive.
pub fn parse_frame_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("frame rate '{}' is not a number", value.trim()))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(format!("frame rate must be greater than 0, got {}", rate));
    }
    Ok(rate)
}

pub fn parse_topic(value: &str) -> Result<String, String> {
    let topic = value.trim();
    if topic.is_empty() {
        return Err("topic must not be empty".to_string());
    }
    Ok(topic.to_string())
}

pub fn parse_chunk_threshold(value: &str) -> Result<usize, String> {
    let threshold: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("chunk threshold '{}' is not a byte count", value.trim()))?;
    if threshold > constants::MAX_CHUNK_THRESHOLD {
        return Err(format!(
            "chunk threshold {} exceeds the maximum of {} bytes",
            threshold,
            constants::MAX_CHUNK_THRESHOLD
        ));
    }
    Ok(threshold)
}
