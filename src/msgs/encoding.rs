use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Pixel layouts the converter can emit. Decoded frames are always 8-bit BGR;
/// other encodings are produced by a color conversion in the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelEncoding {
    #[default]
    Bgr8,
    Rgb8,
    Mono8,
}

impl PixelEncoding {
    /// Name used in the `encoding` field of `sensor_msgs/Image`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelEncoding::Bgr8 => "bgr8",
            PixelEncoding::Rgb8 => "rgb8",
            PixelEncoding::Mono8 => "mono8",
        }
    }

    pub fn channels(&self) -> u32 {
        match self {
            PixelEncoding::Bgr8 | PixelEncoding::Rgb8 => 3,
            PixelEncoding::Mono8 => 1,
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        <Self as ValueEnum>::from_str(value.trim(), true)
            .map_err(|_| format!("unknown pixel encoding '{}' (expected bgr8, rgb8 or mono8)", value.trim()))
    }
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
