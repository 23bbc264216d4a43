use anyhow::{bail, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

use super::{PixelEncoding, RosMessage, RosTime};
use crate::decoder::FrameData;

/// `std_msgs/Header`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub seq: u32,
    pub stamp: RosTime,
    pub frame_id: String,
}

impl Header {
    fn serialize<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(self.seq)?;
        self.stamp.write_to(out)?;
        write_string(out, &self.frame_id)
    }
}

/// `sensor_msgs/Image`
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub encoding: PixelEncoding,
    pub is_bigendian: u8,
    pub step: u32,
    pub data: Vec<u8>,
}

impl RosMessage for Image {
    const DATATYPE: &'static str = "sensor_msgs/Image";
    const MD5SUM: &'static str = "060021388200f6f0f447d0fcd9c64743";
    const DEFINITION: &'static str = "\
std_msgs/Header header
uint32 height
uint32 width
string encoding
uint8 is_bigendian
uint32 step
uint8[] data

================================================================================
MSG: std_msgs/Header
uint32 seq
time stamp
string frame_id
";

    fn serialize(&self, out: &mut Vec<u8>) -> io::Result<()> {
        out.reserve(self.data.len() + 64);
        self.header.serialize(out)?;
        out.write_u32::<LittleEndian>(self.height)?;
        out.write_u32::<LittleEndian>(self.width)?;
        write_string(out, self.encoding.as_str())?;
        out.write_u8(self.is_bigendian)?;
        out.write_u32::<LittleEndian>(self.step)?;
        out.write_u32::<LittleEndian>(self.data.len() as u32)?;
        out.write_all(&self.data)
    }
}

fn write_string<W: Write>(out: &mut W, value: &str) -> io::Result<()> {
    out.write_u32::<LittleEndian>(value.len() as u32)?;
    out.write_all(value.as_bytes())
}

/// Wraps decoded frames into `sensor_msgs/Image` messages.
pub struct ImageEncoder {
    encoding: PixelEncoding,
    frame_id: String,
}

impl ImageEncoder {
    pub fn new(encoding: PixelEncoding, frame_id: impl Into<String>) -> Self {
        Self { encoding, frame_id: frame_id.into() }
    }

    /// Builds the message for one frame. The frame buffer must be tightly packed
    /// rows in this encoder's pixel layout.
    pub fn encode(&self, frame: FrameData, stamp: RosTime) -> Result<Image> {
        let channels = self.encoding.channels();
        if frame.channels != channels {
            bail!(
                "frame has {} channels, {} needs {}",
                frame.channels,
                self.encoding,
                channels
            );
        }

        let step = frame.width * channels;
        let expected = step as usize * frame.height as usize;
        if frame.buffer.len() != expected {
            bail!(
                "frame buffer is {} bytes, expected {} for {}x{} {}",
                frame.buffer.len(),
                expected,
                frame.width,
                frame.height,
                self.encoding
            );
        }

        Ok(Image {
            header: Header {
                seq: 0,
                stamp,
                frame_id: self.frame_id.clone(),
            },
            height: frame.height,
            width: frame.width,
            encoding: self.encoding,
            is_bigendian: u8::from(cfg!(target_endian = "big")),
            step,
            data: frame.buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, channels: u32) -> FrameData {
        let len = (width * height * channels) as usize;
        FrameData::new((0..len).map(|i| i as u8).collect(), width, height, channels)
    }

    #[test]
    fn test_encode_sets_layout() {
        let encoder = ImageEncoder::new(PixelEncoding::Bgr8, "camera");
        let image = encoder.encode(frame(4, 2, 3), RosTime::new(1, 5)).unwrap();

        assert_eq!(image.width, 4);
        assert_eq!(image.height, 2);
        assert_eq!(image.step, 12);
        assert_eq!(image.data.len(), 24);
        assert_eq!(image.header.stamp, RosTime::new(1, 5));
        assert_eq!(image.header.frame_id, "camera");
    }

    #[test]
    fn test_encode_rejects_mismatched_frames() {
        let encoder = ImageEncoder::new(PixelEncoding::Mono8, "");
        assert!(encoder.encode(frame(4, 2, 3), RosTime::ZERO).is_err());

        let mut short = frame(4, 2, 1);
        short.buffer.pop();
        assert!(encoder.encode(short, RosTime::ZERO).is_err());
    }

    #[test]
    fn test_serialized_layout() {
        let encoder = ImageEncoder::new(PixelEncoding::Mono8, "f");
        let image = encoder.encode(frame(2, 1, 1), RosTime::new(7, 9)).unwrap();
        let bytes = image.to_bytes().unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&0u32.to_le_bytes()); // seq
        expected.extend_from_slice(&7u32.to_le_bytes());
        expected.extend_from_slice(&9u32.to_le_bytes());
        expected.extend_from_slice(&1u32.to_le_bytes());
        expected.extend_from_slice(b"f");
        expected.extend_from_slice(&1u32.to_le_bytes()); // height
        expected.extend_from_slice(&2u32.to_le_bytes()); // width
        expected.extend_from_slice(&5u32.to_le_bytes());
        expected.extend_from_slice(b"mono8");
        expected.push(0);
        expected.extend_from_slice(&2u32.to_le_bytes()); // step
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&[0, 1]);

        assert_eq!(bytes, expected);
    }
}
