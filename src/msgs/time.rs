use anyhow::{anyhow, bail, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};
use std::time::Duration;

/// ROS1 `time`: unsigned seconds and nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RosTime {
    pub sec: u32,
    pub nsec: u32,
}

impl RosTime {
    pub const ZERO: RosTime = RosTime { sec: 0, nsec: 0 };

    pub fn new(sec: u32, nsec: u32) -> Self {
        Self { sec, nsec }
    }

    /// Synthetic capture time of frame `index` at a constant `frame_rate`.
    /// Fails when the time does not fit in 32-bit ROS seconds.
    pub fn from_frame_index(index: u64, frame_rate: f64) -> Result<Self> {
        let secs = index as f64 / frame_rate;
        let d = Duration::try_from_secs_f64(secs)
            .map_err(|e| anyhow!("frame {} at {} fps has no valid time ({}s): {}", index, frame_rate, secs, e))?;
        let Ok(sec) = u32::try_from(d.as_secs()) else {
            bail!("frame {} at {} fps is {}s, past the 32-bit ROS time range", index, frame_rate, d.as_secs());
        };
        Ok(Self::new(sec, d.subsec_nanos()))
    }

    pub fn as_nanos(&self) -> u64 {
        self.sec as u64 * 1_000_000_000 + self.nsec as u64
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_u32::<LittleEndian>(self.sec)?;
        out.write_u32::<LittleEndian>(self.nsec)
    }

    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&self.sec.to_le_bytes());
        bytes[4..].copy_from_slice(&self.nsec.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self {
            sec: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            nsec: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}
