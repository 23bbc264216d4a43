pub mod encoding;
pub mod image;
pub mod time;

pub use encoding::PixelEncoding;
pub use image::ImageEncoder;
pub use time::RosTime;

/// A message that can be stored in a bag: ROS1 wire serialization plus the
/// metadata the bag's connection record carries.
pub trait RosMessage {
    const DATATYPE: &'static str;
    const MD5SUM: &'static str;
    const DEFINITION: &'static str;

    fn serialize(&self, out: &mut Vec<u8>) -> std::io::Result<()>;

    fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.serialize(&mut out)?;
        Ok(out)
    }
}
