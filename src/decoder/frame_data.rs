/// One decoded frame: tightly packed 8-bit rows, `channels` bytes per pixel.
#[derive(Clone)]
pub struct FrameData {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl FrameData {
    pub fn new(buffer: Vec<u8>, width: u32, height: u32, channels: u32) -> Self {
        Self { buffer, width, height, channels }
    }
}
