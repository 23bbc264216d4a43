use anyhow::Result;
use std::path::Path;

use super::FrameData;

/// A finite, ordered stream of decoded frames. The underlying handle is
/// released when the source is dropped.
pub trait FrameSource {
    /// Next frame in decode order, `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<FrameData>>;
}

/// Opens a [`FrameSource`] for a video file.
pub trait SourceOpener {
    type Source: FrameSource;

    fn open(&self, path: &Path) -> Result<Self::Source>;
}
