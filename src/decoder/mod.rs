pub mod frame_data;
pub mod source;
pub mod video;

pub use frame_data::FrameData;
pub use source::{FrameSource, SourceOpener};
pub use video::OpenCvOpener;
