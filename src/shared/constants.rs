pub const APP_NAME: &str = "vid2bag";

pub const SETTINGS_FILE: &str = "vid2bag.config";
pub const ERROR_LOG_FILE: &str = "vid2bag_error.log";
pub const DEBUG_LOG_FILE: &str = "vid2bag_debug.log";

pub const VIDEO_EXTENSION: &str = "mp4";
pub const BAG_EXTENSION: &str = "bag";

pub const DEFAULT_FRAME_RATE: f64 = 30.0;
pub const DEFAULT_TOPIC: &str = "/cam0/image_raw";
pub const DEFAULT_FRAME_ID: &str = "";

/// Uncompressed chunk size after which the bag writer starts a new chunk.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 768 * 1024;

/// Upper bound for the chunk threshold, leaving room below the 32-bit chunk
/// size for the message that crosses it.
pub const MAX_CHUNK_THRESHOLD: usize = 1 << 30;

/// A progress line is printed every this many frames.
pub const PROGRESS_INTERVAL: u64 = 100;
