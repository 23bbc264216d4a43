//! Synthetic frame sources so the pipeline can be tested without video files.

use anyhow::{anyhow, bail, Context, Result};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::decoder::{FrameData, FrameSource, SourceOpener};

pub const WIDTH: u32 = 4;
pub const HEIGHT: u32 = 3;

/// Yields `frames` solid BGR frames whose pixel value is the frame index, and
/// fails instead of producing frame `fail_at`.
pub struct SyntheticSource {
    next: u64,
    frames: u64,
    fail_at: Option<u64>,
    channels: u32,
    sample_bytes: u32,
    released: Rc<Cell<bool>>,
}

impl SyntheticSource {
    pub fn new(frames: u64, fail_at: Option<u64>) -> (Self, Rc<Cell<bool>>) {
        let released = Rc::new(Cell::new(false));
        let source = Self {
            next: 0,
            frames,
            fail_at,
            channels: 3,
            sample_bytes: 1,
            released: Rc::clone(&released),
        };
        (source, released)
    }

    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = channels;
        self
    }

    /// Bytes per channel sample, e.g. 2 for a 16-bit source.
    pub fn with_sample_bytes(mut self, sample_bytes: u32) -> Self {
        self.sample_bytes = sample_bytes;
        self
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<FrameData>> {
        if self.fail_at == Some(self.next) {
            bail!("corrupt packet at frame {}", self.next);
        }
        if self.next >= self.frames {
            return Ok(None);
        }
        let value = self.next as u8;
        self.next += 1;
        let len = (WIDTH * HEIGHT * self.channels * self.sample_bytes) as usize;
        Ok(Some(FrameData::new(vec![value; len], WIDTH, HEIGHT, self.channels)))
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

/// Opens "videos" described by their file contents: `frames=N` optionally
/// followed by `fail=M`. Empty or malformed files cannot be opened.
#[derive(Default)]
pub struct SyntheticOpener {
    opened: Cell<usize>,
    released: RefCell<Vec<(PathBuf, Rc<Cell<bool>>)>>,
}

impl SyntheticOpener {
    pub fn opened(&self) -> usize {
        self.opened.get()
    }

    pub fn all_released(&self) -> bool {
        self.released.borrow().iter().all(|(_, released)| released.get())
    }
}

impl SourceOpener for SyntheticOpener {
    type Source = SyntheticSource;

    fn open(&self, path: &Path) -> Result<SyntheticSource> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;

        let mut frames: Option<u64> = None;
        let mut fail_at: Option<u64> = None;
        for token in content.split_whitespace() {
            match token.split_once('=') {
                Some(("frames", n)) => frames = Some(n.parse()?),
                Some(("fail", n)) => fail_at = Some(n.parse()?),
                _ => bail!("unrecognized token '{}'", token),
            }
        }
        let frames = frames.ok_or_else(|| anyhow!("no video stream in {}", path.display()))?;

        self.opened.set(self.opened.get() + 1);
        let (source, released) = SyntheticSource::new(frames, fail_at);
        self.released.borrow_mut().push((path.to_path_buf(), released));
        Ok(source)
    }
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vid2bag_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}
