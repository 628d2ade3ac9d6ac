//! Image shrinking for pictures attached to group content.
//!
//! Full nodes cap the size of a single transaction, so every picture that
//! rides along with a post or a profile has to be squeezed under a byte
//! budget before it is base64-encoded into the payload.

mod animated;
mod raster;
mod sniff;

use anyhow::Result;
use std::path::Path;

pub use sniff::{sniff, FileKind};

/// Reduces image bytes until they fit a kilobyte budget.
///
/// Implementations must not touch the source file of an animated image
/// unless `in_place` is set.
pub trait MediaCodec: Send + Sync {
    /// Shrinks a static raster image held in memory.
    fn shrink_to_budget(&self, bytes: &[u8], max_kb: usize) -> Result<Vec<u8>>;

    /// Shrinks an animated image stored on disk.
    fn shrink_animated_to_budget(&self, path: &Path, max_kb: usize, in_place: bool)
        -> Result<Vec<u8>>;
}

/// Default codec backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl MediaCodec for ImageCodec {
    fn shrink_to_budget(&self, bytes: &[u8], max_kb: usize) -> Result<Vec<u8>> {
        raster::shrink_to_budget(bytes, max_kb)
    }

    fn shrink_animated_to_budget(
        &self,
        path: &Path,
        max_kb: usize,
        in_place: bool,
    ) -> Result<Vec<u8>> {
        animated::shrink_animated_to_budget(path, max_kb, in_place)
    }
}

/// Size in whole kilobytes, rounded down.
pub(crate) fn size_kb(bytes: &[u8]) -> usize {
    bytes.len() / 1024
}
