#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

pub mod pack_zip;
pub mod sample;

use glyphidx_core::LabelError;
use thiserror::Error;

/// Fatal per-entry failures. Any of these aborts the whole pack.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("width and height must be > 0 and width*height must fit in u32 (got {width}x{height})")]
    BadDimensions { width: u32, height: u32 },
    #[error("entry {entry:?}: class code {segment:?} is not hexadecimal")]
    BadClassCode { entry: String, segment: String },
    #[error("entry {entry:?}: {source}")]
    Label {
        entry: String,
        #[source]
        source: LabelError,
    },
    #[error("entry {entry:?}: image decode failed: {source}")]
    Decode {
        entry: String,
        #[source]
        source: image::ImageError,
    },
    #[error("entry {entry:?}: expected {expected} pixel bytes, got {got} (source image {source_width}x{source_height})")]
    ShapeMismatch {
        entry: String,
        expected: usize,
        got: usize,
        source_width: u32,
        source_height: u32,
    },
    #[error("subset {subset} has more than u32::MAX entries")]
    TooManyEntries { subset: &'static str },
}
