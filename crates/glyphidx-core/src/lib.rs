#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

pub mod label;
pub mod reader;
pub mod types;
pub mod writer;

pub use label::{LabelError, LabelPolicy};
pub use reader::IdxReader;
pub use types::{ElementType, IdxError, IdxHeader};
pub use writer::IdxWriter;
