#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

pub mod dump;
pub mod embed;
pub mod find_label;
pub mod view;
