#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use glyphidx_tools::dump::{read_range, render, DumpMode};

#[derive(Debug, Parser)]
#[command(name = "glyphidx-dump")]
struct Args {
    file: PathBuf,

    /// Byte offset from the start of the file.
    offset: u64,

    /// Number of bytes to print (fewer at end of file).
    length: u64,

    /// Print the range as one escaped byte string instead of hex/char lists.
    #[arg(short = 's', default_value_t = false)]
    byte_string: bool,
}

fn main() -> Result<()> {
    glyphidx_observe::logging::init_tracing();
    let args = Args::parse();

    let bytes = read_range(&args.file, args.offset, args.length)?;
    let mode = if args.byte_string {
        DumpMode::ByteString
    } else {
        DumpMode::Lists
    };
    println!("{}", render(&bytes, mode));
    Ok(())
}
