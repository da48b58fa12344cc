#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use glyphidx_tools::embed::{embed_file, EmbedConfig};

#[derive(Debug, Parser)]
#[command(name = "glyphidx-embed")]
struct Args {
    /// Binary file to embed.
    bin_file: PathBuf,

    /// Generated source file.
    out_file: PathBuf,

    /// Name of the generated array (C identifier).
    symbol: String,

    /// Fail unless the input size is a multiple of this many bytes.
    #[arg(long)]
    align: Option<u64>,
}

fn main() -> Result<()> {
    glyphidx_observe::logging::init_tracing();
    let args = Args::parse();

    embed_file(&EmbedConfig {
        input: args.bin_file,
        output: args.out_file,
        symbol: args.symbol,
        align: args.align,
    })?;
    Ok(())
}
