#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use glyphidx_core::LabelPolicy;
use glyphidx_tools::find_label::{find_label, parse_label_arg};

#[derive(Debug, Parser)]
#[command(name = "glyphidx-find-label")]
struct Args {
    /// IDX label file (magic 00 00 08 01).
    idx_file: PathBuf,

    /// Label character to search for.
    label: String,

    /// Payload offset to start searching from (0 = first label).
    start_offset: u64,

    /// Encode the label character with this policy (alnum62|ascii) before searching.
    #[arg(long)]
    label_policy: Option<String>,
}

fn main() -> Result<()> {
    glyphidx_observe::logging::init_tracing();
    let args = Args::parse();

    let policy = args
        .label_policy
        .as_deref()
        .map(str::parse::<LabelPolicy>)
        .transpose()?;
    let label = parse_label_arg(&args.label, policy)?;

    match find_label(&args.idx_file, label, args.start_offset)? {
        Some(offset) => println!("{offset}"),
        None => println!("Not found {} {:?}", args.start_offset, args.label),
    }
    Ok(())
}
