#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use glyphidx_core::LabelPolicy;
use glyphidx_tools::view::{
    check_labels, label_description, load_sample, render_ascii, write_png,
};

#[derive(Debug, Parser)]
#[command(name = "glyphidx-view")]
struct Args {
    /// IDX image file (3 dimensions, unsigned bytes).
    images: PathBuf,

    /// IDX label file paired with `images`.
    labels: PathBuf,

    /// Record index to show.
    index: u64,

    /// Decode the label byte with this policy (alnum62|ascii) instead of printing it raw.
    #[arg(long)]
    label_policy: Option<String>,

    /// Also write the sample as a grayscale PNG.
    #[arg(long)]
    png: Option<PathBuf>,
}

fn main() -> Result<()> {
    glyphidx_observe::logging::init_tracing();
    let args = Args::parse();

    let policy = args
        .label_policy
        .as_deref()
        .map(str::parse::<LabelPolicy>)
        .transpose()?;
    let sample = load_sample(&args.images, &args.labels, args.index)?;
    if let Some(p) = policy {
        if let Some(offset) = check_labels(&args.labels, p)? {
            println!("label at offset {offset} is not a {p} label");
        }
    }

    println!(
        "{} of {} ({}x{})",
        sample.index, sample.count, sample.width, sample.height
    );
    println!("{}", label_description(sample.label, policy));
    print!("{}", render_ascii(&sample));

    if let Some(path) = &args.png {
        write_png(&sample, path)?;
    }
    Ok(())
}
