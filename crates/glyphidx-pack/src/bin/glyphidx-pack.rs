#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use glyphidx_core::LabelPolicy;
use glyphidx_pack::pack_zip::{pack_zip, PackZipConfig};
use glyphidx_pack::sample::parse_filter;

#[derive(Debug, Parser)]
#[command(name = "glyphidx-pack")]
struct Args {
    /// Zip archive laid out as <root>/<class-hex>/<variant>/<file>.png.
    ///
    /// Variant folders starting with `train` go to the train subset, all
    /// others to the hsf subset.
    archive: PathBuf,

    /// Directory receiving the four .idx files (created if missing).
    out_dir: PathBuf,

    /// Name inserted into output file names: <subset>-<prefix>-images-idx3-ubyte.idx.
    name_prefix: String,

    /// Target image width in pixels.
    width: u32,

    /// Target image height in pixels.
    height: u32,

    /// Label encoding: alnum62 (index into 0-9A-Za-z) or ascii (raw code point).
    #[arg(long, default_value = "alnum62")]
    label_policy: String,

    /// Resize filter: nearest|triangle|catmull-rom|gaussian|lanczos3.
    #[arg(long, default_value = "nearest")]
    filter: String,

    /// Also print the distinct classes as characters.
    #[arg(long, default_value_t = false)]
    list_classes: bool,

    /// Disable the stderr progress bar.
    #[arg(long, default_value_t = false)]
    no_progress: bool,
}

fn config_from_args(args: Args) -> Result<PackZipConfig> {
    let label_policy: LabelPolicy = args.label_policy.parse()?;
    let filter = parse_filter(&args.filter)?;
    Ok(PackZipConfig {
        archive: args.archive,
        out_dir: args.out_dir,
        name_prefix: args.name_prefix,
        width: args.width,
        height: args.height,
        label_policy,
        filter,
        show_progress: !args.no_progress,
    })
}

fn main() -> Result<()> {
    glyphidx_observe::logging::init_tracing();

    let args = Args::parse();
    let list_classes = args.list_classes;
    let res = pack_zip(&config_from_args(args)?)?;

    println!("{}", res.summary());
    if list_classes {
        println!("{}", res.class_chars());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::imageops::FilterType;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["glyphidx-pack", "glyphs.zip", "out", "digits", "20", "28"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_map_to_alnum62_nearest_with_progress() {
        let a = args(&[]);
        assert!(!a.list_classes);
        let cfg = config_from_args(a).unwrap();
        assert_eq!(cfg.archive, PathBuf::from("glyphs.zip"));
        assert_eq!(cfg.name_prefix, "digits");
        assert_eq!((cfg.width, cfg.height), (20, 28));
        assert_eq!(cfg.label_policy, LabelPolicy::Alnum62);
        assert_eq!(cfg.filter, FilterType::Nearest);
        assert!(cfg.show_progress);
    }

    #[test]
    fn options_are_parsed_into_config() {
        let a = args(&[
            "--label-policy",
            "ascii",
            "--filter",
            "lanczos3",
            "--list-classes",
            "--no-progress",
        ]);
        assert!(a.list_classes);
        let cfg = config_from_args(a).unwrap();
        assert_eq!(cfg.label_policy, LabelPolicy::Ascii);
        assert_eq!(cfg.filter, FilterType::Lanczos3);
        assert!(!cfg.show_progress);
    }

    #[test]
    fn unknown_option_values_are_rejected() {
        assert!(config_from_args(args(&["--label-policy", "hex"])).is_err());
        assert!(config_from_args(args(&["--filter", "box"])).is_err());
    }
}
